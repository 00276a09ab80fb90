use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::AudioSettings;

use super::error::AudioError;
use super::thread::spawn_output_thread;
use super::types::{AudioEvent, AudioOutput, AudioSource, OutputCmd};

/// `AudioOutput` backed by a rodio sink on a dedicated thread.
pub struct RodioOutput {
    tx: Sender<OutputCmd>,
    join: Option<JoinHandle<()>>,
}

impl RodioOutput {
    /// Open the default output device. Progress and end-of-track
    /// notifications arrive on the returned receiver.
    pub fn spawn(settings: AudioSettings) -> Result<(Self, Receiver<AudioEvent>), AudioError> {
        let (tx, rx) = mpsc::channel::<OutputCmd>();
        let (event_tx, event_rx) = mpsc::channel::<AudioEvent>();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let handle = spawn_output_thread(rx, event_tx, settings, ready_tx);
        ready_rx.recv().map_err(|_| AudioError::ThreadGone)??;

        let output = Self {
            tx,
            join: Some(handle),
        };
        Ok((output, event_rx))
    }

    fn send(&self, cmd: OutputCmd) {
        // The thread only exits on Quit or a dropped sender.
        let _ = self.tx.send(cmd);
    }
}

impl AudioOutput for RodioOutput {
    fn load(&mut self, source: AudioSource, serial: u64) {
        self.send(OutputCmd::Load { source, serial });
    }

    fn unload(&mut self) {
        self.send(OutputCmd::Unload);
    }

    fn set_playing(&mut self, playing: bool) {
        self.send(OutputCmd::SetPlaying(playing));
    }

    fn set_volume(&mut self, volume: f64) {
        self.send(OutputCmd::SetVolume(volume as f32));
    }

    fn seek(&mut self, fraction: f64, serial: u64) {
        self.send(OutputCmd::Seek { fraction, serial });
    }

    fn shutdown(&mut self, fade_out: Duration) {
        self.send(OutputCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}
