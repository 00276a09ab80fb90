//! Keeps an `AudioOutput` consistent with the player state.
//!
//! The player never talks to the output directly. After each state change the
//! runtime calls `sync`, and output notifications go through `handle_event`
//! so the bridge knows which position the output itself reported.

use std::time::Duration;

use tracing::{debug, warn};

use crate::catalog::TrackId;
use crate::player::{AudioEvents, PlayerCmd, PlayerState, PlayerStore};

use super::types::{AudioEvent, AudioOutput, AudioSource};

pub struct AudioBridge<O: AudioOutput> {
    output: O,
    loaded: Option<TrackId>,
    playing: bool,
    volume: Option<f64>,
    /// Last position the output reported or was told to seek to.
    reported: f64,
    /// The output finished the loaded source and waits for a seek or a load.
    ended: bool,
    /// Tag of the latest `load`/`seek`; events carrying another one are stale.
    serial: u64,
}

impl<O: AudioOutput> AudioBridge<O> {
    pub fn new(output: O) -> Self {
        Self {
            output,
            loaded: None,
            playing: false,
            volume: None,
            reported: 0.0,
            ended: false,
            serial: 0,
        }
    }

    #[cfg(test)]
    pub fn output(&self) -> &O {
        &self.output
    }

    #[cfg(test)]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    fn next_serial(&mut self) -> u64 {
        self.serial += 1;
        self.serial
    }

    /// Push whatever changed in `state` to the output.
    pub fn sync(&mut self, state: &PlayerState) {
        let current = state.current_track.as_ref();

        if current.map(|t| &t.id) != self.loaded.as_ref() {
            let serial = self.next_serial();
            match current {
                Some(track) => match AudioSource::from_track(track) {
                    Some(source) => {
                        debug!(track = %track.id, serial, "loading source");
                        self.output.load(source, serial);
                    }
                    None => {
                        warn!(track = %track.id, locator = ?track.audio_url, "track has no playable locator");
                        self.output.unload();
                    }
                },
                None => self.output.unload(),
            }
            self.loaded = current.map(|t| t.id.clone());
            self.reported = 0.0;
            self.ended = false;
        }

        // The player moved the position on its own (restart, repeat-one, stop at
        // end), or the same track follows itself after the output ran dry.
        let moved = (state.progress - self.reported).abs() > f64::EPSILON;
        if self.loaded.is_some() && (moved || self.ended) {
            let serial = self.next_serial();
            self.output.seek(state.progress, serial);
            self.reported = state.progress;
            self.ended = false;
        }

        if state.is_playing != self.playing {
            self.output.set_playing(state.is_playing);
            self.playing = state.is_playing;
        }

        if self.volume != Some(state.volume) {
            self.output.set_volume(state.volume);
            self.volume = Some(state.volume);
        }
    }

    /// Forward an output notification to the player.
    ///
    /// Events tagged for an earlier `load`/`seek` are dropped.
    pub fn handle_event<E: AudioEvents>(&mut self, event: AudioEvent, player: &mut E) {
        if event.serial() != self.serial {
            debug!(?event, current = self.serial, "dropping stale audio event");
            return;
        }
        match event {
            AudioEvent::Progress { fraction, .. } => {
                self.reported = fraction;
                player.on_progress(fraction);
            }
            AudioEvent::Ended { .. } => {
                self.ended = true;
                player.on_ended();
            }
        }
    }

    /// User seek: move the output and the player's progress together.
    ///
    /// `fraction` must already be clamped to [0, 1].
    pub fn seek(&mut self, store: &mut PlayerStore, fraction: f64) {
        if self.loaded.is_none() {
            return;
        }
        let serial = self.next_serial();
        self.output.seek(fraction, serial);
        self.reported = fraction;
        self.ended = false;
        store.dispatch(PlayerCmd::SetProgress(fraction));
    }

    pub fn shutdown(&mut self, fade_out: Duration) {
        self.output.shutdown(fade_out);
    }
}
