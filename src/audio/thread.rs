use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use crate::config::AudioSettings;

use super::error::AudioError;
use super::sink::create_sink_at;
use super::types::{AudioEvent, AudioSource, OutputCmd};

/// Elapsed time of the loaded source, accumulated across pauses.
#[derive(Debug, Default)]
struct Playhead {
    started_at: Option<Instant>,
    accumulated: Duration,
}

impl Playhead {
    fn at(offset: Duration) -> Self {
        Self {
            started_at: None,
            accumulated: offset,
        }
    }

    fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        if let Some(st) = self.started_at.take() {
            self.accumulated += st.elapsed();
        }
    }

    fn elapsed(&self) -> Duration {
        self.accumulated + self.started_at.map_or(Duration::ZERO, |st| st.elapsed())
    }
}

struct Loaded {
    source: AudioSource,
    sink: Sink,
    duration: Option<Duration>,
    playhead: Playhead,
    serial: u64,
    /// Set once `Ended` has been reported; cleared by a seek or a new load.
    ended: bool,
}

impl Loaded {
    fn fraction(&self) -> Option<f64> {
        let total = self.duration?.as_secs_f64();
        if total <= 0.0 {
            return None;
        }
        Some((self.playhead.elapsed().as_secs_f64() / total).clamp(0.0, 1.0))
    }
}

struct OutputThread {
    stream: OutputStream,
    events: Sender<AudioEvent>,
    settings: AudioSettings,
    current: Option<Loaded>,
    playing: bool,
    volume: f32,
}

pub(super) fn spawn_output_thread(
    rx: Receiver<OutputCmd>,
    events: Sender<AudioEvent>,
    settings: AudioSettings,
    ready: SyncSender<Result<(), AudioError>>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                let _ = ready.send(Err(AudioError::Device(e.to_string())));
                return;
            }
        };
        // Keep rodio from writing to the terminal on drop.
        stream.log_on_drop(false);
        let _ = ready.send(Ok(()));

        OutputThread {
            stream,
            events,
            settings,
            current: None,
            playing: false,
            volume: 1.0,
        }
        .run(rx);
    })
}

impl OutputThread {
    fn run(mut self, rx: Receiver<OutputCmd>) {
        let tick = Duration::from_millis(self.settings.tick_ms.max(1));
        let mut last_tick = Instant::now();

        loop {
            let wait = tick.saturating_sub(last_tick.elapsed());
            match rx.recv_timeout(wait) {
                Ok(OutputCmd::Quit { fade_out_ms }) => {
                    self.quit(fade_out_ms);
                    break;
                }
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if last_tick.elapsed() >= tick {
                self.tick();
                last_tick = Instant::now();
            }
        }
        debug!("audio output thread stopped");
    }

    fn handle(&mut self, cmd: OutputCmd) {
        match cmd {
            OutputCmd::Load { source, serial } => self.load(source, serial),
            OutputCmd::Unload => {
                if let Some(old) = self.current.take() {
                    old.sink.stop();
                }
            }
            OutputCmd::SetPlaying(playing) => self.set_playing(playing),
            OutputCmd::SetVolume(volume) => {
                self.volume = volume;
                if let Some(cur) = &self.current {
                    cur.sink.set_volume(volume);
                }
            }
            OutputCmd::Seek { fraction, serial } => self.seek(fraction, serial),
            OutputCmd::Quit { .. } => {}
        }
    }

    fn load(&mut self, source: AudioSource, serial: u64) {
        let (sink, estimated) = match create_sink_at(&self.stream, &source, Duration::ZERO) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "cannot load source");
                if let Some(old) = self.current.take() {
                    old.sink.stop();
                }
                return;
            }
        };
        let duration = source.duration.or(estimated);
        debug!(path = %source.path.display(), ?duration, "source loaded");

        let mut playhead = Playhead::default();
        match self.current.take() {
            Some(old) if self.playing && !old.ended => {
                playhead.start();
                self.crossfade(&old.sink, &sink);
            }
            Some(old) => old.sink.stop(),
            None => {}
        }

        sink.set_volume(self.volume);
        if self.playing {
            sink.play();
            playhead.start();
        }

        self.current = Some(Loaded {
            source,
            sink,
            duration,
            playhead,
            serial,
            ended: false,
        });
    }

    /// Fade `old` out while `new` fades in, then stop `old`.
    fn crossfade(&self, old: &Sink, new: &Sink) {
        let crossfade_ms = self.settings.crossfade_ms;
        if crossfade_ms == 0 {
            old.stop();
            return;
        }
        let steps = self.settings.crossfade_steps.max(1);

        new.set_volume(0.0);
        new.play();
        // Fade volumes in a short blocking loop; audio keeps flowing in rodio's mixer thread.
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            old.set_volume(self.volume * (1.0 - t));
            new.set_volume(self.volume * t);
            thread::sleep(Duration::from_millis((crossfade_ms / steps).max(1)));
        }
        old.stop();
    }

    fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        let Some(cur) = self.current.as_mut() else {
            return;
        };
        if cur.ended {
            return;
        }
        if playing {
            cur.sink.play();
            cur.playhead.start();
        } else {
            cur.sink.pause();
            cur.playhead.stop();
        }
    }

    /// Rebuild the sink at the target offset; `skip_duration` cannot rewind.
    fn seek(&mut self, fraction: f64, serial: u64) {
        let Some(mut old) = self.current.take() else {
            return;
        };
        // Later events belong to this seek even if the sink cannot be rebuilt.
        old.serial = serial;

        let target = if fraction <= 0.0 {
            Duration::ZERO
        } else if let Some(total) = old.duration {
            total.mul_f64(fraction.min(1.0))
        } else {
            warn!(path = %old.source.path.display(), "cannot seek without a known duration");
            self.current = Some(old);
            return;
        };

        match create_sink_at(&self.stream, &old.source, target) {
            Ok((sink, _)) => {
                old.sink.stop();
                sink.set_volume(self.volume);
                let mut playhead = Playhead::at(target);
                if self.playing {
                    sink.play();
                    playhead.start();
                }
                self.current = Some(Loaded {
                    source: old.source,
                    sink,
                    duration: old.duration,
                    playhead,
                    serial,
                    ended: false,
                });
            }
            Err(e) => {
                error!(error = %e, "seek failed");
                self.current = Some(old);
            }
        }
    }

    fn tick(&mut self) {
        let Some(cur) = self.current.as_mut() else {
            return;
        };
        if !self.playing || cur.ended {
            return;
        }

        if cur.sink.empty() {
            cur.ended = true;
            cur.playhead.stop();
            let _ = self.events.send(AudioEvent::Ended { serial: cur.serial });
        } else if let Some(fraction) = cur.fraction() {
            let _ = self.events.send(AudioEvent::Progress {
                serial: cur.serial,
                fraction,
            });
        }
    }

    fn quit(&mut self, fade_out_ms: u64) {
        if let Some(cur) = self.current.take() {
            // Fade out gently before stopping.
            if fade_out_ms > 0 && self.playing && !cur.ended {
                let steps: u64 = 20;
                let step_ms = (fade_out_ms / steps).max(1);
                for step in 1..=steps {
                    let t = step as f32 / steps as f32;
                    cur.sink.set_volume(self.volume * (1.0 - t));
                    thread::sleep(Duration::from_millis(step_ms));
                }
            }
            cur.sink.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playhead_accumulates_across_pauses() {
        let mut p = Playhead::at(Duration::from_secs(10));
        assert_eq!(p.elapsed(), Duration::from_secs(10));

        p.start();
        thread::sleep(Duration::from_millis(20));
        p.stop();
        let after_first = p.elapsed();
        assert!(after_first >= Duration::from_millis(10_020));

        thread::sleep(Duration::from_millis(20));
        assert_eq!(p.elapsed(), after_first);
    }

    #[test]
    fn playhead_start_is_idempotent() {
        let mut p = Playhead::default();
        p.start();
        let first = p.started_at;
        p.start();
        assert_eq!(p.started_at, first);
    }
}
