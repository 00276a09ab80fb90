//! Audio port types.
//!
//! `AudioOutput` is what the integration layer drives; `AudioEvent` is what an
//! output reports back. The rodio implementation talks to its thread through
//! `OutputCmd`.

use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::Track;

/// A playable source resolved from a track's locator.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSource {
    pub path: PathBuf,
    /// Known duration; outputs fall back to the decoder's estimate.
    pub duration: Option<Duration>,
}

impl AudioSource {
    /// `None` when the track has no local, playable locator.
    pub fn from_track(track: &Track) -> Option<Self> {
        Some(Self {
            path: track.local_path()?,
            duration: track.duration(),
        })
    }
}

/// Notifications flowing from an output back to the player.
///
/// `serial` echoes the serial of the `load` or `seek` the output was serving
/// when it produced the event, so stale notifications can be told apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioEvent {
    /// Elapsed fraction of the loaded source, clamped to [0, 1].
    Progress { serial: u64, fraction: f64 },
    /// The loaded source played to its end.
    Ended { serial: u64 },
}

impl AudioEvent {
    pub fn serial(&self) -> u64 {
        match *self {
            AudioEvent::Progress { serial, .. } | AudioEvent::Ended { serial } => serial,
        }
    }
}

/// Something that can play one source at a time.
pub trait AudioOutput {
    /// Replace the loaded source. Playback starts only if the transport is playing.
    /// Events for this source carry `serial`.
    fn load(&mut self, source: AudioSource, serial: u64);
    /// Drop the loaded source, if any.
    fn unload(&mut self);
    /// Set the transport state.
    fn set_playing(&mut self, playing: bool);
    fn set_volume(&mut self, volume: f64);
    /// Jump to `fraction` of the loaded source; later events carry `serial`.
    fn seek(&mut self, fraction: f64, serial: u64);
    /// Stop for good, fading out over `fade_out`.
    fn shutdown(&mut self, _fade_out: Duration) {}
}

#[derive(Debug)]
pub(super) enum OutputCmd {
    Load { source: AudioSource, serial: u64 },
    Unload,
    SetPlaying(bool),
    SetVolume(f32),
    Seek { fraction: f64, serial: u64 },
    /// Quit the output thread, optionally fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}
