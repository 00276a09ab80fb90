use std::sync::Arc;

use crate::catalog::Track;

/// Initial volume, and the level restored when unmuting.
pub const DEFAULT_VOLUME: f64 = 0.8;

/// How `next()` behaves at the end of a track or of the queue.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Stop after the last track of the queue.
    #[default]
    None,
    /// Restart the current track.
    One,
    /// Wrap around to the start of the queue.
    All,
}

impl RepeatMode {
    /// `None -> All -> One -> None`.
    pub fn cycled(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::None => "Off",
            RepeatMode::One => "One",
            RepeatMode::All => "All",
        }
    }
}

/// Snapshot of the player.
///
/// Handed out read-only by `PlayerStore`; only controller operations change it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub current_track: Option<Arc<Track>>,
    pub queue: Vec<Arc<Track>>,
    pub is_playing: bool,
    /// Position within `current_track`, normally in [0, 1].
    pub progress: f64,
    /// Output level, normally in [0, 1].
    pub volume: f64,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_track: None,
            queue: Vec::new(),
            is_playing: false,
            progress: 0.0,
            volume: DEFAULT_VOLUME,
            shuffle: false,
            repeat: RepeatMode::None,
        }
    }
}

impl PlayerState {
    /// Index of the current track in the queue, matched by track id.
    pub fn current_index(&self) -> Option<usize> {
        let current = self.current_track.as_ref()?;
        self.queue.iter().position(|t| t.id == current.id)
    }

    /// Elapsed milliseconds of the current track, derived from `progress`.
    pub fn elapsed_ms(&self) -> u64 {
        match &self.current_track {
            Some(track) => (self.progress * track.duration_ms as f64).floor().max(0.0) as u64,
            None => 0,
        }
    }
}
