//! The playback queue controller.
//!
//! Every operation is a total, synchronous transition over `PlayerState`.
//! Values passed to `set_progress` / `set_volume` are stored verbatim;
//! callers clamp them.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::Track;

use super::state::{PlayerState, RepeatMode};

/// Below this progress `prev()` navigates; above it, it restarts the track.
pub const RESTART_THRESHOLD: f64 = 0.05;

pub struct PlaybackController {
    state: PlayerState,
    rng: StdRng,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Build a controller with a caller-provided RNG (deterministic shuffle).
    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            state: PlayerState::default(),
            rng,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Load `track` and start playing it. A supplied `queue` replaces the
    /// current one; otherwise the existing queue is kept.
    pub fn play(&mut self, track: Arc<Track>, queue: Option<Vec<Arc<Track>>>) {
        self.state.current_track = Some(track);
        self.state.is_playing = true;
        self.state.progress = 0.0;
        if let Some(queue) = queue {
            self.state.queue = queue;
        }
    }

    pub fn pause(&mut self) {
        self.state.is_playing = false;
    }

    pub fn resume(&mut self) {
        self.state.is_playing = true;
    }

    pub fn next(&mut self) {
        let len = self.state.queue.len();
        if len == 0 {
            return;
        }

        if self.state.repeat == RepeatMode::One {
            self.state.progress = 0.0;
            self.state.is_playing = true;
            return;
        }

        let next_idx = if self.state.shuffle {
            self.rng.gen_range(0..len)
        } else {
            // A current track missing from the queue counts as index -1,
            // so playback starts over from the head of the queue.
            let candidate = self.state.current_index().map_or(0, |i| i + 1);
            if candidate < len {
                candidate
            } else if self.state.repeat == RepeatMode::All {
                0
            } else {
                self.state.is_playing = false;
                self.state.progress = 0.0;
                return;
            }
        };

        self.advance_to(next_idx);
    }

    pub fn prev(&mut self) {
        if self.state.progress > RESTART_THRESHOLD {
            self.state.progress = 0.0;
            return;
        }

        let len = self.state.queue.len() as i64;
        if len == 0 {
            return;
        }

        let idx = self.state.current_index().map_or(-1, |i| i as i64);
        let prev_idx = (idx - 1 + len).rem_euclid(len) as usize;
        self.advance_to(prev_idx);
    }

    pub fn set_queue(&mut self, tracks: Vec<Arc<Track>>) {
        self.state.queue = tracks;
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.state.progress = progress;
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.state.volume = volume;
    }

    pub fn toggle_shuffle(&mut self) {
        self.state.shuffle = !self.state.shuffle;
    }

    pub fn cycle_repeat(&mut self) {
        self.state.repeat = self.state.repeat.cycled();
    }

    fn advance_to(&mut self, idx: usize) {
        self.state.current_track = Some(self.state.queue[idx].clone());
        self.state.progress = 0.0;
        self.state.is_playing = true;
    }
}
