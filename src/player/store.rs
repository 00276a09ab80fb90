use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::debug;

use crate::catalog::Track;

use super::controller::PlaybackController;
use super::state::{DEFAULT_VOLUME, PlayerState};

/// A single mutation of the player.
#[derive(Debug, Clone)]
pub enum PlayerCmd {
    /// Load a track and start playing; `queue` replaces the current queue when given.
    Play {
        track: Arc<Track>,
        queue: Option<Vec<Arc<Track>>>,
    },
    Pause,
    Resume,
    Next,
    Prev,
    SetQueue(Vec<Arc<Track>>),
    SetProgress(f64),
    SetVolume(f64),
    ToggleShuffle,
    CycleRepeat,
}

/// Inbound notifications from an audio output.
pub trait AudioEvents {
    /// Elapsed fraction of the current track, already clamped by the output.
    fn on_progress(&mut self, fraction: f64);
    /// The current track played to its end.
    fn on_ended(&mut self);
}

/// Owns one `PlaybackController` and publishes a snapshot after every command.
///
/// Readers get `&PlayerState` or a subscription; writers go through `dispatch`.
pub struct PlayerStore {
    controller: PlaybackController,
    subscribers: Vec<Sender<PlayerState>>,
}

impl Default for PlayerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerStore {
    pub fn new() -> Self {
        Self::with_controller(PlaybackController::new())
    }

    pub fn with_controller(controller: PlaybackController) -> Self {
        Self {
            controller,
            subscribers: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlayerState {
        self.controller.state()
    }

    /// Receive a snapshot after each dispatched command.
    pub fn subscribe(&mut self) -> Receiver<PlayerState> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn dispatch(&mut self, cmd: PlayerCmd) {
        match cmd {
            PlayerCmd::Play { track, queue } => {
                debug!(track = %track.id, queue_len = ?queue.as_ref().map(Vec::len), "play");
                self.controller.play(track, queue);
            }
            PlayerCmd::Pause => self.controller.pause(),
            PlayerCmd::Resume => self.controller.resume(),
            PlayerCmd::Next => {
                self.controller.next();
                debug!(track = ?self.current_id(), playing = self.state().is_playing, "next");
            }
            PlayerCmd::Prev => {
                self.controller.prev();
                debug!(track = ?self.current_id(), "prev");
            }
            PlayerCmd::SetQueue(tracks) => {
                debug!(len = tracks.len(), "queue replaced");
                self.controller.set_queue(tracks);
            }
            PlayerCmd::SetProgress(p) => self.controller.set_progress(p),
            PlayerCmd::SetVolume(v) => self.controller.set_volume(v),
            PlayerCmd::ToggleShuffle => {
                self.controller.toggle_shuffle();
                debug!(shuffle = self.state().shuffle, "shuffle toggled");
            }
            PlayerCmd::CycleRepeat => {
                self.controller.cycle_repeat();
                debug!(repeat = ?self.state().repeat, "repeat cycled");
            }
        }
        self.publish();
    }

    /// Play `track` within `context`, or on its own when there is no context.
    pub fn play_track(&mut self, track: Arc<Track>, context: Option<Vec<Arc<Track>>>) {
        let queue = context.unwrap_or_else(|| vec![track.clone()]);
        self.dispatch(PlayerCmd::Play {
            track,
            queue: Some(queue),
        });
    }

    pub fn toggle_play(&mut self) {
        if self.state().is_playing {
            self.dispatch(PlayerCmd::Pause);
        } else {
            self.dispatch(PlayerCmd::Resume);
        }
    }

    pub fn toggle_mute(&mut self) {
        let volume = if self.state().volume > 0.0 {
            0.0
        } else {
            DEFAULT_VOLUME
        };
        self.dispatch(PlayerCmd::SetVolume(volume));
    }

    fn current_id(&self) -> Option<String> {
        self.state().current_track.as_ref().map(|t| t.id.0.clone())
    }

    fn publish(&mut self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.controller.state().clone();
        self.subscribers.retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

impl AudioEvents for PlayerStore {
    fn on_progress(&mut self, fraction: f64) {
        self.dispatch(PlayerCmd::SetProgress(fraction));
    }

    fn on_ended(&mut self) {
        debug!("track ended");
        self.dispatch(PlayerCmd::Next);
    }
}
