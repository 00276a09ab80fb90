//! Player core: the playback queue controller and the store that owns it.
//!
//! `PlaybackController` implements the transition rules (play, pause, next,
//! prev, shuffle, repeat, ...) over a `PlayerState`. `PlayerStore` is the
//! instance the runtime constructs and hands around: it applies `PlayerCmd`s,
//! publishes snapshots to subscribers and receives audio notifications.

mod controller;
mod state;
mod store;

pub use controller::PlaybackController;
pub use state::*;
pub use store::{AudioEvents, PlayerCmd, PlayerStore};
