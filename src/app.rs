//! Application module: the model the TUI and runtime share.
//!
//! `App` holds the loaded catalog, the cursor and the filter, and builds the
//! play contexts (visible list, album, artist top tracks) handed to the player.

mod model;

pub use model::*;
