use tracing::debug;

use crate::config;
use crate::player::{PlayerCmd, PlayerStore, RepeatMode};

/// Bring a fresh store to the configured shuffle, repeat and volume.
pub fn apply_playback_defaults(store: &mut PlayerStore, settings: &config::PlaybackSettings) {
    if settings.shuffle != store.state().shuffle {
        store.dispatch(PlayerCmd::ToggleShuffle);
    }

    set_repeat(store, settings.repeat.into());

    let volume = settings.volume.clamp(0.0, 1.0);
    if volume != store.state().volume {
        store.dispatch(PlayerCmd::SetVolume(volume));
    }

    debug!(
        shuffle = store.state().shuffle,
        repeat = ?store.state().repeat,
        volume = store.state().volume,
        "playback defaults applied"
    );
}

/// Cycle the repeat mode until it equals `target`.
pub fn set_repeat(store: &mut PlayerStore, target: RepeatMode) {
    // The cycle has three states, so at most two steps are ever needed.
    for _ in 0..3 {
        if store.state().repeat == target {
            break;
        }
        store.dispatch(PlayerCmd::CycleRepeat);
    }
}
