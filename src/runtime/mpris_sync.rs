use std::sync::mpsc::Receiver;

use crate::mpris::MprisHandle;
use crate::player::{PlayerState, PlayerStore};

/// Feeds store snapshots to the MPRIS service.
pub struct MprisSync {
    handle: MprisHandle,
    updates: Receiver<PlayerState>,
}

impl MprisSync {
    pub fn new(handle: MprisHandle, store: &mut PlayerStore) -> Self {
        handle.sync(store.state());
        Self {
            handle,
            updates: store.subscribe(),
        }
    }

    /// Apply the newest pending snapshot; older ones are skipped.
    pub fn pump(&self) {
        if let Some(latest) = self.updates.try_iter().last() {
            self.handle.sync(&latest);
        }
    }
}
