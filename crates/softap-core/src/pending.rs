// ── PendingDisconnectQueue ──
//
// `forceClientDisconnect` call failed, queued for
// a retry driven by the self-scheduled `ForceDisconnectPending` event rather
// than a thread/sleep. `IndexMap` preserves insertion order so
// retries replay in the order disconnects were first attempted.

use indexmap::IndexMap;

use crate::collaborators::DisconnectReason;
use crate::model::MacAddress;

#[derive(Debug, Default)]
pub struct PendingDisconnectQueue {
    by_mac: IndexMap<MacAddress, DisconnectReason>,
}

impl PendingDisconnectQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a retry. I6 requires the caller to have already removed `mac`
    /// from `ClientRegistry` before calling this.
    pub fn insert(&mut self, mac: MacAddress, reason: DisconnectReason) {
        self.by_mac.insert(mac, reason);
    }

    /// Drop `mac` from the queue — called when it re-associates.
    pub fn remove(&mut self, mac: &MacAddress) -> bool {
        self.by_mac.shift_remove(mac).is_some()
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.by_mac.contains_key(mac)
    }

    pub fn is_empty(&self) -> bool {
        self.by_mac.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_mac.clear();
    }

    /// Entries in the order they were first enqueued.
    pub fn iter(&self) -> impl Iterator<Item = (&MacAddress, &DisconnectReason)> {
        self.by_mac.iter()
    }
}
