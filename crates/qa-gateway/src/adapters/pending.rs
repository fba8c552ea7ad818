//! In-memory pending registration store.

use crate::domain::Identity;
use crate::ports::PendingStore;
use dashmap::DashMap;
use std::time::Instant;
use tracing::debug;

/// `DashMap`-backed [`PendingStore`]. Entries live only as long as the
/// process; nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemoryPendingStore {
    pending: DashMap<Identity, Instant>,
}

impl InMemoryPendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Age of the oldest entry, if any.
    pub fn oldest_age(&self) -> Option<std::time::Duration> {
        self.pending.iter().map(|entry| entry.value().elapsed()).max()
    }
}

impl PendingStore for InMemoryPendingStore {
    fn try_insert(&self, identity: &Identity) -> bool {
        use dashmap::mapref::entry::Entry;

        match self.pending.entry(identity.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Instant::now());
                debug!(identity = %identity, "pending registration recorded");
                true
            }
        }
    }

    fn remove(&self, identity: &Identity) -> bool {
        self.pending.remove(identity).is_some()
    }

    fn contains(&self, identity: &Identity) -> bool {
        self.pending.contains_key(identity)
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}
