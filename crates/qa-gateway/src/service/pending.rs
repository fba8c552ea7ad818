//! Tracking of in-flight registrations.
//!
//! An identity is pending from the moment its registration is admitted until
//! the confirmation wait for that registration ends. Admission goes through
//! [`PendingRegistrationTracker::acquire`], which hands back a guard; the
//! entry is removed when the guard drops, whichever way the registration
//! ends.

use crate::domain::Identity;
use crate::ports::PendingStore;
use std::sync::Arc;
use tracing::debug;

pub struct PendingRegistrationTracker {
    store: Arc<dyn PendingStore>,
}

impl PendingRegistrationTracker {
    pub fn new(store: Arc<dyn PendingStore>) -> Self {
        Self { store }
    }

    /// Atomic insert-if-absent. `false` means a registration is in flight.
    pub fn try_begin(&self, identity: &Identity) -> bool {
        self.store.try_insert(identity)
    }

    /// Unconditional removal.
    pub fn end(&self, identity: &Identity) {
        if self.store.remove(identity) {
            debug!(identity = %identity, "pending registration cleared");
        }
    }

    /// Read-only check.
    pub fn check(&self, identity: &Identity) -> bool {
        self.store.contains(identity)
    }

    pub fn pending_count(&self) -> usize {
        self.store.len()
    }

    /// Scoped [`try_begin`](Self::try_begin): `None` when already pending.
    pub fn acquire(self: &Arc<Self>, identity: &Identity) -> Option<PendingGuard> {
        if !self.try_begin(identity) {
            return None;
        }
        Some(PendingGuard {
            tracker: Arc::clone(self),
            identity: identity.clone(),
        })
    }
}

/// Holds an identity's pending entry; dropping it calls `end` exactly once.
#[must_use = "dropping the guard clears the pending registration"]
pub struct PendingGuard {
    tracker: Arc<PendingRegistrationTracker>,
    identity: Identity,
}

impl PendingGuard {
    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl std::fmt::Debug for PendingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingGuard")
            .field("identity", &self.identity)
            .finish()
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.tracker.end(&self.identity);
    }
}
