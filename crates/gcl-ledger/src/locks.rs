use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use gcl_types::UserId;

/// Per-user mutual exclusion for ledger read-modify-write cycles.
///
/// Calls for the same user run one at a time; calls for different users
/// never contend beyond the brief map lookup. Slots are dropped again once
/// no caller holds or waits on them.
#[derive(Debug, Default)]
pub struct UserLocks {
    slots: Mutex<HashMap<UserId, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `user_id`.
    pub fn with_user<T>(&self, user_id: &UserId, f: impl FnOnce() -> T) -> T {
        let slot = {
            // The maps guard no ledger data, so a poisoned lock is still usable.
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(user_id.clone()).or_default())
        };

        let out = {
            let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map plus ours: nobody else is waiting.
        if Arc::strong_count(&slot) == 2 {
            slots.remove(user_id);
        }
        out
    }

    /// Number of users with a live lock slot.
    pub fn active(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
