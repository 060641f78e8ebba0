use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::ProjectKey;

/// Per-project mutual exclusion for the schedule and earned value passes.
///
/// Different projects never contend. A project's entry is dropped as soon as
/// nobody holds or waits for it.
#[derive(Debug, Default)]
pub struct ProjectLocks {
    locks: Mutex<HashMap<ProjectKey, Arc<Mutex<()>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding `key`'s lock.
    pub fn run<T>(&self, key: &ProjectKey, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(map.entry(key.clone()).or_default())
        };
        let out = {
            let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };

        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Clones are only handed out under the map lock: two owners means
        // the map and us.
        if Arc::strong_count(&lock) == 2 {
            map.remove(key);
        }
        out
    }

    /// Projects with a holder or waiter right now.
    pub fn active(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
