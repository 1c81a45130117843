//! Per-key serialization primitives
//!
//! [`KeyLocks`] hands out a named async mutex per persistence key so two
//! rapid edits cannot interleave their read-modify-write cycles and clobber
//! each other. [`LoadTracker`] stamps loads with a start sequence so a slow
//! in-flight load can be discarded once a newer load for the same key has
//! completed (last-write-wins by completion order, not start order).

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of named async mutexes, one per key
#[derive(Default)]
pub struct KeyLocks {
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for a key, creating it on first use
    ///
    /// The registry holds no invariant that a panic could leave half-applied,
    /// so a poisoned guard is reclaimed rather than propagated.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Tracks load start/completion order per key
#[derive(Default)]
pub struct LoadTracker {
    state: StdMutex<HashMap<String, KeyLoadState>>,
    next_seq: StdMutex<u64>,
}

#[derive(Default, Clone, Copy)]
struct KeyLoadState {
    /// Start sequence of the most recently completed load
    last_completed: u64,
}

impl LoadTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the start of a load, returning its sequence number
    pub fn begin(&self, _key: &str) -> u64 {
        let mut next = self
            .next_seq
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *next += 1;
        *next
    }

    /// Register completion of the load started as `seq`
    ///
    /// Returns `false` when a load started later has already completed for
    /// this key, in which case the result is stale and must be discarded.
    pub fn complete(&self, key: &str, seq: u64) -> bool {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = state.entry(key.to_string()).or_default();
        if entry.last_completed > seq {
            return false;
        }
        entry.last_completed = seq;
        true
    }
}
