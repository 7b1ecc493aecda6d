use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use crate::GridCoord;

/// Entries beyond this many are pruned of locks nobody holds.
const PRUNE_THRESHOLD: usize = 256;

/// Lock table serialising read-modify-write cycles on individual chunks.
///
/// Writes to distinct chunks proceed concurrently.
#[derive(Debug, Default)]
pub struct ChunkLocks {
    locks: Mutex<HashMap<GridCoord, Arc<Mutex<()>>>>,
}

impl ChunkLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for one chunk coordinate, created on first use.
    pub fn get(&self, idx: &[u64]) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if map.len() > PRUNE_THRESHOLD {
            map.retain(|_, l| Arc::strong_count(l) > 1);
        }
        map.entry(idx.iter().cloned().collect())
            .or_default()
            .clone()
    }

    /// Run `f` while holding the lock of the given chunk.
    pub fn with_lock<R, F: FnOnce() -> R>(&self, idx: &[u64], f: F) -> R {
        let lock = self.get(idx);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
