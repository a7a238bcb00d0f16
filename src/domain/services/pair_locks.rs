//! Keyed async locks over association pairs
//!
//! Serializes in-process rewrites that touch the same key pair. The store
//! still re-validates inside its transaction; these locks only stop two
//! local requests from racing each other into it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::association::KeyPair;

type LockTable = HashMap<KeyPair, Arc<AsyncMutex<()>>>;

#[derive(Debug, Clone, Default)]
pub struct PairLocks {
    table: Arc<Mutex<LockTable>>,
}

impl PairLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every pair in `pairs`, waiting for holders of any of them.
    ///
    /// Pairs are acquired in sorted order so overlapping requests cannot
    /// deadlock.
    pub async fn acquire(&self, pairs: &[KeyPair]) -> PairGuard {
        let mut ordered = pairs.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mutexes: Vec<Arc<AsyncMutex<()>>> = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            ordered
                .iter()
                .map(|pair| Arc::clone(table.entry(*pair).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }

        PairGuard {
            table: Arc::clone(&self.table),
            pairs: ordered,
            guards,
        }
    }

    /// Number of pairs with a live lock entry
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.table.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Held locks; released and pruned on drop
#[derive(Debug)]
pub struct PairGuard {
    table: Arc<Mutex<LockTable>>,
    pairs: Vec<KeyPair>,
    guards: Vec<OwnedMutexGuard<()>>,
}

impl Drop for PairGuard {
    fn drop(&mut self) {
        self.guards.clear();

        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        for pair in &self.pairs {
            // Only the table itself still references an idle entry
            if table.get(pair).is_some_and(|mutex| Arc::strong_count(mutex) == 1) {
                table.remove(pair);
            }
        }
    }
}
