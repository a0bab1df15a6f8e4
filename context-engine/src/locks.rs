//! Per-user turn serialization.
//!
//! One async mutex per user id; turns of different users never wait on each other. Entries
//! nobody holds or waits for are pruned once the map grows past [`PRUNE_THRESHOLD`].

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

pub const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Clone, Default)]
pub struct UserLocks {
    locks: Arc<DashMap<i64, Arc<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and holds the user's lock until the guard is dropped.
    pub async fn acquire(&self, user_id: i64) -> OwnedMutexGuard<()> {
        if self.locks.len() > PRUNE_THRESHOLD {
            self.prune_idle();
        }
        let lock = self.locks.entry(user_id).or_default().clone();
        lock.lock_owned().await
    }

    /// Drops the locks of users with no holder and no waiter; returns how many were dropped.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        // The map's own Arc is the only reference of an idle lock.
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        let pruned = before.saturating_sub(self.locks.len());
        if pruned > 0 {
            debug!(pruned = pruned, remaining = self.locks.len(), "User locks pruned");
        }
        pruned
    }

    /// Number of users with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
