//! In-process cache of recently seen messages per user.
//!
//! Not a source of truth: empty after restart, refreshed from store reads, and must be
//! invalidated whenever the store is mutated outside a turn (context clear).

use std::collections::HashMap;
use std::sync::Arc;

use storage::ConversationMessage;
use tokio::sync::RwLock;
use tracing::debug;

type CacheMap = HashMap<i64, Vec<ConversationMessage>>;

#[derive(Debug, Clone, Default)]
pub struct ContextAccumulator {
    entries: Arc<RwLock<CacheMap>>,
}

impl ContextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached history of the user, if any.
    pub async fn get(&self, user_id: i64) -> Option<Vec<ConversationMessage>> {
        self.entries.read().await.get(&user_id).cloned()
    }

    /// Last `limit` cached messages, oldest first; `None` when the user is not cached.
    pub async fn recent(&self, user_id: i64, limit: usize) -> Option<Vec<ConversationMessage>> {
        let entries = self.entries.read().await;
        entries.get(&user_id).map(|log| {
            let start = log.len().saturating_sub(limit);
            log[start..].to_vec()
        })
    }

    /// Replaces the cached history with a fresh store read.
    pub async fn replace(&self, user_id: i64, messages: Vec<ConversationMessage>) {
        debug!(user_id = user_id, message_count = messages.len(), "Accumulator replaced");
        self.entries.write().await.insert(user_id, messages);
    }

    /// Appends to an already cached history; uncached users stay uncached.
    pub async fn push(&self, user_id: i64, message: ConversationMessage) {
        if let Some(log) = self.entries.write().await.get_mut(&user_id) {
            log.push(message);
        }
    }

    pub async fn invalidate(&self, user_id: i64) {
        if self.entries.write().await.remove(&user_id).is_some() {
            debug!(user_id = user_id, "Accumulator invalidated");
        }
    }

    /// Number of cached users.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
