//! In-memory implementation of the store traits, for tests and local runs.
//!
//! Same ordering and atomicity guarantees as the SQLite store; all state sits behind one
//! `RwLock`, so a clear never exposes a half-deleted user.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::StorageResult;
use crate::models::{
    BackupSnapshot, ClearedCounts, ConversationMessage, ConversationSummary, NewSummary, Role,
    SettingRecord, UserProfile,
};
use crate::repository::{ContextStore, ProfileStore, SettingsStore};

#[derive(Debug, Default)]
struct Tables {
    last_message_id: i64,
    last_summary_id: i64,
    messages: HashMap<i64, Vec<ConversationMessage>>,
    summaries: HashMap<i64, Vec<ConversationSummary>>,
    settings: BTreeMap<String, SettingRecord>,
    profiles: BTreeMap<i64, UserProfile>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryContextStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn append_message(
        &self,
        user_id: i64,
        role: Role,
        content: &str,
    ) -> StorageResult<ConversationMessage> {
        let mut tables = self.tables.write().await;
        tables.last_message_id += 1;
        let id = tables.last_message_id;
        let log = tables.messages.entry(user_id).or_default();
        let now = Utc::now();
        let timestamp = log.last().map(|m| m.timestamp.max(now)).unwrap_or(now);
        let message = ConversationMessage {
            id,
            user_id,
            role,
            content: content.to_string(),
            timestamp,
        };
        log.push(message.clone());
        info!(user_id = user_id, message_id = id, role = %role, "Saved message (in-memory)");
        Ok(message)
    }

    async fn load_messages(&self, user_id: i64) -> StorageResult<Vec<ConversationMessage>> {
        let tables = self.tables.read().await;
        Ok(tables.messages.get(&user_id).cloned().unwrap_or_default())
    }

    async fn append_summary(
        &self,
        user_id: i64,
        summary: NewSummary,
    ) -> StorageResult<ConversationSummary> {
        let mut tables = self.tables.write().await;
        tables.last_summary_id += 1;
        let stored = ConversationSummary {
            id: tables.last_summary_id,
            user_id,
            summary_text: summary.summary_text,
            start_message_id: summary.start_message_id,
            end_message_id: summary.end_message_id,
            start_timestamp: summary.start_timestamp,
            end_timestamp: summary.end_timestamp,
            created_at: Utc::now(),
        };
        tables.summaries.entry(user_id).or_default().push(stored.clone());
        info!(
            user_id = user_id,
            summary_id = stored.id,
            end_message_id = stored.end_message_id,
            "Saved summary (in-memory)"
        );
        Ok(stored)
    }

    async fn load_summaries(&self, user_id: i64) -> StorageResult<Vec<ConversationSummary>> {
        let tables = self.tables.read().await;
        Ok(tables.summaries.get(&user_id).cloned().unwrap_or_default())
    }

    async fn latest_summary(&self, user_id: i64) -> StorageResult<Option<ConversationSummary>> {
        let tables = self.tables.read().await;
        Ok(tables
            .summaries
            .get(&user_id)
            .and_then(|s| s.last())
            .cloned())
    }

    async fn count_messages(&self, user_id: i64) -> StorageResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.messages.get(&user_id).map_or(0, |m| m.len() as i64))
    }

    async fn count_summaries(&self, user_id: i64) -> StorageResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.summaries.get(&user_id).map_or(0, |s| s.len() as i64))
    }

    async fn clear_user(&self, user_id: i64) -> StorageResult<ClearedCounts> {
        let mut tables = self.tables.write().await;
        let messages = tables.messages.remove(&user_id).map_or(0, |m| m.len() as u64);
        let summaries = tables.summaries.remove(&user_id).map_or(0, |s| s.len() as u64);
        info!(
            user_id = user_id,
            messages = messages,
            summaries = summaries,
            "Cleared user context (in-memory)"
        );
        Ok(ClearedCounts { messages, summaries })
    }

    async fn export_snapshot(&self) -> StorageResult<BackupSnapshot> {
        let tables = self.tables.read().await;
        let mut messages: Vec<ConversationMessage> =
            tables.messages.values().flatten().cloned().collect();
        messages.sort_by_key(|m| m.id);
        let mut summaries: Vec<ConversationSummary> =
            tables.summaries.values().flatten().cloned().collect();
        summaries.sort_by_key(|s| s.id);
        Ok(BackupSnapshot {
            exported_at: Utc::now(),
            messages,
            summaries,
            settings: tables.settings.values().cloned().collect(),
            profiles: tables.profiles.values().cloned().collect(),
        })
    }
}

#[async_trait]
impl SettingsStore for InMemoryContextStore {
    async fn get_setting(&self, key: &str) -> StorageResult<Option<String>> {
        let tables = self.tables.read().await;
        Ok(tables.settings.get(key).map(|r| r.value.clone()))
    }

    async fn put_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        tables.settings.insert(
            key.to_string(),
            SettingRecord {
                key: key.to_string(),
                value: value.to_string(),
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryContextStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        tables.profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: i64) -> StorageResult<Option<UserProfile>> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.get(&user_id).cloned())
    }

    async fn list_complete_profiles(&self) -> StorageResult<Vec<UserProfile>> {
        let tables = self.tables.read().await;
        let mut profiles: Vec<UserProfile> = tables
            .profiles
            .values()
            .filter(|p| p.is_complete())
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.user_id.cmp(&b.user_id)));
        Ok(profiles)
    }

    async fn find_profile_by_nick(&self, nick: &str) -> StorageResult<Option<UserProfile>> {
        let wanted = nick.trim().trim_start_matches('@').to_lowercase();
        let tables = self.tables.read().await;
        let mut matches: Vec<&UserProfile> = tables
            .profiles
            .values()
            .filter(|p| {
                p.telegram_nick
                    .as_deref()
                    .map(|n| n.trim_start_matches('@').to_lowercase() == wanted)
                    .unwrap_or(false)
            })
            .collect();
        matches.sort_by_key(|p| p.user_id);
        Ok(matches.first().map(|p| (*p).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_assigns_increasing_ids_across_users() {
        let store = InMemoryContextStore::new();
        let a = store.append_message(1, Role::User, "a").await.unwrap();
        let b = store.append_message(2, Role::User, "b").await.unwrap();
        let c = store.append_message(1, Role::Assistant, "c").await.unwrap();

        assert!(a.id < b.id && b.id < c.id);
        assert!(c.timestamp >= a.timestamp);

        let log = store.load_messages(1).await.unwrap();
        assert_eq!(log.iter().map(|m| m.id).collect::<Vec<_>>(), vec![a.id, c.id]);
        assert_eq!(store.count_messages(2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_clear_user_leaves_other_users() {
        let store = InMemoryContextStore::new();
        let m = store.append_message(1, Role::User, "hi").await.unwrap();
        store.append_message(2, Role::User, "hey").await.unwrap();
        store
            .append_summary(
                1,
                NewSummary {
                    summary_text: "greeting".to_string(),
                    start_message_id: m.id,
                    end_message_id: m.id,
                    start_timestamp: m.timestamp,
                    end_timestamp: m.timestamp,
                },
            )
            .await
            .unwrap();

        let cleared = store.clear_user(1).await.unwrap();

        assert_eq!(cleared, ClearedCounts { messages: 1, summaries: 1 });
        assert!(store.load_messages(1).await.unwrap().is_empty());
        assert!(store.latest_summary(1).await.unwrap().is_none());
        assert_eq!(store.count_messages(2).await.unwrap(), 1);
    }
}
