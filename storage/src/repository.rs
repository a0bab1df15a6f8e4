//! Store abstractions used by the context engine.
//!
//! Implementations must be safe to share across tasks; per-user ordering of appends is the
//! caller's responsibility (the engine serializes turns per user).

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::models::{
    BackupSnapshot, ClearedCounts, ConversationMessage, ConversationSummary, NewSummary, Role,
    UserProfile,
};

/// Settings key holding the system instruction template.
pub const SYSTEM_PROMPT_KEY: &str = "system_prompt";

/// Append-only message and summary logs, keyed by user.
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Appends a message and returns it with its sequence id and timestamp. The timestamp is
    /// never earlier than the user's previous message.
    async fn append_message(
        &self,
        user_id: i64,
        role: Role,
        content: &str,
    ) -> StorageResult<ConversationMessage>;

    /// All messages of the user in sequence order; empty for an unknown user.
    async fn load_messages(&self, user_id: i64) -> StorageResult<Vec<ConversationMessage>>;

    async fn append_summary(
        &self,
        user_id: i64,
        summary: NewSummary,
    ) -> StorageResult<ConversationSummary>;

    /// All summaries of the user in creation order.
    async fn load_summaries(&self, user_id: i64) -> StorageResult<Vec<ConversationSummary>>;

    async fn latest_summary(&self, user_id: i64) -> StorageResult<Option<ConversationSummary>>;

    async fn count_messages(&self, user_id: i64) -> StorageResult<i64>;

    async fn count_summaries(&self, user_id: i64) -> StorageResult<i64>;

    /// Deletes every message and summary of the user atomically.
    async fn clear_user(&self, user_id: i64) -> StorageResult<ClearedCounts>;

    /// Exports the whole store.
    async fn export_snapshot(&self) -> StorageResult<BackupSnapshot>;
}

/// Key/value settings (system prompt template and similar).
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_setting(&self, key: &str) -> StorageResult<Option<String>>;
    /// Inserts or replaces the value.
    async fn put_setting(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// Community member profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert_profile(&self, profile: &UserProfile) -> StorageResult<()>;
    async fn get_profile(&self, user_id: i64) -> StorageResult<Option<UserProfile>>;
    /// Complete profiles ordered by full name.
    async fn list_complete_profiles(&self) -> StorageResult<Vec<UserProfile>>;
    /// Profile whose Telegram nick matches, ignoring case and a leading `@`.
    async fn find_profile_by_nick(&self, nick: &str) -> StorageResult<Option<UserProfile>>;
}
