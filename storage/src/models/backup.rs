//! Export and maintenance records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationMessage, ConversationSummary, UserProfile};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SettingRecord {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}

/// Whole-store export written by the `backup` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub exported_at: DateTime<Utc>,
    pub messages: Vec<ConversationMessage>,
    pub summaries: Vec<ConversationSummary>,
    pub settings: Vec<SettingRecord>,
    pub profiles: Vec<UserProfile>,
}

/// Rows removed by a context clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearedCounts {
    pub messages: u64,
    pub summaries: u64,
}
