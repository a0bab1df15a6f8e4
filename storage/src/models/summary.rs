//! Conversation summary model.
//!
//! Maps to the `summaries` table. A summary covers the inclusive message range
//! `start_message_id..=end_message_id`; ranges of one user never overlap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ConversationSummary {
    pub id: i64,
    pub user_id: i64,
    pub summary_text: String,
    pub start_message_id: i64,
    pub end_message_id: i64,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Summary to be appended; `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSummary {
    pub summary_text: String,
    pub start_message_id: i64,
    pub end_message_id: i64,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
}
