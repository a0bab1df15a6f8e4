//! Per-user context statistics.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextStats {
    pub message_count: i64,
    pub summary_count: i64,
    pub last_summary_excerpt: Option<String>,
    pub last_summary_at: Option<DateTime<Utc>>,
}

/// First `max_chars` characters, followed by `...` when the text is longer.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
