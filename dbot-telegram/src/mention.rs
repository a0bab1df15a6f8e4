//! Pure helpers for @-mention detection, question extraction and forum-topic prefixes.
//!
//! Telegram usernames are ASCII, so matching folds ASCII case only and byte offsets in the
//! folded text stay valid in the input text.

fn mention_needle(bot_username: &str) -> String {
    format!("@{}", bot_username.trim_start_matches('@')).to_ascii_lowercase()
}

/// Returns true if `text` contains a @mention of the bot, ignoring case.
pub fn is_bot_mentioned(text: &str, bot_username: &str) -> bool {
    text.to_ascii_lowercase().contains(&mention_needle(bot_username))
}

/// Removes every @mention of the bot from `text` and collapses the remaining whitespace.
pub fn extract_question(text: &str, bot_username: &str) -> String {
    let lower_text = text.to_ascii_lowercase();
    let lower_needle = mention_needle(bot_username);

    let mut out = String::with_capacity(text.len());
    let mut rest = 0;
    while let Some(pos) = lower_text[rest..].find(&lower_needle) {
        out.push_str(&text[rest..rest + pos]);
        rest += pos + lower_needle.len();
    }
    out.push_str(&text[rest..]);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Prefixes a forum-topic message with `[Topic: <name>] ` so the model sees where it was asked.
pub fn with_topic_prefix(text: &str, topic_name: Option<&str>) -> String {
    match topic_name.map(str::trim).filter(|t| !t.is_empty()) {
        Some(topic) => format!("[Topic: {}] {}", topic, text),
        None => text.to_string(),
    }
}
