//! # Prompt
//!
//! Composes the single prompt string sent to a generation backend.
//!
//! ## Format
//!
//! ```text
//! {system instructions}
//!
//! [Summary block 1]
//! {summary text}
//!
//! [Recent messages]
//! User: ...
//! Assistant: ...
//! ```
//!
//! Summaries appear oldest first; only the last `recent_window` messages are included, in
//! chronological order. Message content is never truncated. All functions are pure.

/// Role of a message in the assembled prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Label written before the message content.
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::System => "System",
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        }
    }
}

/// A single conversation message as seen by the assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// `Role: content` line.
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.role.label(), self.content)
    }
}

/// Number of raw messages included when the caller has no reason to widen the window.
pub const DEFAULT_RECENT_WINDOW: usize = 10;

/// Header of the raw-message section.
pub const SECTION_RECENT: &str = "[Recent messages]";

/// Instruction preceding the transcript in a summarization request.
pub const SUMMARY_INSTRUCTION: &str = "Summarize the conversation below as a short narrative. \
Describe what the user asked about, which tasks or questions came up and what answers were given. \
Do not copy the messages verbatim and do not add anything that was not discussed.";

/// Header of the summary block with the given 1-based index.
pub fn summary_header(index: usize) -> String {
    format!("[Summary block {}]", index)
}

/// Builds the prompt for one turn.
///
/// # Arguments
///
/// * `system_instructions` - Opaque instruction text, written first
/// * `summaries` - Summary texts in creation order
/// * `messages` - Full raw history in chronological order
/// * `recent_window` - How many of the last messages to include
pub fn assemble_prompt<S>(
    system_instructions: &str,
    summaries: &[S],
    messages: &[ChatMessage],
    recent_window: usize,
) -> String
where
    S: AsRef<str>,
{
    let mut out = String::new();
    out.push_str(system_instructions);
    out.push_str("\n\n");

    for (i, summary) in summaries.iter().enumerate() {
        out.push_str(&summary_header(i + 1));
        out.push('\n');
        out.push_str(summary.as_ref());
        out.push_str("\n\n");
    }

    out.push_str(SECTION_RECENT);
    out.push('\n');
    let start = messages.len().saturating_sub(recent_window);
    for message in &messages[start..] {
        out.push_str(&message.to_line());
        out.push('\n');
    }
    out
}

/// Builds the request asking a backend to compress `messages` into one summary.
pub fn summarization_request(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    out.push_str(SUMMARY_INSTRUCTION);
    out.push_str("\n\n");
    for message in messages {
        out.push_str(&message.to_line());
        out.push('\n');
    }
    out
}

/// Content of the last `Role: content` line of a prompt, if any.
///
/// Used by offline backends that answer by echoing the latest message.
pub fn last_message_content(prompt: &str) -> Option<&str> {
    prompt.lines().rev().find_map(|line| {
        [MessageRole::User, MessageRole::Assistant, MessageRole::System]
            .iter()
            .find_map(|role| {
                line.strip_prefix(role.label())
                    .and_then(|rest| rest.strip_prefix(": "))
            })
    })
}
