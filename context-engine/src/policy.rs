//! Block-based summarization policy.
//!
//! Coverage is tracked by message sequence id: everything up to the highest
//! `end_message_id` of the user's summaries is summarized. Of the rest, the newest
//! `tail_reserve` messages always stay raw; once the remainder reaches `block_size`, the
//! whole remainder is compressed into one new summary.

use std::time::Duration;

use llm_client::{GenerationError, GenerationGateway};
use prompt::{summarization_request, ChatMessage};
use storage::{ContextStore, ConversationMessage, ConversationSummary, NewSummary, Role, StorageError};
use tracing::{info, warn};

use crate::error::PolicyError;

/// Result of one policy evaluation.
#[derive(Debug)]
pub enum PolicyOutcome {
    /// Not enough unsummarized history yet.
    Skipped { unsummarized: usize },
    Summarized(ConversationSummary),
    /// Generation failed; no summary written.
    Failed(PolicyError),
}

#[derive(Debug, Clone)]
pub struct SummarizationPolicy {
    block_size: usize,
    tail_reserve: usize,
    timeout: Duration,
}

/// Converts a stored message into the assembler's representation.
pub fn to_chat_message(message: &ConversationMessage) -> ChatMessage {
    match message.role {
        Role::User => ChatMessage::user(message.content.clone()),
        Role::Assistant => ChatMessage::assistant(message.content.clone()),
        Role::System => ChatMessage::system(message.content.clone()),
    }
}

impl SummarizationPolicy {
    pub fn new(block_size: usize, tail_reserve: usize, timeout: Duration) -> Self {
        Self {
            block_size,
            tail_reserve,
            timeout,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn tail_reserve(&self) -> usize {
        self.tail_reserve
    }

    /// Index of the first message not covered by any summary.
    pub fn first_unsummarized(
        &self,
        messages: &[ConversationMessage],
        summaries: &[ConversationSummary],
    ) -> usize {
        match summaries.iter().map(|s| s.end_message_id).max() {
            Some(last_end) => messages.partition_point(|m| m.id <= last_end),
            None => 0,
        }
    }

    /// Uncovered messages excluding the reserved tail.
    pub fn unsummarized<'a>(
        &self,
        messages: &'a [ConversationMessage],
        summaries: &[ConversationSummary],
    ) -> &'a [ConversationMessage] {
        let start = self.first_unsummarized(messages, summaries);
        let end = messages.len().saturating_sub(self.tail_reserve).max(start);
        &messages[start..end]
    }

    /// The slice to summarize now, if it has reached a full block.
    pub fn plan<'a>(
        &self,
        messages: &'a [ConversationMessage],
        summaries: &[ConversationSummary],
    ) -> Option<&'a [ConversationMessage]> {
        let slice = self.unsummarized(messages, summaries);
        (slice.len() >= self.block_size && !slice.is_empty()).then_some(slice)
    }

    /// Evaluates the policy and, when due, generates and persists one summary.
    ///
    /// Generation problems come back as [`PolicyOutcome::Failed`]; a failure to persist the
    /// generated summary is a store failure and is returned as an error.
    pub async fn run(
        &self,
        user_id: i64,
        store: &dyn ContextStore,
        gateway: &dyn GenerationGateway,
        messages: &[ConversationMessage],
        summaries: &[ConversationSummary],
    ) -> Result<PolicyOutcome, StorageError> {
        let Some(block) = self.plan(messages, summaries) else {
            let unsummarized = self.unsummarized(messages, summaries).len();
            info!(
                user_id = user_id,
                unsummarized = unsummarized,
                block_size = self.block_size,
                "step: summarization skipped"
            );
            return Ok(PolicyOutcome::Skipped { unsummarized });
        };

        let (first, last) = match (block.first(), block.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(PolicyOutcome::Skipped { unsummarized: 0 }),
        };

        info!(
            user_id = user_id,
            block_len = block.len(),
            start_message_id = first.id,
            end_message_id = last.id,
            "step: summarization started"
        );

        let transcript: Vec<ChatMessage> = block.iter().map(to_chat_message).collect();
        let request = summarization_request(&transcript);

        let generated = match tokio::time::timeout(self.timeout, gateway.generate(&request)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(user_id = user_id, error = %e, "Summary generation failed");
                return Ok(PolicyOutcome::Failed(PolicyError::Generation(e)));
            }
            Err(_) => {
                warn!(
                    user_id = user_id,
                    timeout_secs = self.timeout.as_secs(),
                    "Summary generation timed out"
                );
                return Ok(PolicyOutcome::Failed(PolicyError::Generation(
                    GenerationError::Timeout(self.timeout),
                )));
            }
        };

        let summary_text = generated.trim();
        if summary_text.is_empty() {
            warn!(user_id = user_id, "Summary generation returned empty text");
            return Ok(PolicyOutcome::Failed(PolicyError::EmptySummary));
        }

        let stored = store
            .append_summary(
                user_id,
                NewSummary {
                    summary_text: summary_text.to_string(),
                    start_message_id: first.id,
                    end_message_id: last.id,
                    start_timestamp: first.timestamp,
                    end_timestamp: last.timestamp,
                },
            )
            .await?;

        info!(
            user_id = user_id,
            summary_id = stored.id,
            "step: summarization done"
        );
        Ok(PolicyOutcome::Summarized(stored))
    }
}
