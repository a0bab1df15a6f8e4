//! Context engine: one turn = append user message, maybe summarize, assemble, generate,
//! append reply. Turns of one user are serialized; different users run in parallel.

use std::fmt;
use std::sync::Arc;

use llm_client::{GenerationError, GenerationGateway};
use prompt::{assemble_prompt, ChatMessage};
use storage::{
    BackupSnapshot, ClearedCounts, ContextStore, ConversationMessage, ProfileStore, Role, SettingsStore,
};
use tracing::{info, instrument, warn};

use crate::accumulator::ContextAccumulator;
use crate::config::ContextConfig;
use crate::directory::{DirectoryProvider, ProfileDirectory};
use crate::error::EngineError;
use crate::instructions::InstructionSource;
use crate::locks::UserLocks;
use crate::policy::{to_chat_message, PolicyOutcome, SummarizationPolicy};
use crate::stats::{excerpt, ContextStats};

/// Phase of a turn, reported in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    AppendingUser,
    Summarizing,
    Assembling,
    Generating,
    AppendingAssistant,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TurnPhase::Idle => "idle",
            TurnPhase::AppendingUser => "appending_user",
            TurnPhase::Summarizing => "summarizing",
            TurnPhase::Assembling => "assembling",
            TurnPhase::Generating => "generating",
            TurnPhase::AppendingAssistant => "appending_assistant",
        })
    }
}

pub struct ContextEngine {
    store: Arc<dyn ContextStore>,
    profiles: Arc<dyn ProfileStore>,
    directory: Arc<dyn DirectoryProvider>,
    gateway: Arc<dyn GenerationGateway>,
    instructions: InstructionSource,
    policy: SummarizationPolicy,
    accumulator: ContextAccumulator,
    locks: UserLocks,
    config: ContextConfig,
}

impl ContextEngine {
    /// Engine over one store that also holds settings and profiles; the member directory is
    /// read from the store's complete profiles.
    pub fn new<S>(store: Arc<S>, gateway: Arc<dyn GenerationGateway>, config: ContextConfig) -> Self
    where
        S: ContextStore + SettingsStore + ProfileStore + 'static,
    {
        let directory: Arc<dyn DirectoryProvider> = Arc::new(ProfileDirectory::new(store.clone()));
        let instructions = InstructionSource::new(
            store.clone(),
            directory.clone(),
            config.default_system_prompt.clone(),
        );
        let policy = SummarizationPolicy::new(
            config.block_size,
            config.tail_reserve,
            config.summary_timeout,
        );
        Self {
            profiles: store.clone(),
            directory,
            store,
            gateway,
            instructions,
            policy,
            accumulator: ContextAccumulator::new(),
            locks: UserLocks::new(),
            config,
        }
    }

    /// Replaces the member directory source.
    pub fn with_directory(mut self, directory: Arc<dyn DirectoryProvider>) -> Self {
        self.instructions = self.instructions.with_directory(directory.clone());
        self.directory = directory;
        self
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn accumulator(&self) -> &ContextAccumulator {
        &self.accumulator
    }

    fn enter(&self, user_id: i64, phase: TurnPhase) {
        info!(user_id = user_id, phase = %phase, "step: turn phase");
    }

    /// Runs one full turn for `user_id` and returns the generated reply.
    ///
    /// Store failures abort the turn. A failed summarization only widens the prompt to all
    /// uncovered messages. A failed or timed-out answer leaves the user message without a
    /// reply in the log.
    #[instrument(skip(self, incoming_text), fields(text_len = incoming_text.len()))]
    pub async fn record_and_respond(
        &self,
        user_id: i64,
        incoming_text: &str,
    ) -> Result<String, EngineError> {
        let _guard = self.locks.acquire(user_id).await;

        self.enter(user_id, TurnPhase::AppendingUser);
        self.store
            .append_message(user_id, Role::User, incoming_text)
            .await?;

        self.enter(user_id, TurnPhase::Summarizing);
        let messages = self.store.load_messages(user_id).await?;
        let mut summaries = self.store.load_summaries(user_id).await?;
        let uncovered_from = self.policy.first_unsummarized(&messages, &summaries);
        let outcome = self
            .policy
            .run(
                user_id,
                self.store.as_ref(),
                self.gateway.as_ref(),
                &messages,
                &summaries,
            )
            .await?;
        let degraded = match outcome {
            PolicyOutcome::Summarized(summary) => {
                summaries.push(summary);
                false
            }
            PolicyOutcome::Skipped { .. } => false,
            PolicyOutcome::Failed(e) => {
                warn!(user_id = user_id, error = %e, "Continuing turn without new summary");
                true
            }
        };

        self.enter(user_id, TurnPhase::Assembling);
        let system_instructions = self.instructions.compose().await?;
        let window = if degraded {
            self.config
                .recent_window
                .max(messages.len() - uncovered_from)
        } else {
            self.config.recent_window
        };
        let summary_texts: Vec<&str> = summaries.iter().map(|s| s.summary_text.as_str()).collect();
        let chat: Vec<ChatMessage> = messages.iter().map(to_chat_message).collect();
        let prompt = assemble_prompt(&system_instructions, &summary_texts, &chat, window);
        info!(
            user_id = user_id,
            summaries = summaries.len(),
            window = window,
            prompt_len = prompt.len(),
            degraded = degraded,
            "Prompt assembled"
        );

        self.enter(user_id, TurnPhase::Generating);
        let timeout = self.config.generation_timeout;
        let reply = match tokio::time::timeout(timeout, self.gateway.generate(&prompt)).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(user_id = user_id, backend = self.gateway.name(), error = %e, "Generation failed");
                self.accumulator.replace(user_id, messages).await;
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    user_id = user_id,
                    backend = self.gateway.name(),
                    timeout_secs = timeout.as_secs(),
                    "Generation timed out"
                );
                self.accumulator.replace(user_id, messages).await;
                return Err(GenerationError::Timeout(timeout).into());
            }
        };

        self.enter(user_id, TurnPhase::AppendingAssistant);
        let stored = self
            .store
            .append_message(user_id, Role::Assistant, &reply)
            .await?;
        self.accumulator.replace(user_id, messages).await;
        self.accumulator.push(user_id, stored).await;

        self.enter(user_id, TurnPhase::Idle);
        info!(user_id = user_id, reply_len = reply.len(), "Turn completed");
        Ok(reply)
    }

    /// Deletes all messages and summaries of the user and drops the cached history.
    #[instrument(skip(self))]
    pub async fn clear_context(&self, user_id: i64) -> Result<ClearedCounts, EngineError> {
        let _guard = self.locks.acquire(user_id).await;
        let cleared = self.store.clear_user(user_id).await?;
        self.accumulator.invalidate(user_id).await;
        info!(
            user_id = user_id,
            messages = cleared.messages,
            summaries = cleared.summaries,
            "Context cleared"
        );
        Ok(cleared)
    }

    pub async fn get_context_stats(&self, user_id: i64) -> Result<ContextStats, EngineError> {
        let message_count = self.store.count_messages(user_id).await?;
        let summary_count = self.store.count_summaries(user_id).await?;
        let last = self.store.latest_summary(user_id).await?;
        Ok(ContextStats {
            message_count,
            summary_count,
            last_summary_excerpt: last
                .as_ref()
                .map(|s| excerpt(&s.summary_text, self.config.summary_excerpt_chars)),
            last_summary_at: last.map(|s| s.created_at),
        })
    }

    /// Reloads the user's cached history from the store.
    ///
    /// Holds the user lock so a concurrent clear cannot be undone by a stale read.
    pub async fn refresh(&self, user_id: i64) -> Result<Vec<ConversationMessage>, EngineError> {
        let _guard = self.locks.acquire(user_id).await;
        self.reload(user_id).await
    }

    /// Store read into the cache; the caller holds the user lock.
    async fn reload(&self, user_id: i64) -> Result<Vec<ConversationMessage>, EngineError> {
        let messages = self.store.load_messages(user_id).await?;
        self.accumulator.replace(user_id, messages.clone()).await;
        Ok(messages)
    }

    /// Last `limit` messages of the user, served from the cache when present.
    pub async fn recent_messages(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<ConversationMessage>, EngineError> {
        if let Some(recent) = self.accumulator.recent(user_id, limit).await {
            return Ok(recent);
        }
        let _guard = self.locks.acquire(user_id).await;
        // A turn or refresh may have filled the cache while we waited.
        if let Some(recent) = self.accumulator.recent(user_id, limit).await {
            return Ok(recent);
        }
        let messages = self.reload(user_id).await?;
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].to_vec())
    }

    /// Point-in-time dump of every table, for admin backups.
    pub async fn backup(&self) -> Result<BackupSnapshot, EngineError> {
        let snapshot = self.store.export_snapshot().await?;
        info!(
            messages = snapshot.messages.len(),
            summaries = snapshot.summaries.len(),
            "Backup exported"
        );
        Ok(snapshot)
    }

    /// User id registered under a Telegram nick (with or without the leading `@`).
    pub async fn find_user_by_nick(&self, nick: &str) -> Result<Option<i64>, EngineError> {
        Ok(self
            .profiles
            .find_profile_by_nick(nick)
            .await?
            .map(|p| p.user_id))
    }

    /// Member directory, one line per complete profile; empty when nobody is listed.
    pub async fn member_directory(&self) -> Result<String, EngineError> {
        Ok(self.directory.directory_block().await?)
    }

    /// Current instruction template (stored or default), without the directory block.
    pub async fn system_prompt(&self) -> Result<String, EngineError> {
        Ok(self.instructions.template().await?)
    }

    pub async fn set_system_prompt(&self, template: &str) -> Result<(), EngineError> {
        self.instructions.set_template(template).await?;
        info!(template_len = template.len(), "System prompt updated");
        Ok(())
    }

    /// Full system instructions as the next turn would see them.
    pub async fn system_instructions(&self) -> Result<String, EngineError> {
        Ok(self.instructions.compose().await?)
    }
}
