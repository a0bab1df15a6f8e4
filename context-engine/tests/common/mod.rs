//! Test doubles for engine tests: a scripted generation backend and a store that can be told
//! to fail writes or to answer reads slowly.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use context_engine::{ContextConfig, ContextEngine};
use llm_client::{GenerationError, GenerationGateway};
use storage::{
    BackupSnapshot, ClearedCounts, ContextStore, ConversationMessage, ConversationSummary,
    InMemoryContextStore, NewSummary, ProfileStore, Role, SettingsStore, StorageError,
    StorageResult, UserProfile,
};

#[derive(Debug, Clone)]
pub enum Answer {
    /// Reply with the content of the prompt's last message line.
    Echo,
    Fixed(String),
    Fail(GenerationError),
    Hang,
}

#[derive(Debug, Clone)]
pub enum SummaryReply {
    /// "summary #n".
    Numbered,
    Fixed(String),
    Fail(GenerationError),
    Hang,
}

/// Generation backend with scripted answers, call counters and recorded prompts.
pub struct ScriptedGateway {
    answer: Mutex<Answer>,
    summary: Mutex<SummaryReply>,
    delay: Duration,
    answer_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Answer::Echo),
            summary: Mutex::new(SummaryReply::Numbered),
            delay,
            answer_calls: AtomicUsize::new(0),
            summary_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn set_answer(&self, answer: Answer) {
        *self.answer.lock().unwrap() = answer;
    }

    pub fn set_summary(&self, summary: SummaryReply) {
        *self.summary.lock().unwrap() = summary;
    }

    pub fn answer_calls(&self) -> usize {
        self.answer_calls.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    /// Answer prompts (summarization requests excluded), oldest first.
    pub fn answer_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_answer_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl GenerationGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if prompt.starts_with(prompt::SUMMARY_INSTRUCTION) {
            let n = self.summary_calls.fetch_add(1, Ordering::SeqCst) + 1;
            let reply = self.summary.lock().unwrap().clone();
            return match reply {
                SummaryReply::Numbered => Ok(format!("summary #{}", n)),
                SummaryReply::Fixed(text) => Ok(text),
                SummaryReply::Fail(e) => Err(e),
                SummaryReply::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            };
        }

        self.answer_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let answer = self.answer.lock().unwrap().clone();
        match answer {
            Answer::Echo => Ok(prompt::last_message_content(prompt)
                .unwrap_or_default()
                .to_string()),
            Answer::Fixed(text) => Ok(text),
            Answer::Fail(e) => Err(e),
            Answer::Hang => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

/// In-memory store whose message appends can be switched to fail and whose history loads can
/// be slowed down.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryContextStore,
    fail_appends: AtomicBool,
    fail_summaries: AtomicBool,
    load_delay_ms: AtomicU64,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_summaries(&self, fail: bool) {
        self.fail_summaries.store(fail, Ordering::SeqCst);
    }

    /// Delay applied to every `load_messages` call that starts after this.
    pub fn set_load_delay(&self, delay: Duration) {
        self.load_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }
}

#[async_trait]
impl ContextStore for FlakyStore {
    async fn append_message(
        &self,
        user_id: i64,
        role: Role,
        content: &str,
    ) -> StorageResult<ConversationMessage> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.inner.append_message(user_id, role, content).await
    }

    async fn load_messages(&self, user_id: i64) -> StorageResult<Vec<ConversationMessage>> {
        let messages = self.inner.load_messages(user_id).await?;
        let delay = self.load_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(messages)
    }

    async fn append_summary(
        &self,
        user_id: i64,
        summary: NewSummary,
    ) -> StorageResult<ConversationSummary> {
        if self.fail_summaries.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.inner.append_summary(user_id, summary).await
    }

    async fn load_summaries(&self, user_id: i64) -> StorageResult<Vec<ConversationSummary>> {
        self.inner.load_summaries(user_id).await
    }

    async fn latest_summary(&self, user_id: i64) -> StorageResult<Option<ConversationSummary>> {
        self.inner.latest_summary(user_id).await
    }

    async fn count_messages(&self, user_id: i64) -> StorageResult<i64> {
        self.inner.count_messages(user_id).await
    }

    async fn count_summaries(&self, user_id: i64) -> StorageResult<i64> {
        self.inner.count_summaries(user_id).await
    }

    async fn clear_user(&self, user_id: i64) -> StorageResult<ClearedCounts> {
        self.inner.clear_user(user_id).await
    }

    async fn export_snapshot(&self) -> StorageResult<BackupSnapshot> {
        self.inner.export_snapshot().await
    }
}

#[async_trait]
impl SettingsStore for FlakyStore {
    async fn get_setting(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get_setting(key).await
    }

    async fn put_setting(&self, key: &str, value: &str) -> StorageResult<()> {
        self.inner.put_setting(key, value).await
    }
}

#[async_trait]
impl ProfileStore for FlakyStore {
    async fn upsert_profile(&self, profile: &UserProfile) -> StorageResult<()> {
        self.inner.upsert_profile(profile).await
    }

    async fn get_profile(&self, user_id: i64) -> StorageResult<Option<UserProfile>> {
        self.inner.get_profile(user_id).await
    }

    async fn list_complete_profiles(&self) -> StorageResult<Vec<UserProfile>> {
        self.inner.list_complete_profiles().await
    }

    async fn find_profile_by_nick(&self, nick: &str) -> StorageResult<Option<UserProfile>> {
        self.inner.find_profile_by_nick(nick).await
    }
}

pub fn test_config() -> ContextConfig {
    ContextConfig {
        generation_timeout: Duration::from_secs(5),
        summary_timeout: Duration::from_secs(5),
        default_system_prompt: "You are a test bot.".to_string(),
        ..ContextConfig::default()
    }
}

/// Engine over an in-memory store with the scripted gateway.
pub fn engine_with(
    config: ContextConfig,
) -> (ContextEngine, Arc<InMemoryContextStore>, Arc<ScriptedGateway>) {
    let store = Arc::new(InMemoryContextStore::new());
    let gateway = ScriptedGateway::new();
    let engine = ContextEngine::new(store.clone(), gateway.clone(), config);
    (engine, store, gateway)
}
