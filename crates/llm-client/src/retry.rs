//! Retry and fallback around generation backends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{GenerationError, GenerationGateway};

/// Retries after the first attempt and the base delay; the n-th retry waits `backoff * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

/// Primary backend with bounded retries on transient errors, then an optional fallback.
pub struct RetryingGateway {
    primary: Arc<dyn GenerationGateway>,
    fallback: Option<Arc<dyn GenerationGateway>>,
    policy: RetryPolicy,
}

impl RetryingGateway {
    pub fn new(primary: Arc<dyn GenerationGateway>, policy: RetryPolicy) -> Self {
        Self {
            primary,
            fallback: None,
            policy,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn GenerationGateway>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    async fn attempt(
        &self,
        gateway: &dyn GenerationGateway,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let mut retries = 0;
        loop {
            match gateway.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && retries < self.policy.max_retries => {
                    retries += 1;
                    let delay = self.policy.backoff * retries;
                    warn!(
                        backend = gateway.name(),
                        error = %e,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "Generation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl GenerationGateway for RetryingGateway {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        match self.attempt(self.primary.as_ref(), prompt).await {
            Ok(text) => Ok(text),
            Err(e) => match &self.fallback {
                Some(fallback) => {
                    warn!(
                        primary = self.primary.name(),
                        fallback = fallback.name(),
                        error = %e,
                        "Primary backend failed, switching to fallback"
                    );
                    let text = self.attempt(fallback.as_ref(), prompt).await?;
                    info!(fallback = fallback.name(), "Fallback backend answered");
                    Ok(text)
                }
                None => Err(e),
            },
        }
    }
}
