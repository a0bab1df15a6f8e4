//! Context engine configuration: block size, tail reserve, windows, timeouts, default prompt.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

/// Default system instruction template when none is stored in settings.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are the assistant of a professional community chat. \
Answer in the language of the question, concisely and in plain text without Markdown. \
When a member asks who can help with something, recommend people from the member list.";

#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    /// Unsummarized messages needed before a summary is requested.
    pub block_size: usize,
    /// Most recent messages never summarized.
    pub tail_reserve: usize,
    /// Raw messages included in a normal prompt.
    pub recent_window: usize,
    pub generation_timeout: Duration,
    pub summary_timeout: Duration,
    /// Characters of the last summary shown in stats.
    pub summary_excerpt_chars: usize,
    pub default_system_prompt: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            block_size: 30,
            tail_reserve: 10,
            recent_window: prompt::DEFAULT_RECENT_WINDOW,
            generation_timeout: Duration::from_secs(60),
            summary_timeout: Duration::from_secs(120),
            summary_excerpt_chars: 100,
            default_system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

fn env_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid number: {}", name, raw)),
        _ => Ok(default),
    }
}

impl ContextConfig {
    /// Load from CONTEXT_BLOCK_SIZE, CONTEXT_TAIL_RESERVE, CONTEXT_RECENT_WINDOW,
    /// GENERATION_TIMEOUT_SECS, SUMMARY_TIMEOUT_SECS and SYSTEM_PROMPT.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            block_size: env_number("CONTEXT_BLOCK_SIZE", defaults.block_size)?,
            tail_reserve: env_number("CONTEXT_TAIL_RESERVE", defaults.tail_reserve)?,
            recent_window: env_number("CONTEXT_RECENT_WINDOW", defaults.recent_window)?,
            generation_timeout: Duration::from_secs(env_number(
                "GENERATION_TIMEOUT_SECS",
                defaults.generation_timeout.as_secs(),
            )?),
            summary_timeout: Duration::from_secs(env_number(
                "SUMMARY_TIMEOUT_SECS",
                defaults.summary_timeout.as_secs(),
            )?),
            summary_excerpt_chars: defaults.summary_excerpt_chars,
            default_system_prompt: env::var("SYSTEM_PROMPT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.default_system_prompt),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            anyhow::bail!("CONTEXT_BLOCK_SIZE must be at least 1");
        }
        if self.recent_window == 0 {
            anyhow::bail!("CONTEXT_RECENT_WINDOW must be at least 1");
        }
        if self.generation_timeout.is_zero() || self.summary_timeout.is_zero() {
            anyhow::bail!("generation and summary timeouts must be positive");
        }
        Ok(())
    }
}
