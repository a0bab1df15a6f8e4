//! Generation backend configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::retry::RetryPolicy;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-nano-2025-04-14";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Generation backend kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAi,
    Gemini,
    Echo,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Echo => "echo",
        })
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "gemini" => Ok(Provider::Gemini),
            "echo" => Ok(Provider::Echo),
            other => anyhow::bail!("unknown model provider: {} (expected openai, gemini or echo)", other),
        }
    }
}

/// Backend settings: MODEL_PROVIDER, LLM_FALLBACK_PROVIDER, OPENAI_*, GEMINI_*, LLM_*.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub provider: Provider,
    pub fallback_provider: Option<Provider>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parsed<T: FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: fmt::Display,
{
    match non_empty(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} is invalid ({}): {}", name, raw, e)),
        None => Ok(None),
    }
}

impl EnvLlmConfig {
    /// Load from environment variables.
    pub fn from_env() -> Result<Self> {
        let provider = match non_empty("MODEL_PROVIDER") {
            Some(raw) => raw.parse().context("MODEL_PROVIDER")?,
            None => Provider::Gemini,
        };
        let fallback_provider = non_empty("LLM_FALLBACK_PROVIDER")
            .map(|raw| raw.parse::<Provider>())
            .transpose()
            .context("LLM_FALLBACK_PROVIDER")?;

        Ok(Self {
            provider,
            fallback_provider,
            openai_api_key: non_empty("OPENAI_API_KEY"),
            openai_base_url: non_empty("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: non_empty("OPENAI_MODEL")
                .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_base_url: non_empty("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_model: non_empty("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            temperature: parsed("LLM_TEMPERATURE")?.unwrap_or(0.7),
            max_tokens: parsed("LLM_MAX_TOKENS")?,
            max_retries: parsed("LLM_MAX_RETRIES")?.unwrap_or(2),
            retry_backoff_ms: parsed("LLM_RETRY_BACKOFF_MS")?.unwrap_or(500),
        })
    }

    /// Every selected backend has its API key.
    pub fn validate(&self) -> Result<()> {
        for provider in std::iter::once(self.provider).chain(self.fallback_provider) {
            match provider {
                Provider::OpenAi if self.openai_api_key.is_none() => {
                    anyhow::bail!("OPENAI_API_KEY is required when {} uses openai", self.role_of(provider));
                }
                Provider::Gemini if self.gemini_api_key.is_none() => {
                    anyhow::bail!("GEMINI_API_KEY is required when {} uses gemini", self.role_of(provider));
                }
                _ => {}
            }
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!("LLM_TEMPERATURE must be within 0.0..=2.0, got {}", self.temperature);
        }
        Ok(())
    }

    fn role_of(&self, provider: Provider) -> &'static str {
        if provider == self.provider {
            "MODEL_PROVIDER"
        } else {
            "LLM_FALLBACK_PROVIDER"
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "MODEL_PROVIDER",
        "LLM_FALLBACK_PROVIDER",
        "OPENAI_API_KEY",
        "OPENAI_BASE_URL",
        "OPENAI_MODEL",
        "GEMINI_API_KEY",
        "GEMINI_BASE_URL",
        "GEMINI_MODEL",
        "LLM_TEMPERATURE",
        "LLM_MAX_TOKENS",
        "LLM_MAX_RETRIES",
        "LLM_RETRY_BACKOFF_MS",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_select_gemini() {
        clear_env();
        env::set_var("GEMINI_API_KEY", "g-key");

        let config = EnvLlmConfig::from_env().unwrap();

        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.fallback_provider, None);
        assert_eq!(config.gemini_model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_policy().backoff, Duration::from_millis(500));
        assert!(config.validate().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_openai_with_fallback() {
        clear_env();
        env::set_var("MODEL_PROVIDER", "OpenAI");
        env::set_var("LLM_FALLBACK_PROVIDER", "echo");
        env::set_var("OPENAI_API_KEY", "sk-test");
        env::set_var("OPENAI_MODEL", "gpt-4o-mini");
        env::set_var("LLM_MAX_TOKENS", "512");

        let config = EnvLlmConfig::from_env().unwrap();

        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.fallback_provider, Some(Provider::Echo));
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, Some(512));
        assert!(config.validate().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_validate_requires_key_for_selected_provider() {
        clear_env();
        env::set_var("MODEL_PROVIDER", "openai");

        let config = EnvLlmConfig::from_env().unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("OPENAI_API_KEY"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        clear_env();
        env::set_var("MODEL_PROVIDER", "llama");
        assert!(EnvLlmConfig::from_env().is_err());

        clear_env();
        env::set_var("LLM_MAX_RETRIES", "many");
        assert!(EnvLlmConfig::from_env().is_err());
        clear_env();
    }
}
