//! Telegram connection config: token, optional Bot API URL. Loaded from BOT_TOKEN and
//! TELEGRAM_API_URL (or TELOXIDE_API_URL).

use anyhow::Result;
use std::env;
use tracing::error;

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub telegram_api_url: Option<String>,
}

impl TelegramConfig {
    /// BOT_TOKEN is required; TELEGRAM_API_URL / TELOXIDE_API_URL optional.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?;
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(Self {
            bot_token,
            telegram_api_url,
        })
    }

    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            telegram_api_url: None,
        }
    }

    pub fn with_api_url(mut self, url: Option<String>) -> Self {
        self.telegram_api_url = url;
        self
    }

    /// The API URL, when set, must parse.
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        Ok(())
    }

    /// Builds the teloxide Bot, pointing it at the custom API URL when one is configured.
    pub fn build_bot(&self) -> teloxide::Bot {
        let bot = teloxide::Bot::new(self.bot_token.clone());
        match self.telegram_api_url.as_deref() {
            Some(url_str) => match reqwest::Url::parse(url_str) {
                Ok(url) => bot.set_api_url(url),
                Err(e) => {
                    error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                    bot
                }
            },
            None => bot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_with_token() {
        let config = TelegramConfig::with_token("test_token".to_string());
        assert_eq!(config.bot_token, "test_token");
        assert!(config.telegram_api_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = TelegramConfig::with_token("t".to_string())
            .with_api_url(Some("not a url".to_string()));
        assert!(config.validate().is_err());

        let config = TelegramConfig::with_token("t".to_string())
            .with_api_url(Some("http://127.0.0.1:8081".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_requires_token() {
        env::remove_var("BOT_TOKEN");
        assert!(TelegramConfig::from_env().is_err());

        env::set_var("BOT_TOKEN", "123:abc");
        env::set_var("TELEGRAM_API_URL", "http://localhost:8081");
        let config = TelegramConfig::from_env().unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.telegram_api_url.as_deref(), Some("http://localhost:8081"));

        env::remove_var("BOT_TOKEN");
        env::remove_var("TELEGRAM_API_URL");
    }
}
