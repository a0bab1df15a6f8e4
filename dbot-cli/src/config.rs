//! Application config: Telegram connection, logging, store, admins; plus the generation and
//! context settings of the library crates. Loaded from env.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use context_engine::ContextConfig;
use llm_client::EnvLlmConfig;

pub const DEFAULT_DATABASE_URL: &str = "./data/context_bot.db";
pub const DEFAULT_LOG_FILE: &str = "logs/dbot.log";
pub const DEFAULT_BACKUP_DIR: &str = "backup";

/// Which store backs the context engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    /// Process-local; everything is lost on exit.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "memory" => Ok(StoreBackend::Memory),
            other => anyhow::bail!("unknown STORE_BACKEND: {} (expected sqlite or memory)", other),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreBackend::Sqlite => "sqlite",
            StoreBackend::Memory => "memory",
        })
    }
}

/// Base config: Telegram-related, logging, store and admins.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// BOT_TOKEN; only `run` needs it.
    pub bot_token: Option<String>,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// DATABASE_URL: `sqlite:` URL, `file:` path or plain path
    pub database_url: String,
    /// STORE_BACKEND
    pub store_backend: StoreBackend,
    /// LOG_FILE
    pub log_file: String,
    /// ADMIN_USER_IDS, comma separated
    pub admin_user_ids: Vec<i64>,
    /// BACKUP_DIR: where `/backup` writes its JSON dumps
    pub backup_dir: PathBuf,
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Parses a comma separated id list; blanks are skipped.
pub fn parse_admin_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("ADMIN_USER_IDS contains an invalid id: {}", s))
        })
        .collect()
}

impl BaseConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let store_backend = match non_empty("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => StoreBackend::Sqlite,
        };
        let admin_user_ids = match non_empty("ADMIN_USER_IDS") {
            Some(raw) => parse_admin_ids(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            bot_token: token.or_else(|| non_empty("BOT_TOKEN")),
            telegram_api_url: non_empty("TELEGRAM_API_URL").or_else(|| non_empty("TELOXIDE_API_URL")),
            database_url: non_empty("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            store_backend,
            log_file: non_empty("LOG_FILE").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
            admin_user_ids,
            backup_dir: PathBuf::from(
                non_empty("BACKUP_DIR").unwrap_or_else(|| DEFAULT_BACKUP_DIR.to_string()),
            ),
        })
    }

    /// Validate config (e.g. telegram_api_url must be a valid URL if set).
    pub fn validate(&self) -> Result<()> {
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

    /// The bot token, required to connect to Telegram.
    pub fn require_token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .context("BOT_TOKEN not set (pass --token or set it in .env)")
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_user_ids.contains(&user_id)
    }
}

/// Everything the binary needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub base: BaseConfig,
    pub llm: EnvLlmConfig,
    pub context: ContextConfig,
}

impl AppConfig {
    pub fn load(token: Option<String>) -> Result<Self> {
        let config = Self {
            base: BaseConfig::load(token).context("Load base config")?,
            llm: EnvLlmConfig::from_env().context("Load LLM config")?,
            context: ContextConfig::from_env().context("Load context config")?,
        };
        config.base.validate()?;
        config.context.validate()?;
        Ok(config)
    }
}
