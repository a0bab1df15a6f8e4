//! Component factory: builds the store, gateway, engine and handler chain from config.
//! Isolates assembly logic from the commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use context_engine::ContextEngine;
use dbot_core::Bot;
use handler_chain::HandlerChain;
use llm_client::{build_gateway, EchoGateway, GenerationGateway};
use storage::{InMemoryContextStore, SqliteContextStore};
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::config::{AppConfig, StoreBackend};
use crate::handlers::{AdminCommandHandler, ContextHandler, MembersHandler};

/// Core dependencies of the running bot.
pub struct BotComponents {
    pub engine: Arc<ContextEngine>,
    /// Filled by the runner from `get_me()`.
    pub bot_username: Arc<RwLock<Option<String>>>,
    /// Target directory of `/backup`.
    pub backup_dir: PathBuf,
}

/// Creates the directory holding a file-backed SQLite database.
async fn ensure_database_dir(database_url: &str) -> Result<()> {
    if database_url.starts_with("sqlite:") {
        return Ok(());
    }
    let path = database_url.strip_prefix("file:").unwrap_or(database_url);
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Create database directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Builds the engine over the configured store with the given gateway.
#[instrument(skip(config, gateway), fields(store = %config.base.store_backend))]
pub async fn build_engine(
    config: &AppConfig,
    gateway: Arc<dyn GenerationGateway>,
) -> Result<Arc<ContextEngine>> {
    let engine = match config.base.store_backend {
        StoreBackend::Sqlite => {
            ensure_database_dir(&config.base.database_url).await?;
            let store = SqliteContextStore::new(&config.base.database_url)
                .await
                .map_err(|e| {
                    error!(
                        error = %e,
                        database_url = %config.base.database_url,
                        "Failed to initialize context storage"
                    );
                    anyhow::anyhow!("Failed to initialize context storage: {}", e)
                })?;
            info!(database_url = %config.base.database_url, "Using SQLite context store");
            ContextEngine::new(Arc::new(store), gateway, config.context.clone())
        }
        StoreBackend::Memory => {
            info!("Using in-memory context store; history is lost on exit");
            ContextEngine::new(
                Arc::new(InMemoryContextStore::new()),
                gateway,
                config.context.clone(),
            )
        }
    };
    Ok(Arc::new(engine))
}

/// Engine with the configured generation backend.
pub async fn open_engine(config: &AppConfig) -> Result<Arc<ContextEngine>> {
    let gateway = build_gateway(&config.llm).context("Build generation gateway")?;
    info!(backend = gateway.name(), provider = %config.llm.provider, "Generation gateway ready");
    build_engine(config, gateway).await
}

/// Engine for maintenance commands that never generate; needs no API keys.
pub async fn open_admin_engine(config: &AppConfig) -> Result<Arc<ContextEngine>> {
    build_engine(config, Arc::new(EchoGateway::new())).await
}

pub async fn build_components(config: &AppConfig) -> Result<BotComponents> {
    Ok(BotComponents {
        engine: open_engine(config).await?,
        bot_username: Arc::new(RwLock::new(None)),
        backup_dir: config.base.backup_dir.clone(),
    })
}

/// Builds the handler chain: admin commands, member directory, then conversation.
pub fn build_handler_chain(
    components: &BotComponents,
    bot: Arc<dyn Bot>,
    admin_user_ids: Vec<i64>,
) -> HandlerChain {
    HandlerChain::new()
        .add_handler(Arc::new(
            AdminCommandHandler::new(components.engine.clone(), bot.clone(), admin_user_ids)
                .with_backup_dir(components.backup_dir.clone()),
        ))
        .add_handler(Arc::new(MembersHandler::new(
            components.engine.clone(),
            bot.clone(),
        )))
        .add_handler(Arc::new(ContextHandler::new(
            components.engine.clone(),
            bot,
            components.bot_username.clone(),
        )))
}
