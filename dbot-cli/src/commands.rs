//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use dbot_core::init_tracing;
use dbot_telegram::{run_repl, TelegramBotAdapter, TelegramConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Commands;
use crate::components::{build_components, build_handler_chain, open_admin_engine, open_engine};
use crate::config::AppConfig;
use crate::handlers::format_stats;

/// Console logging for one-shot commands: stderr, `RUST_LOG` or `warn`.
fn init_cli_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run { token } => run(token).await,
        Commands::Chat { user_id } => chat(user_id).await,
        Commands::Stats { user_id } => stats(user_id).await,
        Commands::Clear { user_id } => clear(user_id).await,
        Commands::Backup { output } => backup(&output).await,
        Commands::SetPrompt { text, file } => set_prompt(text, file.as_deref()).await,
        Commands::ShowPrompt => show_prompt().await,
    }
}

/// Runs the Telegram bot until the REPL stops.
pub async fn run(token: Option<String>) -> Result<()> {
    let config = AppConfig::load(token)?;
    init_tracing(&config.base.log_file)?;

    let telegram = TelegramConfig::with_token(config.base.require_token()?.to_string())
        .with_api_url(config.base.telegram_api_url.clone());
    telegram.validate()?;

    let components = build_components(&config).await?;
    let bot = telegram.build_bot();
    let bot_adapter: Arc<dyn dbot_core::Bot> = Arc::new(TelegramBotAdapter::new(bot.clone()));
    let chain = build_handler_chain(&components, bot_adapter, config.base.admin_user_ids.clone());

    info!(
        store = %config.base.store_backend,
        provider = %config.llm.provider,
        admins = config.base.admin_user_ids.len(),
        "Starting bot"
    );
    run_repl(bot, chain, components.bot_username.clone()).await
}

/// Stdin conversation: every non-empty line is one turn of `user_id`.
pub async fn chat(user_id: i64) -> Result<()> {
    init_cli_tracing();
    let config = AppConfig::load(None)?;
    let engine = open_engine(&config).await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match engine.record_and_respond(user_id, line).await {
            Ok(reply) => println!("{}", reply),
            Err(e) => eprintln!("error: {}", e),
        }
    }
    Ok(())
}

pub async fn stats(user_id: i64) -> Result<()> {
    init_cli_tracing();
    let config = AppConfig::load(None)?;
    let engine = open_admin_engine(&config).await?;
    let stats = engine.get_context_stats(user_id).await?;
    println!("{}", format_stats(user_id, &stats));
    Ok(())
}

pub async fn clear(user_id: i64) -> Result<()> {
    init_cli_tracing();
    let config = AppConfig::load(None)?;
    let engine = open_admin_engine(&config).await?;
    let cleared = engine.clear_context(user_id).await?;
    println!(
        "Cleared {} messages and {} summaries of user {}",
        cleared.messages, cleared.summaries, user_id
    );
    Ok(())
}

pub async fn backup(output: &Path) -> Result<()> {
    init_cli_tracing();
    let config = AppConfig::load(None)?;
    let engine = open_admin_engine(&config).await?;
    let snapshot = engine.backup().await?;
    write_json(output, &serde_json::to_string_pretty(&snapshot)?).await?;
    println!(
        "Backup written to {}: {} messages, {} summaries, {} settings, {} profiles",
        output.display(),
        snapshot.messages.len(),
        snapshot.summaries.len(),
        snapshot.settings.len(),
        snapshot.profiles.len()
    );
    Ok(())
}

async fn write_json(output: &Path, json: &str) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(output, json)
        .await
        .with_context(|| format!("Write backup to {}", output.display()))
}

/// Prompt text from the argument or the file, trimmed; empty text is refused.
pub async fn read_prompt_text(text: Option<String>, file: Option<&Path>) -> Result<String> {
    let raw = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Read prompt file {}", path.display()))?,
        (None, None) => anyhow::bail!("pass the prompt text or --file"),
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        anyhow::bail!("refusing to store an empty system prompt");
    }
    Ok(trimmed.to_string())
}

pub async fn set_prompt(text: Option<String>, file: Option<&Path>) -> Result<()> {
    init_cli_tracing();
    let prompt = read_prompt_text(text, file).await?;
    let config = AppConfig::load(None)?;
    let engine = open_admin_engine(&config).await?;
    engine.set_system_prompt(&prompt).await?;
    println!("System prompt stored ({} characters)", prompt.chars().count());
    Ok(())
}

pub async fn show_prompt() -> Result<()> {
    init_cli_tracing();
    let config = AppConfig::load(None)?;
    let engine = open_admin_engine(&config).await?;
    println!("{}", engine.system_instructions().await?);
    Ok(())
}
