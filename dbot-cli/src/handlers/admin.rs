//! Context and maintenance commands.
//!
//! `/clear_context [user_id|@nick]` and `/context_stats [user_id|@nick]` act on the caller
//! without an argument; the argument is accepted from admins only. `/set_prompt <text>` and
//! `/backup` are admin-only.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use context_engine::{ContextEngine, ContextStats, EngineError};
use dbot_core::{Bot, DbotError, Handler, HandlerError, HandlerResponse, Message, Result};
use storage::BackupSnapshot;
use tracing::{error, info, warn};

use super::context::RETRY_LATER_REPLY;
use crate::config::DEFAULT_BACKUP_DIR;

const ADMIN_ONLY_REPLY: &str = "Only administrators can do that.";
const COMMAND_FAILED_REPLY: &str = "The command failed, see the bot logs for details.";

const CLEAR_CONTEXT: &str = "/clear_context";
const CONTEXT_STATS: &str = "/context_stats";
const SET_PROMPT: &str = "/set_prompt";
const BACKUP: &str = "/backup";

/// Splits `/command@botname arg ...` into the bare command and its arguments.
pub fn parse_command(text: &str) -> Option<(String, Vec<&str>)> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    if !head.starts_with('/') {
        return None;
    }
    let command = head.split('@').next().unwrap_or(head).to_lowercase();
    Some((command, parts.collect()))
}

/// Everything after the command word, trimmed, with inner line breaks kept.
pub fn command_text(text: &str) -> &str {
    text.trim_start()
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .unwrap_or_default()
}

/// Human-readable stats for a user.
pub fn format_stats(user_id: i64, stats: &ContextStats) -> String {
    let mut out = format!(
        "Context of user {}:\nMessages: {}\nSummaries: {}",
        user_id, stats.message_count, stats.summary_count
    );
    if let Some(excerpt) = &stats.last_summary_excerpt {
        let at = stats
            .last_summary_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        out.push_str(&format!("\nLast summary ({}): {}", at, excerpt));
    }
    out
}

/// Writes the snapshot as `backup_<timestamp>.json` under `dir` and returns the file path.
pub async fn write_backup(dir: &Path, snapshot: &BackupSnapshot) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!(
        "backup_{}.json",
        snapshot.exported_at.format("%Y%m%d_%H%M%S")
    ));
    let json = serde_json::to_vec_pretty(snapshot).map_err(std::io::Error::from)?;
    tokio::fs::write(&path, json).await?;
    Ok(path)
}

fn engine_failure(e: EngineError) -> DbotError {
    HandlerError::Engine(e.to_string()).into()
}

/// Reply for a refused or failed command.
fn failure_reply(command: &str, err: &DbotError) -> String {
    match err {
        DbotError::Handler(HandlerError::Unauthorized) => ADMIN_ONLY_REPLY.to_string(),
        DbotError::Handler(HandlerError::InvalidCommand(reason)) => reason.clone(),
        DbotError::Handler(HandlerError::Engine(reason)) => {
            error!(command = %command, error = %reason, "Context engine call failed");
            RETRY_LATER_REPLY.to_string()
        }
        _ => {
            error!(command = %command, error = %err, "Command failed");
            COMMAND_FAILED_REPLY.to_string()
        }
    }
}

pub struct AdminCommandHandler {
    engine: Arc<ContextEngine>,
    bot: Arc<dyn Bot>,
    admin_user_ids: Vec<i64>,
    backup_dir: PathBuf,
}

impl AdminCommandHandler {
    pub fn new(engine: Arc<ContextEngine>, bot: Arc<dyn Bot>, admin_user_ids: Vec<i64>) -> Self {
        Self {
            engine,
            bot,
            admin_user_ids,
            backup_dir: PathBuf::from(DEFAULT_BACKUP_DIR),
        }
    }

    pub fn with_backup_dir(mut self, backup_dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = backup_dir.into();
        self
    }

    fn is_admin(&self, user_id: i64) -> bool {
        self.admin_user_ids.contains(&user_id)
    }

    fn require_admin(&self, message: &Message, command: &str) -> Result<()> {
        if self.is_admin(message.user.id) {
            return Ok(());
        }
        warn!(user_id = message.user.id, command = %command, "Admin command refused");
        Err(HandlerError::Unauthorized.into())
    }

    /// User the command acts on.
    async fn resolve_target(&self, message: &Message, command: &str, args: &[&str]) -> Result<i64> {
        let Some(arg) = args.first() else {
            return Ok(message.user.id);
        };
        self.require_admin(message, command)?;
        if arg.starts_with('@') {
            return self
                .engine
                .find_user_by_nick(arg)
                .await
                .map_err(engine_failure)?
                .ok_or_else(|| {
                    HandlerError::InvalidCommand(format!("No member is registered as {}.", arg))
                        .into()
                });
        }
        arg.parse::<i64>().map_err(|_| {
            HandlerError::InvalidCommand(format!("Usage: {} [user_id|@nick]", command)).into()
        })
    }

    async fn clear_context(&self, message: &Message, target: i64) -> Result<String> {
        let cleared = self
            .engine
            .clear_context(target)
            .await
            .map_err(engine_failure)?;
        info!(
            by = message.user.id,
            user_id = target,
            messages = cleared.messages,
            summaries = cleared.summaries,
            "Context cleared by command"
        );
        Ok(if target == message.user.id {
            "Your conversation context has been cleared.".to_string()
        } else {
            format!(
                "Context of user {} cleared ({} messages, {} summaries).",
                target, cleared.messages, cleared.summaries
            )
        })
    }

    async fn context_stats(&self, target: i64) -> Result<String> {
        let stats = self
            .engine
            .get_context_stats(target)
            .await
            .map_err(engine_failure)?;
        Ok(format_stats(target, &stats))
    }

    async fn set_prompt(&self, message: &Message) -> Result<String> {
        self.require_admin(message, SET_PROMPT)?;
        let text = command_text(&message.content);
        if text.is_empty() {
            return Err(HandlerError::InvalidCommand(format!(
                "Usage: {} <new system prompt>",
                SET_PROMPT
            ))
            .into());
        }
        self.engine
            .set_system_prompt(text)
            .await
            .map_err(engine_failure)?;
        info!(by = message.user.id, prompt_len = text.len(), "System prompt set by command");
        Ok("System prompt updated.".to_string())
    }

    async fn backup(&self, message: &Message) -> Result<String> {
        self.require_admin(message, BACKUP)?;
        let snapshot = self.engine.backup().await.map_err(engine_failure)?;
        let path = write_backup(&self.backup_dir, &snapshot).await?;
        info!(by = message.user.id, path = %path.display(), "Backup written by command");
        Ok(format!(
            "Backup written to {}: {} messages, {} summaries, {} settings, {} profiles.",
            path.display(),
            snapshot.messages.len(),
            snapshot.summaries.len(),
            snapshot.settings.len(),
            snapshot.profiles.len()
        ))
    }

    async fn execute(&self, message: &Message, command: &str, args: &[&str]) -> Result<String> {
        match command {
            CLEAR_CONTEXT => {
                let target = self.resolve_target(message, command, args).await?;
                self.clear_context(message, target).await
            }
            CONTEXT_STATS => {
                let target = self.resolve_target(message, command, args).await?;
                self.context_stats(target).await
            }
            SET_PROMPT => self.set_prompt(message).await,
            _ => self.backup(message).await,
        }
    }
}

#[async_trait]
impl Handler for AdminCommandHandler {
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let Some((command, args)) = parse_command(&message.content) else {
            return Ok(HandlerResponse::Continue);
        };
        if ![CLEAR_CONTEXT, CONTEXT_STATS, SET_PROMPT, BACKUP].contains(&command.as_str()) {
            return Ok(HandlerResponse::Continue);
        }

        let reply = match self.execute(message, &command, &args).await {
            Ok(reply) => reply,
            Err(e) => failure_reply(&command, &e),
        };

        self.bot.reply_to(message, &reply).await?;
        Ok(HandlerResponse::Reply(reply))
    }
}
