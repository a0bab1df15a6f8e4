//! REPL runner: converts teloxide messages to core messages and hands them to the HandlerChain.

use anyhow::Result;
use dbot_core::ToCoreMessage;
use handler_chain::HandlerChain;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{error, info, instrument, warn};

use super::adapters::TelegramMessageWrapper;

/// Starts the REPL with the given bot and chain. Calls `get_me()` first and stores the bot's
/// username in `bot_username` for mention detection. Each message is processed on its own task;
/// turns of the same user are serialized further down, in the context engine.
#[instrument(skip(bot, handler_chain, bot_username))]
pub async fn run_repl(
    bot: teloxide::Bot,
    handler_chain: HandlerChain,
    bot_username: Arc<tokio::sync::RwLock<Option<String>>>,
) -> Result<()> {
    match bot.get_me().await {
        Ok(me) => {
            if let Some(username) = &me.user.username {
                *bot_username.write().await = Some(username.clone());
                info!(username = %username, "Bot username set before repl");
            }
        }
        Err(e) => warn!(error = %e, "get_me failed; @mentions will not be detected"),
    }

    let chain = handler_chain;
    teloxide::repl(bot, move |_bot: Bot, msg: teloxide::types::Message| {
        let chain = chain.clone();
        let bot_username = bot_username.clone();

        async move {
            if msg.text().is_none() && msg.caption().is_none() {
                info!(chat_id = msg.chat.id.0, "Received non-text message, skipped");
                return Ok(());
            }

            let username = bot_username.read().await.clone();
            let core_msg = TelegramMessageWrapper::new(&msg)
                .with_bot_username(username.as_deref())
                .to_core();
            info!(
                user_id = core_msg.user.id,
                chat_id = core_msg.chat.id,
                chat_type = %core_msg.chat.chat_type,
                thread_id = ?core_msg.thread_id,
                text_len = core_msg.content.len(),
                "Received message"
            );

            tokio::spawn(async move {
                info!(
                    user_id = core_msg.user.id,
                    chat_id = core_msg.chat.id,
                    message_id = %core_msg.id,
                    "step: processing message (handler chain started)"
                );
                if let Err(e) = chain.handle(&core_msg).await {
                    error!(error = %e, user_id = core_msg.user.id, "Handler chain failed");
                }
            });

            Ok(())
        }
    })
    .await;

    Ok(())
}
