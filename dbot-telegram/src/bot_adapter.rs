//! Wraps teloxide::Bot and implements [`dbot_core::Bot`]. Production code sends messages via
//! Telegram; tests substitute another Bot impl.

use async_trait::async_trait;
use dbot_core::{Bot as CoreBot, Chat, DbotError, Message, Result};
use teloxide::{
    prelude::*,
    types::{ChatId, MessageId, ReplyParameters, ThreadId},
};

/// Thin wrapper around teloxide::Bot that implements dbot-core's Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, chat: &Chat, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(chat.id), text.to_string())
            .await
            .map_err(|e| DbotError::Bot(e.to_string()))?;
        Ok(())
    }

    async fn reply_to(&self, message: &Message, text: &str) -> Result<()> {
        let mut request = self.bot.send_message(ChatId(message.chat.id), text.to_string());
        if let Some(thread_id) = message.thread_id {
            request = request.message_thread_id(ThreadId(MessageId(thread_id)));
        }
        if let Ok(id) = message.id.parse::<i32>() {
            request = request.reply_parameters(ReplyParameters::new(MessageId(id)));
        }
        request.await.map_err(|e| DbotError::Bot(e.to_string()))?;
        Ok(())
    }
}
