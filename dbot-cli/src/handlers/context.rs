//! Conversation handler: feeds addressed messages through the context engine and replies.

use std::sync::Arc;

use async_trait::async_trait;
use context_engine::ContextEngine;
use dbot_core::{Bot, Handler, HandlerResponse, Message, Result};
use dbot_telegram::mention::{extract_question, with_topic_prefix};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

/// Sent when the turn fails; the user message is already stored.
pub const RETRY_LATER_REPLY: &str =
    "Sorry, I could not process your message right now. Please try again later.";

/// Sent instead of an empty generated reply.
pub const EMPTY_REPLY_FALLBACK: &str =
    "Sorry, I could not come up with an answer. Please try rephrasing the question.";

/// Stands in for the question when the user only @mentioned the bot.
pub const EMPTY_MENTION_PROMPT: &str =
    "The user only mentioned you without a question. Greet them briefly and invite them to ask.";

pub struct ContextHandler {
    engine: Arc<ContextEngine>,
    bot: Arc<dyn Bot>,
    bot_username: Arc<RwLock<Option<String>>>,
}

impl ContextHandler {
    pub fn new(
        engine: Arc<ContextEngine>,
        bot: Arc<dyn Bot>,
        bot_username: Arc<RwLock<Option<String>>>,
    ) -> Self {
        Self {
            engine,
            bot,
            bot_username,
        }
    }

    /// Text recorded for the turn: mention stripped, topic prefixed.
    async fn turn_text(&self, message: &Message) -> String {
        let username = self.bot_username.read().await.clone();
        let question = match username.as_deref() {
            Some(username) => extract_question(&message.content, username),
            None => message.content.trim().to_string(),
        };
        let question = if question.is_empty() {
            EMPTY_MENTION_PROMPT.to_string()
        } else {
            question
        };
        with_topic_prefix(&question, message.topic_name.as_deref())
    }
}

#[async_trait]
impl Handler for ContextHandler {
    #[instrument(skip(self, message), fields(user_id = message.user.id, chat_id = message.chat.id))]
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        let content = message.content.trim();
        if content.is_empty() || content.starts_with('/') {
            return Ok(HandlerResponse::Continue);
        }
        if !message.is_addressed_to_bot() {
            debug!("Group message not addressed to the bot, ignored");
            return Ok(HandlerResponse::Ignore);
        }

        let text = self.turn_text(message).await;
        let reply = match self.engine.record_and_respond(message.user.id, &text).await {
            Ok(reply) if reply.trim().is_empty() => {
                info!("Empty reply, sending fallback text");
                EMPTY_REPLY_FALLBACK.to_string()
            }
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Turn failed");
                RETRY_LATER_REPLY.to_string()
            }
        };

        self.bot.reply_to(message, &reply).await?;
        info!(reply_len = reply.len(), "Reply sent");
        Ok(HandlerResponse::Reply(reply))
    }
}
