//! `/members`: the community directory, open to everyone.

use std::sync::Arc;

use async_trait::async_trait;
use context_engine::ContextEngine;
use dbot_core::{Bot, Handler, HandlerResponse, Message, Result};
use dbot_telegram::{split_message, TELEGRAM_MESSAGE_LIMIT};
use tracing::{error, info};

use super::admin::parse_command;
use super::context::RETRY_LATER_REPLY;

pub const MEMBERS_HEADER: &str = "Community members:";
pub const NO_MEMBERS_REPLY: &str = "No community members are registered yet.";

pub struct MembersHandler {
    engine: Arc<ContextEngine>,
    bot: Arc<dyn Bot>,
}

impl MembersHandler {
    pub fn new(engine: Arc<ContextEngine>, bot: Arc<dyn Bot>) -> Self {
        Self { engine, bot }
    }
}

#[async_trait]
impl Handler for MembersHandler {
    async fn handle(&self, message: &Message) -> Result<HandlerResponse> {
        match parse_command(&message.content) {
            Some((command, _)) if command == "/members" => {}
            _ => return Ok(HandlerResponse::Continue),
        }

        let reply = match self.engine.member_directory().await {
            Ok(block) if block.is_empty() => NO_MEMBERS_REPLY.to_string(),
            Ok(block) => format!("{}\n{}", MEMBERS_HEADER, block),
            Err(e) => {
                error!(error = %e, "Loading the member directory failed");
                RETRY_LATER_REPLY.to_string()
            }
        };

        let chunks = split_message(&reply, TELEGRAM_MESSAGE_LIMIT);
        for chunk in &chunks {
            self.bot.reply_to(message, chunk).await?;
        }
        info!(user_id = message.user.id, parts = chunks.len(), "Member directory sent");
        Ok(HandlerResponse::Reply(reply))
    }
}
