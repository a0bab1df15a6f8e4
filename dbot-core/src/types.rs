//! Core types: user, chat, message, handler response, and the Bot / Handler traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity (id, username, names).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// "First Last", falling back to the username, then the id.
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !name.is_empty() {
            return name;
        }
        match &self.username {
            Some(username) => username.clone(),
            None => self.id.to_string(),
        }
    }
}

/// Chat identity. `chat_type` follows Telegram: "private", "group", "supergroup", "channel".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub chat_type: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.chat_type == "private"
    }
}

/// A single text message with user, chat and the addressing details needed to decide whether
/// the bot should answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub content: String,
    pub direction: MessageDirection,
    pub created_at: DateTime<Utc>,
    pub reply_to_message_id: Option<String>,
    /// Whether the replied-to message was sent by the bot; only meaningful when
    /// `reply_to_message_id` is set.
    pub reply_to_message_from_bot: bool,
    /// The text mentions the bot by @username.
    pub mentions_bot: bool,
    /// Forum topic (message thread) id.
    pub thread_id: Option<i32>,
    /// Forum topic name, when known.
    pub topic_name: Option<String>,
}

impl Message {
    /// Private chat, @mention, or reply to one of the bot's messages.
    pub fn is_addressed_to_bot(&self) -> bool {
        self.chat.is_private()
            || self.mentions_bot
            || (self.reply_to_message_id.is_some() && self.reply_to_message_from_bot)
    }
}

/// Direction of the message (from user or from bot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessageDirection {
    Incoming,
    Outgoing,
}

/// Handler result for the chain. `Reply(text)` carries the response body so later handlers
/// can see it in `after()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain; no response body.
    Stop,
    /// Skip this handler, try next.
    Ignore,
    /// Stop the chain and attach reply text.
    Reply(String),
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Converts a transport-specific message type to core [`Message`].
pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}

/// Abstraction for sending messages. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message to the given chat.
    async fn send_message(&self, chat: &Chat, text: &str) -> crate::error::Result<()>;
    /// Replies to the given message in the same chat and forum topic.
    async fn reply_to(&self, message: &Message, text: &str) -> crate::error::Result<()>;
}

/// Single handler concept: optional before / handle / after. Chain runs all before → handle
/// until Stop/Reply → all after (reverse).
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs before the handle phase. Return false to stop the chain.
    async fn before(&self, _message: &Message) -> crate::error::Result<bool> {
        Ok(true)
    }
    /// Processes the message. Return Stop or Reply to end the handle phase. Default: Continue.
    async fn handle(&self, _message: &Message) -> crate::error::Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }
    /// Runs after the handle phase (reverse order), with the final response.
    async fn after(
        &self,
        _message: &Message,
        _response: &HandlerResponse,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(chat_type: &str) -> Message {
        Message {
            id: "1".to_string(),
            user: User {
                id: 10,
                username: Some("anna".to_string()),
                first_name: Some("Anna".to_string()),
                last_name: None,
            },
            chat: Chat {
                id: -100,
                chat_type: chat_type.to_string(),
            },
            content: "hello".to_string(),
            direction: MessageDirection::Incoming,
            created_at: Utc::now(),
            reply_to_message_id: None,
            reply_to_message_from_bot: false,
            mentions_bot: false,
            thread_id: None,
            topic_name: None,
        }
    }

    #[test]
    fn test_private_message_is_addressed() {
        assert!(message("private").is_addressed_to_bot());
        assert!(!message("supergroup").is_addressed_to_bot());
    }

    #[test]
    fn test_group_message_addressed_by_mention_or_reply() {
        let mut m = message("group");
        m.mentions_bot = true;
        assert!(m.is_addressed_to_bot());

        let mut m = message("group");
        m.reply_to_message_id = Some("5".to_string());
        assert!(!m.is_addressed_to_bot());
        m.reply_to_message_from_bot = true;
        assert!(m.is_addressed_to_bot());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut user = message("private").user;
        assert_eq!(user.display_name(), "Anna");
        user.last_name = Some("Petrova".to_string());
        assert_eq!(user.display_name(), "Anna Petrova");
        user.first_name = None;
        user.last_name = None;
        assert_eq!(user.display_name(), "anna");
        user.username = None;
        assert_eq!(user.display_name(), "10");
    }
}
