//! Adapters from Telegram (teloxide) types to dbot_core types.
//! Depends only on teloxide and dbot_core type definitions.

use dbot_core::{Chat, Message, MessageDirection, ToCoreMessage, ToCoreUser, User};

use crate::mention::is_bot_mentioned;

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`]. The bot username, when
/// known, is used to detect @mentions.
pub struct TelegramMessageWrapper<'a> {
    message: &'a teloxide::types::Message,
    bot_username: Option<&'a str>,
}

impl<'a> TelegramMessageWrapper<'a> {
    pub fn new(message: &'a teloxide::types::Message) -> Self {
        Self {
            message,
            bot_username: None,
        }
    }

    pub fn with_bot_username(mut self, bot_username: Option<&'a str>) -> Self {
        self.bot_username = bot_username;
        self
    }

    /// Text or media caption.
    fn content(&self) -> &str {
        self.message
            .text()
            .or_else(|| self.message.caption())
            .unwrap_or("")
    }

    fn reply_to_message_id(&self) -> Option<String> {
        self.message.reply_to_message().map(|msg| msg.id.to_string())
    }

    /// Returns true if the replied-to message was sent by a bot.
    fn reply_to_message_from_bot(&self) -> bool {
        self.message
            .reply_to_message()
            .and_then(|m| m.from.as_ref())
            .map(|u| u.is_bot)
            .unwrap_or(false)
    }

    /// Forum topic id; only set for messages posted inside a topic.
    fn thread_id(&self) -> Option<i32> {
        if !self.message.is_topic_message {
            return None;
        }
        self.message.thread_id.map(|thread| thread.0 .0)
    }

    /// Topic name, taken from the topic-created service message the topic's messages reply to.
    fn topic_name(&self) -> Option<String> {
        if !self.message.is_topic_message {
            return None;
        }
        self.message
            .reply_to_message()
            .and_then(|m| m.forum_topic_created())
            .map(|created| created.name.clone())
    }
}

/// Telegram chat kind as the lowercase name used in core [`Chat`].
pub fn chat_type_name(chat: &teloxide::types::Chat) -> &'static str {
    if chat.is_private() {
        "private"
    } else if chat.is_supergroup() {
        "supergroup"
    } else if chat.is_group() {
        "group"
    } else if chat.is_channel() {
        "channel"
    } else {
        "unknown"
    }
}

impl<'a> ToCoreMessage for TelegramMessageWrapper<'a> {
    fn to_core(&self) -> Message {
        let content = self.content().to_string();
        let mentions_bot = self
            .bot_username
            .map(|username| is_bot_mentioned(&content, username))
            .unwrap_or(false);
        Message {
            id: self.message.id.to_string(),
            user: self
                .message
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or(User {
                    id: 0,
                    username: None,
                    first_name: None,
                    last_name: None,
                }),
            chat: Chat {
                id: self.message.chat.id.0,
                chat_type: chat_type_name(&self.message.chat).to_string(),
            },
            content,
            direction: MessageDirection::Incoming,
            created_at: self.message.date,
            reply_to_message_id: self.reply_to_message_id(),
            reply_to_message_from_bot: self.reply_to_message_from_bot(),
            mentions_bot,
            thread_id: self.thread_id(),
            topic_name: self.topic_name(),
        }
    }
}
