//! Telegram handlers: admin commands, the member directory, then the conversation handler.

mod admin;
mod context;
mod members;

pub use admin::{command_text, format_stats, parse_command, write_backup, AdminCommandHandler};
pub use context::{ContextHandler, EMPTY_MENTION_PROMPT, EMPTY_REPLY_FALLBACK, RETRY_LATER_REPLY};
pub use members::{MembersHandler, MEMBERS_HEADER, NO_MEMBERS_REPLY};
