//! # dbot-telegram
//!
//! Telegram transport layer: adapters, [`dbot_core::Bot`] implementation, config, REPL runner.
//! Handles only Telegram connectivity and handler-chain execution; conversation state lives in
//! the context engine.

mod adapters;
mod bot_adapter;
mod config;
pub mod mention;
mod runner;
pub mod text;

pub use adapters::{TelegramMessageWrapper, TelegramUserWrapper};
pub use bot_adapter::TelegramBotAdapter;
pub use config::TelegramConfig;
pub use runner::run_repl;
pub use text::{split_message, TELEGRAM_MESSAGE_LIMIT};
