//! # dbot-cli
//!
//! The `dbot` binary's library half: CLI parsing, config loading, component factory, Telegram
//! handlers and the admin subcommands.

pub mod cli;
pub mod commands;
pub mod components;
pub mod config;
pub mod handlers;

pub use cli::{Cli, Commands};
pub use components::{build_components, build_handler_chain, BotComponents};
pub use config::{AppConfig, BaseConfig, StoreBackend};
pub use handlers::{AdminCommandHandler, ContextHandler, MembersHandler};
