//! # dbot-core
//!
//! Core types and traits for the community bot: [`Bot`], [`Handler`], message and user types,
//! and tracing initialization. Transport-agnostic; used by dbot-telegram, handler-chain and
//! dbot-cli.

pub mod error;
pub mod logger;
pub mod types;

pub use error::{DbotError, HandlerError, Result};
pub use logger::init_tracing;
pub use types::{
    Bot, Chat, Handler, HandlerResponse, Message, MessageDirection, ToCoreMessage, ToCoreUser,
    User,
};
