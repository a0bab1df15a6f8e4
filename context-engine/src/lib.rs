//! # context-engine
//!
//! Decides what part of a user's unbounded chat history goes into each generation call.
//!
//! ## Modules
//!
//! - [`engine`] – [`ContextEngine`]: `record_and_respond`, `clear_context`, `get_context_stats`
//! - [`policy`] – block-based [`SummarizationPolicy`]
//! - [`accumulator`] – in-process per-user message cache
//! - [`locks`] – per-user turn serialization
//! - [`instructions`] / [`directory`] – system instructions with the member directory block
//! - [`config`] – [`ContextConfig`] from env
//!
//! Durable state lives in `storage`; prompts are built by `prompt`; text comes from an
//! `llm_client::GenerationGateway`.

pub mod accumulator;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod instructions;
pub mod locks;
pub mod policy;
pub mod stats;

pub use accumulator::ContextAccumulator;
pub use config::ContextConfig;
pub use directory::{format_profile_line, DirectoryProvider, ProfileDirectory};
pub use engine::{ContextEngine, TurnPhase};
pub use error::{EngineError, PolicyError};
pub use instructions::{compose_instructions, InstructionSource, DIRECTORY_HEADER};
pub use locks::UserLocks;
pub use policy::{PolicyOutcome, SummarizationPolicy};
pub use stats::{excerpt, ContextStats};
