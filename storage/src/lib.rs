//! Storage crate: durable conversation log, summary log, settings and member profiles.
//!
//! ## Modules
//!
//! - [`error`] – Storage error types
//! - [`models`] – ConversationMessage, ConversationSummary, UserProfile, BackupSnapshot
//! - [`repository`] – ContextStore / SettingsStore / ProfileStore traits
//! - [`sqlite_store`] – SqliteContextStore (SQLite via sqlx)
//! - [`memory_store`] – InMemoryContextStore (tests, local runs)
//! - [`sqlite_pool`] – SqlitePoolManager

mod error;
mod memory_store;
mod models;
mod repository;
mod sqlite_pool;
mod sqlite_store;

pub use error::{StorageError, StorageResult};
pub use memory_store::InMemoryContextStore;
pub use models::{
    BackupSnapshot, ClearedCounts, ConversationMessage, ConversationSummary, NewSummary, Role,
    SettingRecord, UserProfile,
};
pub use repository::{ContextStore, ProfileStore, SettingsStore, SYSTEM_PROMPT_KEY};
pub use sqlite_pool::SqlitePoolManager;
pub use sqlite_store::SqliteContextStore;
