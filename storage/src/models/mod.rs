//! Persisted records of the storage crate.

mod backup;
pub(crate) mod message;
pub(crate) mod profile;
mod summary;

pub use backup::{BackupSnapshot, ClearedCounts, SettingRecord};
pub use message::{ConversationMessage, Role};
pub use profile::UserProfile;
pub use summary::{ConversationSummary, NewSummary};
