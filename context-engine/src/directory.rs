//! Community member directory injected into system instructions.

use std::sync::Arc;

use async_trait::async_trait;
use storage::{ProfileStore, StorageResult, UserProfile};

/// Source of the formatted member list.
#[async_trait]
pub trait DirectoryProvider: Send + Sync {
    /// One line per member; empty when nobody is listed.
    async fn directory_block(&self) -> StorageResult<String>;
}

/// `• {full_name} — {occupation} ({skills}) @{nick}`
pub fn format_profile_line(profile: &UserProfile) -> String {
    let nick = profile.telegram_nick.as_deref().unwrap_or_default().trim();
    let nick = if nick.starts_with('@') {
        nick.to_string()
    } else {
        format!("@{}", nick)
    };
    let skills: Vec<&str> = profile
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    format!(
        "• {} — {} ({}) {}",
        profile.full_name.as_deref().unwrap_or_default().trim(),
        profile.occupation.as_deref().unwrap_or_default().trim(),
        skills.join(", "),
        nick
    )
}

/// Directory built from complete profiles in the store.
pub struct ProfileDirectory {
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileDirectory {
    pub fn new(profiles: Arc<dyn ProfileStore>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl DirectoryProvider for ProfileDirectory {
    async fn directory_block(&self) -> StorageResult<String> {
        let profiles = self.profiles.list_complete_profiles().await?;
        Ok(profiles
            .iter()
            .map(format_profile_line)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::InMemoryContextStore;

    fn profile(user_id: i64, name: &str, nick: &str) -> UserProfile {
        UserProfile {
            full_name: Some(name.to_string()),
            telegram_nick: Some(nick.to_string()),
            occupation: Some("Data engineer".to_string()),
            skills: vec!["Python".to_string(), " Spark ".to_string()],
            ..UserProfile::new(user_id)
        }
    }

    #[test]
    fn test_format_profile_line_adds_at_sign() {
        let line = format_profile_line(&profile(1, "Ivan Ivanov", "ivan"));
        assert_eq!(line, "• Ivan Ivanov — Data engineer (Python, Spark) @ivan");

        let line = format_profile_line(&profile(1, "Ivan Ivanov", "@ivan"));
        assert!(line.ends_with(" @ivan"));
    }

    #[tokio::test]
    async fn test_directory_lists_complete_profiles_only() {
        let store = Arc::new(InMemoryContextStore::new());
        store.upsert_profile(&profile(1, "Boris", "boris")).await.unwrap();
        store.upsert_profile(&profile(2, "Anna", "@anna")).await.unwrap();
        store.upsert_profile(&UserProfile::new(3)).await.unwrap();

        let directory = ProfileDirectory::new(store);
        let block = directory.directory_block().await.unwrap();

        let lines: Vec<&str> = block.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("• Anna"));
        assert!(lines[1].starts_with("• Boris"));
    }

    #[tokio::test]
    async fn test_empty_directory() {
        let directory = ProfileDirectory::new(Arc::new(InMemoryContextStore::new()));
        assert_eq!(directory.directory_block().await.unwrap(), "");
    }
}
