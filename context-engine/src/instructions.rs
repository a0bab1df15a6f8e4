//! System instructions: stored template plus the member directory block.

use std::sync::Arc;

use storage::{SettingsStore, StorageResult, SYSTEM_PROMPT_KEY};
use tracing::warn;

use crate::directory::DirectoryProvider;

pub const DIRECTORY_HEADER: &str = "Registered community members:";

/// Appends the directory block under [`DIRECTORY_HEADER`] when it is not empty.
pub fn compose_instructions(template: &str, directory_block: &str) -> String {
    if directory_block.trim().is_empty() {
        return template.to_string();
    }
    format!("{}\n\n{}\n{}", template, DIRECTORY_HEADER, directory_block)
}

pub struct InstructionSource {
    settings: Arc<dyn SettingsStore>,
    directory: Arc<dyn DirectoryProvider>,
    default_template: String,
}

impl InstructionSource {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        directory: Arc<dyn DirectoryProvider>,
        default_template: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            directory,
            default_template: default_template.into(),
        }
    }

    pub fn with_directory(mut self, directory: Arc<dyn DirectoryProvider>) -> Self {
        self.directory = directory;
        self
    }

    /// Stored template, or the configured default when none is stored.
    pub async fn template(&self) -> StorageResult<String> {
        Ok(self
            .settings
            .get_setting(SYSTEM_PROMPT_KEY)
            .await?
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.default_template.clone()))
    }

    pub async fn set_template(&self, template: &str) -> StorageResult<()> {
        self.settings.put_setting(SYSTEM_PROMPT_KEY, template).await
    }

    /// Template with the directory block. A failing directory only drops the block.
    pub async fn compose(&self) -> StorageResult<String> {
        let template = self.template().await?;
        let block = match self.directory.directory_block().await {
            Ok(block) => block,
            Err(e) => {
                warn!(error = %e, "Member directory unavailable, using template only");
                String::new()
            }
        };
        Ok(compose_instructions(&template, &block))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storage::{InMemoryContextStore, StorageError};

    struct Fixed(&'static str);

    #[async_trait]
    impl DirectoryProvider for Fixed {
        async fn directory_block(&self) -> StorageResult<String> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl DirectoryProvider for Broken {
        async fn directory_block(&self) -> StorageResult<String> {
            Err(StorageError::Unavailable("profiles offline".to_string()))
        }
    }

    #[test]
    fn test_compose_instructions() {
        assert_eq!(compose_instructions("Be kind.", ""), "Be kind.");
        assert_eq!(
            compose_instructions("Be kind.", "• A — B (C) @a"),
            "Be kind.\n\nRegistered community members:\n• A — B (C) @a"
        );
    }

    #[tokio::test]
    async fn test_template_falls_back_to_default_then_uses_stored() {
        let store = Arc::new(InMemoryContextStore::new());
        let source = InstructionSource::new(store.clone(), Arc::new(Fixed("")), "default");

        assert_eq!(source.compose().await.unwrap(), "default");

        source.set_template("stored").await.unwrap();
        assert_eq!(source.template().await.unwrap(), "stored");

        let source = source.with_directory(Arc::new(Fixed("• X — Y (Z) @x")));
        assert!(source.compose().await.unwrap().starts_with("stored\n\n"));
    }

    #[tokio::test]
    async fn test_directory_failure_is_not_fatal() {
        let source = InstructionSource::new(
            Arc::new(InMemoryContextStore::new()),
            Arc::new(Broken),
            "default",
        );
        assert_eq!(source.compose().await.unwrap(), "default");
    }
}
