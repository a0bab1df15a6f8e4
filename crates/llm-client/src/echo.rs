//! Offline backend that answers with the content of the prompt's last message line.

use async_trait::async_trait;

use crate::{GenerationError, GenerationGateway};

#[derive(Debug, Clone, Default)]
pub struct EchoGateway {
    prefix: String,
}

impl EchoGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `prefix` to every reply.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl GenerationGateway for EchoGateway {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let content = prompt::last_message_content(prompt).unwrap_or_default();
        Ok(format!("{}{}", self.prefix, content))
    }
}
