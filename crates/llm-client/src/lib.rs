//! # Generation gateway
//!
//! Defines the [`GenerationGateway`] trait (prompt string in, full text out) and its backends:
//! OpenAI-compatible chat completion, Google Gemini REST and an offline echo backend.
//! [`RetryingGateway`] adds bounded retries for transient failures and an optional fallback
//! backend; [`build_gateway`] assembles the configured stack from [`EnvLlmConfig`].

use async_trait::async_trait;

mod config;
mod echo;
mod error;
mod factory;
mod gemini;
mod openai_llm;
mod retry;

pub use config::{EnvLlmConfig, Provider};
pub use echo::EchoGateway;
pub use error::GenerationError;
pub use factory::{build_backend, build_gateway};
pub use gemini::GeminiGateway;
pub use openai_llm::OpenAiGateway;
pub use retry::{RetryPolicy, RetryingGateway};

/// Text generation backend. Implementations return the whole output or an error, never a
/// partial response. An empty string is a valid output.
#[async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
