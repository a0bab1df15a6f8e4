//! Builds the configured gateway stack from [`EnvLlmConfig`].

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{EnvLlmConfig, Provider};
use crate::{EchoGateway, GeminiGateway, GenerationGateway, OpenAiGateway, RetryingGateway};

/// Single backend for `provider`, without retries.
pub fn build_backend(config: &EnvLlmConfig, provider: Provider) -> Result<Arc<dyn GenerationGateway>> {
    let gateway: Arc<dyn GenerationGateway> = match provider {
        Provider::OpenAi => {
            let api_key = config
                .openai_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY not set"))?;
            info!(model = %config.openai_model, base_url = %config.openai_base_url, "Using OpenAI backend");
            Arc::new(
                OpenAiGateway::with_base_url(
                    api_key,
                    config.openai_base_url.clone(),
                    config.openai_model.clone(),
                )
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens),
            )
        }
        Provider::Gemini => {
            let api_key = config
                .gemini_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("GEMINI_API_KEY not set"))?;
            info!(model = %config.gemini_model, "Using Gemini backend");
            Arc::new(
                GeminiGateway::new(
                    api_key,
                    config.gemini_base_url.clone(),
                    config.gemini_model.clone(),
                )
                .with_temperature(config.temperature)
                .with_max_tokens(config.max_tokens),
            )
        }
        Provider::Echo => {
            info!("Using echo backend");
            Arc::new(EchoGateway::new())
        }
    };
    Ok(gateway)
}

/// Primary backend wrapped with retries and, when configured, a fallback backend.
pub fn build_gateway(config: &EnvLlmConfig) -> Result<Arc<dyn GenerationGateway>> {
    config.validate()?;
    let primary = build_backend(config, config.provider)?;
    let mut gateway = RetryingGateway::new(primary, config.retry_policy());
    if let Some(fallback) = config.fallback_provider {
        gateway = gateway.with_fallback(build_backend(config, fallback)?);
    }
    Ok(Arc::new(gateway))
}
