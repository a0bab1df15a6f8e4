//! OpenAI-compatible gateway: wraps openai-client, sends the prompt as one user message.

use async_trait::async_trait;
use openai_client::{ClientError, CompletionOptions, OpenAIError};
use tracing::instrument;

use crate::{GenerationError, GenerationGateway};

/// [`GenerationGateway`] backed by the OpenAI chat completion API.
#[derive(Clone)]
pub struct OpenAiGateway {
    client: openai_client::OpenAIClient,
    model: String,
    options: CompletionOptions,
}

impl OpenAiGateway {
    pub fn new(api_key: String, model: impl Into<String>) -> Self {
        Self {
            client: openai_client::OpenAIClient::new(api_key),
            model: model.into(),
            options: CompletionOptions::default(),
        }
    }

    pub fn with_base_url(api_key: String, base_url: String, model: impl Into<String>) -> Self {
        Self {
            client: openai_client::OpenAIClient::with_base_url(api_key, base_url),
            model: model.into(),
            options: CompletionOptions::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.options.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn classify(err: ClientError) -> GenerationError {
    match err {
        ClientError::NoChoices => GenerationError::MalformedOutput("no choices in response".into()),
        ClientError::Api(OpenAIError::Reqwest(e)) => GenerationError::Network(e.to_string()),
        ClientError::Api(OpenAIError::JSONDeserialize(e)) => {
            GenerationError::MalformedOutput(e.to_string())
        }
        ClientError::Api(OpenAIError::InvalidArgument(msg)) => GenerationError::Config(msg),
        ClientError::Api(OpenAIError::ApiError(api)) => {
            let lower = api.message.to_lowercase();
            if lower.contains("rate limit") || lower.contains("quota") {
                GenerationError::RateLimited(api.message)
            } else if lower.contains("overloaded") || lower.contains("server error") {
                GenerationError::Server {
                    status: 500,
                    message: api.message,
                }
            } else {
                GenerationError::Rejected(api.message)
            }
        }
        ClientError::Api(other) => GenerationError::Rejected(other.to_string()),
    }
}

#[async_trait]
impl GenerationGateway for OpenAiGateway {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.client
            .complete_prompt(&self.model, prompt, self.options)
            .await
            .map_err(classify)
    }
}
