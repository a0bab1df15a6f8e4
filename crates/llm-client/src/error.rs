//! Generation error taxonomy.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("Timed out after {0:?}")]
    Timeout(Duration),
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Malformed output: {0}")]
    MalformedOutput(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl GenerationError {
    /// Transient failures worth another attempt on the same backend.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited(_)
                | GenerationError::Network(_)
                | GenerationError::Server { .. }
                | GenerationError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GenerationError::RateLimited("429".into()).is_retryable());
        assert!(GenerationError::Network("reset".into()).is_retryable());
        assert!(GenerationError::Server { status: 503, message: "busy".into() }.is_retryable());
        assert!(GenerationError::Timeout(Duration::from_secs(1)).is_retryable());

        assert!(!GenerationError::Rejected("bad request".into()).is_retryable());
        assert!(!GenerationError::MalformedOutput("no candidates".into()).is_retryable());
        assert!(!GenerationError::Config("missing key".into()).is_retryable());
    }
}
