use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbotError {
    #[error("Bot error: {0}")]
    Bot(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a handler refused or could not finish a command.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Context engine error: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, DbotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let err: DbotError = HandlerError::InvalidCommand("Usage: /backup".to_string()).into();
        assert!(matches!(err, DbotError::Handler(HandlerError::InvalidCommand(_))));
        assert_eq!(err.to_string(), "Handler error: Invalid command: Usage: /backup");

        let err: DbotError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, DbotError::Io(_)));
    }
}
