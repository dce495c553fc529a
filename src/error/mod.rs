use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Prompt of ~{tokens} tokens exceeds the {limit}-token context window of {model}")]
    ContextLimit {
        tokens: usize,
        limit: usize,
        model: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse provider response: {0}")]
    Parsing(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Secure storage error: {0}")]
    SecureStorage(#[from] keyring::Error),
}

/// Closed classification of every [`Error`], used for retry decisions and
/// for the error-log record handed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    RateLimit,
    Validation,
    ContextLimit,
    Network,
    Parsing,
    Configuration,
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        match self {
            ErrorKind::RateLimit | ErrorKind::Network | ErrorKind::Parsing => true,
            ErrorKind::Authentication
            | ErrorKind::Validation
            | ErrorKind::ContextLimit
            | ErrorKind::Configuration => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Authentication => "authentication_error",
            ErrorKind::RateLimit => "rate_limit_error",
            ErrorKind::Validation => "validation_error",
            ErrorKind::ContextLimit => "context_limit_error",
            ErrorKind::Network => "network_error",
            ErrorKind::Parsing => "parsing_error",
            ErrorKind::Configuration => "configuration_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Error::Authentication(msg.into())
    }

    pub fn rate_limit(msg: impl Into<String>) -> Self {
        Error::RateLimit(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn context_limit(tokens: usize, limit: usize, model: impl Into<String>) -> Self {
        Error::ContextLimit {
            tokens,
            limit,
            model: model.into(),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Error::Network(msg.into())
    }

    pub fn parsing(msg: impl Into<String>) -> Self {
        Error::Parsing(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::RateLimit(_) => ErrorKind::RateLimit,
            Error::Validation(_) => ErrorKind::Validation,
            Error::ContextLimit { .. } => ErrorKind::ContextLimit,
            Error::Network(_) => ErrorKind::Network,
            Error::Parsing(_) => ErrorKind::Parsing,
            Error::Configuration(_)
            | Error::Config(_)
            | Error::Io(_)
            | Error::SecureStorage(_) => ErrorKind::Configuration,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}
