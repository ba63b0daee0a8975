//! Error types for starsailors-core

use thiserror::Error;

/// Main error type for the starsailors-core library
#[derive(Error, Debug)]
pub enum Error {
    /// No valid user session accompanied the request
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed deployment mode, automaton, or target list
    #[error("{0}")]
    InvalidArgument(String),

    /// A read the decision depends on failed
    #[error("upstream read failed: {0}")]
    UpstreamRead(String),

    /// The claim batch could not be committed
    #[error("write failed: {0}")]
    Write(String),

    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A blocking storage task panicked, was cancelled, or hit a poisoned lock
    #[error("task error: {0}")]
    Task(String),
}

impl Error {
    /// HTTP status code the boundary should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Unauthorized => 401,
            Error::InvalidArgument(_) => 400,
            _ => 500,
        }
    }

    /// Shorthand for building an [`Error::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }
}

/// Result type alias for starsailors-core
pub type Result<T> = std::result::Result<T, Error>;
