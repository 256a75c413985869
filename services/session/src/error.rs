//! services/session/src/error.rs
//!
//! Defines the primary error type for the session service.

use crate::config::ConfigError;
use lemuria_core::ports::CoreError;

/// The primary error type for the `session` service.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the core stores or ports.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// Represents a malformed or unserializable protocol message.
    #[error("Protocol error: {0}")]
    Json(#[from] serde_json::Error),

    /// Represents a standard Input/Output error on the protocol streams.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// A convenience type alias for `Result<T, SessionError>`.
pub type SessionResult<T> = Result<T, SessionError>;
