//! Error types for EvalSenior

use thiserror::Error;

/// Result type alias for EvalSenior operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for EvalSenior operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error (bad endpoint, unreadable settings, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or transport failure while talking to a remote collaborator
    #[error("Network error: {0}")]
    Transport(String),

    /// Record missing from the collection
    #[error("Review {0} not found or link expired")]
    NotFound(String),

    /// Action refused in the current access mode
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// A delete confirmation arrived while another delete is still running
    #[error("A deletion is already in progress")]
    DeleteInFlight,

    /// A delete confirmation arrived without a prior request
    #[error("No deletion is awaiting confirmation")]
    NoPendingDelete,

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Text generation failure
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}
