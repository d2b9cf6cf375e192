//! Error types for HTTP store operations

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the remote collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered something other than JSON
    #[error(
        "Invalid response format ({content_type}). Check the script permissions: \
         it must be deployed with access for \"Anyone\""
    )]
    NotJson { content_type: String },

    /// Endpoint answered with an error status
    #[error("{action} request failed with status {status}")]
    Status {
        action: &'static str,
        status: reqwest::StatusCode,
    },

    /// Endpoint URL is unusable
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// No text-generation API key configured
    #[error("API key missing")]
    MissingApiKey,

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<Error> for evalsenior_core::Error {
    fn from(err: Error) -> Self {
        use evalsenior_core::Error as Core;

        match err {
            Error::NotJson { .. } | Error::InvalidEndpoint(_) | Error::MissingApiKey => {
                Core::Config(err.to_string())
            }
            Error::Http(_) | Error::Status { .. } => Core::Transport(err.to_string()),
            Error::Parse(_) => Core::Other(err.to_string()),
        }
    }
}
