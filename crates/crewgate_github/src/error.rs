//! Error types for the GitHub capabilities.
//!
//! Transport failures are not errors here: they become structured
//! [`Outcome`](crate::outcome::Outcome) values. What remains are
//! authorization failures and programming errors.

use thiserror::Error;

use crewgate_core::CoreError;
use crewgate_identity::IdentityError;

/// Result type alias for GitHub capability operations.
pub type GitHubResult<T> = Result<T, GitHubError>;

/// Errors raised by capabilities (never transport failures).
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Invalid repository identifier '{0}', expected 'owner/repo'")]
    InvalidRepository(String),

    #[error("Invalid API settings: {0}")]
    InvalidSettings(String),

    #[error("Authorization error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Unexpected {resource} payload: {message}")]
    Decode { resource: String, message: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl GitHubError {
    pub fn decode(resource: impl Into<String>, err: serde_json::Error) -> Self {
        Self::Decode {
            resource: resource.into(),
            message: err.to_string(),
        }
    }

    /// Convert into a pipeline error attributed to `tool`.
    pub fn into_core(self, tool: &str) -> CoreError {
        match self {
            Self::Identity(e) => CoreError::Identity(e),
            Self::InvalidArguments(message) => CoreError::InvalidArguments {
                tool: tool.to_string(),
                message,
            },
            other => CoreError::tool(tool, other.to_string()),
        }
    }
}
