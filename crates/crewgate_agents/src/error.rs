//! Error types for the review crew.

use thiserror::Error;

use crewgate_core::CoreError;
use crewgate_github::GitHubError;
use crewgate_identity::IdentityError;

/// Result type alias for crew operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur while configuring or building the crew.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid crew configuration: {0}")]
    Config(String),

    #[error("Unknown agent role: {0}")]
    UnknownRole(String),

    #[error("Agent {agent} lists unknown tool: {tool}")]
    UnknownTool { agent: String, tool: String },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline error: {0}")]
    Core(#[from] CoreError),

    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl AgentError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether this error should be reported as a configuration problem.
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Config(_) | Self::UnknownRole(_) | Self::UnknownTool { .. } | Self::Yaml(_) | Self::Io(_) => true,
            Self::GitHub(e) => matches!(
                e,
                GitHubError::InvalidRepository(_) | GitHubError::InvalidSettings(_) | GitHubError::UnknownTool(_)
            ),
            Self::Identity(e) => matches!(e, IdentityError::AuthConfiguration(_) | IdentityError::InvalidScope(_)),
            Self::Core(e) => matches!(e, CoreError::Configuration(_)),
        }
    }
}
