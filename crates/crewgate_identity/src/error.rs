//! Error types for the identity module.

use thiserror::Error;

/// Result type alias for identity operations.
pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors that can occur while authenticating or authorizing agents.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Authentication configuration error: {0}")]
    AuthConfiguration(String),

    #[error("Scope denied: agent '{role}' does not hold '{scope}'")]
    ScopeDenied { role: String, scope: String },

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Token issue failed: {0}")]
    TokenIssue(String),

    #[error("Identity for agent '{0}' is no longer available")]
    ContextExpired(String),
}

impl IdentityError {
    /// Create a scope denied error.
    pub fn scope_denied(role: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::ScopeDenied {
            role: role.into(),
            scope: scope.into(),
        }
    }

    /// Whether this error is an authorization denial.
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::ScopeDenied { .. })
    }
}
