//! Error types for the core module.

use thiserror::Error;

use crate::pipeline::ExecutionLog;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during pipeline operations.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Tool not available to agent '{agent}': {tool}")]
    ToolNotFound { agent: String, tool: String },

    #[error("Tool '{tool}' failed: {message}")]
    Tool { tool: String, message: String },

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("Authorization error: {0}")]
    Identity(#[from] crewgate_identity::IdentityError),

    #[error("Stage execution failed: {stage} - {message}")]
    StageFailed { stage: String, message: String },

    #[error("Pipeline '{pipeline}' aborted at stage '{stage}': {message}")]
    Aborted {
        pipeline: String,
        stage: String,
        message: String,
        log: Box<ExecutionLog>,
    },

    #[error("Invalid pipeline state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn stage_failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Whether this error, or the error that aborted a pipeline, is a scope denial.
    pub fn is_scope_denied(&self) -> bool {
        match self {
            Self::Identity(e) => e.is_denied(),
            Self::Aborted { log, .. } => log.denied,
            _ => false,
        }
    }

    /// The execution log attached to an aborted run.
    pub fn execution_log(&self) -> Option<&ExecutionLog> {
        match self {
            Self::Aborted { log, .. } => Some(log),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
