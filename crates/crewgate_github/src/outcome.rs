//! Result-or-structured-error values returned by capabilities.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::transport::TransportError;

/// The `{"error": message}` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolError {
    pub error: String,
}

impl From<TransportError> for ToolError {
    fn from(err: TransportError) -> Self {
        Self { error: err.message }
    }
}

/// Either a capability's value or a structured error.
///
/// Serializes untagged, so a failure is exactly `{"error": message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Failed(ToolError),
    Done(T),
}

impl<T> Outcome<T> {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(ToolError {
            error: message.into(),
        })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(e) => Some(&e.error),
            Self::Done(_) => None,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Done(v) => Some(v),
            Self::Failed(_) => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Done(v) => Some(v),
            Self::Failed(_) => None,
        }
    }
}

impl<T> From<TransportError> for Outcome<T> {
    fn from(err: TransportError) -> Self {
        Self::Failed(err.into())
    }
}

impl<T: Serialize> Outcome<Vec<T>> {
    /// JSON form of a list result: failures become `[{"error": message}]`.
    pub fn to_list_json(&self) -> serde_json::Result<Value> {
        match self {
            Self::Failed(e) => Ok(Value::Array(vec![serde_json::to_value(e)?])),
            Self::Done(items) => serde_json::to_value(items),
        }
    }
}
