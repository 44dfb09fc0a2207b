//! Tool interface and per-agent toolboxes.
//!
//! A [`Tool`] is one bound, scope-guarded external operation as seen by an
//! agent runtime: it takes JSON arguments and returns a JSON result. Concrete
//! capabilities also expose a typed `invoke`; this trait is the object-safe
//! face used to hand tools to agents.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crewgate_identity::Scope;

use crate::error::{CoreError, CoreResult};

/// An externally-effectful operation an agent may call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used by agents (e.g. `github_pr_list`).
    fn name(&self) -> &str;

    /// Human-readable description of the tool.
    fn description(&self) -> &str;

    /// Scope the caller must hold.
    fn required_scope(&self) -> &Scope;

    /// Invoke the tool with JSON arguments.
    ///
    /// Transport failures come back as structured error values inside `Ok`.
    /// Authorization failures and programming errors are `Err`.
    async fn call(&self, args: Value) -> CoreResult<Value>;
}

/// The set of tools bound to one agent.
#[derive(Clone, Default)]
pub struct Toolbox {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl Toolbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        debug!("Registering tool: {}", name);
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Scopes required by all tools in this box.
    pub fn required_scopes(&self) -> Vec<Scope> {
        self.tools.values().map(|t| t.required_scope().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for Toolbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolbox")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// How a tool call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    /// Returned a normal result.
    Ok,
    /// Returned a structured `{error}` value.
    StructuredError,
    /// Raised (denied or programming error).
    Failed,
}

/// Audit record for a single tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    pub scope: String,
    pub args: Value,
    pub status: ToolCallStatus,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Extract the message of a structured error value.
///
/// Recognizes `{"error": "..."}` and the single-element list form
/// `[{"error": "..."}]`.
pub fn structured_error(value: &Value) -> Option<&str> {
    match value {
        Value::Object(map) if map.len() == 1 => map.get("error").and_then(Value::as_str),
        Value::Array(items) if items.len() == 1 => structured_error(&items[0]),
        _ => None,
    }
}

/// Deserialize tool arguments, mapping failures to [`CoreError::InvalidArguments`].
pub fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, args: Value) -> CoreResult<T> {
    serde_json::from_value(args).map_err(|e| CoreError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool {
        scope: Scope,
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes its arguments"
        }

        fn required_scope(&self) -> &Scope {
            &self.scope
        }

        async fn call(&self, args: Value) -> CoreResult<Value> {
            Ok(args)
        }
    }

    #[test]
    fn test_toolbox_register_and_lookup() {
        let toolbox = Toolbox::new().with(Arc::new(EchoTool {
            scope: Scope::for_tool("EchoTool"),
        }));

        assert_eq!(toolbox.len(), 1);
        assert!(toolbox.contains("echo"));
        assert!(toolbox.get("missing").is_none());
        assert_eq!(toolbox.required_scopes(), vec![Scope::for_tool("EchoTool")]);
    }

    #[test]
    fn test_structured_error_shapes() {
        assert_eq!(structured_error(&json!({"error": "boom"})), Some("boom"));
        assert_eq!(structured_error(&json!([{"error": "boom"}])), Some("boom"));
        assert_eq!(structured_error(&json!([])), None);
        assert_eq!(structured_error(&json!({"number": 1})), None);
        assert_eq!(structured_error(&json!({"error": "x", "number": 1})), None);
        assert_eq!(structured_error(&json!([{"number": 1}, {"error": "x"}])), None);
    }

    #[test]
    fn test_parse_args_reports_tool() {
        #[derive(Debug, Deserialize)]
        struct Args {
            #[allow(dead_code)]
            pr_number: u64,
        }

        let err = parse_args::<Args>("github_pr_details", json!({})).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArguments { ref tool, .. } if tool == "github_pr_details"));
    }
}
