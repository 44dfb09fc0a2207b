//! Task templates bound to pipeline stages.

use serde::{Deserialize, Serialize};

/// One task template: what a stage should do and what it should produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Task identifier (e.g. `analyze_prs`)
    pub name: String,
    /// Goal text for the agent
    pub description: String,
    /// Shape of the expected output
    pub expected_output: String,
}

impl TaskSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            expected_output: expected_output.into(),
        }
    }
}
