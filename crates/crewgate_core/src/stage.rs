//! Pipeline stages and the context a stage runs in.
//!
//! A stage pairs one [`Agent`] with one [`TaskSpec`]. While a stage runs, the
//! agent runtime sees a [`StageContext`]: the task, the agent, a read-only view
//! of the previous stage's output, and `call_tool` for invoking the agent's
//! tools. Every call made through the context is recorded for the audit trail.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn perform(&self, ctx: &mut StageContext<'_>) -> CoreResult<StageOutput> {
//!     let prs = ctx.call_tool("github_pr_list", json!({})).await?;
//!     Ok(ctx.output("Listed pull requests").with_data(prs))
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::error::{CoreError, CoreResult};
use crate::task::TaskSpec;
use crate::tool::{structured_error, ToolCall, ToolCallStatus};

/// One step of a pipeline.
#[derive(Debug)]
pub struct Stage {
    task: TaskSpec,
    agent: Agent,
}

impl Stage {
    pub fn new(task: TaskSpec, agent: Agent) -> Self {
        Self { task, agent }
    }

    /// Stage name (the task name).
    pub fn name(&self) -> &str {
        &self.task.name
    }

    pub fn task(&self) -> &TaskSpec {
        &self.task
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

/// Output produced by a stage and handed to the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    pub stage: String,
    pub agent: String,
    /// Human-readable summary
    pub summary: String,
    /// Structured data (may itself be a structured error value)
    pub data: Value,
}

impl StageOutput {
    pub fn new(stage: impl Into<String>, agent: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            agent: agent.into(),
            summary: summary.into(),
            data: Value::Null,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// The error message if the stage's data is a structured error value.
    pub fn structured_error(&self) -> Option<&str> {
        structured_error(&self.data)
    }
}

/// Stage state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl Default for StageState {
    fn default() -> Self {
        Self::Pending
    }
}

/// Execution record for one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    pub index: usize,
    pub stage: String,
    pub agent: String,
    pub state: StageState,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub output: Option<StageOutput>,
    pub tool_calls: Vec<ToolCall>,
    pub error: Option<String>,
}

impl StageRecord {
    pub fn pending(index: usize, stage: &Stage) -> Self {
        Self {
            index,
            stage: stage.name().to_string(),
            agent: stage.agent().name().to_string(),
            state: StageState::Pending,
            started_at: None,
            completed_at: None,
            output: None,
            tool_calls: Vec::new(),
            error: None,
        }
    }

    /// Number of tool calls that returned a structured error value.
    pub fn structured_errors(&self) -> usize {
        self.tool_calls
            .iter()
            .filter(|c| c.status == ToolCallStatus::StructuredError)
            .count()
    }
}

/// What the agent runtime sees while performing a stage.
pub struct StageContext<'a> {
    index: usize,
    total: usize,
    stage: &'a Stage,
    prior: Option<&'a StageOutput>,
    calls: Vec<ToolCall>,
}

impl<'a> StageContext<'a> {
    pub fn new(index: usize, total: usize, stage: &'a Stage, prior: Option<&'a StageOutput>) -> Self {
        Self {
            index,
            total,
            stage,
            prior,
            calls: Vec::new(),
        }
    }

    /// Zero-based position of this stage.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn stage(&self) -> &'a Stage {
        self.stage
    }

    pub fn task(&self) -> &'a TaskSpec {
        self.stage.task()
    }

    pub fn agent(&self) -> &'a Agent {
        self.stage.agent()
    }

    /// Output of the previous stage, if any.
    pub fn prior(&self) -> Option<&'a StageOutput> {
        self.prior
    }

    /// Start an output for this stage.
    pub fn output(&self, summary: impl Into<String>) -> StageOutput {
        StageOutput::new(self.stage.name(), self.agent().name(), summary)
    }

    /// Calls made so far.
    pub fn calls(&self) -> &[ToolCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<ToolCall> {
        self.calls
    }

    /// Invoke one of the agent's tools.
    ///
    /// Fails with [`CoreError::ToolNotFound`] for tools outside the agent's
    /// toolbox. Structured error values are returned as `Ok` and recorded.
    pub async fn call_tool(&mut self, name: &str, args: Value) -> CoreResult<Value> {
        let agent = self.agent();
        let tool = agent.tools().get(name).ok_or_else(|| CoreError::ToolNotFound {
            agent: agent.name().to_string(),
            tool: name.to_string(),
        })?;

        info!("[{}] {} calls {}", self.stage.name(), agent.name(), name);
        debug!("{} args: {}", name, args);

        let started_at = Utc::now();
        let result = tool.call(args.clone()).await;
        let completed_at = Utc::now();

        let (status, error) = match &result {
            Ok(value) => match structured_error(value) {
                Some(message) => {
                    warn!("{} returned an error value: {}", name, message);
                    (ToolCallStatus::StructuredError, Some(message.to_string()))
                }
                None => (ToolCallStatus::Ok, None),
            },
            Err(e) => (ToolCallStatus::Failed, Some(e.to_string())),
        };

        self.calls.push(ToolCall {
            tool: name.to_string(),
            scope: tool.required_scope().to_string(),
            args,
            status,
            error,
            started_at,
            completed_at,
        });

        result
    }
}
