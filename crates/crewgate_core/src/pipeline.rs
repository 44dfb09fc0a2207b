//! Strictly sequential pipeline executor.
//!
//! A [`Pipeline`] owns a fixed array of stages. `run` executes them in order,
//! handing each stage a read-only view of the previous stage's output. Stage
//! `i + 1` never starts before stage `i` has returned. Nothing is retried.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::runtime::AgentRuntime;
use crate::stage::{Stage, StageContext, StageOutput, StageRecord, StageState};

/// Overall pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Pipeline has not started
    NotStarted,
    /// A stage is running
    InProgress,
    /// All stages returned
    Finished,
    /// A stage raised a non-recoverable error
    Aborted,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// Record of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// Unique execution ID
    pub execution_id: Uuid,
    /// Pipeline name
    pub pipeline: String,
    /// Execution state
    pub state: PipelineState,
    /// One record per stage, in order
    pub stages: Vec<StageRecord>,
    /// When execution started
    pub started_at: Option<DateTime<Utc>>,
    /// When execution finished or aborted
    pub completed_at: Option<DateTime<Utc>>,
    /// Error message if aborted
    pub error: Option<String>,
    /// Whether the abort was a scope denial
    #[serde(default)]
    pub denied: bool,
}

impl ExecutionLog {
    fn new(pipeline: impl Into<String>, stages: &[Stage]) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            pipeline: pipeline.into(),
            state: PipelineState::NotStarted,
            stages: stages
                .iter()
                .enumerate()
                .map(|(i, s)| StageRecord::pending(i, s))
                .collect(),
            started_at: None,
            completed_at: None,
            error: None,
            denied: false,
        }
    }

    /// Output of the last stage, once the pipeline has finished.
    pub fn final_output(&self) -> Option<&StageOutput> {
        if self.state != PipelineState::Finished {
            return None;
        }
        self.stages.last().and_then(|r| r.output.as_ref())
    }

    /// Output of a stage by name.
    pub fn output_of(&self, stage: &str) -> Option<&StageOutput> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .and_then(|r| r.output.as_ref())
    }

    /// The stage that failed, if any.
    pub fn failed_stage(&self) -> Option<&str> {
        self.stages
            .iter()
            .find(|r| r.state == StageState::Failed)
            .map(|r| r.stage.as_str())
    }

    /// Total structured error values observed across all stages.
    pub fn structured_errors(&self) -> usize {
        self.stages.iter().map(|r| r.structured_errors()).sum()
    }
}

/// A fixed-length, strictly ordered sequence of stages.
pub struct Pipeline<const N: usize> {
    name: String,
    stages: [Stage; N],
    runtime: Arc<dyn AgentRuntime>,
    state: PipelineState,
}

impl<const N: usize> Pipeline<N> {
    /// Create a pipeline. Stage names must be unique and there must be at least one stage.
    pub fn new(
        name: impl Into<String>,
        stages: [Stage; N],
        runtime: Arc<dyn AgentRuntime>,
    ) -> CoreResult<Self> {
        if N == 0 {
            return Err(CoreError::Configuration(
                "A pipeline needs at least one stage".to_string(),
            ));
        }
        for (i, stage) in stages.iter().enumerate() {
            if stages[..i].iter().any(|s| s.name() == stage.name()) {
                return Err(CoreError::Configuration(format!(
                    "Duplicate stage name: {}",
                    stage.name()
                )));
            }
        }

        Ok(Self {
            name: name.into(),
            stages,
            runtime,
            state: PipelineState::NotStarted,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stages(&self) -> &[Stage; N] {
        &self.stages
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Run every stage in order and return the execution log.
    ///
    /// The last stage's output is available through
    /// [`ExecutionLog::final_output`]. If a stage raises, the pipeline is
    /// aborted and the partial log is returned inside
    /// [`CoreError::Aborted`]. A pipeline runs at most once.
    pub async fn run(&mut self) -> CoreResult<ExecutionLog> {
        if self.state != PipelineState::NotStarted {
            return Err(CoreError::InvalidState(format!(
                "Pipeline {} has already run (state={:?})",
                self.name, self.state
            )));
        }

        let mut log = ExecutionLog::new(&self.name, &self.stages);
        self.state = PipelineState::InProgress;
        log.state = PipelineState::InProgress;
        log.started_at = Some(Utc::now());

        info!(
            "Starting pipeline: {} ({}) with runtime {}",
            self.name,
            log.execution_id,
            self.runtime.name()
        );

        for (i, stage) in self.stages.iter().enumerate() {
            let (done, rest) = log.stages.split_at_mut(i);
            let prior = done.last().and_then(|r| r.output.as_ref());
            let record = &mut rest[0];

            info!(
                "Executing stage [{}/{}]: {} (agent {})",
                i + 1,
                N,
                stage.name(),
                stage.agent().name()
            );
            record.state = StageState::Running;
            record.started_at = Some(Utc::now());

            let mut ctx = StageContext::new(i, N, stage, prior);
            let result = self.runtime.perform(&mut ctx).await;
            record.tool_calls = ctx.into_calls();
            record.completed_at = Some(Utc::now());

            match result {
                Ok(output) => {
                    if let Some(message) = output.structured_error() {
                        warn!("Stage '{}' produced an error value: {}", stage.name(), message);
                    }
                    record.state = StageState::Completed;
                    record.output = Some(output);
                    info!("Stage '{}' completed", stage.name());
                }
                Err(e) => {
                    let message = e.to_string();
                    error!("Stage '{}' aborted the pipeline: {}", stage.name(), message);
                    record.state = StageState::Failed;
                    record.error = Some(message.clone());

                    log.state = PipelineState::Aborted;
                    log.error = Some(message.clone());
                    log.denied = e.is_scope_denied();
                    log.completed_at = Some(Utc::now());
                    self.state = PipelineState::Aborted;

                    return Err(CoreError::Aborted {
                        pipeline: self.name.clone(),
                        stage: stage.name().to_string(),
                        message,
                        log: Box::new(log),
                    });
                }
            }
        }

        log.state = PipelineState::Finished;
        log.completed_at = Some(Utc::now());
        self.state = PipelineState::Finished;

        info!(
            "Pipeline '{}' finished ({} structured error value(s))",
            self.name,
            log.structured_errors()
        );
        Ok(log)
    }
}

impl<const N: usize> std::fmt::Debug for Pipeline<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stages.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("runtime", &self.runtime.name())
            .field("state", &self.state)
            .finish()
    }
}
