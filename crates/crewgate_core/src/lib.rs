//! # crewgate_core
//!
//! Sequential pipeline engine for crewgate.
//!
//! This crate provides the stage/pipeline model that threads agent outputs
//! from one stage to the next, and the tool interface through which agents
//! reach scope-guarded external operations.
//!
//! # Architecture
//!
//! - **Tools**: scope-guarded operations exposed to agents as JSON in / JSON out
//! - **Agents**: a persona bound to an identity context and a toolbox
//! - **Stages**: one agent paired with one task template
//! - **Pipeline**: a fixed array of stages executed strictly in order
//! - **AgentRuntime**: the external engine that performs each stage's task
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use crewgate_core::{Agent, Persona, Pipeline, Stage, TaskSpec, Toolbox};
//!
//! let agent = Agent::new(persona, provider.create_agent_context("pr-analyzer-agent")?, tools);
//! let stages = [
//!     Stage::new(analyze, agent),
//!     Stage::new(review, reviewer),
//!     Stage::new(submit, submitter),
//! ];
//!
//! let mut pipeline = Pipeline::new("pr-review", stages, Arc::new(runtime))?;
//! let log = pipeline.run().await?;
//! println!("{}", log.final_output().unwrap().summary);
//! ```

pub mod agent;
pub mod error;
pub mod pipeline;
pub mod runtime;
pub mod stage;
pub mod task;
pub mod tool;

// Re-export main types for convenience
pub use agent::{Agent, Persona};
pub use error::{CoreError, CoreResult};
pub use pipeline::{ExecutionLog, Pipeline, PipelineState};
pub use runtime::AgentRuntime;
pub use stage::{Stage, StageContext, StageOutput, StageRecord, StageState};
pub use task::TaskSpec;
pub use tool::{parse_args, structured_error, Tool, ToolCall, ToolCallStatus, Toolbox};
