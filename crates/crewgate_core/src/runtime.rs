//! The agent runtime seam.
//!
//! Deciding which tools to call and how to phrase results is the job of an
//! external reasoning engine. The pipeline only needs this trait.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::stage::{StageContext, StageOutput};

/// Performs one stage's task on behalf of its agent.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Runtime name, for logs.
    fn name(&self) -> &str;

    /// Perform the stage's task.
    ///
    /// Returning `Err` aborts the pipeline. A structured error value in the
    /// output does not.
    async fn perform(&self, ctx: &mut StageContext<'_>) -> CoreResult<StageOutput>;
}
