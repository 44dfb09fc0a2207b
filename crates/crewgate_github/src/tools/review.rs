use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crewgate_core::{parse_args, CoreResult, Tool};
use crewgate_identity::{GuardPass, Scope, ScopeGuard};

use super::{check_number, PrNumber, ToolBinding, REVIEW_CAPABILITY, REVIEW_TOOL};
use crate::error::GitHubResult;
use crate::outcome::Outcome;

/// Event sent with every review, whatever the caller asks for.
pub const FORCED_REVIEW_EVENT: &str = "COMMENT";

fn default_event() -> String {
    FORCED_REVIEW_EVENT.to_string()
}

/// Arguments of `github_pr_review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewArgs {
    pub pr_number: PrNumber,
    /// Requested event (`APPROVE`, `REQUEST_CHANGES`, `COMMENT`)
    #[serde(default = "default_event")]
    pub event: String,
    pub body: String,
}

impl ReviewArgs {
    pub fn new(pr_number: impl Into<PrNumber>, event: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            pr_number: pr_number.into(),
            event: event.into(),
            body: body.into(),
        }
    }
}

/// Posts a review on a pull request.
#[derive(Debug, Clone)]
pub struct SubmitReview {
    binding: ToolBinding,
    guard: ScopeGuard,
}

impl SubmitReview {
    pub fn new(binding: ToolBinding) -> Self {
        Self {
            binding,
            guard: ScopeGuard::for_tool(REVIEW_CAPABILITY),
        }
    }

    /// POST the review and return the created review as the API sent it.
    pub async fn invoke(&self, args: ReviewArgs) -> GitHubResult<Outcome<Value>> {
        let number = check_number(args.pr_number)?;
        self.guard
            .run(&self.binding.context, |pass| self.submit(pass, number, args))
            .await?
    }

    async fn submit(&self, pass: GuardPass, number: u64, args: ReviewArgs) -> GitHubResult<Outcome<Value>> {
        let token = pass.require_token()?;

        info!(
            "Reviewing pull request #{} (requested event {}, sending {})",
            number, args.event, FORCED_REVIEW_EVENT
        );
        if !args.event.eq_ignore_ascii_case(FORCED_REVIEW_EVENT) {
            warn!(
                "Review event {} replaced by {} for pull request #{}",
                args.event, FORCED_REVIEW_EVENT, number
            );
        }

        let payload = json!({
            "event": FORCED_REVIEW_EVENT,
            "body": args.body,
            "comments": [],
        });
        let path = format!("{}/reviews", self.binding.repo.pull_path(number));

        match self.binding.client.post(token, &path, payload).await {
            Ok(review) => {
                info!("Review submitted on pull request #{}", number);
                Ok(Outcome::Done(review))
            }
            Err(e) => {
                warn!("Review of pull request #{} failed: {}", number, e);
                Ok(e.into())
            }
        }
    }
}

#[async_trait]
impl Tool for SubmitReview {
    fn name(&self) -> &str {
        REVIEW_TOOL
    }

    fn description(&self) -> &str {
        "Create a review for a pull request"
    }

    fn required_scope(&self) -> &Scope {
        self.guard.required_scope()
    }

    async fn call(&self, args: Value) -> CoreResult<Value> {
        let args: ReviewArgs = parse_args(REVIEW_TOOL, args)?;
        let outcome = self.invoke(args).await.map_err(|e| e.into_core(REVIEW_TOOL))?;
        Ok(serde_json::to_value(outcome)?)
    }
}
