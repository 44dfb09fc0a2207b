use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crewgate_core::{parse_args, CoreResult, Tool};
use crewgate_identity::{AccessToken, GuardPass, Scope, ScopeGuard};

use super::{check_number, decode, PrNumber, ToolBinding, DETAILS_CAPABILITY, DETAILS_TOOL};
use crate::error::GitHubResult;
use crate::models::PullRequestDetail;
use crate::outcome::Outcome;
use crate::transport::TransportError;

/// Arguments of `github_pr_details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsArgs {
    pub pr_number: PrNumber,
}

/// Aggregates a pull request with its files, commits and comments.
#[derive(Debug, Clone)]
pub struct GetPullRequestDetail {
    binding: ToolBinding,
    guard: ScopeGuard,
}

struct Parts {
    pull: Value,
    files: Value,
    commits: Value,
    comments: Value,
}

impl GetPullRequestDetail {
    pub fn new(binding: ToolBinding) -> Self {
        Self {
            binding,
            guard: ScopeGuard::for_tool(DETAILS_CAPABILITY),
        }
    }

    /// Four GETs in order: detail, files, commits, comments.
    ///
    /// The first transport failure ends the call with a single structured
    /// error; nothing fetched before it is returned.
    pub async fn invoke(&self, number: PrNumber) -> GitHubResult<Outcome<PullRequestDetail>> {
        let number = check_number(number)?;
        self.guard
            .run(&self.binding.context, |pass| self.fetch(pass, number))
            .await?
    }

    async fn fetch(&self, pass: GuardPass, number: u64) -> GitHubResult<Outcome<PullRequestDetail>> {
        let token = pass.require_token()?;

        let parts = match self.fetch_parts(token, number).await {
            Ok(parts) => parts,
            Err(e) => {
                warn!("Fetching pull request #{} failed: {}", number, e);
                return Ok(e.into());
            }
        };

        let detail = PullRequestDetail::assemble(
            decode("pull request", parts.pull)?,
            decode("pull request files", parts.files)?,
            decode("pull request commits", parts.commits)?,
            decode("pull request comments", parts.comments)?,
        );

        info!(
            "Fetched pull request #{}: {} file(s), {} commit(s), {} comment(s)",
            number,
            detail.changed_files.len(),
            detail.commits.len(),
            detail.comments.len()
        );

        Ok(Outcome::Done(detail))
    }

    async fn fetch_parts(&self, token: &AccessToken, number: u64) -> Result<Parts, TransportError> {
        let client = &self.binding.client;
        let path = self.binding.repo.pull_path(number);

        let pull = client.get(token, &path).await?;
        let files = client.get(token, &format!("{}/files", path)).await?;
        let commits = client.get(token, &format!("{}/commits", path)).await?;
        let comments = client.get(token, &format!("{}/comments", path)).await?;

        Ok(Parts {
            pull,
            files,
            commits,
            comments,
        })
    }
}

#[async_trait]
impl Tool for GetPullRequestDetail {
    fn name(&self) -> &str {
        DETAILS_TOOL
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific pull request"
    }

    fn required_scope(&self) -> &Scope {
        self.guard.required_scope()
    }

    async fn call(&self, args: Value) -> CoreResult<Value> {
        let args: DetailsArgs = parse_args(DETAILS_TOOL, args)?;
        let outcome = self
            .invoke(args.pr_number)
            .await
            .map_err(|e| e.into_core(DETAILS_TOOL))?;
        Ok(serde_json::to_value(outcome)?)
    }
}
