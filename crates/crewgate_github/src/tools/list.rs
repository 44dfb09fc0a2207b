use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crewgate_core::{CoreResult, Tool};
use crewgate_identity::{GuardPass, Scope, ScopeGuard};

use super::{decode, ToolBinding, LIST_CAPABILITY, LIST_TOOL};
use crate::error::GitHubResult;
use crate::models::{PullRequestSummary, RawPull};
use crate::outcome::Outcome;

/// Lists open pull requests of the bound repository.
#[derive(Debug, Clone)]
pub struct ListPullRequests {
    binding: ToolBinding,
    guard: ScopeGuard,
}

impl ListPullRequests {
    pub fn new(binding: ToolBinding) -> Self {
        Self {
            binding,
            guard: ScopeGuard::for_tool(LIST_CAPABILITY),
        }
    }

    /// One GET of the pulls collection, in API order.
    pub async fn invoke(&self) -> GitHubResult<Outcome<Vec<PullRequestSummary>>> {
        self.guard
            .run(&self.binding.context, |pass| self.fetch(pass))
            .await?
    }

    async fn fetch(&self, pass: GuardPass) -> GitHubResult<Outcome<Vec<PullRequestSummary>>> {
        let token = pass.require_token()?;
        let path = self.binding.repo.pulls_path();

        let body = match self.binding.client.get(token, &path).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Listing pull requests of {} failed: {}", self.binding.repo, e);
                return Ok(e.into());
            }
        };

        let pulls: Vec<RawPull> = decode("pull request list", body)?;
        info!("Found {} open pull request(s) in {}", pulls.len(), self.binding.repo);

        Ok(Outcome::Done(
            pulls.into_iter().map(PullRequestSummary::from).collect(),
        ))
    }
}

#[async_trait]
impl Tool for ListPullRequests {
    fn name(&self) -> &str {
        LIST_TOOL
    }

    fn description(&self) -> &str {
        "List all open pull requests in a repository"
    }

    fn required_scope(&self) -> &Scope {
        self.guard.required_scope()
    }

    async fn call(&self, _args: Value) -> CoreResult<Value> {
        let outcome = self.invoke().await.map_err(|e| e.into_core(LIST_TOOL))?;
        Ok(outcome.to_list_json()?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mock::MockTransport;
    use crate::tools::testing::{binding, provider, raw_pull};
    use crate::transport::Method;

    #[tokio::test]
    async fn test_lists_two_pull_requests_in_order() {
        let provider = provider();
        let transport = MockTransport::new().respond(
            Method::Get,
            "/repos/octo/widgets/pulls",
            json!([raw_pull(12, "First"), raw_pull(9, "Second")]),
        );
        let tool = ListPullRequests::new(binding(&provider, "pr-analyzer-agent", &transport));

        let outcome = tool.invoke().await.unwrap();
        let prs = outcome.into_value().unwrap();

        assert_eq!(prs.len(), 2);
        assert_eq!(prs[0].number, 12);
        assert_eq!(prs[0].title, "First");
        assert_eq!(prs[1].number, 9);
        assert_eq!(prs[1].user, "octocat");
    }

    #[tokio::test]
    async fn test_server_error_yields_error_list() {
        let provider = provider();
        let transport = MockTransport::new().fail(Method::Get, "/repos/octo/widgets/pulls", 500);
        let tool = ListPullRequests::new(binding(&provider, "pr-analyzer-agent", &transport));

        let value = tool.call(json!({})).await.unwrap();

        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0]["error"].as_str().unwrap().contains("500"));
        assert_eq!(crewgate_core::structured_error(&value), items[0]["error"].as_str());
    }

    #[tokio::test]
    async fn test_denied_without_network_call() {
        let provider = provider();
        let transport = MockTransport::new();
        let tool = ListPullRequests::new(binding(&provider, "pr-reviewer-agent", &transport));

        let err = tool.call(json!({})).await.unwrap_err();

        assert!(err.is_scope_denied());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sends_bearer_and_shared_headers() {
        let provider = provider();
        let transport = MockTransport::new().respond(Method::Get, "/repos/octo/widgets/pulls", json!([]));
        let tool = ListPullRequests::new(binding(&provider, "pr-analyzer-agent", &transport));

        tool.invoke().await.unwrap();

        let calls = transport.get_calls();
        assert_eq!(calls.len(), 1);
        let auth = calls[0].header("Authorization").unwrap();
        assert!(auth.starts_with("Bearer "));
        assert!(auth.len() > "Bearer ".len());
        assert_eq!(calls[0].header("Accept"), Some("application/vnd.github.v3+json"));
        assert_eq!(calls[0].header("X-USER-ID"), Some("user-1"));
        assert_eq!(calls[0].header("X-RESOURCE-URN"), Some("urn:res:1"));
    }

    #[tokio::test]
    async fn test_identical_responses_yield_identical_output() {
        let provider = provider();
        let transport = MockTransport::new().respond(
            Method::Get,
            "/repos/octo/widgets/pulls",
            json!([raw_pull(3, "Same")]),
        );
        let tool = ListPullRequests::new(binding(&provider, "pr-analyzer-agent", &transport));

        let first = tool.call(json!({})).await.unwrap();
        let second = tool.call(json!({})).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_missing_field_is_hard_error() {
        let provider = provider();
        let transport = MockTransport::new().respond(
            Method::Get,
            "/repos/octo/widgets/pulls",
            json!([{"number": 1}]),
        );
        let tool = ListPullRequests::new(binding(&provider, "pr-analyzer-agent", &transport));

        assert!(matches!(
            tool.invoke().await,
            Err(crate::error::GitHubError::Decode { .. })
        ));
    }
}
