//! Scope-guarded pull-request capabilities.
//!
//! Each capability is bound to one repository, one API client and one
//! agent context at construction. Its typed `invoke` runs the network path
//! inside a [`ScopeGuard`](crewgate_identity::ScopeGuard); the
//! [`Tool`](crewgate_core::Tool) impl is the JSON face given to agents.

mod details;
mod list;
mod review;

pub use details::{DetailsArgs, GetPullRequestDetail};
pub use list::ListPullRequests;
pub use review::{ReviewArgs, SubmitReview, FORCED_REVIEW_EVENT};

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crewgate_core::Tool;
use crewgate_identity::{AgentContext, Scope};

use crate::client::ApiClient;
use crate::error::{GitHubError, GitHubResult};
use crate::repo::RepoTarget;

pub const LIST_TOOL: &str = "github_pr_list";
pub const DETAILS_TOOL: &str = "github_pr_details";
pub const REVIEW_TOOL: &str = "github_pr_review";

pub const LIST_CAPABILITY: &str = "GitHubPRListTool";
pub const DETAILS_CAPABILITY: &str = "GitHubPRDetailsTool";
pub const REVIEW_CAPABILITY: &str = "GitHubPRReviewTool";

/// All tool names, in pipeline order.
pub const TOOL_NAMES: [&str; 3] = [LIST_TOOL, DETAILS_TOOL, REVIEW_TOOL];

/// Capability name behind a tool name.
pub fn capability_for(tool: &str) -> Option<&'static str> {
    match tool {
        LIST_TOOL => Some(LIST_CAPABILITY),
        DETAILS_TOOL => Some(DETAILS_CAPABILITY),
        REVIEW_TOOL => Some(REVIEW_CAPABILITY),
        _ => None,
    }
}

/// Scope required to call a tool.
pub fn scope_for(tool: &str) -> Option<Scope> {
    capability_for(tool).map(Scope::for_tool)
}

/// What a capability is bound to.
#[derive(Debug, Clone)]
pub struct ToolBinding {
    pub repo: RepoTarget,
    pub client: ApiClient,
    pub context: AgentContext,
}

impl ToolBinding {
    pub fn new(repo: RepoTarget, client: ApiClient, context: AgentContext) -> Self {
        Self {
            repo,
            client,
            context,
        }
    }
}

/// Bind the named tool.
pub fn bind_tool(name: &str, binding: ToolBinding) -> GitHubResult<Arc<dyn Tool>> {
    let tool: Arc<dyn Tool> = match name {
        LIST_TOOL => Arc::new(ListPullRequests::new(binding)),
        DETAILS_TOOL => Arc::new(GetPullRequestDetail::new(binding)),
        REVIEW_TOOL => Arc::new(SubmitReview::new(binding)),
        other => return Err(GitHubError::UnknownTool(other.to_string())),
    };
    Ok(tool)
}

/// Pull-request number, accepted as an integer or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PrNumber(pub u64);

impl PrNumber {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PrNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PrNumber {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl<'de> Deserialize<'de> for PrNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Int(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Int(n) => Ok(Self(n)),
            Repr::Text(s) => s.trim().parse::<u64>().map(Self).map_err(|_| {
                serde::de::Error::custom(format!("invalid pull request number '{}'", s))
            }),
        }
    }
}

fn check_number(number: PrNumber) -> GitHubResult<u64> {
    if number.0 == 0 {
        return Err(GitHubError::InvalidArguments(
            "Pull request numbers start at 1".to_string(),
        ));
    }
    Ok(number.0)
}

fn decode<T: DeserializeOwned>(resource: &str, value: Value) -> GitHubResult<T> {
    serde_json::from_value(value).map_err(|e| GitHubError::decode(resource, e))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use crewgate_identity::{Credentials, IdentityProvider, ScopeGrants};

    use super::*;
    use crate::mock::MockTransport;
    use crate::settings::ApiSettings;

    pub const REPO: &str = "octo/widgets";

    pub fn provider() -> IdentityProvider {
        let credentials = Credentials::new("proj", "client", "secret").unwrap();
        let grants = ScopeGrants::new()
            .grant("pr-analyzer-agent", Scope::for_tool(LIST_CAPABILITY))
            .grant("pr-analyzer-agent", Scope::for_tool(DETAILS_CAPABILITY))
            .grant("code-reviewer-agent", Scope::for_tool(DETAILS_CAPABILITY))
            .grant("pr-reviewer-agent", Scope::for_tool(REVIEW_CAPABILITY));
        IdentityProvider::builder(credentials).grants(grants).build()
    }

    pub fn binding(provider: &IdentityProvider, role: &str, transport: &MockTransport) -> ToolBinding {
        let settings = ApiSettings::new("http://api.test").with_identity_headers("user-1", "urn:res:1");
        ToolBinding::new(
            RepoTarget::parse(REPO).unwrap(),
            ApiClient::new(settings, Arc::new(transport.clone())),
            provider.create_agent_context(role).unwrap(),
        )
    }

    pub fn raw_pull(number: u64, title: &str) -> Value {
        json!({
            "number": number,
            "title": title,
            "state": "open",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-02T10:00:00Z",
            "user": {"login": "octocat"},
            "html_url": format!("https://example.test/octo/widgets/pull/{}", number),
            "body": "Adds a widget"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pr_number_accepts_int_and_string() {
        let n: PrNumber = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(n.get(), 42);
        let n: PrNumber = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(n.get(), 42);
        assert!(serde_json::from_value::<PrNumber>(json!("forty-two")).is_err());
    }

    #[test]
    fn test_scope_for_tool() {
        assert_eq!(
            scope_for(REVIEW_TOOL).unwrap().as_str(),
            "app:tool:GitHubPRReviewTool"
        );
        assert!(scope_for("github_issue_list").is_none());
    }
}
