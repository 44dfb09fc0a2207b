//! # crewgate_github
//!
//! Scope-guarded pull-request capabilities for crewgate.
//!
//! Each capability wraps its network path in a
//! [`ScopeGuard`](crewgate_identity::ScopeGuard). Requests go through an
//! [`HttpTransport`]; transport and HTTP failures come back as structured
//! `{"error": message}` values while authorization failures stay errors.
//!
//! # Capabilities
//!
//! - **github_pr_list**: open pull requests of the bound repository
//! - **github_pr_details**: one pull request with files, commits and comments
//! - **github_pr_review**: post a review (the event is always `COMMENT`)
//!
//! # Example
//!
//! ```rust,ignore
//! use crewgate_github::{ApiClient, ApiSettings, ListPullRequests, RepoTarget, ToolBinding};
//!
//! let context = provider.create_agent_context("pr-analyzer-agent")?;
//! let binding = ToolBinding::new(
//!     RepoTarget::parse("octo/widgets")?,
//!     ApiClient::http(ApiSettings::from_env()),
//!     context,
//! );
//!
//! let prs = ListPullRequests::new(binding).invoke().await?;
//! ```

pub mod client;
pub mod error;
pub mod mock;
pub mod models;
pub mod outcome;
pub mod repo;
pub mod settings;
pub mod tools;
pub mod transport;

pub use client::ApiClient;
pub use error::{GitHubError, GitHubResult};
pub use mock::{CapturedRequest, MockTransport};
pub use models::{ChangedFile, CommentInfo, CommitInfo, PullRequestDetail, PullRequestSummary};
pub use outcome::{Outcome, ToolError};
pub use repo::{RepoTarget, DEFAULT_REPO, REPO_VAR};
pub use settings::ApiSettings;
pub use tools::{
    bind_tool, capability_for, scope_for, DetailsArgs, GetPullRequestDetail, ListPullRequests,
    PrNumber, ReviewArgs, SubmitReview, ToolBinding, FORCED_REVIEW_EVENT, TOOL_NAMES,
};
pub use transport::{ApiRequest, HttpTransport, Method, ReqwestTransport, TransportError};
