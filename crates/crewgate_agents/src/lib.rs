//! # crewgate_agents
//!
//! The pull-request review crew.
//!
//! This crate turns the declarative crew configuration into a runnable
//! three-stage pipeline:
//!
//! - **pr_analyzer** (`pr-analyzer-agent`): lists open pull requests and analyzes each one
//! - **code_reviewer** (`code-reviewer-agent`): reviews the changes and recommends an outcome
//! - **pr_reviewer** (`pr-reviewer-agent`): posts one review per pull request
//!
//! Each role's scopes are derived from the tools its configuration lists, so
//! a role can never call a capability it was not configured with.
//!
//! # Example
//!
//! ```rust,ignore
//! use crewgate_agents::{CrewConfig, ReviewCrew};
//! use crewgate_github::{ApiSettings, RepoTarget};
//! use crewgate_identity::Credentials;
//!
//! let mut crew = ReviewCrew::builder(CrewConfig::embedded()?)
//!     .credentials(Credentials::from_env()?)
//!     .repo(RepoTarget::from_env()?)
//!     .settings(ApiSettings::from_env())
//!     .build()?;
//!
//! let log = crew.run().await?;
//! ```

pub mod config;
pub mod crew;
pub mod error;
pub mod heuristics;
pub mod roles;
pub mod runtime;

pub use config::{AgentConfig, CrewConfig, TaskConfig, DEFAULT_AGENTS_YAML, DEFAULT_TASKS_YAML, TASK_ORDER};
pub use crew::{ReviewCrew, ReviewCrewBuilder, PIPELINE_NAME};
pub use error::{AgentError, AgentResult};
pub use heuristics::{
    AnalysisEntry, ChangeArea, CodeReview, FindingCategory, FindingSeverity, PullRequestAnalysis,
    Recommendation, ReviewEntry, ReviewFinding, ReviewRules, RiskLevel,
};
pub use roles::AgentRole;
pub use runtime::{HeuristicRuntime, SubmissionRecord};
