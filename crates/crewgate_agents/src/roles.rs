//! The three review roles.

use serde::{Deserialize, Serialize};

use crewgate_github::tools::{DETAILS_TOOL, LIST_TOOL, REVIEW_TOOL};

use crate::error::AgentError;

/// Review crew roles, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    PrAnalyzer,
    CodeReviewer,
    PrReviewer,
}

impl AgentRole {
    /// Identity context name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::PrAnalyzer => "pr-analyzer-agent",
            AgentRole::CodeReviewer => "code-reviewer-agent",
            AgentRole::PrReviewer => "pr-reviewer-agent",
        }
    }

    /// Key of this role in the agents file.
    pub fn config_key(&self) -> &'static str {
        match self {
            AgentRole::PrAnalyzer => "pr_analyzer",
            AgentRole::CodeReviewer => "code_reviewer",
            AgentRole::PrReviewer => "pr_reviewer",
        }
    }

    /// Task this role performs in the default crew.
    pub fn task(&self) -> &'static str {
        match self {
            AgentRole::PrAnalyzer => "analyze_prs",
            AgentRole::CodeReviewer => "review_code_changes",
            AgentRole::PrReviewer => "create_pr_reviews",
        }
    }

    /// Tools the role needs for its task.
    pub fn default_tools(&self) -> &'static [&'static str] {
        match self {
            AgentRole::PrAnalyzer => &[LIST_TOOL, DETAILS_TOOL],
            AgentRole::CodeReviewer => &[DETAILS_TOOL],
            AgentRole::PrReviewer => &[REVIEW_TOOL],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentRole::PrAnalyzer => "Analyzes open pull requests",
            AgentRole::CodeReviewer => "Reviews code changes",
            AgentRole::PrReviewer => "Posts pull request reviews",
        }
    }

    pub fn all() -> [Self; 3] {
        [
            AgentRole::PrAnalyzer,
            AgentRole::CodeReviewer,
            AgentRole::PrReviewer,
        ]
    }

    /// Look a role up by config key or identity context name.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|r| r.config_key() == key || r.as_str() == key)
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| AgentError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_key_or_context_name() {
        assert_eq!(AgentRole::from_key("pr_analyzer"), Some(AgentRole::PrAnalyzer));
        assert_eq!(AgentRole::from_key("pr-reviewer-agent"), Some(AgentRole::PrReviewer));
        assert!("release_manager".parse::<AgentRole>().is_err());
    }

    #[test]
    fn test_only_reviewer_posts_reviews() {
        for role in AgentRole::all() {
            let posts = role.default_tools().contains(&REVIEW_TOOL);
            assert_eq!(posts, role == AgentRole::PrReviewer);
        }
    }
}
