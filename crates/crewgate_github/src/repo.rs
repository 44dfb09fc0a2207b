//! Repository targets.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GitHubError, GitHubResult};

pub const DEFAULT_REPO: &str = "securebotinc/ai-gateway";
pub const REPO_VAR: &str = "GITHUB_REPO";

static REPO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9-]*)/([A-Za-z0-9._-]+)$").expect("Invalid repository regex")
});

/// A repository identified as `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoTarget {
    owner: String,
    name: String,
}

impl RepoTarget {
    /// Parse an `owner/repo` identifier.
    pub fn parse(value: &str) -> GitHubResult<Self> {
        let caps = REPO_PATTERN
            .captures(value.trim())
            .ok_or_else(|| GitHubError::InvalidRepository(value.to_string()))?;

        let name = &caps[2];
        if name == "." || name == ".." {
            return Err(GitHubError::InvalidRepository(value.to_string()));
        }

        Ok(Self {
            owner: caps[1].to_string(),
            name: name.to_string(),
        })
    }

    /// Read the target from `GITHUB_REPO`, falling back to [`DEFAULT_REPO`].
    pub fn from_env() -> GitHubResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> GitHubResult<Self> {
        match lookup(REPO_VAR).filter(|v| !v.trim().is_empty()) {
            Some(value) => Self::parse(&value),
            None => Self::parse(DEFAULT_REPO),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `/repos/{owner}/{repo}/pulls`
    pub fn pulls_path(&self) -> String {
        format!("/repos/{}/{}/pulls", self.owner, self.name)
    }

    /// `/repos/{owner}/{repo}/pulls/{number}`
    pub fn pull_path(&self, number: u64) -> String {
        format!("{}/{}", self.pulls_path(), number)
    }
}

impl std::fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl std::str::FromStr for RepoTarget {
    type Err = GitHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
