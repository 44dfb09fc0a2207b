//! Wire models.
//!
//! `Raw*` types mirror the API payloads and only carry the fields the
//! capabilities read. A missing field is a decode error, not a transport
//! failure. The remaining types are the shapes handed back to agents.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPull {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    pub user: RawUser,
    pub html_url: String,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawFile {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitAuthor {
    pub name: String,
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommitData {
    pub message: String,
    pub author: RawCommitAuthor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    pub commit: RawCommitData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawComment {
    pub id: u64,
    pub user: RawUser,
    pub body: String,
    pub created_at: String,
}

/// One open pull request as returned by `github_pr_list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    /// Author login
    pub user: String,
    /// Web URL
    pub url: String,
}

impl From<RawPull> for PullRequestSummary {
    fn from(raw: RawPull) -> Self {
        Self {
            number: raw.number,
            title: raw.title,
            state: raw.state,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            user: raw.user.login,
            url: raw.html_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
}

impl From<RawFile> for ChangedFile {
    fn from(raw: RawFile) -> Self {
        Self {
            filename: raw.filename,
            status: raw.status,
            additions: raw.additions,
            deletions: raw.deletions,
            changes: raw.changes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: String,
}

impl From<RawCommit> for CommitInfo {
    fn from(raw: RawCommit) -> Self {
        Self {
            sha: raw.sha,
            message: raw.commit.message,
            author: raw.commit.author.name,
            date: raw.commit.author.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInfo {
    pub id: u64,
    pub user: String,
    pub body: String,
    pub created_at: String,
}

impl From<RawComment> for CommentInfo {
    fn from(raw: RawComment) -> Self {
        Self {
            id: raw.id,
            user: raw.user.login,
            body: raw.body,
            created_at: raw.created_at,
        }
    }
}

/// Aggregated view of one pull request as returned by `github_pr_details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDetail {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    pub user: String,
    pub url: String,
    pub body: Option<String>,
    pub changed_files: Vec<ChangedFile>,
    pub commits: Vec<CommitInfo>,
    pub comments: Vec<CommentInfo>,
}

impl PullRequestDetail {
    pub fn assemble(
        pull: RawPull,
        files: Vec<RawFile>,
        commits: Vec<RawCommit>,
        comments: Vec<RawComment>,
    ) -> Self {
        Self {
            number: pull.number,
            title: pull.title,
            state: pull.state,
            created_at: pull.created_at,
            updated_at: pull.updated_at,
            user: pull.user.login,
            url: pull.html_url,
            body: pull.body,
            changed_files: files.into_iter().map(ChangedFile::from).collect(),
            commits: commits.into_iter().map(CommitInfo::from).collect(),
            comments: comments.into_iter().map(CommentInfo::from).collect(),
        }
    }

    pub fn total_additions(&self) -> u64 {
        self.changed_files.iter().map(|f| f.additions).sum()
    }

    pub fn total_deletions(&self) -> u64 {
        self.changed_files.iter().map(|f| f.deletions).sum()
    }
}
