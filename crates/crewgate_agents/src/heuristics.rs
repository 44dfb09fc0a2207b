//! Deterministic review rules.
//!
//! Pure functions over [`PullRequestDetail`]: the same pull request always
//! produces the same analysis, findings and review text.

use serde::{Deserialize, Serialize};

use crewgate_github::{PullRequestDetail, PullRequestSummary};

/// Thresholds used by the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRules {
    /// Total changed lines above which a change is large
    pub large_change_lines: u64,
    /// Total changed lines above which a change is medium risk
    pub medium_change_lines: u64,
    /// Files above which a change is large
    pub max_files: usize,
    /// Changed lines in one file worth calling out
    pub max_file_changes: u64,
    /// Shortest useful description
    pub min_description_chars: usize,
    /// Shortest useful commit subject
    pub min_commit_subject: usize,
    /// Pull requests handled per run
    pub max_pull_requests: usize,
}

impl Default for ReviewRules {
    fn default() -> Self {
        Self {
            large_change_lines: 400,
            medium_change_lines: 100,
            max_files: 20,
            max_file_changes: 300,
            min_description_chars: 20,
            min_commit_subject: 10,
            max_pull_requests: 10,
        }
    }
}

/// Area of the code base a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeArea {
    Source,
    Tests,
    Docs,
    Config,
    Dependencies,
    Ci,
}

impl ChangeArea {
    pub fn classify(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        let file = lower.rsplit('/').next().unwrap_or(lower.as_str());

        const MANIFESTS: [&str; 9] = [
            "cargo.toml",
            "cargo.lock",
            "package.json",
            "package-lock.json",
            "yarn.lock",
            "requirements.txt",
            "poetry.lock",
            "pyproject.toml",
            "go.mod",
        ];

        if lower.starts_with(".github/") || lower.starts_with(".gitlab-ci") || lower.contains("/.circleci/") {
            ChangeArea::Ci
        } else if MANIFESTS.contains(&file) || file == "go.sum" {
            ChangeArea::Dependencies
        } else if lower.starts_with("tests/")
            || lower.contains("/tests/")
            || lower.contains("/test/")
            || file.starts_with("test_")
            || file.contains("_test.")
            || file.contains(".test.")
            || file.contains(".spec.")
        {
            ChangeArea::Tests
        } else if lower.starts_with("docs/") || file.ends_with(".md") || file.ends_with(".rst") {
            ChangeArea::Docs
        } else if [".yaml", ".yml", ".toml", ".json", ".ini", ".cfg", ".env"]
            .iter()
            .any(|ext| file.ends_with(ext))
        {
            ChangeArea::Config
        } else {
            ChangeArea::Source
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// What the analyzer learned about one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestAnalysis {
    pub number: u64,
    pub title: String,
    pub author: String,
    pub url: String,
    pub files: usize,
    pub additions: u64,
    pub deletions: u64,
    pub commits: usize,
    pub areas: Vec<ChangeArea>,
    pub risk: RiskLevel,
    pub has_description: bool,
}

/// Entry of the analyzer's output: an analysis or the error that prevented it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisEntry {
    Failed { number: u64, error: String },
    Analyzed(PullRequestAnalysis),
}

impl AnalysisEntry {
    pub fn number(&self) -> u64 {
        match self {
            AnalysisEntry::Failed { number, .. } => *number,
            AnalysisEntry::Analyzed(a) => a.number,
        }
    }
}

pub fn analyze(detail: &PullRequestDetail, rules: &ReviewRules) -> PullRequestAnalysis {
    let mut areas: Vec<ChangeArea> = detail
        .changed_files
        .iter()
        .map(|f| ChangeArea::classify(&f.filename))
        .collect();
    areas.sort();
    areas.dedup();

    let changed = detail.total_additions() + detail.total_deletions();
    let risk = if changed > rules.large_change_lines || detail.changed_files.len() > rules.max_files {
        RiskLevel::High
    } else if changed > rules.medium_change_lines
        || areas.contains(&ChangeArea::Dependencies)
        || areas.contains(&ChangeArea::Ci)
    {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    PullRequestAnalysis {
        number: detail.number,
        title: detail.title.clone(),
        author: detail.user.clone(),
        url: detail.url.clone(),
        files: detail.changed_files.len(),
        additions: detail.total_additions(),
        deletions: detail.total_deletions(),
        commits: detail.commits.len(),
        areas,
        risk,
        has_description: detail
            .body
            .as_deref()
            .map(|b| !b.trim().is_empty())
            .unwrap_or(false),
    }
}

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Error,
    Warning,
    Info,
}

/// Category of finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Size,
    Testing,
    Documentation,
    CommitHygiene,
    Dependencies,
    Deletion,
    WorkInProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewFinding {
    pub severity: FindingSeverity,
    pub category: FindingCategory,
    pub file: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ReviewFinding {
    fn new(severity: FindingSeverity, category: FindingCategory, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            file: None,
            message: message.into(),
            suggestion: None,
        }
    }

    fn file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Recommended review event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Approve,
    Comment,
    RequestChanges,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Approve => "APPROVE",
            Recommendation::Comment => "COMMENT",
            Recommendation::RequestChanges => "REQUEST_CHANGES",
        }
    }

    pub fn from_findings(findings: &[ReviewFinding]) -> Self {
        if findings.iter().any(|f| f.severity == FindingSeverity::Error) {
            Recommendation::RequestChanges
        } else if findings.iter().any(|f| f.severity == FindingSeverity::Warning) {
            Recommendation::Comment
        } else {
            Recommendation::Approve
        }
    }
}

/// The code reviewer's verdict on one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeReview {
    pub number: u64,
    pub title: String,
    pub findings: Vec<ReviewFinding>,
    pub recommendation: Recommendation,
}

/// Entry of the code reviewer's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReviewEntry {
    Failed { number: u64, error: String },
    Reviewed(CodeReview),
}

pub fn review(detail: &PullRequestDetail, rules: &ReviewRules) -> CodeReview {
    let mut findings = Vec::new();

    findings.extend(check_work_in_progress(detail));
    findings.extend(check_size(detail, rules));
    findings.extend(check_tests(detail));
    findings.extend(check_description(detail, rules));
    findings.extend(check_commits(detail, rules));
    findings.extend(check_dependencies(detail));
    findings.extend(check_deletions(detail));

    CodeReview {
        number: detail.number,
        title: detail.title.clone(),
        recommendation: Recommendation::from_findings(&findings),
        findings,
    }
}

fn check_work_in_progress(detail: &PullRequestDetail) -> Option<ReviewFinding> {
    let title = detail.title.trim_start().to_ascii_lowercase();
    let wip = title.starts_with("wip") || title.starts_with("[wip]") || title.starts_with("draft:");
    wip.then(|| {
        ReviewFinding::new(
            FindingSeverity::Error,
            FindingCategory::WorkInProgress,
            "Title marks this pull request as work in progress",
        )
        .suggest("Finish the change or convert the pull request to a draft")
    })
}

fn check_size(detail: &PullRequestDetail, rules: &ReviewRules) -> Vec<ReviewFinding> {
    let mut findings = Vec::new();

    let changed = detail.total_additions() + detail.total_deletions();
    if changed > rules.large_change_lines {
        findings.push(
            ReviewFinding::new(
                FindingSeverity::Warning,
                FindingCategory::Size,
                format!(
                    "Change touches {} lines, above the {} line guideline",
                    changed, rules.large_change_lines
                ),
            )
            .suggest("Consider splitting into smaller pull requests"),
        );
    }

    if detail.changed_files.len() > rules.max_files {
        findings.push(ReviewFinding::new(
            FindingSeverity::Warning,
            FindingCategory::Size,
            format!(
                "{} files changed, above the {} file guideline",
                detail.changed_files.len(),
                rules.max_files
            ),
        ));
    }

    let mut large: Vec<ReviewFinding> = detail
        .changed_files
        .iter()
        .filter(|f| f.changes > rules.max_file_changes)
        .map(|f| {
            ReviewFinding::new(
                FindingSeverity::Info,
                FindingCategory::Size,
                format!("{} lines changed in one file", f.changes),
            )
            .file(f.filename.clone())
        })
        .collect();

    // Limit per-file findings to avoid noise
    if large.len() > 3 {
        let count = large.len();
        large.truncate(3);
        large.push(ReviewFinding::new(
            FindingSeverity::Info,
            FindingCategory::Size,
            format!("... and {} more large file(s)", count - 3),
        ));
    }
    findings.extend(large);

    findings
}

fn check_tests(detail: &PullRequestDetail) -> Option<ReviewFinding> {
    let areas: Vec<ChangeArea> = detail
        .changed_files
        .iter()
        .filter(|f| f.status != "removed")
        .map(|f| ChangeArea::classify(&f.filename))
        .collect();

    let touches_source = areas.contains(&ChangeArea::Source);
    let touches_tests = areas.contains(&ChangeArea::Tests);

    (touches_source && !touches_tests).then(|| {
        ReviewFinding::new(
            FindingSeverity::Warning,
            FindingCategory::Testing,
            "Source files changed without accompanying test changes",
        )
        .suggest("Add or update tests covering the new behavior")
    })
}

fn check_description(detail: &PullRequestDetail, rules: &ReviewRules) -> Option<ReviewFinding> {
    let body = detail.body.as_deref().map(str::trim).unwrap_or("");
    if body.is_empty() {
        Some(
            ReviewFinding::new(
                FindingSeverity::Warning,
                FindingCategory::Documentation,
                "Pull request has no description",
            )
            .suggest("Describe what the change does and how it was tested"),
        )
    } else if body.chars().count() < rules.min_description_chars {
        Some(ReviewFinding::new(
            FindingSeverity::Info,
            FindingCategory::Documentation,
            "Pull request description is very short",
        ))
    } else {
        None
    }
}

fn check_commits(detail: &PullRequestDetail, rules: &ReviewRules) -> Vec<ReviewFinding> {
    detail
        .commits
        .iter()
        .filter_map(|c| {
            let subject = c.message.lines().next().unwrap_or("").trim();
            let lower = subject.to_ascii_lowercase();
            let short_sha: String = c.sha.chars().take(7).collect();

            if lower.starts_with("fixup!") || lower.starts_with("squash!") || lower.starts_with("wip") {
                Some(
                    ReviewFinding::new(
                        FindingSeverity::Info,
                        FindingCategory::CommitHygiene,
                        format!("Commit {} looks temporary: \"{}\"", short_sha, subject),
                    )
                    .suggest("Squash temporary commits before merging"),
                )
            } else if subject.chars().count() < rules.min_commit_subject {
                Some(ReviewFinding::new(
                    FindingSeverity::Info,
                    FindingCategory::CommitHygiene,
                    format!("Commit {} has a terse subject: \"{}\"", short_sha, subject),
                ))
            } else {
                None
            }
        })
        .collect()
}

fn check_dependencies(detail: &PullRequestDetail) -> Vec<ReviewFinding> {
    detail
        .changed_files
        .iter()
        .filter(|f| ChangeArea::classify(&f.filename) == ChangeArea::Dependencies)
        .map(|f| {
            ReviewFinding::new(
                FindingSeverity::Info,
                FindingCategory::Dependencies,
                "Dependency manifest changed",
            )
            .file(f.filename.clone())
            .suggest("Check new or upgraded dependencies for license and security issues")
        })
        .collect()
}

fn check_deletions(detail: &PullRequestDetail) -> Option<ReviewFinding> {
    let removed = detail
        .changed_files
        .iter()
        .filter(|f| f.status == "removed")
        .count();
    (removed > 0).then(|| {
        ReviewFinding::new(
            FindingSeverity::Info,
            FindingCategory::Deletion,
            format!("Removes {} file(s)", removed),
        )
    })
}

/// Markdown body of the review posted for `review`.
pub fn render_review(review: &CodeReview, reviewer: &str) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "## Automated review for #{}: {}\n\n",
        review.number, review.title
    ));
    body.push_str(&format!(
        "Recommendation: **{}**\n\n",
        review.recommendation.as_str()
    ));

    let count = |severity: FindingSeverity| review.findings.iter().filter(|f| f.severity == severity).count();
    body.push_str("| Severity | Count |\n");
    body.push_str("|----------|-------|\n");
    body.push_str(&format!("| Error | {} |\n", count(FindingSeverity::Error)));
    body.push_str(&format!("| Warning | {} |\n", count(FindingSeverity::Warning)));
    body.push_str(&format!("| Info | {} |\n\n", count(FindingSeverity::Info)));

    if review.findings.is_empty() {
        body.push_str("No findings.\n");
    } else {
        body.push_str("### Findings\n\n");
        let mut findings: Vec<&ReviewFinding> = review.findings.iter().collect();
        findings.sort_by_key(|f| f.severity);
        for finding in findings {
            let label = match finding.severity {
                FindingSeverity::Error => "Error",
                FindingSeverity::Warning => "Warning",
                FindingSeverity::Info => "Info",
            };
            match &finding.file {
                Some(file) => body.push_str(&format!("- **{}** `{}`: {}\n", label, file, finding.message)),
                None => body.push_str(&format!("- **{}**: {}\n", label, finding.message)),
            }
            if let Some(suggestion) = &finding.suggestion {
                body.push_str(&format!("  - Suggestion: {}\n", suggestion));
            }
        }
    }

    body.push_str(&format!("\n---\n_Posted by {}_\n", reviewer));
    body
}

/// One-line description of an open pull request.
pub fn describe(summary: &PullRequestSummary) -> String {
    format!("#{} {} (by {})", summary.number, summary.title, summary.user)
}

#[cfg(test)]
mod tests {
    use crewgate_github::{ChangedFile, CommitInfo};

    use super::*;

    fn file(name: &str, status: &str, additions: u64, deletions: u64) -> ChangedFile {
        ChangedFile {
            filename: name.to_string(),
            status: status.to_string(),
            additions,
            deletions,
            changes: additions + deletions,
        }
    }

    fn commit(sha: &str, message: &str) -> CommitInfo {
        CommitInfo {
            sha: sha.to_string(),
            message: message.to_string(),
            author: "Octo Cat".to_string(),
            date: "2024-05-01T09:00:00Z".to_string(),
        }
    }

    fn detail(title: &str, body: Option<&str>, files: Vec<ChangedFile>, commits: Vec<CommitInfo>) -> PullRequestDetail {
        PullRequestDetail {
            number: 42,
            title: title.to_string(),
            state: "open".to_string(),
            created_at: "2024-05-01T10:00:00Z".to_string(),
            updated_at: "2024-05-01T10:00:00Z".to_string(),
            user: "octocat".to_string(),
            url: "https://example.test/pull/42".to_string(),
            body: body.map(str::to_string),
            changed_files: files,
            commits,
            comments: Vec::new(),
        }
    }

    #[test]
    fn test_classify_paths() {
        assert_eq!(ChangeArea::classify("src/lib.rs"), ChangeArea::Source);
        assert_eq!(ChangeArea::classify("tests/api_test.rs"), ChangeArea::Tests);
        assert_eq!(ChangeArea::classify("web/button.spec.ts"), ChangeArea::Tests);
        assert_eq!(ChangeArea::classify("README.md"), ChangeArea::Docs);
        assert_eq!(ChangeArea::classify("Cargo.toml"), ChangeArea::Dependencies);
        assert_eq!(ChangeArea::classify(".github/workflows/ci.yml"), ChangeArea::Ci);
        assert_eq!(ChangeArea::classify("config/app.yaml"), ChangeArea::Config);
    }

    #[test]
    fn test_clean_change_is_approved() {
        let d = detail(
            "Add widget parser",
            Some("Adds a parser for widget manifests, covered by unit tests."),
            vec![file("src/parser.rs", "added", 40, 0), file("tests/parser.rs", "added", 30, 0)],
            vec![commit("abcdef123", "Add widget manifest parser")],
        );

        let review = review(&d, &ReviewRules::default());

        assert!(review.findings.is_empty(), "{:?}", review.findings);
        assert_eq!(review.recommendation, Recommendation::Approve);
        assert_eq!(analyze(&d, &ReviewRules::default()).risk, RiskLevel::Low);
    }

    #[test]
    fn test_missing_tests_and_description() {
        let d = detail(
            "Tweak retry loop",
            None,
            vec![file("src/retry.rs", "modified", 10, 4)],
            vec![commit("1234567aa", "fix")],
        );

        let review = review(&d, &ReviewRules::default());

        let categories: Vec<_> = review.findings.iter().map(|f| f.category).collect();
        assert!(categories.contains(&FindingCategory::Testing));
        assert!(categories.contains(&FindingCategory::Documentation));
        assert!(categories.contains(&FindingCategory::CommitHygiene));
        assert_eq!(review.recommendation, Recommendation::Comment);
    }

    #[test]
    fn test_wip_requests_changes() {
        let d = detail("WIP: new api", Some("Not ready yet, do not merge."), vec![], vec![]);
        assert_eq!(review(&d, &ReviewRules::default()).recommendation, Recommendation::RequestChanges);
    }

    #[test]
    fn test_large_change_is_high_risk() {
        let files = (0..5)
            .map(|i| file(&format!("src/m{}.rs", i), "modified", 350, 10))
            .collect();
        let d = detail("Rewrite modules", Some("Big rewrite of the module tree."), files, vec![]);

        let rules = ReviewRules::default();
        assert_eq!(analyze(&d, &rules).risk, RiskLevel::High);

        let review = review(&d, &rules);
        let per_file = review
            .findings
            .iter()
            .filter(|f| f.category == FindingCategory::Size && f.severity == FindingSeverity::Info)
            .count();
        // three files listed plus the summary line
        assert_eq!(per_file, 4);
    }

    #[test]
    fn test_render_review() {
        let d = detail("Tweak", None, vec![file("src/a.rs", "modified", 1, 1)], vec![]);
        let review = review(&d, &ReviewRules::default());

        let body = render_review(&review, "Pull Request Reviewer");

        assert!(body.starts_with("## Automated review for #42: Tweak"));
        assert!(body.contains("Recommendation: **COMMENT**"));
        assert!(body.contains("| Warning | 2 |"));
        assert!(body.ends_with("_Posted by Pull Request Reviewer_\n"));
    }

    #[test]
    fn test_entries_round_trip_through_json() {
        let entry = AnalysisEntry::Failed {
            number: 3,
            error: "HTTP status 502".to_string(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        let back: AnalysisEntry = serde_json::from_value(value).unwrap();
        assert_eq!(back.number(), 3);
        assert!(matches!(back, AnalysisEntry::Failed { .. }));
    }
}
