//! Deterministic agent runtime.
//!
//! Stands in for a reasoning engine: each task is handled by a fixed
//! procedure that calls the agent's tools and composes its output with the
//! rules in [`heuristics`](crate::heuristics).
//!
//! Structured error values returned by tools are carried forward in the stage
//! output. Only denied calls and programming errors abort the pipeline.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crewgate_core::{structured_error, AgentRuntime, CoreError, CoreResult, StageContext, StageOutput};
use crewgate_github::tools::{DETAILS_TOOL, LIST_TOOL, REVIEW_TOOL};
use crewgate_github::{PullRequestDetail, PullRequestSummary};

use crate::heuristics::{
    self, AnalysisEntry, CodeReview, Recommendation, ReviewEntry, ReviewRules,
};

/// Outcome of one review submission.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmissionRecord {
    pub number: u64,
    pub recommendation: Option<Recommendation>,
    pub review_id: Option<u64>,
    pub error: Option<String>,
}

/// Runtime with one fixed handler per task.
#[derive(Debug, Clone, Default)]
pub struct HeuristicRuntime {
    rules: ReviewRules,
}

impl HeuristicRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ReviewRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ReviewRules {
        &self.rules
    }

    async fn analyze_prs(&self, ctx: &mut StageContext<'_>) -> CoreResult<StageOutput> {
        let listed = ctx.call_tool(LIST_TOOL, json!({})).await?;
        if let Some(message) = structured_error(&listed) {
            let message = message.to_string();
            return Ok(ctx
                .output(format!("Could not list pull requests: {}", message))
                .with_data(json!({ "error": message })));
        }

        let mut summaries: Vec<PullRequestSummary> = decode(LIST_TOOL, listed)?;
        if summaries.len() > self.rules.max_pull_requests {
            info!(
                "Limiting analysis to {} of {} pull request(s)",
                self.rules.max_pull_requests,
                summaries.len()
            );
            summaries.truncate(self.rules.max_pull_requests);
        }

        let mut entries = Vec::with_capacity(summaries.len());
        for summary in &summaries {
            debug!("Analyzing {}", heuristics::describe(summary));
            let entry = match fetch_detail(ctx, summary.number).await? {
                Ok(detail) => AnalysisEntry::Analyzed(heuristics::analyze(&detail, &self.rules)),
                Err(error) => AnalysisEntry::Failed {
                    number: summary.number,
                    error,
                },
            };
            entries.push(entry);
        }

        let failed = entries
            .iter()
            .filter(|e| matches!(e, AnalysisEntry::Failed { .. }))
            .count();
        let mut summary = format!("Analyzed {} open pull request(s)", entries.len() - failed);
        if failed > 0 {
            summary.push_str(&format!(", {} could not be fetched", failed));
        }
        for entry in &entries {
            if let AnalysisEntry::Analyzed(a) = entry {
                summary.push_str(&format!(
                    "\n- #{} {} by {}: {} file(s), +{}/-{}, risk {:?}",
                    a.number, a.title, a.author, a.files, a.additions, a.deletions, a.risk
                ));
            }
        }

        Ok(ctx
            .output(summary)
            .with_data(json!({ "pull_requests": entries })))
    }

    async fn review_code_changes(&self, ctx: &mut StageContext<'_>) -> CoreResult<StageOutput> {
        let Some(entries) = prior_entries::<AnalysisEntry>(ctx, "pull_requests")? else {
            return Ok(forward_error(ctx, "No pull requests to review"));
        };

        let mut reviews = Vec::with_capacity(entries.len());
        for entry in &entries {
            let review = match entry {
                AnalysisEntry::Failed { number, error } => ReviewEntry::Failed {
                    number: *number,
                    error: error.clone(),
                },
                AnalysisEntry::Analyzed(analysis) => match fetch_detail(ctx, analysis.number).await? {
                    Ok(detail) => ReviewEntry::Reviewed(heuristics::review(&detail, &self.rules)),
                    Err(error) => ReviewEntry::Failed {
                        number: analysis.number,
                        error,
                    },
                },
            };
            reviews.push(review);
        }

        let mut summary = format!("Reviewed {} pull request(s)", reviews.len());
        for review in &reviews {
            match review {
                ReviewEntry::Reviewed(r) => summary.push_str(&format!(
                    "\n- #{}: {} finding(s), recommend {}",
                    r.number,
                    r.findings.len(),
                    r.recommendation.as_str()
                )),
                ReviewEntry::Failed { number, error } => {
                    summary.push_str(&format!("\n- #{}: skipped ({})", number, error))
                }
            }
        }

        Ok(ctx.output(summary).with_data(json!({ "reviews": reviews })))
    }

    async fn create_pr_reviews(&self, ctx: &mut StageContext<'_>) -> CoreResult<StageOutput> {
        let Some(reviews) = prior_entries::<ReviewEntry>(ctx, "reviews")? else {
            return Ok(forward_error(ctx, "No reviews to submit"));
        };

        let reviewer = ctx.agent().persona().role.clone();
        let mut records = Vec::with_capacity(reviews.len());
        for entry in &reviews {
            let record = match entry {
                ReviewEntry::Failed { number, error } => SubmissionRecord {
                    number: *number,
                    recommendation: None,
                    review_id: None,
                    error: Some(error.clone()),
                },
                ReviewEntry::Reviewed(review) => self.submit(ctx, review, &reviewer).await?,
            };
            records.push(record);
        }

        let submitted = records.iter().filter(|r| r.error.is_none()).count();
        let mut summary = format!(
            "Submitted {} of {} review(s)",
            submitted,
            records.len()
        );
        for record in &records {
            match (&record.error, record.review_id) {
                (None, Some(id)) => summary.push_str(&format!("\n- #{}: review {}", record.number, id)),
                (None, None) => summary.push_str(&format!("\n- #{}: review posted", record.number)),
                (Some(error), _) => summary.push_str(&format!("\n- #{}: failed ({})", record.number, error)),
            }
        }

        Ok(ctx.output(summary).with_data(json!({ "submissions": records })))
    }

    async fn submit(
        &self,
        ctx: &mut StageContext<'_>,
        review: &CodeReview,
        reviewer: &str,
    ) -> CoreResult<SubmissionRecord> {
        let body = heuristics::render_review(review, reviewer);
        let result = ctx
            .call_tool(
                REVIEW_TOOL,
                json!({
                    "pr_number": review.number,
                    "event": review.recommendation.as_str(),
                    "body": body,
                }),
            )
            .await?;

        let error = structured_error(&result).map(str::to_string);
        Ok(SubmissionRecord {
            number: review.number,
            recommendation: Some(review.recommendation),
            review_id: if error.is_none() {
                result.get("id").and_then(Value::as_u64)
            } else {
                None
            },
            error,
        })
    }
}

#[async_trait]
impl AgentRuntime for HeuristicRuntime {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn perform(&self, ctx: &mut StageContext<'_>) -> CoreResult<StageOutput> {
        match ctx.task().name.as_str() {
            "analyze_prs" => self.analyze_prs(ctx).await,
            "review_code_changes" => self.review_code_changes(ctx).await,
            "create_pr_reviews" => self.create_pr_reviews(ctx).await,
            other => Err(CoreError::stage_failed(
                other,
                "No handler for this task in the heuristic runtime",
            )),
        }
    }
}

/// Fetch one detail; `Err` carries a structured error message.
async fn fetch_detail(
    ctx: &mut StageContext<'_>,
    number: u64,
) -> CoreResult<Result<PullRequestDetail, String>> {
    let value = ctx
        .call_tool(DETAILS_TOOL, json!({ "pr_number": number }))
        .await?;
    if let Some(message) = structured_error(&value) {
        warn!("Pull request #{} unavailable: {}", number, message);
        return Ok(Err(message.to_string()));
    }
    Ok(Ok(decode(DETAILS_TOOL, value)?))
}

/// Entries under `key` in the prior stage's data, or `None` if the prior
/// stage produced a structured error.
fn prior_entries<T: serde::de::DeserializeOwned>(
    ctx: &StageContext<'_>,
    key: &str,
) -> CoreResult<Option<Vec<T>>> {
    let prior = ctx.prior().ok_or_else(|| {
        CoreError::stage_failed(ctx.stage().name(), "Stage needs the previous stage's output")
    })?;

    if prior.structured_error().is_some() {
        return Ok(None);
    }

    let entries = prior.data.get(key).cloned().ok_or_else(|| {
        CoreError::stage_failed(
            ctx.stage().name(),
            format!("Previous stage output has no '{}'", key),
        )
    })?;
    Ok(Some(serde_json::from_value(entries)?))
}

/// Carry the prior stage's structured error forward.
fn forward_error(ctx: &StageContext<'_>, what: &str) -> StageOutput {
    let message = ctx
        .prior()
        .and_then(|p| p.structured_error())
        .unwrap_or("previous stage failed")
        .to_string();
    warn!("[{}] {}: {}", ctx.stage().name(), what, message);
    ctx.output(format!("{}: {}", what, message))
        .with_data(json!({ "error": message }))
}

fn decode<T: serde::de::DeserializeOwned>(tool: &str, value: Value) -> CoreResult<T> {
    serde_json::from_value(value).map_err(|e| CoreError::tool(tool, format!("Unexpected result: {}", e)))
}
