//! Full crew runs against a mock API.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crewgate_agents::{AgentError, AgentRole, CrewConfig, ReviewCrew, DEFAULT_AGENTS_YAML, DEFAULT_TASKS_YAML};
use crewgate_core::{CoreError, PipelineState, StageState, ToolCallStatus};
use crewgate_github::{ApiSettings, ListPullRequests, Method, MockTransport, RepoTarget};
use crewgate_identity::{
    Credentials, IdentityError, IdentityResult, IssuedToken, Scope, TokenIssuer, TokenRequest,
};

const PULLS: &str = "/repos/octo/widgets/pulls";

fn pull(number: u64, title: &str) -> Value {
    json!({
        "number": number,
        "title": title,
        "state": "open",
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-02T10:00:00Z",
        "user": {"login": "octocat"},
        "html_url": format!("https://example.test/pull/{}", number),
        "body": "Adds the widget registry and its tests."
    })
}

fn with_detail(transport: MockTransport, number: u64, title: &str) -> MockTransport {
    let base = format!("{}/{}", PULLS, number);
    transport
        .respond(Method::Get, base.clone(), pull(number, title))
        .respond(
            Method::Get,
            format!("{}/files", base),
            json!([
                {"filename": "src/registry.rs", "status": "added", "additions": 80, "deletions": 0, "changes": 80},
                {"filename": "tests/registry.rs", "status": "added", "additions": 40, "deletions": 0, "changes": 40}
            ]),
        )
        .respond(
            Method::Get,
            format!("{}/commits", base),
            json!([{"sha": "0123456789", "commit": {"message": "Add widget registry", "author": {"name": "Octo Cat", "date": "2024-05-01T09:00:00Z"}}}]),
        )
        .respond(Method::Get, format!("{}/comments", base), json!([]))
        .respond(
            Method::Post,
            format!("{}/reviews", base),
            json!({"id": 1000 + number, "state": "COMMENTED"}),
        )
}

fn crew(transport: &MockTransport) -> ReviewCrew {
    ReviewCrew::builder(CrewConfig::embedded().unwrap())
        .credentials(Credentials::new("proj", "client", "secret").unwrap())
        .repo(RepoTarget::parse("octo/widgets").unwrap())
        .settings(ApiSettings::new("http://api.test").with_identity_headers("user-1", "urn:res:1"))
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_stages_run_in_order() {
    let transport = MockTransport::new().respond(Method::Get, PULLS, json!([pull(1, "Registry")]));
    let transport = with_detail(transport, 1, "Registry");
    let mut crew = crew(&transport);

    let log = crew.run().await.unwrap();

    assert_eq!(log.state, PipelineState::Finished);
    let detail = format!("{}/1", PULLS);
    assert_eq!(
        transport.paths(),
        vec![
            // stage 1: list then detail
            PULLS.to_string(),
            detail.clone(),
            format!("{}/files", detail),
            format!("{}/commits", detail),
            format!("{}/comments", detail),
            // stage 2: detail again
            detail.clone(),
            format!("{}/files", detail),
            format!("{}/commits", detail),
            format!("{}/comments", detail),
            // stage 3: the review
            format!("{}/reviews", detail),
        ]
    );

    for pair in log.stages.windows(2) {
        assert!(pair[0].completed_at.unwrap() <= pair[1].started_at.unwrap());
    }
    assert!(log.stages.iter().all(|s| s.state == StageState::Completed));

    let last = log.final_output().unwrap();
    assert_eq!(last.stage, "create_pr_reviews");
    assert_eq!(last.data["submissions"][0]["review_id"], json!(1001));
}

#[tokio::test]
async fn test_review_event_is_comment() {
    let transport = MockTransport::new().respond(Method::Get, PULLS, json!([pull(2, "WIP: registry")]));
    let transport = with_detail(transport, 2, "WIP: registry");
    let mut crew = crew(&transport);

    let log = crew.run().await.unwrap();

    // the reviewer asked for REQUEST_CHANGES but the API sees COMMENT
    let review_call = &log.stages[2].tool_calls[0];
    assert_eq!(review_call.args["event"], json!("REQUEST_CHANGES"));

    let post = transport
        .get_calls()
        .into_iter()
        .find(|c| c.method == Method::Post)
        .unwrap();
    assert_eq!(post.body.as_ref().unwrap()["event"], json!("COMMENT"));
    assert!(post.body.as_ref().unwrap()["body"]
        .as_str()
        .unwrap()
        .contains("Recommendation: **REQUEST_CHANGES**"));
}

#[tokio::test]
async fn test_list_failure_flows_forward() {
    let transport = MockTransport::new().fail(Method::Get, PULLS, 500);
    let mut crew = crew(&transport);

    let log = crew.run().await.unwrap();

    assert_eq!(log.state, PipelineState::Finished);
    assert_eq!(transport.call_count(), 1);
    assert_eq!(log.stages[0].tool_calls[0].status, ToolCallStatus::StructuredError);
    let last = log.final_output().unwrap();
    assert!(last.structured_error().unwrap().contains("500"));
}

#[tokio::test]
async fn test_one_failing_detail_does_not_stop_others() {
    let transport = MockTransport::new().respond(
        Method::Get,
        PULLS,
        json!([pull(1, "Registry"), pull(2, "Cache")]),
    );
    let transport = with_detail(transport, 1, "Registry")
        .fail(Method::Get, format!("{}/1/commits", PULLS), 502);
    let transport = with_detail(transport, 2, "Cache");
    let mut crew = crew(&transport);

    let log = crew.run().await.unwrap();

    let submissions = log.final_output().unwrap().data["submissions"].as_array().unwrap().clone();
    assert_eq!(submissions.len(), 2);
    assert!(submissions[0]["error"].as_str().unwrap().contains("502"));
    assert_eq!(submissions[1]["review_id"], json!(1002));
    assert_eq!(
        transport.get_calls().iter().filter(|c| c.method == Method::Post).count(),
        1
    );
}

#[tokio::test]
async fn test_identical_responses_identical_output() {
    let make = || {
        let transport = MockTransport::new().respond(Method::Get, PULLS, json!([pull(1, "Registry")]));
        with_detail(transport, 1, "Registry")
    };

    let first_transport = make();
    let second_transport = make();
    let first = crew(&first_transport).run().await.unwrap();
    let second = crew(&second_transport).run().await.unwrap();

    assert_eq!(first.final_output(), second.final_output());
}

#[test]
fn test_agent_missing_task_tool_is_rejected() {
    let agents = DEFAULT_AGENTS_YAML.replace(
        "  tools:\n    - github_pr_details\n",
        "  tools: []\n",
    );
    let err = CrewConfig::from_yaml(&agents, DEFAULT_TASKS_YAML).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("github_pr_details"));
}

/// Issues tokens for every scope except `denied`, which the identity
/// service refuses.
struct DenyingIssuer {
    denied: Scope,
}

#[async_trait]
impl TokenIssuer for DenyingIssuer {
    async fn issue(&self, request: &TokenRequest) -> IdentityResult<IssuedToken> {
        if request.scope == self.denied {
            return Err(IdentityError::scope_denied(&request.role, request.scope.as_str()));
        }
        Ok(IssuedToken {
            access_token: format!("tok-{}", request.scope),
            token_type: Some("Bearer".to_string()),
            expires_in: Some(300),
        })
    }
}

fn denying_crew(transport: &MockTransport, denied: &str) -> ReviewCrew {
    ReviewCrew::builder(CrewConfig::embedded().unwrap())
        .credentials(Credentials::new("proj", "client", "secret").unwrap())
        .repo(RepoTarget::parse("octo/widgets").unwrap())
        .settings(ApiSettings::new("http://api.test"))
        .issuer(Arc::new(DenyingIssuer {
            denied: Scope::for_tool(denied),
        }))
        .transport(Arc::new(transport.clone()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_denied_list_scope_aborts_before_any_call() {
    let transport = MockTransport::new().respond(Method::Get, PULLS, json!([pull(1, "Registry")]));
    let transport = with_detail(transport, 1, "Registry");
    let mut crew = denying_crew(&transport, "GitHubPRListTool");

    let err = crew.run().await.unwrap_err();

    assert!(err.is_scope_denied());
    match &err {
        CoreError::Aborted { stage, log, .. } => {
            assert_eq!(stage, "analyze_prs");
            assert!(log.denied);
            assert_eq!(log.state, PipelineState::Aborted);
            assert_eq!(log.stages[1].state, StageState::Pending);
            assert_eq!(log.stages[2].state, StageState::Pending);
        }
        other => panic!("expected abort, got {:?}", other),
    }
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn test_denied_review_scope_posts_nothing() {
    let transport = MockTransport::new().respond(Method::Get, PULLS, json!([pull(1, "Registry")]));
    let transport = with_detail(transport, 1, "Registry");
    let mut crew = denying_crew(&transport, "GitHubPRReviewTool");

    let err = crew.run().await.unwrap_err();

    assert!(err.is_scope_denied());
    match &err {
        CoreError::Aborted { stage, log, .. } => {
            assert_eq!(stage, "create_pr_reviews");
            assert!(log.denied);
            assert_eq!(log.stages[0].state, StageState::Completed);
        }
        other => panic!("expected abort, got {:?}", other),
    }
    assert!(transport.get_calls().iter().all(|c| c.method == Method::Get));
}

#[tokio::test]
async fn test_second_run_is_rejected() {
    let transport = MockTransport::new().respond(Method::Get, PULLS, json!([]));
    let mut crew = crew(&transport);

    crew.run().await.unwrap();

    assert!(matches!(crew.run().await, Err(CoreError::InvalidState(_))));
}

#[tokio::test]
async fn test_binding_outside_pipeline_respects_scopes() {
    let transport = MockTransport::new().respond(Method::Get, PULLS, json!([pull(4, "Docs")]));
    let crew = crew(&transport);

    let analyzer = ListPullRequests::new(crew.binding(AgentRole::PrAnalyzer).unwrap());
    assert_eq!(analyzer.invoke().await.unwrap().into_value().unwrap().len(), 1);

    let poster = ListPullRequests::new(crew.binding(AgentRole::PrReviewer).unwrap());
    assert!(poster.invoke().await.is_err());
    assert_eq!(transport.call_count(), 1);
}

#[test]
fn test_build_requires_credentials() {
    let err = ReviewCrew::builder(CrewConfig::embedded().unwrap())
        .repo(RepoTarget::parse("octo/widgets").unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(err, AgentError::Config(_)));
    assert!(err.is_configuration());
}
