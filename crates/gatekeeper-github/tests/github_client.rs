//! HTTP-level tests for `GithubClient` against a mock GitHub API.

use std::sync::Arc;

use gatekeeper_core::{
    CancellationToken, CheckProvider, CheckRunConclusion, CheckRunStatus, GateError,
    ProviderError, StatusValidator, Validator,
};
use gatekeeper_github::{GithubClient, GithubConfig};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GithubClient {
    GithubClient::new(GithubConfig::new(&server.uri()).with_token("secret")).unwrap()
}

#[tokio::test]
async fn list_check_runs_sends_paging_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/commits/abc123/check-runs"))
        .and(query_param("page", "2"))
        .and(query_param("per_page", "100"))
        .and(header("authorization", "Bearer secret"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 101,
            "check_runs": [
                {
                    "id": 1,
                    "name": "build",
                    "status": "completed",
                    "conclusion": "success",
                    "check_suite": { "id": 10 }
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client(&server)
        .list_check_runs("octo", "hello", "abc123", 2, 100)
        .await
        .unwrap();

    assert_eq!(page.total_count, 101);
    assert_eq!(page.check_runs.len(), 1);
    assert_eq!(page.check_runs[0].name.as_deref(), Some("build"));
    assert_eq!(page.check_runs[0].status, Some(CheckRunStatus::Completed));
    assert_eq!(page.check_runs[0].conclusion, Some(CheckRunConclusion::Success));
    assert_eq!(page.check_runs[0].check_suite_id(), 10);
}

#[tokio::test]
async fn list_workflow_runs_follows_pages() {
    let server = MockServer::start().await;
    let first: Vec<_> = (0..100)
        .map(|i| json!({ "name": format!("wf-{i}"), "check_suite_id": i }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/actions/runs"))
        .and(query_param("head_sha", "abc123"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "total_count": 101, "workflow_runs": first })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/actions/runs"))
        .and(query_param("head_sha", "abc123"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 101,
            "workflow_runs": [{ "name": "last", "check_suite_id": 100 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runs = client(&server)
        .list_workflow_runs("octo", "hello", "abc123")
        .await
        .unwrap();

    assert_eq!(runs.len(), 101);
    assert_eq!(runs[100].name.as_deref(), Some("last"));
}

#[tokio::test]
async fn non_success_status_becomes_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/commits/abc123/check-runs"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    let err = client(&server)
        .list_check_runs("octo", "hello", "abc123", 1, 100)
        .await
        .unwrap_err();

    match err {
        ProviderError::Status { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Bad credentials");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn invalid_json_becomes_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/actions/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server)
        .list_workflow_runs("octo", "hello", "abc123")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)));
}

#[tokio::test]
async fn validator_end_to_end_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/commits/abc123/check-runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 3,
            "check_runs": [
                {
                    "name": "gatekeeper",
                    "status": "in_progress",
                    "conclusion": null,
                    "check_suite": { "id": 2 }
                },
                {
                    "name": "test",
                    "status": "completed",
                    "conclusion": "failure",
                    "check_suite": { "id": 1 }
                },
                {
                    "name": "build",
                    "status": "completed",
                    "conclusion": "success",
                    "check_suite": { "id": 1 }
                }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/hello/actions/runs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "workflow_runs": [
                { "name": "CI", "check_suite_id": 1 },
                { "name": "Gatekeeper", "check_suite_id": 2 }
            ]
        })))
        .mount(&server)
        .await;

    let validator = StatusValidator::builder()
        .client(Arc::new(client(&server)))
        .owner_and_repo("octo", "hello")
        .git_ref("abc123")
        .self_job("gatekeeper")
        .build()
        .unwrap();

    let err = validator
        .validate(&CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GateError::GateFailure { .. }));
    let status = err.status().unwrap();
    assert_eq!(status.err_jobs(), ["CI / test".to_string()]);
    assert_eq!(status.complete_jobs(), ["CI / build".to_string()]);
}
