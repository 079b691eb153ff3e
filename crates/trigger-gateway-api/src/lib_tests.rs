//! Tests for routing and status mapping in the HTTP layer.

use super::*;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chrono::Utc;
use github_bot_sdk::client::PullRequest;
use github_bot_sdk::webhook::{sign_payload, SignatureAlgorithm};
use github_bot_sdk::{
    ApiError, AuthError, AuthenticationProvider, GitHubApiClient, InstallationToken, JsonWebToken,
};
use std::sync::Mutex;
use tower::ServiceExt;
use trigger_gateway_core::adapters::InMemoryStore;
use trigger_gateway_core::{GatewayConfig, Project, ResourceMapping, SharedSecret};

const SECRET: &str = "s3cret";

// ============================================================================
// Test doubles
// ============================================================================

/// Records requested installations and always succeeds.
#[derive(Default)]
struct RecordingAuth {
    installations: Mutex<Vec<Option<InstallationId>>>,
}

#[async_trait]
impl AuthenticationProvider for RecordingAuth {
    async fn installation_token(
        &self,
        _api_url: &str,
        installation_id: Option<InstallationId>,
    ) -> Result<InstallationToken, AuthError> {
        self.installations.lock().unwrap().push(installation_id);
        let id = installation_id.ok_or(AuthError::MissingInstallationId)?;
        Ok(InstallationToken::new(
            "ghs_test".to_string(),
            id,
            Utc::now() + chrono::Duration::hours(1),
        ))
    }
}

/// Pull request lookups always answer with the same head.
struct CannedGitHub;

#[async_trait]
impl GitHubApiClient for CannedGitHub {
    async fn create_installation_access_token(
        &self,
        _api_url: &str,
        _installation_id: InstallationId,
        _jwt: &JsonWebToken,
    ) -> Result<InstallationToken, ApiError> {
        Err(ApiError::AuthorizationFailed)
    }

    async fn get_pull_request(
        &self,
        _api_url: &str,
        _token: &InstallationToken,
        _owner: &str,
        _repo: &str,
        number: u64,
    ) -> Result<PullRequest, ApiError> {
        Ok(serde_json::from_value(serde_json::json!({
            "number": number,
            "url": "https://api.github.com/repos/octo/repo/pulls/1",
            "head": { "ref": "feature", "sha": "abc123" }
        }))?)
    }
}

// ============================================================================
// Test helpers
// ============================================================================

struct TestApp {
    store: InMemoryStore,
    auth: Arc<RecordingAuth>,
    router: Router,
}

fn test_app() -> TestApp {
    let store = InMemoryStore::new()
        .with_project(Project::new("octo/repo").with_shared_secret(SharedSecret::new(SECRET)))
        .with_project(Project::new("octo/infra"));
    let auth = Arc::new(RecordingAuth::default());

    let mapping: ResourceMapping = "g=cd.example.com,v=v1,k=Terraform,p=octo/infra"
        .parse()
        .unwrap();
    let config = Arc::new(GatewayConfig {
        mappings: vec![mapping.clone()],
        ..GatewayConfig::default()
    });

    let classifier = Arc::new(WebhookEventClassifier::new(
        config.clone(),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        auth.clone(),
        Arc::new(CannedGitHub),
    ));
    let translator = ResourceStateTranslator::new(
        mapping,
        config,
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        auth.clone(),
    );

    let state = AppState::new(
        classifier,
        vec![translator],
        ServiceMetrics::new().unwrap(),
    );

    TestApp {
        store,
        auth,
        router: create_router(state),
    }
}

fn comment_body(full_name: &str, association: &str, installation: Option<u64>) -> Vec<u8> {
    let mut body = serde_json::json!({
        "action": "created",
        "issue": {
            "number": 1,
            "pull_request": { "url": "https://api.github.com/repos/octo/repo/pulls/1" }
        },
        "comment": { "author_association": association },
        "repository": { "full_name": full_name }
    });
    if let Some(id) = installation {
        body["installation"] = serde_json::json!({ "id": id });
    }
    serde_json::to_vec(&body).unwrap()
}

fn webhook_request(path: &str, event: &str, body: Vec<u8>, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("x-github-event", event)
        .header("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-hub-signature-256", signature);
    }
    builder.body(Body::from(body)).unwrap()
}

fn sign(body: &[u8]) -> String {
    sign_payload(SignatureAlgorithm::Sha256, SECRET.as_bytes(), body).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Webhook endpoint
// ============================================================================

#[tokio::test]
async fn test_ping_returns_ok_message() {
    let app = test_app();

    let response = app
        .router
        .oneshot(webhook_request("/events/github", "ping", b"{}".to_vec(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, serde_json::json!({"message": "OK"}));
    assert_eq!(app.store.build_count(), 0);
}

#[tokio::test]
async fn test_unsupported_event_is_ignored() {
    let app = test_app();

    let response = app
        .router
        .oneshot(webhook_request("/events/github", "push", b"{}".to_vec(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"message": "Ignored"})
    );
}

#[tokio::test]
async fn test_signed_comment_completes() {
    let app = test_app();
    let body = comment_body("octo/repo", "NONE", None);
    let signature = sign(&body);

    let response = app
        .router
        .oneshot(webhook_request("/events/github", "issue_comment", body, Some(signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"status": "Complete"})
    );
    assert_eq!(app.store.build_count(), 2);
}

#[tokio::test]
async fn test_legacy_sha1_header_is_accepted() {
    let app = test_app();
    let body = comment_body("octo/repo", "NONE", None);
    let signature = sign_payload(SignatureAlgorithm::Sha1, SECRET.as_bytes(), &body).unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/events/github")
        .header("x-github-event", "issue_comment")
        .header("x-hub-signature", signature)
        .body(Body::from(body))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bad_signature_is_forbidden() {
    let app = test_app();
    let body = comment_body("octo/repo", "NONE", None);

    let response = app
        .router
        .oneshot(webhook_request(
            "/events/github",
            "issue_comment",
            body,
            Some(format!("sha256={}", "0".repeat(64))),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"status": "signature mismatch"})
    );
    assert_eq!(app.store.build_count(), 0);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = test_app();

    let response = app
        .router
        .oneshot(webhook_request(
            "/events/github",
            "issue_comment",
            b"{oops".to_vec(),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"status": "Malformed body"})
    );
}

#[tokio::test]
async fn test_unknown_project_is_bad_request() {
    let app = test_app();
    let body = comment_body("octo/unknown", "NONE", None);
    let signature = sign(&body);

    let response = app
        .router
        .oneshot(webhook_request("/events/github", "issue_comment", body, Some(signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_secret_is_server_error() {
    let app = test_app();
    let body = comment_body("octo/infra", "NONE", None);
    let signature = sign(&body);

    let response = app
        .router
        .oneshot(webhook_request("/events/github", "issue_comment", body, Some(signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"status": "No secret is configured for this repo."})
    );
}

#[tokio::test]
async fn test_enrichment_without_installation_is_forbidden() {
    let app = test_app();
    let body = comment_body("octo/repo", "OWNER", None);
    let signature = sign(&body);

    let response = app
        .router
        .oneshot(webhook_request("/events/github", "issue_comment", body, Some(signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        json_body(response).await,
        serde_json::json!({"status": "Auth Failed"})
    );
    assert_eq!(app.store.build_count(), 0);
}

#[tokio::test]
async fn test_installation_route_supplies_installation() {
    let app = test_app();
    let body = comment_body("octo/repo", "OWNER", None);
    let signature = sign(&body);

    let response = app
        .router
        .oneshot(webhook_request(
            "/events/github/123/456",
            "issue_comment",
            body,
            Some(signature),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        *app.auth.installations.lock().unwrap(),
        vec![InstallationId::non_zero(456)]
    );
    assert_eq!(
        app.store.builds()[0].revision.git_ref.as_deref(),
        Some("refs/pull/1/head")
    );
}

#[tokio::test]
async fn test_body_installation_wins_over_route() {
    let app = test_app();
    let body = comment_body("octo/repo", "OWNER", Some(42));
    let signature = sign(&body);

    app.router
        .oneshot(webhook_request(
            "/events/github/123/456",
            "issue_comment",
            body,
            Some(signature),
        ))
        .await
        .unwrap();

    assert_eq!(
        *app.auth.installations.lock().unwrap(),
        vec![InstallationId::non_zero(42)]
    );
}

// ============================================================================
// Reconcile endpoint
// ============================================================================

fn reconcile_request(kind: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/reconcile/{}", kind))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn test_reconcile_returns_completed_snapshot() {
    let app = test_app();
    let request = reconcile_request(
        "terraform",
        serde_json::json!({
            "object": {
                "apiVersion": "cd.example.com/v1",
                "kind": "Terraform",
                "metadata": {
                    "name": "network",
                    "annotations": { "cd.brigade.sh/approved": "true" }
                },
                "spec": {},
                "status": {}
            }
        }),
    );

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["object"]["status"]["phase"], "completed");
    assert_eq!(body["object"]["metadata"]["name"], "network");

    let builds = app.store.builds();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].event_type, "terraform:apply");
}

#[tokio::test]
async fn test_reconcile_kind_is_case_insensitive() {
    let app = test_app();

    let response = app
        .router
        .oneshot(reconcile_request(
            "Terraform",
            serde_json::json!({ "object": { "kind": "Terraform" } }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_reconcile_unknown_kind_is_not_found() {
    let app = test_app();

    let response = app
        .router
        .oneshot(reconcile_request(
            "helmrelease",
            serde_json::json!({ "object": {} }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reconcile_bad_annotation_is_bad_request() {
    let app = test_app();

    let response = app
        .router
        .oneshot(reconcile_request(
            "terraform",
            serde_json::json!({
                "object": {
                    "kind": "Terraform",
                    "metadata": {
                        "annotations": { "cd.brigade.sh/git-repo": "no-owner" }
                    }
                }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.build_count(), 0);
}

#[tokio::test]
async fn test_reconcile_malformed_request_is_bad_request() {
    let app = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/reconcile/terraform")
        .body(Body::from("not json"))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Observability endpoints
// ============================================================================

#[tokio::test]
async fn test_healthz() {
    let app = test_app();

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
}

#[tokio::test]
async fn test_metrics_reflect_handled_requests() {
    let app = test_app();

    app.router
        .clone()
        .oneshot(webhook_request("/events/github", "ping", b"{}".to_vec(), None))
        .await
        .unwrap();
    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#"webhook_requests_total{kind="ping"} 1"#));
}

#[tokio::test]
async fn test_unsupported_event_kinds_share_one_metric_series() {
    let app = test_app();

    for i in 0..20 {
        let response = app
            .router
            .clone()
            .oneshot(webhook_request(
                "/events/github",
                &format!("junk-{i}"),
                b"{}".to_vec(),
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    assert!(text.contains(r#"webhook_requests_total{kind="unrecognized"} 20"#));
    assert!(!text.contains("junk-"));
    let series = text
        .lines()
        .filter(|line| line.starts_with("webhook_requests_total{"))
        .count();
    assert_eq!(series, 1);
}
