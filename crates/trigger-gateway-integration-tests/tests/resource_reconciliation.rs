//! Custom resource reconciliation through the HTTP adapter.

mod common;

use axum::http::StatusCode;
use common::*;
use std::sync::Arc;
use trigger_gateway_core::adapters::FilesystemBuildRecorder;
use trigger_gateway_core::{BuildTrigger, GatewayConfig};

#[tokio::test]
async fn test_deleted_resource_records_destroy() {
    let gateway = TestGateway::start().await;
    let mut snapshot = terraform("network", serde_json::json!({}));
    snapshot["metadata"]["deletionTimestamp"] = serde_json::json!("2024-05-01T10:00:00Z");

    let (status, body) = gateway.send(reconcile(snapshot)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"]["status"]["phase"], "completed");
    assert_eq!(
        body["object"]["metadata"]["deletionTimestamp"],
        "2024-05-01T10:00:00Z"
    );

    let builds = gateway.store.builds();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].event_type, "terraform:destroy");
    assert_eq!(builds[0].provider, "brigade-cd");
    assert_eq!(builds[0].project_name, INFRA);
}

#[tokio::test]
async fn test_approved_resource_records_apply() {
    let gateway = TestGateway::start().await;
    let snapshot = terraform(
        "network",
        serde_json::json!({ "cd.brigade.sh/approved": "true" }),
    );

    let (status, body) = gateway.send(reconcile(snapshot)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"]["status"]["phase"], "completed");
    assert_eq!(body["object"]["spec"]["module"], "./network");

    let builds = gateway.store.builds();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].event_type, "terraform:apply");

    let payload = builds[0].payload().unwrap();
    assert_eq!(payload.event_type, "terraform");
    assert_eq!(payload.body["metadata"]["name"], "network");
    assert!(payload.token.is_none());
}

#[tokio::test]
async fn test_dry_run_resource_records_plan() {
    let gateway = TestGateway::start().await;
    let snapshot = terraform(
        "network",
        serde_json::json!({
            "cd.brigade.sh/approved": "true",
            "cd.brigade.sh/dry-run": "true"
        }),
    );

    let (status, _) = gateway.send(reconcile(snapshot)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(gateway.store.builds()[0].event_type, "terraform:plan");
}

#[tokio::test]
async fn test_annotated_resource_is_linked_to_pull_request() {
    let gateway = TestGateway::start().await;
    gateway.mock_token_exchange().await;
    let snapshot = terraform(
        "network",
        serde_json::json!({
            "cd.brigade.sh/github-app-inst-id": INSTALLATION_ID.to_string(),
            "cd.brigade.sh/git-repo": "octo/repo",
            "cd.brigade.sh/git-commit": HEAD_SHA,
            "cd.brigade.sh/git-branch": "feature",
            "cd.brigade.sh/github-pull-id": "7"
        }),
    );

    let (status, _) = gateway.send(reconcile(snapshot)).await;

    assert_eq!(status, StatusCode::OK);
    let build = &gateway.store.builds()[0];
    assert_eq!(build.revision.commit.as_deref(), Some(HEAD_SHA));
    assert_eq!(build.revision.git_ref.as_deref(), Some("refs/heads/feature"));

    let payload = build.payload().unwrap();
    assert_eq!(payload.token.as_deref(), Some(TOKEN));
    assert_eq!(payload.owner.as_deref(), Some("octo"));
    assert_eq!(payload.repo.as_deref(), Some("repo"));
    assert_eq!(payload.pull.as_deref(), Some("7"));
    assert_eq!(
        payload.pull_url,
        Some(format!("{}/repos/octo/repo/pulls/7", gateway.github.uri()))
    );
}

#[tokio::test]
async fn test_rejected_token_exchange_fails_reconciliation() {
    let gateway = TestGateway::start().await;
    wiremock::Mock::given(wiremock::matchers::method("POST"))
        .respond_with(wiremock::ResponseTemplate::new(403))
        .mount(&gateway.github)
        .await;
    let snapshot = terraform(
        "network",
        serde_json::json!({ "cd.brigade.sh/github-app-inst-id": "42" }),
    );

    let (status, _) = gateway.send(reconcile(snapshot)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(gateway.store.build_count(), 0);
}

#[tokio::test]
async fn test_unmapped_kind_is_not_found() {
    let gateway = TestGateway::start().await;
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/reconcile/helmrelease")
        .body(axum::body::Body::from(r#"{"object":{}}"#))
        .unwrap();

    let (status, _) = gateway.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(gateway.store.build_count(), 0);
}

#[tokio::test]
async fn test_builds_are_written_to_the_build_directory() {
    let dir = tempfile::tempdir().unwrap();
    let recorder = FilesystemBuildRecorder::new(dir.path().to_path_buf())
        .await
        .unwrap();
    let gateway = TestGateway::start_with(GatewayConfig::default(), Some(Arc::new(recorder))).await;
    let snapshot = terraform(
        "network",
        serde_json::json!({ "cd.brigade.sh/approved": "yes" }),
    );

    let (status, _) = gateway.send(reconcile(snapshot)).await;
    assert_eq!(status, StatusCode::OK);

    let project_dirs: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(project_dirs.len(), 1);

    let files: Vec<_> = std::fs::read_dir(&project_dirs[0])
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);

    let trigger: BuildTrigger =
        serde_json::from_slice(&std::fs::read(&files[0]).unwrap()).unwrap();
    assert_eq!(trigger.event_type, "terraform:apply");
    assert_eq!(trigger.project_name, INFRA);
    assert!(trigger.project_id.as_str().starts_with("brigade-"));
}
