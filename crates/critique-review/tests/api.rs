use std::fs;
use std::path::Path;
use std::time::Duration;

use critique_core::{ApiConfig, CodeReview, CritiqueError, ReviewConfig};
use critique_review::llm::{LlmClient, ReviewBackend};
use critique_review::pacing::RetryPolicy;
use critique_review::pipeline::ReviewPipeline;
use mockito::{Matcher, Server};
use serde_json::json;

const PATH: &str = "/v1/messages";

fn api_config(server_url: &str) -> ApiConfig {
    ApiConfig {
        url: format!("{server_url}{PATH}"),
        api_key: Some("test-key".into()),
        model: "test-model".into(),
        version: "2023-06-01".into(),
        max_tokens: 256,
        ..ApiConfig::default()
    }
}

fn review_config() -> ReviewConfig {
    ReviewConfig {
        file_extensions: vec![".java".into()],
        request_delay_ms: 0,
        ..ReviewConfig::default()
    }
}

fn ok_body(text: &str) -> String {
    json!({
        "id": "msg_01",
        "type": "message",
        "role": "assistant",
        "content": [{ "type": "text", "text": text }],
        "stop_reason": "end_turn"
    })
    .to_string()
}

async fn review_with_status(status: usize, body: &str) -> Result<String, CritiqueError> {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(status)
        .with_body(body)
        .create_async()
        .await;
    let client = LlmClient::new(&api_config(&server.url())).unwrap();
    client.review("prompt").await
}

#[tokio::test]
async fn request_carries_headers_and_body() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("x-api-key", "test-key")
        .match_header("anthropic-version", "2023-06-01")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "model": "test-model",
            "max_tokens": 256,
            "messages": [{ "role": "user", "content": "review me" }]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(ok_body("LOOKS GOOD"))
        .create_async()
        .await;

    let client = LlmClient::new(&api_config(&server.url())).unwrap();
    let text = client.review("review me").await.unwrap();

    assert_eq!(text, "LOOKS GOOD");
    mock.assert_async().await;
}

#[tokio::test]
async fn status_401_is_authentication_error() {
    let err = review_with_status(401, r#"{"error":"invalid x-api-key"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, CritiqueError::Authentication));
}

#[tokio::test]
async fn status_429_is_rate_limited() {
    let err = review_with_status(429, "").await.unwrap_err();
    assert!(matches!(err, CritiqueError::RateLimited));
}

#[tokio::test]
async fn status_529_is_overloaded() {
    let err = review_with_status(529, "").await.unwrap_err();
    assert!(matches!(err, CritiqueError::ServiceOverloaded));
}

#[tokio::test]
async fn other_error_status_is_api_error_with_code() {
    let err = review_with_status(500, "boom").await.unwrap_err();
    match err {
        CritiqueError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn empty_success_body_is_empty_response() {
    let err = review_with_status(200, "").await.unwrap_err();
    assert!(matches!(err, CritiqueError::EmptyResponse));
}

#[tokio::test]
async fn empty_or_missing_content_is_malformed() {
    let err = review_with_status(200, r#"{"content":[]}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, CritiqueError::MalformedResponse(_)));

    let err = review_with_status(200, r#"{"id":"msg_01"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, CritiqueError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_endpoint_is_network_error() {
    let config = ApiConfig {
        url: "http://127.0.0.1:1/v1/messages".into(),
        api_key: Some("k".into()),
        connect_timeout_secs: 2,
        ..ApiConfig::default()
    };
    let client = LlmClient::new(&config).unwrap();
    let err = client.review("prompt").await.unwrap_err();
    assert!(matches!(err, CritiqueError::Network(_)));
}

#[tokio::test]
async fn single_file_scenario() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body(r#"{"content":[{"text":"LOOKS GOOD"}]}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Foo.java");
    fs::write(&path, "class Foo { int x; }").unwrap();

    let client = LlmClient::new(&api_config(&server.url())).unwrap();
    let pipeline = ReviewPipeline::new(client, review_config());
    let review = pipeline.review_file(&path).await.unwrap();

    assert_eq!(
        review,
        CodeReview {
            filename: "Foo.java".into(),
            review_text: "LOOKS GOOD".into(),
        }
    );
}

fn write_batch(root: &Path) {
    fs::write(root.join("A.java"), "class A {}").unwrap();
    fs::write(root.join("B.java"), "class B {}").unwrap();
    fs::write(root.join("C.java"), "class C {}").unwrap();
    fs::write(root.join("build.gradle"), "apply plugin: 'java'").unwrap();
}

#[tokio::test]
async fn batch_scenario_skips_rejected_file() {
    let mut server = Server::new_async().await;
    let rejected = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex(r"File: B\.java".into()))
        .with_status(401)
        .create_async()
        .await;
    let accepted = server
        .mock("POST", PATH)
        .match_body(Matcher::Regex(r"File: [AC]\.java".into()))
        .with_status(200)
        .with_body(ok_body("fine"))
        .expect(2)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    write_batch(dir.path());

    let client = LlmClient::new(&api_config(&server.url())).unwrap();
    let pipeline = ReviewPipeline::new(client, review_config());
    let report = pipeline.review_directory(dir.path()).await.unwrap();

    assert_eq!(report.files_found, 3);
    let names: Vec<&str> = report.reviews.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(names, vec!["A.java", "C.java"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].path, "B.java");

    rejected.assert_async().await;
    accepted.assert_async().await;
}

#[tokio::test]
async fn retry_policy_repeats_rate_limited_calls() {
    let mut server = Server::new_async().await;
    let limited = server
        .mock("POST", PATH)
        .with_status(429)
        .expect(3)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Foo.java");
    fs::write(&path, "class Foo {}").unwrap();

    let client = LlmClient::new(&api_config(&server.url())).unwrap();
    let pipeline = ReviewPipeline::new(client, review_config())
        .with_retry_policy(RetryPolicy::new(2, Duration::from_millis(1)));
    let err = pipeline.review_file(&path).await.unwrap_err();

    assert!(matches!(err, CritiqueError::RateLimited));
    limited.assert_async().await;
}

#[tokio::test]
async fn retry_policy_leaves_auth_failures_alone() {
    let mut server = Server::new_async().await;
    let rejected = server
        .mock("POST", PATH)
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Foo.java");
    fs::write(&path, "class Foo {}").unwrap();

    let client = LlmClient::new(&api_config(&server.url())).unwrap();
    let pipeline = ReviewPipeline::new(client, review_config())
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)));
    let err = pipeline.review_file(&path).await.unwrap_err();

    assert!(matches!(err, CritiqueError::Authentication));
    rejected.assert_async().await;
}
