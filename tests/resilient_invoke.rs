//! Upstream failure-handling tests for `GeminiClient`.
//!
//! Each test spins up its own mockito server and drives the client through
//! one failure shape: rate limiting, hard failures, empty responses and
//! unparseable payloads. Backoff runs against real time, so the retry tests
//! take a few seconds each.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mockito::{Matcher, Server};
use serde_json::json;

use resumatch_core::client::parse_string_array;
use resumatch_core::{Error, EventRecorder, GeminiClient, GeminiConfig, GenerateRequest};

const GENERATE_PATH: &str = "/models/gemini-2.0-flash-exp:generateContent";

/// Wraps `text` in the candidate envelope the upstream API produces.
fn envelope(text: &str) -> String {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] }
        }]
    })
    .to_string()
}

fn keyword_schema() -> serde_json::Value {
    json!({ "type": "ARRAY", "items": { "type": "STRING" } })
}

fn keyword_request() -> GenerateRequest {
    GenerateRequest::new(
        "Extract the technical keywords as a JSON array of strings.",
        "Senior Rust engineer: tokio, gRPC, Kubernetes.",
    )
}

#[tokio::test]
async fn parses_successful_response() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(r#"["rust", "tokio", "grpc"]"#))
        .create_async()
        .await;

    let recorder = Arc::new(EventRecorder::new());
    let client = GeminiClient::new(GeminiConfig::new("test-key").with_base_url(server.url()))
        .expect("client construction")
        .with_recorder(recorder.clone());

    let keywords = client
        .invoke(
            &keyword_request(),
            &keyword_schema(),
            parse_string_array,
            Vec::new(),
        )
        .await
        .expect("invoke");

    assert_eq!(keywords, vec!["rust", "tokio", "grpc"]);
    assert_eq!(recorder.stats(None).calls, 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn recovers_after_rate_limit_backoff() {
    let mut server = Server::new_async().await;
    let rate_limited = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body(r#"{"error": {"message": "quota exceeded"}}"#)
        .expect(2)
        .create_async()
        .await;

    let recorder = Arc::new(EventRecorder::new());
    let client = GeminiClient::new(GeminiConfig::new("test-key").with_base_url(server.url()))
        .expect("client construction")
        .with_recorder(recorder.clone());

    let started = Instant::now();
    let invocation = tokio::spawn(async move {
        client
            .invoke(
                &keyword_request(),
                &keyword_schema(),
                parse_string_array,
                Vec::new(),
            )
            .await
    });

    // Swap in a healthy mock while the client sits out its second backoff
    // (4s). Only one mock is ever registered at a time, so the third
    // attempt can only land on the healthy response.
    let deadline = Instant::now() + Duration::from_secs(10);
    while !rate_limited.matched_async().await {
        assert!(
            Instant::now() < deadline,
            "rate-limited mock never reached two hits"
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    rate_limited.assert_async().await;
    rate_limited.remove_async().await;
    let healthy = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope(r#"["kubernetes", "rust"]"#))
        .create_async()
        .await;

    let keywords = invocation.await.expect("join").expect("invoke");

    assert_eq!(keywords, vec!["kubernetes", "rust"]);
    // The two rate-limited attempts back off 2s then 4s before the third.
    assert!(started.elapsed() >= Duration::from_secs(6));
    assert_eq!(recorder.stats(None).calls, 3);
    healthy.assert_async().await;
}

#[tokio::test]
async fn rate_limit_exhaustion_falls_back() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body(r#"{"error": {"message": "quota exceeded"}}"#)
        .expect(3)
        .create_async()
        .await;

    let recorder = Arc::new(EventRecorder::new());
    let client = GeminiClient::new(GeminiConfig::new("test-key").with_base_url(server.url()))
        .expect("client construction")
        .with_recorder(recorder.clone());

    let started = Instant::now();
    let keywords = client
        .invoke(
            &keyword_request(),
            &keyword_schema(),
            parse_string_array,
            vec!["fallback".to_string()],
        )
        .await
        .expect("retryable exhaustion must not surface an error");

    assert_eq!(keywords, vec!["fallback"]);
    assert!(started.elapsed() >= Duration::from_secs(6));
    assert_eq!(recorder.stats(None).calls, 3);
    assert_eq!(recorder.stats(None).errors, 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn hard_failure_propagates_without_retry() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create_async()
        .await;

    let recorder = Arc::new(EventRecorder::new());
    let client = GeminiClient::new(GeminiConfig::new("test-key").with_base_url(server.url()))
        .expect("client construction")
        .with_recorder(recorder.clone());

    let result = client
        .invoke(
            &keyword_request(),
            &keyword_schema(),
            parse_string_array,
            Vec::new(),
        )
        .await;

    match result {
        Err(Error::Upstream { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("internal error"));
        }
        other => panic!("expected upstream failure, got {other:?}"),
    }
    assert_eq!(recorder.stats(None).calls, 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn empty_responses_exhaust_into_fallback() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope("  \n"))
        .expect(3)
        .create_async()
        .await;

    let recorder = Arc::new(EventRecorder::new());
    let client = GeminiClient::new(GeminiConfig::new("test-key").with_base_url(server.url()))
        .expect("client construction")
        .with_recorder(recorder.clone());

    let started = Instant::now();
    let keywords = client
        .invoke(
            &keyword_request(),
            &keyword_schema(),
            parse_string_array,
            vec!["fallback".to_string()],
        )
        .await
        .expect("empty responses must not surface an error");

    assert_eq!(keywords, vec!["fallback"]);
    // A fixed 1s pause separates each of the three attempts.
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(recorder.stats(None).calls, 3);
    mock.assert_async().await;
}

#[tokio::test]
async fn malformed_envelope_is_retried_then_falls_back() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html>gateway error page</html>")
        .expect(2)
        .create_async()
        .await;

    let recorder = Arc::new(EventRecorder::new());
    let client = GeminiClient::new(GeminiConfig::new("test-key").with_base_url(server.url()))
        .expect("client construction")
        .with_recorder(recorder.clone());
    let request = keyword_request().with_max_retries(2);

    let keywords = client
        .invoke(
            &request,
            &keyword_schema(),
            parse_string_array,
            vec!["fallback".to_string()],
        )
        .await
        .expect("unreadable 2xx bodies must not surface an error");

    assert_eq!(keywords, vec!["fallback"]);
    assert_eq!(recorder.stats(None).calls, 2);
    mock.assert_async().await;
}

#[tokio::test]
async fn parser_rejection_uses_fallback() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope("The keywords are rust and tokio."))
        .expect(1)
        .create_async()
        .await;

    let recorder = Arc::new(EventRecorder::new());
    let client = GeminiClient::new(GeminiConfig::new("test-key").with_base_url(server.url()))
        .expect("client construction")
        .with_recorder(recorder.clone());

    let keywords = client
        .invoke(
            &keyword_request(),
            &keyword_schema(),
            parse_string_array,
            vec!["unchanged".to_string()],
        )
        .await
        .expect("parser rejection must not surface an error");

    // The response arrived, so no retry happens; the fallback papers over
    // the parse failure.
    assert_eq!(keywords, vec!["unchanged"]);
    assert_eq!(recorder.stats(None).calls, 1);
    mock.assert_async().await;
}
