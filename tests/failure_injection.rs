//! Failure injection tests for the user → catalog call.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use tracelink::downstream::RECOMMEND_CALL;
use tracelink::trace::span::DROPPED_DETAIL;
use tracelink::trace::SpanStatus;

mod common;

#[tokio::test]
async fn test_catalog_server_error_passes_through() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let (addr, _) = common::start_programmable_backend(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (500, r#"{"detail":"boom"}"#.to_string())
        }
    })
    .await;
    let (user_url, spans, _shutdown) =
        common::start_user_service(&format!("http://{}", addr), |_| {}).await;

    let res = reqwest::get(format!("{}/users/1/recommendations", user_url))
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
    assert!(res.headers().contains_key("x-trace-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "upstream error");

    // Exactly one attempt, no retries.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let client_span = spans.find(RECOMMEND_CALL).unwrap();
    assert!(client_span.status.is_error());
    assert_eq!(
        client_span.attribute("http.status_code"),
        Some(&500u16.into())
    );
    assert!(spans.find("get_user_recommendations").unwrap().status.is_error());
}

#[tokio::test]
async fn test_slow_catalog_times_out_as_unavailable() {
    let (addr, _) = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_secs(3)).await;
        (200, "[]".to_string())
    })
    .await;
    let (user_url, spans, _shutdown) =
        common::start_user_service(&format!("http://{}", addr), |config| {
            config.downstream.timeout_secs = 1;
        })
        .await;

    let res = reqwest::get(format!("{}/users/1/recommendations", user_url))
        .await
        .unwrap();

    assert_eq!(res.status(), 503);
    let client_span = spans.find(RECOMMEND_CALL).unwrap();
    assert!(client_span.status.is_error());
    assert_eq!(
        client_span.attribute("downstream.outcome"),
        Some(&"timeout".into())
    );
}

#[tokio::test]
async fn test_request_deadline_cancels_downstream_call() {
    let (addr, _) = common::start_programmable_backend(|| async {
        tokio::time::sleep(Duration::from_secs(4)).await;
        (200, "[]".to_string())
    })
    .await;
    let (user_url, spans, _shutdown) =
        common::start_user_service(&format!("http://{}", addr), |config| {
            config.timeouts.request_secs = 1;
            config.downstream.timeout_secs = 30;
        })
        .await;

    let res = reqwest::get(format!("{}/users/1/recommendations", user_url))
        .await
        .unwrap();
    assert_eq!(res.status(), 503);

    // The abandoned call is still closed, with an error status.
    let client_span = spans.find(RECOMMEND_CALL).unwrap();
    assert_eq!(client_span.status, SpanStatus::Error(DROPPED_DETAIL.into()));
    assert!(client_span.end.is_some());

    let root = spans.find("get_user_recommendations").unwrap();
    assert!(root.events.iter().any(|e| e.name == "deadline_exceeded"));
    assert_eq!(root.trace_id, client_span.trace_id);
}

#[tokio::test]
async fn test_catalog_down_is_unavailable() {
    let addr = common::closed_port().await;
    let (user_url, spans, _shutdown) =
        common::start_user_service(&format!("http://{}", addr), |_| {}).await;

    let res = reqwest::get(format!("{}/users/1/recommendations", user_url))
        .await
        .unwrap();

    assert_eq!(res.status(), 503);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "service unavailable");
    assert!(spans.find(RECOMMEND_CALL).unwrap().status.is_error());
}

#[tokio::test]
async fn test_unknown_user_never_calls_catalog() {
    let (addr, seen) = common::start_programmable_backend(|| async {
        (200, "[]".to_string())
    })
    .await;
    let (user_url, spans, _shutdown) =
        common::start_user_service(&format!("http://{}", addr), |_| {}).await;

    let res = reqwest::get(format!("{}/users/42/recommendations", user_url))
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "User 42 not found");
    assert!(seen.lock().unwrap().is_empty());
    assert!(spans.find(RECOMMEND_CALL).is_none());
}

#[tokio::test]
async fn test_limit_above_maximum_is_rejected() {
    let stack = common::start_stack().await;
    let res = reqwest::get(format!("{}/users/1/recommendations?limit=101", stack.user_url))
        .await
        .unwrap();

    assert_eq!(res.status(), 422);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"][0]["field"], "limit");
    assert!(stack.spans.find(RECOMMEND_CALL).is_none());
    assert!(stack
        .spans
        .find("get_user_recommendations")
        .unwrap()
        .status
        .is_error());
}

#[tokio::test]
async fn test_malformed_user_payload_is_traced() {
    let stack = common::start_stack().await;
    let res = reqwest::Client::new()
        .post(format!("{}/users", stack.user_url))
        .json(&serde_json::json!({ "name": "No Email" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 422);
    let trace_id = res.headers()["x-trace-id"].to_str().unwrap().to_string();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["errors"][0]["field"], "email");

    let span = stack.spans.find("create_user").unwrap();
    assert_eq!(span.trace_id.to_string(), trace_id);
    assert!(span.status.is_error());
}
