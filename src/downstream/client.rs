//! Traced HTTP client for the cross-service call.

use std::time::Duration;

use axum::body::Bytes;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::downstream::error::DownstreamError;
use crate::observability::metrics;
use crate::trace::{propagation, SpanStatus, TraceContext, Tracer};

/// Timeout applied when a request does not set its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One logical downstream call.
#[derive(Debug, Clone)]
pub struct DownstreamRequest {
    /// Logical call name, used as the span name.
    pub name: String,
    pub method: Method,
    pub url: Url,
    pub params: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl DownstreamRequest {
    pub fn get(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            method: Method::GET,
            url,
            params: Vec::new(),
            timeout: None,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Successful downstream response, not yet decoded.
#[derive(Debug, Clone)]
pub struct DownstreamBody {
    status: StatusCode,
    bytes: Bytes,
}

impl DownstreamBody {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Decode into the caller's expected shape.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.bytes)
    }
}

/// Client that propagates trace context and records one span per call.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    http: Client,
    tracer: Tracer,
    default_timeout: Duration,
}

impl DownstreamClient {
    pub fn new(tracer: Tracer, default_timeout: Duration) -> Self {
        Self::with_client(Client::new(), tracer, default_timeout)
    }

    pub fn with_client(http: Client, tracer: Tracer, default_timeout: Duration) -> Self {
        Self {
            http,
            tracer,
            default_timeout,
        }
    }

    /// Perform the call as a child of `current`. Exactly one attempt.
    ///
    /// If the returned future is dropped (caller deadline), the span is still
    /// closed, with an error status.
    pub async fn call(
        &self,
        request: DownstreamRequest,
        current: &TraceContext,
    ) -> Result<DownstreamBody, DownstreamError> {
        let (mut span, call_ctx) = self.tracer.start_span(request.name.as_str(), current);
        let timeout = request.timeout.unwrap_or(self.default_timeout);

        span.set_attribute("http.method", request.method.as_str());
        span.set_attribute("http.url", request.url.as_str());
        span.set_attribute("downstream.timeout_ms", timeout.as_millis() as u64);
        if let Some(host) = request.url.host_str() {
            span.set_attribute("peer.host", host);
        }

        tracing::debug!(
            trace_id = %call_ctx.trace_id,
            call = %request.name,
            url = %request.url,
            timeout_ms = timeout.as_millis() as u64,
            "Calling downstream"
        );

        let result = self.send(&request, &call_ctx, timeout).await;

        match &result {
            Ok(body) => {
                span.set_attribute("http.status_code", body.status().as_u16());
                span.set_status(SpanStatus::Ok);
                metrics::record_downstream_call(&request.name, "ok");
            }
            Err(err) => {
                if let DownstreamError::Upstream { status } = err {
                    span.set_attribute("http.status_code", *status);
                }
                span.set_attribute("downstream.outcome", err.outcome());
                span.record_error(err);
                metrics::record_downstream_call(&request.name, err.outcome());
                tracing::warn!(
                    trace_id = %call_ctx.trace_id,
                    call = %request.name,
                    error = %err,
                    "Downstream call failed"
                );
            }
        }

        span.finish();
        result
    }

    async fn send(
        &self,
        request: &DownstreamRequest,
        call_ctx: &TraceContext,
        timeout: Duration,
    ) -> Result<DownstreamBody, DownstreamError> {
        let headers = propagation::inject(call_ctx);

        let exchange = async {
            let response = self
                .http
                .request(request.method.clone(), request.url.clone())
                .query(&request.params)
                .headers(headers)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                return Err(DownstreamError::Upstream {
                    status: status.as_u16(),
                });
            }

            let bytes = response.bytes().await?;
            Ok::<_, DownstreamError>(DownstreamBody { status, bytes })
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(DownstreamError::timeout(format!(
                "no response within {}ms",
                timeout.as_millis()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::HeaderMap, routing::get, Router};
    use tokio::net::TcpListener;

    use crate::downstream::UnavailableReason;
    use crate::trace::{MemorySink, SpanStatus, TRACEPARENT_HEADER};

    type Seen = Arc<Mutex<Option<HeaderMap>>>;

    async fn spawn_peer(status: u16, delay: Duration, seen: Seen) -> Url {
        async fn handler(
            State((status, delay, seen)): State<(u16, Duration, Seen)>,
            headers: HeaderMap,
        ) -> (axum::http::StatusCode, String) {
            *seen.lock().unwrap() = Some(headers);
            tokio::time::sleep(delay).await;
            (
                axum::http::StatusCode::from_u16(status).unwrap(),
                r#"{"ok":true}"#.to_string(),
            )
        }

        let app = Router::new()
            .route("/peer", get(handler))
            .with_state((status, delay, seen));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Url::parse(&format!("http://{}/peer", addr)).unwrap()
    }

    fn client() -> (DownstreamClient, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let tracer = Tracer::new("caller", sink.clone());
        (DownstreamClient::new(tracer, DEFAULT_TIMEOUT), sink)
    }

    #[tokio::test]
    async fn test_injects_context_with_same_trace_id() {
        let seen: Seen = Arc::default();
        let url = spawn_peer(200, Duration::ZERO, seen.clone()).await;
        let (client, sink) = client();
        let parent = TraceContext::new_root().with_baggage("tenant", "acme");

        let body = client
            .call(DownstreamRequest::get("peer.get", url).param("limit", 3), &parent)
            .await
            .unwrap();
        assert_eq!(body.json::<serde_json::Value>().unwrap()["ok"], true);

        let headers = seen.lock().unwrap().take().unwrap();
        let received = propagation::extract(&headers);
        assert_eq!(received.trace_id, parent.trace_id);
        assert_eq!(received.baggage.get("tenant").map(String::as_str), Some("acme"));
        assert!(headers.get(TRACEPARENT_HEADER).is_some());

        let span = sink.find("peer.get").unwrap();
        assert_eq!(span.status, SpanStatus::Ok);
        assert_eq!(received.span_id, Some(span.span_id));
        assert_eq!(span.attribute("http.status_code"), Some(&200u16.into()));
    }

    #[tokio::test]
    async fn test_non_success_status_is_preserved() {
        let url = spawn_peer(500, Duration::ZERO, Seen::default()).await;
        let (client, sink) = client();

        let err = client
            .call(DownstreamRequest::get("peer.get", url), &TraceContext::new_root())
            .await
            .unwrap_err();
        assert!(matches!(err, DownstreamError::Upstream { status: 500 }));

        let span = sink.find("peer.get").unwrap();
        assert!(span.status.is_error());
        assert_eq!(span.events[0].name, "exception");
    }

    #[tokio::test]
    async fn test_timeout_is_unavailable_and_span_errors() {
        let url = spawn_peer(200, Duration::from_secs(5), Seen::default()).await;
        let (client, sink) = client();

        let err = client
            .call(
                DownstreamRequest::get("peer.get", url).timeout(Duration::from_millis(100)),
                &TraceContext::new_root(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DownstreamError::Unavailable {
                reason: UnavailableReason::Timeout,
                ..
            }
        ));
        assert!(sink.find("peer.get").unwrap().status.is_error());
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (client, sink) = client();
        let url = Url::parse(&format!("http://{}/peer", addr)).unwrap();
        let err = client
            .call(DownstreamRequest::get("peer.get", url), &TraceContext::new_root())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DownstreamError::Unavailable {
                reason: UnavailableReason::Network,
                ..
            }
        ));
        assert_eq!(sink.len(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_call_still_closes_span() {
        let url = spawn_peer(200, Duration::from_secs(5), Seen::default()).await;
        let (client, sink) = client();
        let parent = TraceContext::new_root();

        let outcome = tokio::time::timeout(
            Duration::from_millis(100),
            client.call(DownstreamRequest::get("peer.get", url), &parent),
        )
        .await;
        assert!(outcome.is_err());

        let span = sink.find("peer.get").unwrap();
        assert!(span.status.is_error());
        assert_eq!(span.trace_id, parent.trace_id);
    }
}
