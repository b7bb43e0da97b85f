//! Cross-cutting HTTP middleware: request metrics and CORS.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;
use crate::observability::metrics::{self, RequestMetrics};

/// Record per-route counts and latency. Mounted with `route_layer`, so the
/// matched path is always known.
pub async fn track_requests(
    State(tally): State<Arc<RequestMetrics>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let route = format!("{} {}", method, path);
    tally.observe(&route, status, start.elapsed());
    metrics::record_request(&method, status, &path, start);
    response
}

/// Build the CORS layer. `*` in the origin list allows any origin.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}
