//! Response shaping.
//!
//! # Responsibilities
//! - Serialize orchestrator results as JSON
//! - Map `ServiceError` to its status code and body
//! - Tag every response with the request's trace id

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::ServiceError;
use crate::trace::TraceContext;

pub const X_TRACE_ID: &str = "x-trace-id";

/// Turn an orchestrator result into a response carrying `x-trace-id`.
pub fn respond<T: Serialize>(
    ctx: &TraceContext,
    status: StatusCode,
    result: Result<T, ServiceError>,
) -> Response {
    let mut response = match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(err) => err.into_response(),
    };
    if let Ok(value) = HeaderValue::from_str(&ctx.trace_id.to_string()) {
        response.headers_mut().insert(X_TRACE_ID, value);
    }
    response
}
