//! Inbound request handling.
//!
//! # Responsibilities
//! - Assign a request ID (UUID v4) unless the caller sent one
//! - Extract the trace context from inbound headers
//! - Turn extractor rejections into field-level validation errors
//!
//! # Design Decisions
//! - Extraction never rejects a request; bad context mints a new root
//! - New roots take their sampled flag from service config

use std::convert::Infallible;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::error::FieldError;
use crate::trace::{propagation, TraceContext};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer assigning `x-request-id` to requests that lack one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Layer copying `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Trace settings a service applies to inbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceSettings {
    /// Sampled flag given to traces minted here.
    pub sample_new_traces: bool,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            sample_new_traces: true,
        }
    }
}

/// The trace context of the inbound request.
#[derive(Debug, Clone)]
pub struct InboundTrace(pub TraceContext);

impl<S> FromRequestParts<S> for InboundTrace
where
    S: Send + Sync,
    TraceSettings: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let settings = TraceSettings::from_ref(state);
        let mut context = propagation::extract(&parts.headers);
        if context.is_root() {
            context.sampled = settings.sample_new_traces;
        }
        Ok(InboundTrace(context))
    }
}

/// Field error for a body that did not deserialize.
pub fn body_error(rejection: &JsonRejection) -> FieldError {
    rejection_field_error("body", rejection.body_text())
}

/// Field error for a query string that did not deserialize.
pub fn query_error(rejection: &QueryRejection) -> FieldError {
    rejection_field_error("query", rejection.body_text())
}

/// Field error for a path segment that did not parse.
pub fn path_error(rejection: &PathRejection) -> FieldError {
    rejection_field_error("path", rejection.body_text())
}

fn rejection_field_error(fallback: &str, detail: String) -> FieldError {
    let field = failing_field(&detail).unwrap_or_else(|| fallback.to_string());
    FieldError::new(field, detail)
}

/// Name the field a deserialization message points at, if any.
///
/// Handles serde's "missing field `x`" and the `path: message` prefix axum
/// adds for data errors ("...: limit: invalid digit found in string").
fn failing_field(detail: &str) -> Option<String> {
    if let Some(rest) = detail.split("missing field `").nth(1) {
        return rest.split('`').next().map(str::to_string);
    }

    let mut parts = detail.split(": ");
    parts.next()?;
    let path = parts.next()?;
    parts.next()?;
    let is_path = !path.is_empty()
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'));
    is_path.then(|| path.to_string())
}
