//! Classified errors surfaced by both services.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::downstream::DownstreamError;

/// A single rejected field of a create payload or query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the orchestrators.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Referenced id is absent from the local collection.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    /// Malformed create payload or query parameter.
    #[error("validation failed: {}", summarize(.0))]
    Validation(Vec<FieldError>),

    /// Timeout or network failure on the downstream call.
    #[error("service unavailable")]
    DownstreamUnavailable,

    /// Downstream answered with a non-success status.
    #[error("upstream error (status {status})")]
    DownstreamUpstream { status: u16 },

    /// Local failure, e.g. an undecodable downstream body.
    #[error("internal error: {0}")]
    Internal(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: u64) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldError::new(field, message)])
    }

    /// Status code the error maps to on an HTTP-style transport.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::DownstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::DownstreamUpstream { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound { .. } => self.to_string(),
            Self::Validation(_) => "validation failed".to_string(),
            Self::DownstreamUnavailable => "service unavailable".to_string(),
            Self::DownstreamUpstream { .. } => "upstream error".to_string(),
            Self::Internal(_) => "internal error".to_string(),
        }
    }
}

impl From<DownstreamError> for ServiceError {
    fn from(err: DownstreamError) -> Self {
        match err {
            DownstreamError::Unavailable { .. } => Self::DownstreamUnavailable,
            DownstreamError::Upstream { status } => Self::DownstreamUpstream { status },
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::Validation(errors) => serde_json::json!({
                "detail": self.public_message(),
                "errors": errors,
            }),
            _ => serde_json::json!({ "detail": self.public_message() }),
        };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downstream::UnavailableReason;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::not_found("User", 7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::invalid("name", "empty").status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::DownstreamUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServiceError::DownstreamUpstream { status: 500 }.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::DownstreamUpstream { status: 429 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_downstream_errors_classify() {
        let unavailable: ServiceError = DownstreamError::Unavailable {
            reason: UnavailableReason::Timeout,
            detail: "elapsed".into(),
        }
        .into();
        assert!(matches!(unavailable, ServiceError::DownstreamUnavailable));

        let upstream: ServiceError = DownstreamError::Upstream { status: 500 }.into();
        assert!(matches!(upstream, ServiceError::DownstreamUpstream { status: 500 }));
    }

    #[test]
    fn test_messages_name_entity_but_stay_generic_for_downstream() {
        assert_eq!(ServiceError::not_found("User", 7).public_message(), "User 7 not found");
        assert_eq!(
            ServiceError::DownstreamUpstream { status: 502 }.public_message(),
            "upstream error"
        );
        assert_eq!(
            ServiceError::Internal("decode failed".into()).public_message(),
            "internal error"
        );
    }
}
