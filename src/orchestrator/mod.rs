//! Request orchestration subsystem.
//!
//! # State Machine (per request)
//! ```text
//! Start → LocalLookup → (optional) DownstreamCall → Compose → Finish
//!   │          │                    │                  │
//!   └──────────┴────────────────────┴──────────────────┴──→ Error
//! ```
//!
//! # Responsibilities
//! - Open one root span per operation from the inbound context
//! - Resolve local records through the repository
//! - Call the catalog service when the operation needs it
//! - Fold results through the recommendation engine
//! - Close spans with the outcome and return a classified result
//!
//! # Design Decisions
//! - Transport independent: handlers pass an extracted `TraceContext`
//! - Local lookup failures short-circuit before any network work
//! - No lock is held across the downstream await

pub mod catalog;
pub mod users;

pub use catalog::{CatalogService, CategoryCount, ListFilter};
pub use users::UserService;

use crate::error::ServiceError;
use crate::trace::{Span, SpanStatus, TraceContext, Tracer};

/// Largest `limit` accepted on any listing.
pub const MAX_LIMIT: usize = 100;

/// Default `limit` for listings.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Default `limit` for recommendations.
pub const DEFAULT_RECOMMEND_LIMIT: usize = 5;

/// Validated limit/skip pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub skip: usize,
}

impl Page {
    pub fn new(limit: Option<usize>, skip: Option<usize>, default_limit: usize) -> Result<Self, ServiceError> {
        Ok(Self {
            limit: checked_limit(limit, default_limit)?,
            skip: skip.unwrap_or(0),
        })
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.skip).take(self.limit).collect()
    }
}

/// Resolve an optional `limit`, rejecting values above [`MAX_LIMIT`].
pub fn checked_limit(limit: Option<usize>, default: usize) -> Result<usize, ServiceError> {
    match limit {
        None => Ok(default),
        Some(l) if l <= MAX_LIMIT => Ok(l),
        Some(_) => Err(ServiceError::invalid(
            "limit",
            format!("must be at most {}", MAX_LIMIT),
        )),
    }
}

/// Record a request that failed before reaching `operation`, under that
/// operation's span.
pub(crate) fn reject<T>(
    tracer: &Tracer,
    ctx: &TraceContext,
    operation: &'static str,
    err: ServiceError,
) -> Result<T, ServiceError> {
    let (mut span, _) = tracer.start_span(operation, ctx);
    span.set_attribute("request.rejected", true);
    finish_span(span, Err(err))
}

/// Set the span status from `result`, finish the span, hand the result back.
pub(crate) fn finish_span<T>(mut span: Span, result: Result<T, ServiceError>) -> Result<T, ServiceError> {
    match &result {
        Ok(_) => span.set_status(SpanStatus::Ok),
        Err(err) => {
            span.set_attribute("error.kind", error_kind(err));
            span.record_error(err);
        }
    }
    span.finish();
    result
}

fn error_kind(err: &ServiceError) -> &'static str {
    match err {
        ServiceError::NotFound { .. } => "not_found",
        ServiceError::Validation(_) => "validation",
        ServiceError::DownstreamUnavailable => "downstream_unavailable",
        ServiceError::DownstreamUpstream { .. } => "downstream_upstream",
        ServiceError::Internal(_) => "internal",
    }
}
