//! Downstream call subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator (current TraceContext)
//!     → client.rs opens a child span named after the logical call
//!     → trace::propagation::inject(child context) → outgoing headers
//!     → one HTTP attempt, bounded by a timeout
//!     → error.rs classifies the outcome (Unavailable / Upstream)
//!     → span status + exception event, span finished
//! ```
//!
//! # Design Decisions
//! - Exactly one attempt; retries are the caller's business
//! - Timeouts and network failures are both `Unavailable`
//! - Non-success status codes are kept verbatim for re-surfacing
//! - Body decoding is left to the caller: a shape mismatch is a local bug,
//!   not a downstream failure

pub mod catalog;
pub mod client;
pub mod error;

pub use catalog::{CatalogClient, RECOMMEND_CALL};
pub use client::{DownstreamBody, DownstreamClient, DownstreamRequest, DEFAULT_TIMEOUT};
pub use error::{DownstreamError, UnavailableReason};
