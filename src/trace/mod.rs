//! Distributed tracing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → propagation.rs (extract TraceContext, mint root if absent/invalid)
//!     → span.rs (Tracer opens root span, hands out child context)
//!     → downstream client opens child span, propagation.rs injects it
//!     → peer service repeats the same steps with the same trace id
//!
//! Span finished (or dropped)
//!     → sink.rs (log line, in-memory collector, fan-out)
//! ```
//!
//! # Design Decisions
//! - W3C `traceparent` + `baggage` headers on the wire
//! - Extraction never fails; propagation is best-effort
//! - The tracer is an explicit handle, cloned into each component
//! - Spans are finished exactly once: `finish` consumes, `Drop` covers the rest

pub mod context;
pub mod propagation;
pub mod sink;
pub mod span;

pub use context::{Baggage, SpanId, TraceContext, TraceId};
pub use propagation::{extract, inject, BAGGAGE_HEADER, TRACEPARENT_HEADER};
pub use sink::{FanoutSink, LogSink, MemorySink, SpanSink};
pub use span::{AttributeValue, Attributes, Span, SpanData, SpanEvent, SpanStatus, Tracer};
