//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms, per-route snapshot)
//!     → trace::sink (finished spans)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, /metrics snapshot)
//! ```
//!
//! # Design Decisions
//! - Trace id is logged on every orchestrator event for correlation
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
