//! Traced catalog and user services.
//!
//! Two cooperating HTTP services share one library: the catalog service
//! ranks products, the user service composes per-user recommendations by
//! calling the catalog. W3C trace context flows across the hop so both
//! sides record spans of one trace.

pub mod config;
pub mod downstream;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod orchestrator;
pub mod recommend;
pub mod store;
pub mod trace;

pub use config::schema::{ServiceConfig, ServiceRole};
pub use error::ServiceError;
pub use http::ServiceServer;
pub use lifecycle::Shutdown;
