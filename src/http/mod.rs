//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, inbound trace context)
//!     → catalog.rs / users.rs (handlers → orchestrator)
//!     → response.rs (JSON body, status mapping, x-trace-id)
//!     → Send to client
//! ```

pub mod catalog;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod users;

pub use request::{InboundTrace, TraceSettings, X_REQUEST_ID};
pub use response::{respond, X_TRACE_ID};
pub use server::{span_sink, AppState, ServiceServer};
