//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → reason string
//!
//! Shutdown (shutdown.rs):
//!     trigger → broadcast to every server → stop accepting → drain → exit
//! ```
//!
//! # Design Decisions
//! - One coordinator per process; each server holds a receiver
//! - A signal handler that cannot be installed never fires, it does not abort

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
