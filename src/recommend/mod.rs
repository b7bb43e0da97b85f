//! Recommendation subsystem.
//!
//! # Responsibilities
//! - Filter a product set by category (or not, for the "general" sentinel)
//! - Rank by rating, keeping input order for ties
//! - Derive a confidence score from the number of products returned
//!
//! # Design Decisions
//! - Pure functions, no tracing; callers wrap them in spans
//! - The score only looks at the result count (known simplification)

pub mod engine;

pub use engine::{recommend, score, Recommendation, GENERAL_CATEGORY, MAX_SCORE};
