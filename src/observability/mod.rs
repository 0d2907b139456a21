//! Observability
//!
//! Tracing setup and log hygiene helpers.

pub mod telemetry;

pub use telemetry::{init_tracing, init_tracing_with_filter, sanitize_for_log};
