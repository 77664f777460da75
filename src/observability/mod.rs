//! # Observability
//!
//! Observability modules for logging and metrics.
//!
//! - `logging`: `tracing` subscriber setup (text or JSON)
//! - `metrics`: Prometheus metrics collection and textfile export

pub mod logging;
pub mod metrics;
