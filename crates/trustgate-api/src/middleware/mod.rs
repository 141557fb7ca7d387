//! # Middleware Stack
//!
//! Tower middleware for the API layer:
//! - `TraceLayer` (tower-http): request/response tracing, mounted in [`crate::app`].
//! - [`metrics`]: Prometheus request and pipeline metrics.

pub mod metrics;
