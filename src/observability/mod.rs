//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, pipeline, server:
//!     → tracing events (route publication, dispatch, faults)
//!     → metrics.rs (request counter, latency histogram)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, filtered by RUST_LOG or config)
//!     → any `metrics` recorder installed by the embedding application
//! ```
//!
//! # Design Decisions
//! - Structured fields rather than formatted messages
//! - Request ID flows through the request extensions and the trace layer
//! - Metrics go through the `metrics` facade; without a recorder they are
//!   no-ops

pub mod logging;
pub mod metrics;
