//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Shutdown::trigger or Ctrl+C → stop accepting → drain in-flight → exit
//! ```
//!
//! # Design Decisions
//! - One broadcast channel; every server task subscribes
//! - In-flight requests finish; the pipeline itself never polls for
//!   cancellation

pub mod shutdown;

pub use shutdown::Shutdown;
