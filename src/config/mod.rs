//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatchConfig (validated, immutable)
//!     → Dispatcher (pipeline, observability) and HttpServer (server)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a new Dispatcher
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{DispatchConfig, ObservabilityConfig, PipelineConfig, ServerConfig};
pub use validation::{validate_config, ValidationError};
