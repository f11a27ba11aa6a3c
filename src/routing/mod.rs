//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Drawing (once, before serving):
//!     Dispatcher::draw(|s| ...)
//!     → scope.rs (nested path/method/name/namespace/model fragments)
//!     → resources.rs / resource.rs / mount.rs (route generators)
//!     → route.rs (normalized Route records with bound handlers)
//!     → matcher.rs (compiled RouteTable) + named.rs (NamedRoutes)
//!
//! Incoming Request (host, method, path):
//!     → matcher.rs (most specific route)
//!     → Return: matched Route or no match
//! ```
//!
//! # Design Decisions
//! - Controller method names are the only routing metadata
//! - Routes are drawn once and immutable at runtime
//! - No regex in the hot path (segment matching only)
//! - Deterministic: same input always matches the same route

pub mod inflect;
pub mod matcher;
mod mount;
pub mod named;
pub mod resource;
pub mod resources;
pub mod route;
pub mod scope;

pub use matcher::{HostMatcher, Matcher, MethodMatcher, PathPattern, RouteTable};
pub use mount::{Redirect, To};
pub use named::{Model, NamedRoutes, PathArg, PathError};
pub use resource::Resource;
pub use resources::Resources;
pub use route::{count_params, ModelKey, Route};
pub use scope::{ResolvedScope, Scope};
