//! Controller subsystem.
//!
//! # Data Flow
//! ```text
//! Bind time (once per drawn controller):
//!     Controller::methods
//!     → methods.rs (typed operation table, filters ordered)
//!     → pipeline.rs (ActionHandler per routed action, own instance pool)
//!
//! Per request:
//!     ActionHandler
//!     → pool.rs (instance reset to prototype)
//!     → Before_ filters → action → After_ filters
//!         each: call.rs (resolve params) → invoke → output.rs (interpret)
//!     → first fault: HandleError, or DispatchError::Unhandled
//! ```
//!
//! # Design Decisions
//! - Method names are the only routing metadata; a controller lists its
//!   operations once by name
//! - Parameters resolve by type in a fixed order: request, response,
//!   context, in-flight error, path parameter, generator, context value
//! - Returned values are a closed sum type, so an unknown output kind is a
//!   compile error rather than a runtime one

pub mod call;
pub mod methods;
pub mod output;
pub mod pipeline;
mod pool;
pub mod types;

use std::any::type_name;

use crate::routing::inflect;

pub use call::{Call, Dep, FromCall};
pub use methods::{Action, MethodTable, Methods, Operation, Role};
pub use output::{IntoOutputs, Output, Stream};
pub use pipeline::ActionHandler;
pub use types::{ActionError, DispatchError, ParamKind, ReturnKind, TypeKey};

/// A plain struct whose methods serve requests.
///
/// The instance passed to the router is the prototype: every request works
/// on a copy holding the prototype's field values.
///
/// ```ignore
/// #[derive(Clone, Default)]
/// struct PostsController;
///
/// impl PostsController {
///     fn index(&mut self) -> &'static str { "index" }
///     fn show(&mut self, id: String) -> String { format!("post {}", id) }
/// }
///
/// impl Controller for PostsController {
///     fn methods(m: &mut Methods<Self>) {
///         m.method("Index", Self::index).method("Show", Self::show);
///     }
/// }
/// ```
pub trait Controller: Clone + Send + Sync + 'static {
    /// Register the operations of this controller.
    fn methods(methods: &mut Methods<Self>);

    /// Usable name, e.g. `posts` for `PostsController`.
    fn name() -> String {
        controller_name(type_name::<Self>())
    }
}

/// Usable name of a controller type.
///
/// A trailing `Controller` is stripped. A type named exactly `Controller`
/// takes the last component of its module path instead.
pub fn controller_name(full_type_name: &str) -> String {
    let path = full_type_name.split('<').next().unwrap_or(full_type_name);
    let mut components = path.rsplit("::");
    let short = components.next().unwrap_or(path);

    let base = if short == "Controller" {
        components.next().unwrap_or(short)
    } else {
        short.strip_suffix("Controller").unwrap_or(short)
    };
    inflect::underscore(base)
}
