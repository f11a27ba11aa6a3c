//! Convention-driven HTTP routing and action dispatch.
//!
//! # Architecture Overview
//!
//! ```text
//!   Draw (once)                              Serve (per request)
//!   ───────────                              ───────────────────
//!   Dispatcher::draw(|s| ...)                HttpServer / DispatchService
//!     │                                        │
//!     ▼                                        ▼
//!   routing::Scope ── resources/resource ─▶  Dispatcher (middleware chain)
//!     │                 to/redirect_to         │
//!     ▼                                        ▼
//!   Route table ──────── published ───────▶  RouteTable::find ─▶ Context(Arc<Route>)
//!   NamedRoutes (path_for)                     │
//!                                              ▼
//!                                            controller::ActionHandler
//!                                              Before_* → action → After_*
//!                                              HandleError on the first fault
//! ```
//!
//! Controllers are plain structs listing their operations by conventional
//! name; REST routes, route names and reverse routing follow from those
//! names and from the nesting of the drawing DSL.

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::DispatchConfig;
pub use controller::{ActionError, Controller, Dep, DispatchError, Methods, Output};
pub use dispatcher::{handler_fn, Dispatcher, Handler};
pub use http::{Context, HttpRequest, HttpResponse, HttpServer, Request, ResponseWriter};
pub use lifecycle::Shutdown;
pub use routing::{Model, PathArg, PathError, Route, Scope};
