//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace and timeout layers)
//!     → server.rs DispatchService (buffer body, move to blocking pool)
//!     → Dispatcher (middleware chain, matcher, route handler)
//!     → request.rs (Request, Context) / response.rs (ResponseWriter)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, Context, HttpRequest, MakeRequestUuidV4, Request, X_REQUEST_ID};
pub use response::{status_response, HttpResponse, ResponseWriter};
pub use server::{DispatchService, HttpServer};
