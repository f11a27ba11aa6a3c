//! Request-side types handed to controller operations.
//!
//! # Responsibilities
//! - Shared, read-only view of the incoming request (`Request`)
//! - Per-request value store (`Context`), carried in the request extensions
//! - Request ID generation for the `x-request-id` header
//!
//! # Design Decisions
//! - `Context` is persistent: `with_value` returns a new context and never
//!   mutates one already observed by another component
//! - Values are keyed by their type, one value per type

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::Route;

/// Request type the dispatcher works with: body already buffered.
pub type HttpRequest = axum::http::Request<Bytes>;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(id))
    }
}

/// Request ID of a request, if one was assigned.
pub fn request_id<B>(request: &axum::http::Request<B>) -> Option<&str> {
    request
        .headers()
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
}

/// Per-request value store.
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context that also holds `value`, replacing any value of the
    /// same type.
    pub fn with_value<T: Send + Sync + 'static>(&self, value: T) -> Self {
        let mut values = (*self.values).clone();
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self {
            values: Arc::new(values),
        }
    }

    pub fn value<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    /// The route chosen by the matcher for this request.
    pub fn route(&self) -> Option<Arc<Route>> {
        self.value::<Arc<Route>>().cloned()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Context attached to `request`, or an empty one.
    pub fn of(request: &HttpRequest) -> Context {
        request.extensions().get::<Context>().cloned().unwrap_or_default()
    }

    /// Attach this context to `request`, replacing the previous one.
    pub fn attach(self, request: &mut HttpRequest) {
        request.extensions_mut().insert(self);
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("values", &self.values.len()).finish()
    }
}

/// Shared handle to the incoming request.
#[derive(Clone)]
pub struct Request {
    inner: Arc<HttpRequest>,
}

impl Request {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            inner: Arc::new(request),
        }
    }

    pub fn context(&self) -> Context {
        Context::of(&self.inner)
    }

    pub fn request_id(&self) -> Option<&str> {
        request_id(&self.inner)
    }
}

impl Deref for Request {
    type Target = HttpRequest;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", self.inner.method())
            .field("uri", self.inner.uri())
            .finish()
    }
}
