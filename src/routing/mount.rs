//! Routes to arbitrary handlers and redirects.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use axum::http::header::LOCATION;
use axum::http::{HeaderValue, StatusCode};

use crate::controller::DispatchError;
use crate::dispatcher::Handler;
use crate::http::response::status_response;
use crate::http::{HttpRequest, HttpResponse};
use crate::routing::route::Route;
use crate::routing::scope::{RouteGenerator, ScopeArena, ScopeId, ScopeNode};

/// Returned by [`Scope::to`](crate::routing::Scope::to).
pub struct To {
    name: Rc<RefCell<String>>,
}

impl To {
    /// Name the route.
    pub fn as_name(self, name: &str) -> Self {
        *self.name.borrow_mut() = name.to_string();
        self
    }
}

pub(crate) struct ToGenerator {
    scope: ScopeId,
    name: Rc<RefCell<String>>,
    handler: Arc<dyn Handler>,
}

impl ToGenerator {
    pub(crate) fn new(scope: ScopeId, handler: Arc<dyn Handler>) -> (To, Self) {
        let name = Rc::new(RefCell::new(String::new()));
        let to = To { name: name.clone() };
        (
            to,
            Self {
                scope,
                name,
                handler,
            },
        )
    }
}

impl RouteGenerator for ToGenerator {
    fn routes(&self, arena: &ScopeArena) -> Vec<Route> {
        let mut leaf = ScopeNode::child_of(self.scope);
        leaf.name = self.name.borrow().clone();
        let resolved = arena.resolve(&leaf);
        let route = Route {
            method: resolved.method,
            url: resolved.path,
            name: resolved.name,
            namespace: resolved.namespace,
            models: resolved.models,
            handler: Some(self.handler.clone()),
            ..Default::default()
        };
        vec![route.normalize()]
    }
}

/// Returned by [`Scope::redirect_to`](crate::routing::Scope::redirect_to).
pub struct Redirect {
    status: Rc<Cell<u16>>,
}

impl Redirect {
    /// Redirect status code.
    ///
    /// # Panics
    /// If `code` is not a 3xx status.
    pub fn status(self, code: u16) -> Self {
        if !(300..400).contains(&code) {
            panic!("invalid redirect status code {}", code);
        }
        self.status.set(code);
        self
    }
}

pub(crate) struct RedirectGenerator {
    scope: ScopeId,
    location: String,
    status: Rc<Cell<u16>>,
}

impl RedirectGenerator {
    pub(crate) fn new(scope: ScopeId, location: &str) -> (Redirect, Self) {
        let status = Rc::new(Cell::new(StatusCode::MOVED_PERMANENTLY.as_u16()));
        let redirect = Redirect {
            status: status.clone(),
        };
        (
            redirect,
            Self {
                scope,
                location: location.to_string(),
                status,
            },
        )
    }
}

impl RouteGenerator for RedirectGenerator {
    fn routes(&self, arena: &ScopeArena) -> Vec<Route> {
        let resolved = arena.resolve(arena.node(self.scope));
        let Ok(location) = HeaderValue::from_str(&self.location) else {
            panic!("invalid redirect location {:?}", self.location);
        };
        let handler = RedirectHandler {
            location,
            status: StatusCode::from_u16(self.status.get()).unwrap_or(StatusCode::MOVED_PERMANENTLY),
        };
        let route = Route {
            method: resolved.method,
            url: resolved.path,
            name: resolved.name,
            namespace: resolved.namespace,
            models: resolved.models,
            handler: Some(Arc::new(handler)),
            ..Default::default()
        };
        vec![route.normalize()]
    }
}

#[derive(Debug)]
struct RedirectHandler {
    location: HeaderValue,
    status: StatusCode,
}

impl Handler for RedirectHandler {
    fn handle(&self, _request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        let mut response = status_response(self.status);
        response.headers_mut().insert(LOCATION, self.location.clone());
        Ok(response)
    }
}
