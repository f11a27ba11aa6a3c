//! Request entry point and route table publication.
//!
//! # Responsibilities
//! - Run the drawing DSL and publish the resulting route table
//! - Wrap the matching endpoint in the middleware chain
//! - Match requests, expose the matched route through the context
//! - Reverse routing through the named route registry
//!
//! # Design Decisions
//! - Publication is a single atomic swap; readers never see a partial table
//! - The middleware chain is assembled once, on the first request; the last
//!   middleware added is the outermost
//! - Unmatched requests get `404 Not Found` with the status text as body

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::http::StatusCode;

use crate::config::{DispatchConfig, PipelineConfig};
use crate::controller::DispatchError;
use crate::http::response::status_response;
use crate::http::{Context, HttpRequest, HttpResponse};
use crate::observability::metrics;
use crate::routing::{NamedRoutes, PathArg, PathError, Route, RouteTable, Scope};

/// Synchronous request handler.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError>;
}

impl<F> Handler for F
where
    F: Fn(HttpRequest) -> Result<HttpResponse, DispatchError> + Send + Sync + 'static,
{
    fn handle(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        self(request)
    }
}

/// Handler from an infallible closure. See [`handler_fn`].
#[derive(Clone)]
pub struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
    F: Fn(HttpRequest) -> HttpResponse + Send + Sync + 'static,
{
    fn handle(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        Ok((self.0)(request))
    }
}

pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(HttpRequest) -> HttpResponse + Send + Sync + 'static,
{
    HandlerFn(f)
}

/// Wraps a handler into another one.
pub type Middleware = Box<dyn Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync>;

/// Everything one `draw` publishes.
#[derive(Default)]
struct Published {
    routes: Vec<Arc<Route>>,
    table: RouteTable,
    names: NamedRoutes,
}

/// Innermost handler of the chain: match, then run the route's handler.
struct Endpoint {
    published: Arc<ArcSwap<Published>>,
    record_metrics: bool,
}

impl Handler for Endpoint {
    fn handle(&self, mut request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        let start = Instant::now();
        let method = request.method().to_string();
        let matched = self.published.load().table.find(&request);

        let Some((route, handler)) =
            matched.and_then(|route| route.handler.clone().map(|h| (route, h)))
        else {
            tracing::debug!(method = %method, path = %request.uri().path(), "No route matched");
            if self.record_metrics {
                metrics::record_dispatch(&method, StatusCode::NOT_FOUND.as_u16(), "none", start);
            }
            return Ok(status_response(StatusCode::NOT_FOUND));
        };

        Context::of(&request)
            .with_value(route.clone())
            .attach(&mut request);
        let result = handler.handle(request);

        if self.record_metrics {
            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            };
            metrics::record_dispatch(&method, status, &route.name, start);
        }
        result
    }
}

/// Routes requests to the handlers of drawn routes.
///
/// ```ignore
/// let dispatcher = Dispatcher::new();
/// dispatcher.draw(|s| {
///     s.resources(PostsController::default()).model::<Post>();
/// });
/// let response = dispatcher.serve(request);
/// ```
pub struct Dispatcher {
    pipeline: PipelineConfig,
    published: Arc<ArcSwap<Published>>,
    middlewares: Vec<Middleware>,
    app: OnceLock<Arc<dyn Handler>>,
    record_metrics: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_config(&DispatchConfig::default())
    }

    pub fn with_config(config: &DispatchConfig) -> Self {
        Self {
            pipeline: config.pipeline.clone(),
            published: Arc::new(ArcSwap::from_pointee(Published::default())),
            middlewares: Vec::new(),
            app: OnceLock::new(),
            record_metrics: config.observability.metrics_enabled,
        }
    }

    /// Append a middleware. The chain is rebuilt on the next request.
    pub fn use_middleware<M>(&mut self, middleware: M)
    where
        M: Fn(Arc<dyn Handler>) -> Arc<dyn Handler> + Send + Sync + 'static,
    {
        self.middlewares.push(Box::new(middleware));
        self.app = OnceLock::new();
    }

    /// Draw routes with `f` and publish them, replacing any previous table.
    ///
    /// # Panics
    /// On configuration faults in the drawn routes, e.g. conflicting method
    /// constraints or a controller operation that cannot be bound.
    pub fn draw(&self, f: impl FnOnce(&Scope)) {
        let root = Scope::with_settings(self.pipeline.clone());
        f(&root);

        let routes: Vec<Arc<Route>> = root.routes().into_iter().map(Arc::new).collect();
        let table = RouteTable::new(&routes);
        let mut names = NamedRoutes::new();
        for route in &routes {
            names.add(route);
        }

        tracing::info!(
            routes = routes.len(),
            routable = table.len(),
            named = names.len(),
            "Route table published"
        );
        for route in &routes {
            tracing::debug!(route = %route, "Route");
        }

        self.published.store(Arc::new(Published {
            routes,
            table,
            names,
        }));
    }

    fn app(&self) -> &Arc<dyn Handler> {
        self.app.get_or_init(|| {
            let endpoint: Arc<dyn Handler> = Arc::new(Endpoint {
                published: self.published.clone(),
                record_metrics: self.record_metrics,
            });
            self.middlewares
                .iter()
                .fold(endpoint, |handler, middleware| middleware(handler))
        })
    }

    /// Handle `request`. A fault escaping a controller without error
    /// handler is returned as is.
    pub fn try_serve(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        self.app().handle(request)
    }

    /// Handle `request`. A fault escaping a controller without error
    /// handler becomes `500 Internal Server Error`.
    pub fn serve(&self, request: HttpRequest) -> HttpResponse {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        match self.try_serve(request) {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    error = %err,
                    "Unhandled dispatch error"
                );
                status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Path of a named route, or of the route whose models match the
    /// argument types. See [`path_for!`](crate::path_for).
    pub fn path_for(&self, args: &[PathArg]) -> Result<String, PathError> {
        self.published.load().names.path_for(args)
    }

    /// Every drawn route, routable or not, in drawing order.
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.published.load().routes.clone()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for Dispatcher {
    fn handle(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        self.try_serve(request)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.published.load().routes.len())
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
