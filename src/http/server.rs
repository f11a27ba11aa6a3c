//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Adapt the synchronous `Dispatcher` to an async tower `Service`
//! - Buffer request bodies, bounded by `max_body_bytes`
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve on a listener until shutdown

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::Service;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{DispatchConfig, ServerConfig};
use crate::dispatcher::Dispatcher;
use crate::http::request::{MakeRequestUuidV4, X_REQUEST_ID};
use crate::http::response::{status_response, HttpResponse};
use crate::lifecycle::shutdown::wait_for_signal;

/// Tower service running every request through a `Dispatcher`.
///
/// The dispatcher runs on tokio's blocking pool: controller code is
/// synchronous and may block.
#[derive(Clone)]
pub struct DispatchService {
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: usize,
}

impl DispatchService {
    pub fn new(dispatcher: Arc<Dispatcher>, max_body_bytes: usize) -> Self {
        Self {
            dispatcher,
            max_body_bytes,
        }
    }
}

impl Service<Request<Body>> for DispatchService {
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let dispatcher = self.dispatcher.clone();
        let limit = self.max_body_bytes;
        Box::pin(async move { Ok(dispatch(dispatcher, limit, request).await) })
    }
}

async fn dispatch(dispatcher: Arc<Dispatcher>, limit: usize, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(
                path = %parts.uri.path(),
                limit,
                error = %err,
                "Failed to read request body"
            );
            return into_axum(status_response(StatusCode::PAYLOAD_TOO_LARGE));
        }
    };

    let method = parts.method.clone();
    let path = parts.uri.path().to_string();
    let request = Request::from_parts(parts, bytes);
    match tokio::task::spawn_blocking(move || dispatcher.serve(request)).await {
        Ok(response) => into_axum(response),
        Err(err) => {
            tracing::error!(
                method = %method,
                path = %path,
                error = %err,
                "Dispatch task failed"
            );
            into_axum(status_response(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

fn into_axum(response: HttpResponse) -> Response {
    response.map(Body::from)
}

/// HTTP server hosting a `Dispatcher`.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    pub fn new(config: &DispatchConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let service = DispatchService::new(dispatcher, config.server.max_body_bytes);
        let router = Self::build_router(&config.server, service);
        Self {
            router,
            config: config.server.clone(),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, service: DispatchService) -> Router {
        Router::new()
            .fallback_service(service)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_secs,
            )))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
    }

    /// Serve on `listener` until `shutdown` fires or Ctrl+C.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = self.config.request_timeout_secs,
            max_body_bytes = self.config.max_body_bytes,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(wait_for_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
