//! The per-request dispatch pipeline of one bound action.
//!
//! # Responsibilities
//! - Check out a controller instance reset to its prototype
//! - Run before filters, the action, then after filters
//! - Interpret returned outputs into the response
//! - Route the first fault to the controller's error handler
//!
//! # Design Decisions
//! - Every invocation runs under `catch_unwind`; a panic becomes an
//!   `ActionError::Panic` routed like a returned error
//! - At most one error handler invocation per request; a fault raised while
//!   handling another one is a double fault and panics
//! - Without an error handler the fault escapes as `DispatchError::Unhandled`

use std::fmt;
use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};

use crate::controller::call::Call;
use crate::controller::methods::{MethodTable, ERROR_HANDLER};
use crate::controller::output::{Output, Stream};
use crate::controller::pool::InstancePool;
use crate::controller::types::{ActionError, DispatchError};
use crate::controller::Controller;
use crate::dispatcher::Handler;
use crate::http::{Context, HttpRequest, HttpResponse, Request, ResponseWriter};

/// Instances kept for reuse by one bound action.
pub const DEFAULT_POOL_CAPACITY: usize = 64;

type ContextFn = Box<dyn Fn(Context, &HttpRequest) -> Context + Send + Sync>;

/// Request handler running one controller action.
pub struct ActionHandler<C: Controller> {
    table: Arc<MethodTable<C>>,
    action: usize,
    pool: InstancePool<C>,
    context_fn: Option<ContextFn>,
}

impl<C: Controller> ActionHandler<C> {
    /// Bind `action` of `controller`.
    ///
    /// # Panics
    /// If the controller declares no operation named `action`.
    pub fn for_action(controller: C, action: &str) -> Self {
        Self::bind(
            Arc::new(MethodTable::of()),
            controller,
            action,
            DEFAULT_POOL_CAPACITY,
        )
    }

    pub(crate) fn bind(
        table: Arc<MethodTable<C>>,
        prototype: C,
        action: &str,
        pool_capacity: usize,
    ) -> Self {
        let Some(index) = table.find(action) else {
            panic!(
                "action {} not found in controller {}",
                action,
                table.controller()
            );
        };
        Self {
            table,
            action: index,
            pool: InstancePool::new(prototype, pool_capacity),
            context_fn: None,
        }
    }

    /// Derive the request context before the pipeline runs.
    pub fn with_context<F>(mut self, f: F) -> Self
    where
        F: Fn(Context, &HttpRequest) -> Context + Send + Sync + 'static,
    {
        self.context_fn = Some(Box::new(f));
        self
    }

    /// `Controller#Action` of the bound action.
    pub fn target(&self) -> String {
        self.table.target(self.table.operation(self.action).name())
    }

    fn run(&self, mut request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        if let Some(context_fn) = &self.context_fn {
            let context = context_fn(Context::of(&request), &request);
            context.attach(&mut request);
        }
        let request = Request::new(request);
        let response = ResponseWriter::new();

        tracing::debug!(
            method = %request.method(),
            path = %request.uri().path(),
            target = %self.target(),
            "Dispatching action"
        );

        let mut instance = self.pool.checkout();
        let outcome = {
            let mut call = Call::new(&mut instance, &self.table, &request, &response);
            self.execute(&mut call)
        };
        self.pool.checkin(instance);

        outcome.map(|()| response.take_response())
    }

    fn execute(&self, call: &mut Call<'_, C>) -> Result<(), DispatchError> {
        let stages = self
            .table
            .befores()
            .iter()
            .chain(std::iter::once(&self.action))
            .chain(self.table.afters());

        for &index in stages {
            if let Err(err) = stage(call, index) {
                return self.route_error(call, index, err);
            }
        }
        Ok(())
    }

    fn route_error(
        &self,
        call: &mut Call<'_, C>,
        failed: usize,
        err: ActionError,
    ) -> Result<(), DispatchError> {
        let target = self.table.target(self.table.operation(failed).name());
        let Some(handler) = self.table.error_handler() else {
            return Err(DispatchError::Unhandled {
                target,
                source: err,
            });
        };
        tracing::debug!(target = %target, error = %err, "Routing error to handler");
        call.set_error(err.clone());
        if let Err(second) = stage(call, handler) {
            panic!(
                "double fault in {}: {} raised while handling {}",
                self.table.target(ERROR_HANDLER),
                second,
                err
            );
        }
        Ok(())
    }
}

impl<C: Controller> Handler for ActionHandler<C> {
    fn handle(&self, request: HttpRequest) -> Result<HttpResponse, DispatchError> {
        self.run(request)
    }
}

impl<C: Controller> fmt::Debug for ActionHandler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionHandler")
            .field("target", &self.target())
            .field("pool", &self.pool)
            .finish()
    }
}

/// Invoke one operation and interpret what it returned.
fn stage<C>(call: &mut Call<'_, C>, index: usize) -> Result<(), ActionError> {
    let outputs = match panic::catch_unwind(AssertUnwindSafe(|| call.invoke(index))) {
        Ok(result) => result?,
        Err(payload) => return Err(ActionError::from_panic(payload)),
    };
    interpret(outputs, call.response())
}

/// Apply outputs to the response.
///
/// Headers are merged first. An error output stops there and is returned.
/// Otherwise a non-zero status is written, then the last non-empty body,
/// or the stream when no body was given.
fn interpret(outputs: Vec<Output>, response: &ResponseWriter) -> Result<(), ActionError> {
    let mut headers = HeaderMap::new();
    let mut error = None;
    let mut status = 0u16;
    let mut body = None;
    let mut stream = None;

    for output in outputs {
        match output {
            Output::None => {}
            Output::Error(err) => error = Some(err),
            Output::Body(bytes) if bytes.is_empty() => {}
            Output::Body(bytes) => body = Some(bytes),
            Output::Status(code) => status = code,
            Output::Headers(map) => {
                for (name, value) in map.iter() {
                    headers.append(name.clone(), value.clone());
                }
            }
            Output::Stream(source) => stream = Some(source),
        }
    }

    response.merge_headers(&headers);
    if let Some(err) = error {
        return Err(err);
    }
    if status != 0 {
        let Ok(code) = StatusCode::from_u16(status) else {
            panic!("invalid status code {}", status);
        };
        response.write_header(code);
    }
    match (body, stream) {
        (Some(bytes), _) => response.write(&bytes),
        (None, Some(Stream(mut reader))) => {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf)?;
            if !buf.is_empty() {
                response.write(&buf);
            }
        }
        (None, None) => {}
    }
    Ok(())
}
