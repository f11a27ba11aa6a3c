//! Per-invocation state and parameter resolution.
//!
//! # Responsibilities
//! - Hold everything one request exposes to controller operations
//! - Resolve declared parameters by type (`FromCall`)
//! - Run generators on demand and detect generator cycles
//!
//! # Design Decisions
//! - The path parameter cursor is fresh for every operation invocation,
//!   generators included
//! - Generators are not memoized: every parameter of a generated type runs
//!   the generator again
//! - Resolution failures are request-domain errors, routed like any other

use std::any::Any;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::controller::methods::MethodTable;
use crate::controller::output::Output;
use crate::controller::types::{ActionError, ParamKind, TypeKey};
use crate::http::{Context, Request, ResponseWriter};
use crate::routing::matcher::split_segments;

/// State of one controller call chain within a request.
pub struct Call<'a, C> {
    instance: &'a mut C,
    table: &'a MethodTable<C>,
    request: &'a Request,
    response: &'a ResponseWriter,
    method: &'a str,
    error: Option<ActionError>,
    path_params: Option<Vec<String>>,
    generating: Vec<TypeKey>,
}

impl<'a, C> Call<'a, C> {
    pub(crate) fn new(
        instance: &'a mut C,
        table: &'a MethodTable<C>,
        request: &'a Request,
        response: &'a ResponseWriter,
    ) -> Self {
        Self {
            instance,
            table,
            request,
            response,
            method: "",
            error: None,
            path_params: None,
            generating: Vec::new(),
        }
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn response(&self) -> &ResponseWriter {
        self.response
    }

    pub fn context(&self) -> Context {
        self.request.context()
    }

    /// The error being handled, set only while the error handler runs.
    pub fn error(&self) -> Option<&ActionError> {
        self.error.as_ref()
    }

    /// `Controller#Method` of the operation being resolved.
    pub fn target(&self) -> String {
        self.table.target(self.method)
    }

    pub(crate) fn instance(&mut self) -> &mut C {
        &mut *self.instance
    }

    pub(crate) fn set_error(&mut self, error: ActionError) {
        self.error = Some(error);
    }

    /// Run operation `index` of the table.
    pub(crate) fn invoke(&mut self, index: usize) -> Result<Vec<Output>, ActionError> {
        let table = self.table;
        let operation = table.operation(index);
        self.in_frame(operation.name(), |call| operation.call(call))
    }

    fn in_frame<R>(&mut self, method: &'a str, f: impl FnOnce(&mut Self) -> R) -> R {
        let method = std::mem::replace(&mut self.method, method);
        let params = self.path_params.take();
        let result = f(self);
        self.method = method;
        self.path_params = params;
        result
    }

    /// Next path parameter value for a string parameter.
    ///
    /// Values are extracted left to right from the matched route's path
    /// template, then consumed in reverse: the first string parameter gets
    /// the last path parameter.
    pub fn next_path_param(&mut self) -> Result<String, ActionError> {
        if self.path_params.is_none() {
            let route = self.context().route().ok_or_else(|| ActionError::NoRoute {
                target: self.target(),
            })?;
            self.path_params = Some(extract_params(self.request.uri().path(), &route.path));
        }
        self.path_params
            .as_mut()
            .and_then(Vec::pop)
            .ok_or_else(|| ActionError::MissingPathParam {
                target: self.target(),
            })
    }

    /// Run the generator producing `T`, if the controller declares one.
    pub fn generate<T: Send + 'static>(&mut self) -> Result<Option<T>, ActionError> {
        let key = TypeKey::of::<T>();
        let table = self.table;
        let Some(generator) = table.generator(&key) else {
            return Ok(None);
        };
        if self.generating.contains(&key) {
            return Err(ActionError::GeneratorCycle {
                generator: generator.name().to_string(),
                type_name: key.to_string(),
            });
        }

        self.generating.push(key);
        let produced = self.in_frame(generator.name(), |call| generator.call(call));
        self.generating.pop();

        let value: Box<dyn Any + Send> = produced?;
        value
            .downcast::<T>()
            .map(|v| Some(*v))
            .map_err(|_| ActionError::ParamNotFound {
                target: self.target(),
                type_name: key.to_string(),
            })
    }
}

impl<C> fmt::Debug for Call<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("target", &self.target())
            .field("error", &self.error)
            .field("path_params", &self.path_params)
            .finish()
    }
}

/// Values of the `:name` segments of `template`, in template order.
pub(crate) fn extract_params(path: &str, template: &str) -> Vec<String> {
    let segments: Vec<&str> = split_segments(path).collect();
    split_segments(template)
        .enumerate()
        .filter(|(_, s)| s.starts_with(':'))
        .map(|(i, _)| segments.get(i).copied().unwrap_or_default().to_string())
        .collect()
}

/// A type an operation can declare as parameter.
pub trait FromCall<C>: Sized {
    /// Descriptor reported when the operation is bound.
    fn kind() -> ParamKind;

    fn from_call(call: &mut Call<'_, C>) -> Result<Self, ActionError>;
}

impl<C> FromCall<C> for Request {
    fn kind() -> ParamKind {
        ParamKind::Request
    }

    fn from_call(call: &mut Call<'_, C>) -> Result<Self, ActionError> {
        Ok(call.request.clone())
    }
}

impl<C> FromCall<C> for ResponseWriter {
    fn kind() -> ParamKind {
        ParamKind::Response
    }

    fn from_call(call: &mut Call<'_, C>) -> Result<Self, ActionError> {
        Ok(call.response.clone())
    }
}

impl<C> FromCall<C> for Context {
    fn kind() -> ParamKind {
        ParamKind::Context
    }

    fn from_call(call: &mut Call<'_, C>) -> Result<Self, ActionError> {
        Ok(call.context())
    }
}

impl<C> FromCall<C> for ActionError {
    fn kind() -> ParamKind {
        ParamKind::Error
    }

    fn from_call(call: &mut Call<'_, C>) -> Result<Self, ActionError> {
        call.error.clone().ok_or_else(|| ActionError::NoErrorInFlight {
            target: call.target(),
        })
    }
}

impl<C> FromCall<C> for String {
    fn kind() -> ParamKind {
        ParamKind::PathParam
    }

    fn from_call(call: &mut Call<'_, C>) -> Result<Self, ActionError> {
        call.next_path_param()
    }
}

/// A value produced by a generator, or else found in the request context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dep<T>(pub T);

impl<T> Dep<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Dep<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Dep<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<C, T> FromCall<C> for Dep<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn kind() -> ParamKind {
        ParamKind::Value(TypeKey::of::<T>())
    }

    fn from_call(call: &mut Call<'_, C>) -> Result<Self, ActionError> {
        if let Some(value) = call.generate::<T>()? {
            return Ok(Dep(value));
        }
        call.context()
            .value::<T>()
            .cloned()
            .map(Dep)
            .ok_or_else(|| ActionError::ParamNotFound {
                target: call.target(),
                type_name: TypeKey::of::<T>().to_string(),
            })
    }
}
