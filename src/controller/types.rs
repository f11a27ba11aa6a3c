//! Operation descriptors and error definitions.

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::routing::route::short_type_name;

/// Key of a type, used to match generators and context values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub id: TypeId,
    pub name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(short_type_name(self.name))
    }
}

/// How a declared parameter is resolved, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Request,
    Response,
    Context,
    Error,
    PathParam,
    /// Generator by produced type, else the context value store.
    Value(TypeKey),
}

/// Kind of value an operation may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Body,
    Status,
    Headers,
    Stream,
    Error,
    Any,
}

/// Request-domain error handed to a controller's error handler.
#[derive(Debug, Clone, Error)]
pub enum ActionError {
    #[error("{0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync>),

    #[error("{0}")]
    Message(String),

    /// A controller operation panicked.
    #[error("panic: {0}")]
    Panic(String),

    #[error("parameter {type_name} needed by method {target} not found")]
    ParamNotFound { target: String, type_name: String },

    #[error("method {target} asked for more params than available")]
    MissingPathParam { target: String },

    #[error("string param of {target} can't be filled as there is no route in the context")]
    NoRoute { target: String },

    #[error("method {target} asked for an error but none is being handled")]
    NoErrorInFlight { target: String },

    #[error("generator {generator} for {type_name} depends on itself")]
    GeneratorCycle { generator: String, type_name: String },
}

impl ActionError {
    /// Wrap any error.
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ActionError::Failed(Arc::new(err))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        ActionError::Message(message.into())
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, ActionError::Panic(_))
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else if let Some(err) = payload.downcast_ref::<ActionError>() {
            err.to_string()
        } else {
            "unknown panic payload".to_string()
        };
        ActionError::Panic(message)
    }
}

impl From<&str> for ActionError {
    fn from(message: &str) -> Self {
        ActionError::msg(message)
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        ActionError::Message(message)
    }
}

impl From<std::io::Error> for ActionError {
    fn from(err: std::io::Error) -> Self {
        ActionError::new(err)
    }
}

impl From<std::fmt::Error> for ActionError {
    fn from(err: std::fmt::Error) -> Self {
        ActionError::new(err)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for ActionError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        ActionError::Failed(Arc::from(err))
    }
}

/// Fault escaping the pipeline.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A fault in a controller that declares no error handler.
    #[error("unhandled error in {target}: {source}")]
    Unhandled {
        target: String,
        #[source]
        source: ActionError,
    },
}
