//! Named route registry and reverse routing.
//!
//! # Responsibilities
//! - Keep name, path and models of every named route, in table order
//! - Find a route by name, or by the types of the model arguments
//! - Substitute path parameters left to right
//!
//! # Design Decisions
//! - Names are not unique; the first route with a name wins
//! - A lookup by name accepts any argument kind for the parameters
//! - `*` segments are substituted like named ones

use std::fmt;

use thiserror::Error;

use crate::routing::route::{count_params, ModelKey, Route};

/// A value exposing the identifier used in generated paths.
pub trait Model: 'static {
    fn id(&self) -> String;
}

/// One argument of [`NamedRoutes::path_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathArg {
    /// A route name when first, a parameter value otherwise.
    Text(String),
    Int(String),
    Model { key: ModelKey, id: String },
}

impl PathArg {
    fn segment(&self) -> &str {
        match self {
            PathArg::Text(s) | PathArg::Int(s) => s,
            PathArg::Model { id, .. } => id,
        }
    }

    fn model_key(&self) -> Option<ModelKey> {
        match self {
            PathArg::Model { key, .. } => Some(*key),
            _ => None,
        }
    }
}

impl fmt::Display for PathArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathArg::Text(s) | PathArg::Int(s) => f.write_str(s),
            PathArg::Model { key, id } => write!(f, "{}({})", key.name(), id),
        }
    }
}

impl From<&str> for PathArg {
    fn from(s: &str) -> Self {
        PathArg::Text(s.to_string())
    }
}

impl From<String> for PathArg {
    fn from(s: String) -> Self {
        PathArg::Text(s)
    }
}

macro_rules! int_path_arg {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PathArg {
                fn from(n: $t) -> Self {
                    PathArg::Int(n.to_string())
                }
            }
        )*
    };
}

int_path_arg!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<M: Model> From<&M> for PathArg {
    fn from(model: &M) -> Self {
        PathArg::Model {
            key: ModelKey::of::<M>(),
            id: model.id(),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path_for requires at least one argument")]
    NoArguments,

    #[error("path not found for [{}]", .args.join(" "))]
    NotFound { args: Vec<String> },

    #[error("path name {name:?} requires {required} arguments. Got {given}")]
    ArgumentCount {
        name: String,
        required: usize,
        given: usize,
    },
}

#[derive(Debug, Clone)]
struct NamedRoute {
    name: String,
    path: String,
    models: Vec<ModelKey>,
}

/// Routes addressable by name or by model types.
#[derive(Debug, Clone, Default)]
pub struct NamedRoutes {
    routes: Vec<NamedRoute>,
}

impl NamedRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `route` when it has a name.
    pub fn add(&mut self, route: &Route) {
        if route.name.is_empty() {
            return;
        }
        self.routes.push(NamedRoute {
            name: route.name.clone(),
            path: route.path.clone(),
            models: route.models.clone(),
        });
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Build the path of a route.
    ///
    /// A leading [`PathArg::Text`] names the route and the remaining
    /// arguments fill its parameters. Otherwise every argument is a model
    /// and the route is the first whose models have the same types, in
    /// order.
    pub fn path_for(&self, args: &[PathArg]) -> Result<String, PathError> {
        let Some(first) = args.first() else {
            return Err(PathError::NoArguments);
        };

        let (route, params) = match first {
            PathArg::Text(name) => (self.find_by_name(name), &args[1..]),
            _ => (self.find_by_models(args), args),
        };
        let Some(route) = route else {
            return Err(PathError::NotFound {
                args: args.iter().map(ToString::to_string).collect(),
            });
        };

        let required = count_params(&route.path);
        if params.len() != required {
            return Err(PathError::ArgumentCount {
                name: route.name.clone(),
                required,
                given: params.len(),
            });
        }
        Ok(substitute(&route.path, params))
    }

    fn find_by_name(&self, name: &str) -> Option<&NamedRoute> {
        self.routes.iter().find(|r| r.name == name)
    }

    fn find_by_models(&self, args: &[PathArg]) -> Option<&NamedRoute> {
        self.routes.iter().find(|r| {
            r.models.len() == args.len()
                && r.models.iter().zip(args).all(|(model, arg)| {
                    *model != ModelKey::Anonymous && arg.model_key() == Some(*model)
                })
        })
    }
}

fn substitute(path: &str, params: &[PathArg]) -> String {
    let mut params = params.iter();
    path.split('/')
        .map(|segment| {
            if segment.starts_with(':') || segment == "*" {
                params.next().map_or(segment, PathArg::segment)
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Build a path from mixed arguments through [`NamedRoutes::path_for`]
/// or `Dispatcher::path_for`.
///
/// ```ignore
/// let path = path_for!(dispatcher, "post_comment", 1, &comment)?;
/// ```
#[macro_export]
macro_rules! path_for {
    ($routes:expr $(, $arg:expr)* $(,)?) => {
        $routes.path_for(&[$($crate::routing::PathArg::from($arg)),*])
    };
}
