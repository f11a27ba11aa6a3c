//! Typed operation table of a controller.
//!
//! # Responsibilities
//! - Register a controller's operations once, by conventional name
//! - Classify them: action, `Before_` / `After_` filter, `HandleError`,
//!   `Gen_` generator
//! - Order filters and detect shape faults when the table is built
//!
//! # Design Decisions
//! - Operations are plain functions over `&mut C`; parameter and return
//!   descriptors come from their types, never from per-request inspection
//! - Shape faults (filters returning non-error values, generators under an
//!   ordinary name, duplicate names) panic while routes are drawn

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::controller::call::{Call, FromCall};
use crate::controller::output::{IntoOutputs, Output};
use crate::controller::types::{ActionError, ParamKind, ReturnKind, TypeKey};
use crate::controller::Controller;
use crate::routing::route::short_type_name;

pub const BEFORE_PREFIX: &str = "Before_";
pub const AFTER_PREFIX: &str = "After_";
pub const GENERATOR_PREFIX: &str = "Gen_";
pub const ERROR_HANDLER: &str = "HandleError";

/// A function usable as controller operation.
///
/// Implemented for `Fn(&mut C, A1, .., An) -> R` with up to eight
/// parameters, each implementing [`FromCall`].
pub trait Action<C, Args>: Send + Sync + 'static {
    type Output;

    fn params() -> Vec<ParamKind>;

    fn invoke(&self, call: &mut Call<'_, C>) -> Result<Self::Output, ActionError>;
}

macro_rules! impl_action {
    ($($arg:ident),*) => {
        #[allow(non_snake_case, unused_variables)]
        impl<C, F, R, $($arg,)*> Action<C, ($($arg,)*)> for F
        where
            F: Fn(&mut C, $($arg),*) -> R + Send + Sync + 'static,
            $($arg: FromCall<C>,)*
        {
            type Output = R;

            fn params() -> Vec<ParamKind> {
                vec![$(<$arg as FromCall<C>>::kind()),*]
            }

            fn invoke(&self, call: &mut Call<'_, C>) -> Result<R, ActionError> {
                $(let $arg = <$arg as FromCall<C>>::from_call(call)?;)*
                Ok(self(call.instance(), $($arg),*))
            }
        }
    };
}

impl_action!();
impl_action!(A1);
impl_action!(A1, A2);
impl_action!(A1, A2, A3);
impl_action!(A1, A2, A3, A4);
impl_action!(A1, A2, A3, A4, A5);
impl_action!(A1, A2, A3, A4, A5, A6);
impl_action!(A1, A2, A3, A4, A5, A6, A7);
impl_action!(A1, A2, A3, A4, A5, A6, A7, A8);

type Thunk<C, T> = Box<dyn Fn(&mut Call<'_, C>) -> Result<T, ActionError> + Send + Sync>;

/// Role of an operation, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Action,
    Before,
    After,
    ErrorHandler,
}

impl Role {
    fn of(name: &str) -> Self {
        if name.starts_with(BEFORE_PREFIX) {
            Role::Before
        } else if name.starts_with(AFTER_PREFIX) {
            Role::After
        } else if name == ERROR_HANDLER {
            Role::ErrorHandler
        } else {
            Role::Action
        }
    }
}

/// One registered operation.
pub struct Operation<C> {
    name: String,
    role: Role,
    params: Vec<ParamKind>,
    returns: Vec<ReturnKind>,
    thunk: Thunk<C, Vec<Output>>,
}

impl<C> Operation<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub fn returns(&self) -> &[ReturnKind] {
        &self.returns
    }

    pub(crate) fn call(&self, call: &mut Call<'_, C>) -> Result<Vec<Output>, ActionError> {
        (self.thunk)(call)
    }
}

impl<C> fmt::Debug for Operation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish()
    }
}

/// A `Gen_` operation producing a value of one type.
pub struct Generator<C> {
    name: String,
    produces: TypeKey,
    params: Vec<ParamKind>,
    thunk: Thunk<C, Box<dyn Any + Send>>,
}

impl<C> Generator<C> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn produces(&self) -> TypeKey {
        self.produces
    }

    pub fn params(&self) -> &[ParamKind] {
        &self.params
    }

    pub(crate) fn call(&self, call: &mut Call<'_, C>) -> Result<Box<dyn Any + Send>, ActionError> {
        (self.thunk)(call)
    }
}

impl<C> fmt::Debug for Generator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("name", &self.name)
            .field("produces", &self.produces)
            .field("params", &self.params)
            .finish()
    }
}

/// Registration surface handed to [`Controller::methods`].
pub struct Methods<C> {
    operations: Vec<Operation<C>>,
    generators: Vec<Generator<C>>,
}

impl<C: 'static> Methods<C> {
    pub(crate) fn new() -> Self {
        Self {
            operations: Vec::new(),
            generators: Vec::new(),
        }
    }

    /// Register an operation under its conventional name.
    ///
    /// # Panics
    /// If the name is taken, carries the generator prefix, or names a
    /// filter whose return type can produce anything but an error.
    pub fn method<Args, A>(&mut self, name: &str, action: A) -> &mut Self
    where
        A: Action<C, Args>,
        A::Output: IntoOutputs,
        Args: 'static,
    {
        if name.starts_with(GENERATOR_PREFIX) {
            panic!(
                "{} carries the {} prefix; register it with `generator` or `try_generator`",
                name, GENERATOR_PREFIX
            );
        }
        self.assert_free(name);

        let role = Role::of(name);
        let returns = <A::Output as IntoOutputs>::return_kinds();
        if matches!(role, Role::Before | Role::After)
            && returns.iter().any(|kind| *kind != ReturnKind::Error)
        {
            panic!(
                "filter {} returns {:?}; filters may only return errors",
                name, returns
            );
        }

        self.operations.push(Operation {
            name: name.to_string(),
            role,
            params: A::params(),
            returns,
            thunk: Box::new(move |call: &mut Call<'_, C>| {
                action.invoke(call).map(IntoOutputs::into_outputs)
            }),
        });
        self
    }

    /// Register an infallible generator for the type it returns.
    pub fn generator<T, Args, A>(&mut self, name: &str, generator: A) -> &mut Self
    where
        A: Action<C, Args, Output = T>,
        T: Send + 'static,
        Args: 'static,
    {
        self.push_generator::<T>(
            name,
            A::params(),
            Box::new(move |call: &mut Call<'_, C>| {
                generator
                    .invoke(call)
                    .map(|value| Box::new(value) as Box<dyn Any + Send>)
            }),
        )
    }

    /// Register a generator returning `Result<T, E>`. An `Err` stops the
    /// pipeline and is handed to the error handler.
    pub fn try_generator<T, E, Args, A>(&mut self, name: &str, generator: A) -> &mut Self
    where
        A: Action<C, Args, Output = Result<T, E>>,
        T: Send + 'static,
        E: Into<ActionError>,
        Args: 'static,
    {
        self.push_generator::<T>(
            name,
            A::params(),
            Box::new(move |call: &mut Call<'_, C>| {
                generator
                    .invoke(call)?
                    .map(|value| Box::new(value) as Box<dyn Any + Send>)
                    .map_err(Into::into)
            }),
        )
    }

    fn push_generator<T: 'static>(
        &mut self,
        name: &str,
        params: Vec<ParamKind>,
        thunk: Thunk<C, Box<dyn Any + Send>>,
    ) -> &mut Self {
        if !name.starts_with(GENERATOR_PREFIX) {
            panic!("generator {} must carry the {} prefix", name, GENERATOR_PREFIX);
        }
        self.assert_free(name);
        self.generators.push(Generator {
            name: name.to_string(),
            produces: TypeKey::of::<T>(),
            params,
            thunk,
        });
        self
    }

    fn assert_free(&self, name: &str) {
        let taken = self.operations.iter().any(|op| op.name == name)
            || self.generators.iter().any(|g| g.name == name);
        if taken {
            panic!("method {} is registered twice", name);
        }
    }
}

/// Operation table of one controller type, built once per bind.
pub struct MethodTable<C> {
    controller: &'static str,
    operations: Vec<Operation<C>>,
    befores: Vec<usize>,
    afters: Vec<usize>,
    error_handler: Option<usize>,
    generators: HashMap<TypeId, Generator<C>>,
}

impl<C: Controller> MethodTable<C> {
    /// Build the table of `C` from its `methods` registration.
    pub fn of() -> Self {
        let mut methods = Methods::new();
        C::methods(&mut methods);
        Self::from_methods(short_type_name(type_name::<C>()), methods)
    }
}

impl<C> MethodTable<C> {
    fn from_methods(controller: &'static str, methods: Methods<C>) -> Self {
        let Methods {
            operations,
            generators,
        } = methods;

        let mut befores = Vec::new();
        let mut afters = Vec::new();
        let mut error_handler = None;
        for (index, op) in operations.iter().enumerate() {
            match op.role {
                Role::Before => befores.push(index),
                Role::After => afters.push(index),
                Role::ErrorHandler => error_handler = Some(index),
                Role::Action => {}
            }
        }
        befores.sort_by(|a, b| operations[*a].name.cmp(&operations[*b].name));
        afters.sort_by(|a, b| operations[*b].name.cmp(&operations[*a].name));

        // Later registrations for the same type win.
        let generators = generators
            .into_iter()
            .map(|g| (g.produces.id, g))
            .collect();

        Self {
            controller,
            operations,
            befores,
            afters,
            error_handler,
            generators,
        }
    }

    /// Short type name of the controller, e.g. `PostsController`.
    pub fn controller(&self) -> &'static str {
        self.controller
    }

    /// `Controller#Method` diagnostic identifier.
    pub fn target(&self, method: &str) -> String {
        format!("{}#{}", self.controller, method)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.operations.iter().position(|op| op.name == name)
    }

    pub fn operation(&self, index: usize) -> &Operation<C> {
        &self.operations[index]
    }

    /// Names of the operations that are neither filters nor the error
    /// handler, in registration order.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.operations
            .iter()
            .filter(|op| op.role == Role::Action)
            .map(|op| op.name.as_str())
    }

    /// Before filters, ascending by name.
    pub fn befores(&self) -> &[usize] {
        &self.befores
    }

    /// After filters, descending by name.
    pub fn afters(&self) -> &[usize] {
        &self.afters
    }

    pub fn error_handler(&self) -> Option<usize> {
        self.error_handler
    }

    pub fn generator(&self, produces: &TypeKey) -> Option<&Generator<C>> {
        self.generators.get(&produces.id)
    }
}

impl<C> fmt::Debug for MethodTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodTable")
            .field("controller", &self.controller)
            .field("operations", &self.operations)
            .field("befores", &self.befores)
            .field("afters", &self.afters)
            .field("error_handler", &self.error_handler)
            .field("generators", &self.generators.values().collect::<Vec<_>>())
            .finish()
    }
}
