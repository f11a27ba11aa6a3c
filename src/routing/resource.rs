//! REST conventions for a single implicit resource, e.g. `/session`.
//!
//! ```text
//! Show        GET        /session          session
//! Create      POST       /session          session
//! Update      PUT,PATCH  /session          session
//! Delete      DELETE     /session          session
//! New         GET        /session/new      new_session
//! Edit        GET        /session/edit     edit_session
//! GETSearch   GET        /session/search   session_search
//! ```

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::controller::{ActionHandler, Controller, MethodTable};
use crate::routing::inflect::underscore;
use crate::routing::resources::split_verb;
use crate::routing::route::Route;
use crate::routing::scope::{RouteGenerator, Scope, ScopeArena, ScopeId, ScopeNode};

struct ResourceShape {
    parent: ScopeId,
    name: String,
    path: String,
    new_name: String,
    edit_name: String,
}

impl ResourceShape {
    fn action_scope(&self, name: &str) -> Option<(ScopeNode, String)> {
        let mut scope = ScopeNode::child_of(self.parent);
        scope.method = "GET".to_string();
        scope.path = self.path.clone();
        scope.name = self.name.clone();

        match name {
            "Show" => {}
            "Create" => scope.method = "POST".to_string(),
            "Update" => scope.method = "PUT,PATCH".to_string(),
            "Delete" => scope.method = "DELETE".to_string(),
            "New" => {
                scope.path = format!("{}/{}", self.path, self.new_name);
                scope.verb = "new".to_string();
            }
            "Edit" => {
                scope.path = format!("{}/{}", self.path, self.edit_name);
                scope.verb = "edit".to_string();
            }
            _ => {
                let (method, rest) = split_verb(name)?;
                let action = underscore(rest);
                scope.method = method.to_string();
                scope.name = format!("{}_{}", self.name, action);
                scope.path = format!("{}/{}", self.path, action);
                return Some((scope, action));
            }
        }
        Some((scope, underscore(name)))
    }
}

struct ResourceGenerator<C: Controller> {
    prototype: C,
    table: Arc<MethodTable<C>>,
    shape: Rc<RefCell<ResourceShape>>,
}

impl<C: Controller> RouteGenerator for ResourceGenerator<C> {
    fn routes(&self, arena: &ScopeArena) -> Vec<Route> {
        let shape = self.shape.borrow();
        let capacity = arena.settings().pool_capacity;
        let mut routes = Vec::new();
        for name in self.table.action_names() {
            let Some((leaf, action)) = shape.action_scope(name) else {
                continue;
            };
            let resolved = arena.resolve(&leaf);
            let handler =
                ActionHandler::bind(self.table.clone(), self.prototype.clone(), name, capacity);
            let route = Route {
                method: resolved.method,
                url: resolved.path,
                name: resolved.name,
                action,
                controller: C::name(),
                namespace: resolved.namespace,
                target: self.table.target(name),
                models: resolved.models,
                handler: Some(Arc::new(handler)),
                ..Default::default()
            };
            routes.push(route.normalize());
        }
        routes
    }
}

/// Builder returned by [`Scope::resource`].
pub struct Resource {
    parent: Scope,
    shape: Rc<RefCell<ResourceShape>>,
}

impl Resource {
    pub(crate) fn register<C: Controller>(parent: &Scope, controller: C) -> Self {
        let name = C::name();
        let settings = parent.arena().borrow().settings().clone();
        let shape = Rc::new(RefCell::new(ResourceShape {
            parent: parent.id(),
            path: name.clone(),
            name,
            new_name: settings.new_path_name,
            edit_name: settings.edit_path_name,
        }));

        let generator = ResourceGenerator {
            prototype: controller,
            table: Arc::new(MethodTable::of()),
            shape: shape.clone(),
        };
        parent
            .arena()
            .borrow_mut()
            .add_generator(Box::new(generator));

        Self {
            parent: parent.clone(),
            shape,
        }
    }

    /// Set the route name and the path.
    pub fn name(self, name: &str) -> Self {
        {
            let mut shape = self.shape.borrow_mut();
            shape.name = name.to_string();
            shape.path = name.to_string();
        }
        self
    }

    pub fn path(self, path: &str) -> Self {
        self.shape.borrow_mut().path = path.to_string();
        self
    }

    /// Draw nested routes under the resource path.
    pub fn draw(&self, f: impl FnOnce(&Scope)) -> Scope {
        let (path, name) = {
            let shape = self.shape.borrow();
            (shape.path.clone(), shape.name.clone())
        };
        self.parent.path(&path).as_name(&name).draw(f)
    }
}
