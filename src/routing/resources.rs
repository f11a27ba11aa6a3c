//! REST conventions for a collection of resources.
//!
//! # Responsibilities
//! - Derive plural, singular, parameter and path names from the controller
//! - Map each action name to a method, path and route name
//! - Bind one `ActionHandler` per routed action
//!
//! # Conventions
//! ```text
//! Index                GET        /posts                 posts
//! Create               POST       /posts                 posts
//! New                  GET        /posts/new             new_post
//! Show                 GET        /posts/:post_id        post
//! Edit                 GET        /posts/:post_id/edit   edit_post
//! Update               PUT,PATCH  /posts/:post_id        post
//! Delete               DELETE     /posts/:post_id        post
//! GETSearch            GET        /posts/search          search_posts
//! MemberPOSTApprove    POST       /posts/:post_id/approve approve_post
//! ```
//! Any other action name without a verb prefix is not routed.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::controller::{ActionHandler, Controller, MethodTable};
use crate::routing::inflect::{pluralize, singularize, underscore};
use crate::routing::route::{ModelKey, Route};
use crate::routing::scope::{RouteGenerator, Scope, ScopeArena, ScopeId, ScopeNode};

const VERB_PREFIXES: [(&str, &str); 5] = [
    ("get", "GET"),
    ("post", "POST"),
    ("put", "PUT,PATCH"),
    ("patch", "PATCH"),
    ("delete", "DELETE"),
];

/// Split a leading HTTP verb, matched case-insensitively, off an action
/// name. Returns the method and the rest without a leading `_`.
pub(crate) fn split_verb(name: &str) -> Option<(&'static str, &str)> {
    VERB_PREFIXES.iter().find_map(|(prefix, method)| {
        let head = name.get(..prefix.len())?;
        if !head.eq_ignore_ascii_case(prefix) {
            return None;
        }
        let rest = &name[prefix.len()..];
        Some((*method, rest.strip_prefix('_').unwrap_or(rest)))
    })
}

/// Append one segment to a route path.
pub(crate) fn push_segment(path: &mut String, segment: &str) {
    if path != "/" {
        path.push('/');
    }
    path.push_str(segment);
}

struct ResourcesShape {
    scope: ScopeId,
    singular: String,
    plural: String,
    param: String,
    new_name: String,
    edit_name: String,
    model: Option<ModelKey>,
}

impl ResourcesShape {
    /// Scope of one action and its snake_case verb, or `None` when the
    /// action is not routed.
    fn action_scope(&self, arena: &ScopeArena, name: &str) -> Option<(ScopeNode, String)> {
        let mut scope = arena.node(self.scope).clone();
        scope.method = "GET".to_string();
        scope.name = self.plural.clone();
        let param = format!(":{}", self.param);

        match name {
            "Index" => {}
            "Create" => scope.method = "POST".to_string(),
            "Show" | "Update" | "Delete" => {
                scope.model = self.model;
                scope.name = self.singular.clone();
                push_segment(&mut scope.path, &param);
                scope.method = match name {
                    "Update" => "PUT,PATCH",
                    "Delete" => "DELETE",
                    _ => "GET",
                }
                .to_string();
            }
            "New" => {
                scope.name = self.singular.clone();
                scope.verb = "new".to_string();
                push_segment(&mut scope.path, &self.new_name);
            }
            "Edit" => {
                scope.name = self.singular.clone();
                scope.verb = "edit".to_string();
                push_segment(&mut scope.path, &format!("{}/{}", param, self.edit_name));
            }
            _ => {
                let mut rest = name;
                if let Some(member) = name.strip_prefix("Member") {
                    scope.name = self.singular.clone();
                    push_segment(&mut scope.path, &param);
                    rest = member.strip_prefix('_').unwrap_or(member);
                }
                let (method, rest) = split_verb(rest)?;
                let action = underscore(rest);
                scope.method = method.to_string();
                if !action.is_empty() {
                    scope.verb = action.clone();
                    push_segment(&mut scope.path, &action);
                }
                return Some((scope, action));
            }
        }
        Some((scope, underscore(name)))
    }
}

struct ResourcesGenerator<C: Controller> {
    prototype: C,
    table: Arc<MethodTable<C>>,
    shape: Rc<RefCell<ResourcesShape>>,
}

impl<C: Controller> RouteGenerator for ResourcesGenerator<C> {
    fn routes(&self, arena: &ScopeArena) -> Vec<Route> {
        let shape = self.shape.borrow();
        let capacity = arena.settings().pool_capacity;
        self.table
            .action_names()
            .filter_map(|name| {
                let (leaf, action) = shape.action_scope(arena, name)?;
                let resolved = arena.resolve(&leaf);
                let handler = ActionHandler::bind(
                    self.table.clone(),
                    self.prototype.clone(),
                    name,
                    capacity,
                );
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
                Some(route.normalize())
            })
            .collect()
    }
}

/// Builder returned by [`Scope::resources`].
///
/// Options may be set in any order; they apply when the routes are
/// generated at the end of the drawing pass.
pub struct Resources {
    scope: Scope,
    shape: Rc<RefCell<ResourcesShape>>,
}

impl Resources {
    pub(crate) fn register<C: Controller>(parent: &Scope, controller: C) -> Self {
        let resource_name = C::name();
        let plural = pluralize(&resource_name);
        let singular = singularize(&resource_name);
        let scope = parent.path(&plural);

        let settings = scope.arena().borrow().settings().clone();
        let shape = Rc::new(RefCell::new(ResourcesShape {
            scope: scope.id(),
            param: param_for(&singular),
            singular,
            plural,
            new_name: settings.new_path_name,
            edit_name: settings.edit_path_name,
            model: None,
        }));

        let generator = ResourcesGenerator {
            prototype: controller,
            table: Arc::new(MethodTable::of()),
            shape: shape.clone(),
        };
        scope
            .arena()
            .borrow_mut()
            .add_generator(Box::new(generator));

        Self { scope, shape }
    }

    fn set_path(&self, path: &str) {
        self.scope.arena().borrow_mut().node_mut(self.scope.id()).path = path.to_string();
    }

    /// Rename the resource: plural, singular, parameter and path.
    pub fn name(self, name: &str) -> Self {
        {
            let mut shape = self.shape.borrow_mut();
            shape.plural = pluralize(name);
            shape.singular = singularize(name);
            shape.param = param_for(&shape.singular);
        }
        let plural = self.shape.borrow().plural.clone();
        self.set_path(&plural);
        self
    }

    /// Set the singular name and the parameter derived from it.
    pub fn singular(self, singular: &str) -> Self {
        {
            let mut shape = self.shape.borrow_mut();
            shape.singular = singular.to_string();
            shape.param = param_for(singular);
        }
        self
    }

    /// Set the plural name and the collection path.
    pub fn plural(self, plural: &str) -> Self {
        self.shape.borrow_mut().plural = plural.to_string();
        self.set_path(plural);
        self
    }

    /// Rename the route names only; the path is kept.
    pub fn as_name(self, name: &str) -> Self {
        {
            let mut shape = self.shape.borrow_mut();
            shape.plural = pluralize(name);
            shape.singular = singularize(name);
        }
        self
    }

    pub fn path(self, path: &str) -> Self {
        self.set_path(path);
        self
    }

    pub fn param_name(self, param: &str) -> Self {
        self.shape.borrow_mut().param = param.to_string();
        self
    }

    /// Segments used by the `New` and `Edit` actions.
    pub fn path_names(self, new_name: &str, edit_name: &str) -> Self {
        {
            let mut shape = self.shape.borrow_mut();
            shape.new_name = new_name.to_string();
            shape.edit_name = edit_name.to_string();
        }
        self
    }

    /// Model type of the member parameter, used by reverse routing.
    pub fn model<M: 'static>(self) -> Self {
        self.shape.borrow_mut().model = Some(ModelKey::of::<M>());
        self
    }

    /// Namespace of every route of this resource and of its nested routes.
    pub fn namespace(self, namespace: &str) -> Self {
        self.scope
            .arena()
            .borrow_mut()
            .node_mut(self.scope.id())
            .namespace = namespace.to_string();
        self
    }

    /// Draw nested routes under a single member,
    /// e.g. `/posts/:post_id/comments`.
    pub fn draw(&self, f: impl FnOnce(&Scope)) -> Scope {
        let (param, singular, model) = {
            let shape = self.shape.borrow();
            (format!(":{}", shape.param), shape.singular.clone(), shape.model)
        };
        let member = self.scope.path(&param).as_name(&singular);
        if let Some(model) = model {
            let id = member.id();
            member.arena().borrow_mut().node_mut(id).model = Some(model);
        }
        member.draw(f)
    }
}

fn param_for(singular: &str) -> String {
    format!("{}_id", underscore(singular))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_verb() {
        assert_eq!(split_verb("GETSearch"), Some(("GET", "Search")));
        assert_eq!(split_verb("Post_Publish"), Some(("POST", "Publish")));
        assert_eq!(split_verb("PUTReject"), Some(("PUT,PATCH", "Reject")));
        assert_eq!(split_verb("deleteAll"), Some(("DELETE", "All")));
        assert_eq!(split_verb("Search"), None);
        assert_eq!(split_verb("Ge"), None);
    }

    #[test]
    fn test_push_segment() {
        let mut root = "/".to_string();
        push_segment(&mut root, ":id");
        assert_eq!(root, "/:id");

        let mut posts = "posts".to_string();
        push_segment(&mut posts, "new");
        assert_eq!(posts, "posts/new");
    }
}
