//! The route definition DSL.
//!
//! # Responsibilities
//! - Accumulate path, method, name, namespace, verb and model fragments in
//!   nested scopes
//! - Resolve a scope to its final method, path, name, namespace and models
//! - Collect the route generators of one drawing pass
//!
//! # Design Decisions
//! - Scopes are nodes in an arena, linked to their parent by index; a
//!   `Scope` is a cheap handle to one node
//! - Generators run after the drawing closure returns, so options set on a
//!   `Resources` after it was registered still apply
//! - Two different non-empty method constraints on one chain panic at
//!   resolution: that is a route definition bug

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::controller::Controller;
use crate::dispatcher::Handler;
use crate::routing::mount::{Redirect, RedirectGenerator, To, ToGenerator};
use crate::routing::resource::Resource;
use crate::routing::resources::Resources;
use crate::routing::route::{ModelKey, Route};

pub(crate) type ScopeId = usize;

/// One node of the scope tree.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScopeNode {
    pub parent: Option<ScopeId>,
    pub path: String,
    pub method: String,
    pub name: String,
    pub namespace: String,
    pub verb: String,
    pub model: Option<ModelKey>,
}

impl ScopeNode {
    pub fn child_of(parent: ScopeId) -> Self {
        Self {
            parent: Some(parent),
            ..Default::default()
        }
    }
}

/// Produces routes once the drawing pass is over.
pub(crate) trait RouteGenerator {
    fn routes(&self, arena: &ScopeArena) -> Vec<Route>;
}

/// Every scope node and route generator of one drawing pass.
pub(crate) struct ScopeArena {
    nodes: Vec<ScopeNode>,
    generators: Vec<Box<dyn RouteGenerator>>,
    settings: PipelineConfig,
}

impl ScopeArena {
    fn new(settings: PipelineConfig) -> Self {
        Self {
            nodes: vec![ScopeNode::default()],
            generators: Vec::new(),
            settings,
        }
    }

    pub fn node(&self, id: ScopeId) -> &ScopeNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: ScopeId) -> &mut ScopeNode {
        &mut self.nodes[id]
    }

    pub fn push(&mut self, node: ScopeNode) -> ScopeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_generator(&mut self, generator: Box<dyn RouteGenerator>) {
        self.generators.push(generator);
    }

    pub fn settings(&self) -> &PipelineConfig {
        &self.settings
    }

    /// Resolve `leaf`, a node that may not live in the arena, against its
    /// ancestors.
    pub fn resolve(&self, leaf: &ScopeNode) -> ResolvedScope {
        let mut method = leaf.method.clone();
        let mut path = leaf.path.clone();
        let mut name = leaf.name.clone();
        let mut namespace = leaf.namespace.clone();
        let mut models: Vec<ModelKey> = leaf.model.into_iter().collect();

        let mut parent = leaf.parent;
        while let Some(id) = parent {
            let node = &self.nodes[id];
            path = join_path(&node.path, &path);
            name = join_with('_', &node.name, &name);
            namespace = join_with('/', &node.namespace, &namespace);
            if !models.is_empty() {
                if let Some(model) = node.model {
                    models.insert(0, model);
                }
            }
            if method.is_empty() {
                method = node.method.clone();
            } else if !node.method.is_empty() && node.method != method {
                panic!(
                    "can't add {} {} as {} in {:?} namespace with a constraint of {} method",
                    method, path, name, namespace, node.method
                );
            }
            parent = node.parent;
        }

        if method.is_empty() {
            method = "GET".to_string();
        }
        if !path.starts_with('/') && !path.contains("://") {
            path.insert(0, '/');
        }

        ResolvedScope {
            method,
            path,
            name: join_with('_', &leaf.verb, &name),
            namespace,
            models,
        }
    }

    /// Routes of every generator, in registration order.
    pub fn routes(&self) -> Vec<Route> {
        self.generators
            .iter()
            .flat_map(|generator| generator.routes(self))
            .collect()
    }
}

/// Final values of a scope chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    pub method: String,
    pub path: String,
    pub name: String,
    pub namespace: String,
    pub models: Vec<ModelKey>,
}

/// Join fragments with `sep`, skipping empty and separator-only ones.
pub(crate) fn join_with(sep: char, head: &str, tail: &str) -> String {
    let parts: Vec<&str> = [head, tail]
        .into_iter()
        .filter(|p| !p.is_empty() && p.chars().any(|c| c != sep))
        .collect();
    parts.join(&sep.to_string())
}

fn join_path(head: &str, tail: &str) -> String {
    let head = if head.contains("://") {
        head.trim_end_matches('/')
    } else {
        head.trim_matches('/')
    };
    join_with('/', head, tail.trim_start_matches('/'))
}

/// Handle to one scope of a drawing pass.
///
/// Every builder method creates a child scope and returns it; the receiver
/// is never modified.
///
/// ```ignore
/// dispatcher.draw(|s| {
///     s.path("cool").as_name("admin").resources(PostsController::default());
///     s.get("health").to(handler_fn(|_| status_response(StatusCode::OK)));
/// });
/// ```
#[derive(Clone)]
pub struct Scope {
    arena: Rc<RefCell<ScopeArena>>,
    id: ScopeId,
}

impl Scope {
    /// A root scope with default pipeline settings.
    pub fn new() -> Self {
        Self::with_settings(PipelineConfig::default())
    }

    pub fn with_settings(settings: PipelineConfig) -> Self {
        Self {
            arena: Rc::new(RefCell::new(ScopeArena::new(settings))),
            id: 0,
        }
    }

    pub(crate) fn arena(&self) -> &Rc<RefCell<ScopeArena>> {
        &self.arena
    }

    pub(crate) fn id(&self) -> ScopeId {
        self.id
    }

    pub(crate) fn from_parts(arena: Rc<RefCell<ScopeArena>>, id: ScopeId) -> Self {
        Self { arena, id }
    }

    fn child(&self, configure: impl FnOnce(&mut ScopeNode)) -> Scope {
        let mut node = ScopeNode::child_of(self.id);
        configure(&mut node);
        let id = self.arena.borrow_mut().push(node);
        Scope::from_parts(self.arena.clone(), id)
    }

    pub fn path(&self, path: &str) -> Scope {
        self.child(|n| n.path = path.to_string())
    }

    /// Add a route name fragment.
    pub fn as_name(&self, name: &str) -> Scope {
        self.child(|n| n.name = name.to_string())
    }

    pub fn namespace(&self, namespace: &str) -> Scope {
        self.child(|n| n.namespace = namespace.to_string())
    }

    fn method(&self, method: &str, path: &str) -> Scope {
        self.child(|n| n.method = method.to_string()).path(path)
    }

    pub fn get(&self, path: &str) -> Scope {
        self.method("GET", path)
    }

    pub fn post(&self, path: &str) -> Scope {
        self.method("POST", path)
    }

    pub fn put(&self, path: &str) -> Scope {
        self.method("PUT", path)
    }

    pub fn patch(&self, path: &str) -> Scope {
        self.method("PATCH", path)
    }

    pub fn delete(&self, path: &str) -> Scope {
        self.method("DELETE", path)
    }

    pub fn options(&self, path: &str) -> Scope {
        self.method("OPTIONS", path)
    }

    /// Run `f` on a new child scope.
    pub fn draw(&self, f: impl FnOnce(&Scope)) -> Scope {
        let scope = self.child(|_| {});
        f(&scope);
        scope
    }

    /// Mount a collection of `controller`'s REST and custom actions.
    pub fn resources<C: Controller>(&self, controller: C) -> Resources {
        Resources::register(self, controller)
    }

    /// Mount `controller` as a single implicit instance.
    pub fn resource<C: Controller>(&self, controller: C) -> Resource {
        Resource::register(self, controller)
    }

    /// Mount an arbitrary handler at this scope.
    pub fn to<H: Handler>(&self, handler: H) -> To {
        let (to, generator) = ToGenerator::new(self.id, Arc::new(handler));
        self.arena.borrow_mut().add_generator(Box::new(generator));
        to
    }

    /// Mount a redirect to `location`, `301 Moved Permanently` unless
    /// changed with [`Redirect::status`].
    pub fn redirect_to(&self, location: &str) -> Redirect {
        let (redirect, generator) = RedirectGenerator::new(self.id, location);
        self.arena.borrow_mut().add_generator(Box::new(generator));
        redirect
    }

    /// Method, path, name, namespace and models of this scope.
    ///
    /// # Panics
    /// If two scopes of the chain constrain the method differently.
    pub fn resolve(&self) -> ResolvedScope {
        let arena = self.arena.borrow();
        arena.resolve(arena.node(self.id))
    }

    /// Materialize the routes of every generator of this drawing pass.
    pub fn routes(&self) -> Vec<Route> {
        self.arena.borrow().routes()
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arena = self.arena.borrow();
        f.debug_struct("Scope")
            .field("id", &self.id)
            .field("node", arena.node(self.id))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expect(scope: &Scope, method: &str, path: &str, name: &str, namespace: &str) {
        let resolved = scope.resolve();
        assert_eq!(resolved.method, method);
        assert_eq!(resolved.path, path);
        assert_eq!(resolved.name, name);
        assert_eq!(resolved.namespace, namespace);
    }

    #[test]
    fn test_root_defaults() {
        let root = Scope::new();
        expect(&root, "GET", "/", "", "");
        expect(&root.path("/"), "GET", "/", "", "");
    }

    #[test]
    fn test_nested_fragments() {
        let root = Scope::new();
        let parent = root.put("patatas").namespace("admin").as_name("secret");
        expect(&parent, "PUT", "/patatas", "secret", "admin");
        expect(&parent.draw(|_| {}), "PUT", "/patatas", "secret", "admin");

        let child = parent
            .put("fritas")
            .as_name("weapon")
            .namespace("super");
        expect(&child, "PUT", "/patatas/fritas", "secret_weapon", "admin/super");
    }

    #[test]
    fn test_slashes_are_collapsed() {
        let root = Scope::new();
        expect(&root.path("/admin/").path("/posts"), "GET", "/admin/posts", "", "");
    }

    #[test]
    #[should_panic(expected = "with a constraint of PUT method")]
    fn test_method_conflict_panics() {
        let root = Scope::new();
        root.put("posts").post("approve").resolve();
    }

    #[test]
    fn test_join_with_skips_separators() {
        assert_eq!(join_with('_', "", "post"), "post");
        assert_eq!(join_with('_', "_", "post"), "post");
        assert_eq!(join_with('_', "edit", "blog_post"), "edit_blog_post");
        assert_eq!(join_with('/', "admin", ""), "admin");
    }
}
