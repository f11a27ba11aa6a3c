//! The Route record produced by drawing.
//!
//! # Responsibilities
//! - Hold the resolved method, URL, path, name and diagnostic target
//! - Carry the positional model placeholders used for reverse routing
//! - Carry the bound request handler
//!
//! # Design Decisions
//! - Immutable once normalized and published (shared via `Arc<Route>`)
//! - Normalization is idempotent
//! - A mismatched model count only logs; it never aborts the draw

use std::any::{type_name, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::dispatcher::Handler;

/// Type marker of one positional path parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKey {
    /// Filled in when a route declares no model for a parameter.
    /// Never matches a model argument.
    Anonymous,
    Typed {
        id: TypeId,
        name: &'static str,
    },
}

impl ModelKey {
    pub fn of<M: 'static>() -> Self {
        ModelKey::Typed {
            id: TypeId::of::<M>(),
            name: type_name::<M>(),
        }
    }

    /// Short type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKey::Anonymous => "_",
            ModelKey::Typed { name, .. } => short_type_name(*name),
        }
    }
}

/// Last path component of a type name, without generic arguments.
pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A resolved route.
#[derive(Clone, Default)]
pub struct Route {
    /// One of GET, POST, PUT, PATCH, DELETE, OPTIONS, or a comma-joined set
    /// such as `PUT,PATCH`.
    pub method: String,

    /// Pattern to match. `:name` segments are named parameters and a
    /// trailing `*` matches the rest of the path. May include a scheme and
    /// host (`http://example.com/posts/:id`).
    pub url: String,

    /// Path component of `url`.
    pub path: String,

    /// Route name used by reverse routing. Not required to be unique.
    pub name: String,

    /// snake_case action verb, e.g. `approve`.
    pub action: String,

    /// Controller usable name, e.g. `posts`.
    pub controller: String,

    /// Joined namespace fragments, e.g. `admin/v1`.
    pub namespace: String,

    /// `ControllerName#MethodName`, for diagnostics only.
    pub target: String,

    /// One entry per path parameter, positionally.
    pub models: Vec<ModelKey>,

    pub handler: Option<Arc<dyn Handler>>,
}

impl Route {
    pub(crate) fn normalize(mut self) -> Self {
        self.assign_models();
        self.assign_default_method();
        self.prefix_url();
        self.assign_path();
        self
    }

    fn assign_default_method(&mut self) {
        if self.method.is_empty() {
            self.method = "GET".to_string();
        }
    }

    fn prefix_url(&mut self) {
        if has_authority(&self.url) || self.url.starts_with('/') {
            return;
        }
        self.url = format!("/{}", self.url.trim_start_matches('/'));
    }

    fn assign_path(&mut self) {
        self.path = url_path(&self.url);
    }

    fn assign_models(&mut self) {
        let required = count_params(&self.url);
        if self.models.len() == required {
            return;
        }
        if self.models.is_empty() {
            self.models = vec![ModelKey::Anonymous; required];
            return;
        }
        let names: Vec<&str> = self.models.iter().map(ModelKey::name).collect();
        tracing::warn!(
            url = %self.url,
            required,
            models = ?names,
            "Number of models does not match the number of path parameters"
        );
    }

    /// Individual methods this route answers to.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.method.split(',').map(str::trim).filter(|m| !m.is_empty())
    }

    /// Host constraint carried by the URL, if any.
    pub fn host(&self) -> Option<String> {
        if !has_authority(&self.url) {
            return None;
        }
        let parsed = parse_absolute(&self.url)?;
        parsed.host_str().filter(|h| !h.is_empty()).map(str::to_lowercase)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "route:{} {} (name: {}) (target: {}) (action: {})",
            self.method, self.url, self.name, self.target, self.action
        )
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("action", &self.action)
            .field("namespace", &self.namespace)
            .field("target", &self.target)
            .field("models", &self.models)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// Number of `:param` and `*` segments in a URL pattern.
pub fn count_params(url: &str) -> usize {
    url.split('/')
        .filter(|s| s.starts_with(':') || *s == "*")
        .count()
}

fn has_authority(url: &str) -> bool {
    url.contains("://") || url.starts_with("//")
}

fn parse_absolute(url: &str) -> Option<url::Url> {
    // `:param` segments are valid URL path characters, so the pattern parses as-is.
    let absolute = if url.starts_with("//") {
        format!("http:{}", url)
    } else {
        url.to_string()
    };
    url::Url::parse(&absolute).ok()
}

fn url_path(url: &str) -> String {
    if has_authority(url) {
        return match parse_absolute(url) {
            Some(parsed) => parsed.path().to_string(),
            None => panic!("can't parse url {:?}", url),
        };
    }
    let end = url.find(['?', '#']).unwrap_or(url.len());
    url[..end].to_string()
}
