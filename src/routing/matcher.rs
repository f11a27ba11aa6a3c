//! Route matching logic.
//!
//! # Responsibilities
//! - Match the host (case-insensitive) of routes drawn with an absolute URL
//! - Match the method against a route's method set
//! - Match path segments: static, `:name` and a trailing `*`
//! - Pick the most specific matching route
//!
//! # Design Decisions
//! - Patterns compiled once when the table is published
//! - Trailing slashes are ignored on both sides
//! - Specificity compares segments left to right: static > named > wildcard;
//!   a template ending where the path ends beats one ending in `*`;
//!   ties keep table order
//! - No regex; matching is a linear scan over the table

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use axum::http::header::HOST;

use crate::http::HttpRequest;
use crate::routing::route::Route;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &HttpRequest) -> bool;
}

/// Matches the Host header, or the URI authority when there is none.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &HttpRequest) -> bool {
        let host = req
            .headers()
            .get(HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri().host());
        host.map(strip_port)
            .is_some_and(|h| h.eq_ignore_ascii_case(&self.expected_host))
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return host.split_inclusive(']').next().unwrap_or(host);
    }
    host.split(':').next().unwrap_or(host)
}

/// Matches any method of a comma-joined set such as `PUT,PATCH`.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    methods: Vec<String>,
}

impl MethodMatcher {
    pub fn new(methods: &str) -> Self {
        Self {
            methods: methods
                .split(',')
                .map(|m| m.trim().to_uppercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &HttpRequest) -> bool {
        self.methods.iter().any(|m| m == req.method().as_str())
    }
}

#[derive(Debug, Clone, Copy)]
enum Segment<'a> {
    Wildcard,
    Param,
    Static(&'a str),
}

impl Segment<'_> {
    fn rank(&self) -> u8 {
        match self {
            Segment::Wildcard => 0,
            Segment::Param => 1,
            Segment::Static(_) => 2,
        }
    }
}

/// Rank of the end of a template, above any segment.
const END_RANK: u8 = 3;

/// Compiled path template.
#[derive(Debug, Clone)]
pub struct PathPattern {
    template: String,
}

impl PathPattern {
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    fn segments(&self) -> impl Iterator<Item = Segment<'_>> {
        split_segments(&self.template).map(|s| match s {
            "*" => Segment::Wildcard,
            s if s.starts_with(':') => Segment::Param,
            s => Segment::Static(s),
        })
    }

    /// Whether `path` matches the template.
    pub fn matches_path(&self, path: &str) -> bool {
        let mut actual = split_segments(path);
        for segment in self.segments() {
            match segment {
                Segment::Wildcard => return true,
                Segment::Param => {
                    if actual.next().is_none() {
                        return false;
                    }
                }
                Segment::Static(expected) => {
                    if actual.next() != Some(expected) {
                        return false;
                    }
                }
            }
        }
        actual.next().is_none()
    }

    /// Order by specificity, most specific greatest.
    fn specificity(&self, other: &Self) -> Ordering {
        let ranks = |p: &Self| {
            p.segments()
                .map(|s| s.rank())
                .chain(std::iter::once(END_RANK))
                .collect::<Vec<_>>()
        };
        ranks(self).cmp(&ranks(other))
    }
}

impl Matcher for PathPattern {
    fn matches(&self, req: &HttpRequest) -> bool {
        self.matches_path(req.uri().path())
    }
}

/// Non-empty segments of `path`.
pub(crate) fn split_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

struct Entry {
    route: Arc<Route>,
    host: Option<HostMatcher>,
    method: MethodMatcher,
    path: PathPattern,
}

impl Entry {
    fn matches(&self, req: &HttpRequest) -> bool {
        self.method.matches(req)
            && self.path.matches(req)
            && self.host.as_ref().map_or(true, |h| h.matches(req))
    }
}

/// The published, immutable set of routable routes.
#[derive(Default)]
pub struct RouteTable {
    entries: Vec<Entry>,
}

impl RouteTable {
    /// Compile `routes`. Routes without a handler are not routable.
    pub fn new(routes: &[Arc<Route>]) -> Self {
        let entries = routes
            .iter()
            .filter(|route| route.handler.is_some())
            .map(|route| Entry {
                host: route.host().map(HostMatcher::new),
                method: MethodMatcher::new(&route.method),
                path: PathPattern::new(&route.path),
                route: route.clone(),
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most specific route matching `req`.
    pub fn find(&self, req: &HttpRequest) -> Option<Arc<Route>> {
        let mut best: Option<&Entry> = None;
        for entry in self.entries.iter().filter(|e| e.matches(req)) {
            let better = match best {
                None => true,
                Some(current) => entry.path.specificity(&current.path) == Ordering::Greater,
            };
            if better {
                best = Some(entry);
            }
        }
        best.map(|entry| entry.route.clone())
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.route.to_string()))
            .finish()
    }
}
