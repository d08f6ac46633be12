//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the matching route for a request path
//! - Return the matched rule or an explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan, longest prefix first
//! - Explicit `None` rather than a silent default route

use axum::body::Body;
use axum::http::Request;

use crate::config::RouteRule;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

#[derive(Debug)]
struct CompiledRoute {
    matcher: PathPrefixMatcher,
    rule: RouteRule,
}

/// Compiled proxy routing table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<CompiledRoute>,
}

impl Router {
    /// Compile rules into a routing table ordered by specificity.
    ///
    /// Rules of equal specificity keep their declaration order.
    pub fn from_rules(rules: &[RouteRule]) -> Self {
        let mut routes: Vec<CompiledRoute> = rules
            .iter()
            .map(|rule| CompiledRoute {
                matcher: PathPrefixMatcher::new(rule.path_prefix.clone()),
                rule: rule.clone(),
            })
            .collect();
        routes.sort_by(|a, b| b.matcher.specificity().cmp(&a.matcher.specificity()));

        tracing::debug!(routes = routes.len(), "Routing table compiled");
        Self { routes }
    }

    /// Longest-prefix match on a request path.
    pub fn match_path(&self, path: &str) -> Option<&RouteRule> {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(path))
            .map(|route| &route.rule)
    }

    /// Match on the request URI path. Host and query are ignored.
    pub fn match_request(&self, req: &Request<Body>) -> Option<&RouteRule> {
        self.match_path(req.uri().path())
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> impl Iterator<Item = &RouteRule> {
        self.routes.iter().map(|route| &route.rule)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
