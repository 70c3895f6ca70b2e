//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled prefix rules
//! - Resolve a request path to a pool key
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Rules sorted by priority (descending); ties keep config order
//! - A configured default pool catches everything else, so a single fixed
//!   backend is just a default pool of size one

use crate::config::{RouteConfig, RoutingConfig};
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// A compiled routing rule.
#[derive(Debug, Clone)]
pub struct Route {
    pub name: String,
    pub pool: String,
    pub priority: u32,
    matcher: PathPrefixMatcher,
}

impl Route {
    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }
}

/// Prefix → pool-key rule table.
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
    default_pool: String,
}

impl Router {
    /// Compile the rule table from configuration.
    pub fn from_config(routes: &[RouteConfig], routing: &RoutingConfig) -> Self {
        let mut compiled: Vec<Route> = routes
            .iter()
            .map(|r| Route {
                name: r.name.clone(),
                pool: r.pool.clone(),
                priority: r.priority,
                matcher: PathPrefixMatcher::new(r.path_prefix.clone()),
            })
            .collect();

        // Stable sort: equal priorities keep their configured order.
        compiled.sort_by(|a, b| b.priority.cmp(&a.priority));

        Self {
            routes: compiled,
            default_pool: routing.default_pool.clone(),
        }
    }

    /// Pool key for the given request path.
    pub fn resolve(&self, path: &str) -> &str {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(path))
            .map(|route| route.pool.as_str())
            .unwrap_or(self.default_pool.as_str())
    }

    /// Every pool key this table can produce.
    pub fn pool_keys(&self) -> impl Iterator<Item = &str> {
        self.routes
            .iter()
            .map(|route| route.pool.as_str())
            .chain(std::iter::once(self.default_pool.as_str()))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}
