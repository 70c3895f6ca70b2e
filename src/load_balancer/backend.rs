//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server by its base URL
//! - Build the absolute upstream URI for a request path

use axum::http::Uri;
use url::Url;

/// A single backend server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    /// Pool this backend belongs to.
    pub pool: String,
    /// Base URL, e.g. `http://session-service-1:8001`.
    pub base_url: Url,
}

impl Backend {
    /// Create a new backend.
    pub fn new(pool: impl Into<String>, base_url: Url) -> Self {
        Self {
            pool: pool.into(),
            base_url,
        }
    }

    /// Base URL without a trailing slash, as configured.
    pub fn base(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Absolute URI for forwarding `path_and_query` to this backend.
    pub fn upstream_uri(&self, path_and_query: &str) -> Result<Uri, axum::http::uri::InvalidUri> {
        format!("{}{}", self.base(), path_and_query).parse()
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.base())
    }
}
