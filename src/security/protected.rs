//! Static protected-path predicate.

use crate::config::AuthConfig;
use crate::routing::{AnyPrefixMatcher, Matcher};

/// Which paths require a valid token.
///
/// A path is protected when it starts with a protected prefix and with none
/// of the exempt prefixes. Exemptions win even under a protected prefix.
#[derive(Debug, Clone, Default)]
pub struct ProtectedPaths {
    protected: AnyPrefixMatcher,
    exempt: AnyPrefixMatcher,
}

impl ProtectedPaths {
    pub fn new<P, E>(protected: P, exempt: E) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        Self {
            protected: AnyPrefixMatcher::new(protected),
            exempt: AnyPrefixMatcher::new(exempt),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.protected_prefixes.iter().cloned(),
            config.exempt_prefixes.iter().cloned(),
        )
    }

    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.matches(path) && !self.exempt.matches(path)
    }
}
