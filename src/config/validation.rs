//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics: pools are non-empty
//! and hold usable URLs, every route references a configured pool, and
//! numeric settings are in range. All errors are collected, not just the first.

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("no backend pools configured")]
    NoPools,

    #[error("pool '{0}' has no backends")]
    EmptyPool(String),

    #[error("pool '{pool}' has invalid backend URL '{address}'")]
    BackendUrl { pool: String, address: String },

    #[error("route '{route}' references unknown pool '{pool}'")]
    UnknownRoutePool { route: String, pool: String },

    #[error("route '{0}' has an empty path prefix")]
    EmptyPrefix(String),

    #[error("default pool '{0}' is not configured")]
    UnknownDefaultPool(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("auth validate_url '{0}' is not a valid URL")]
    ValidateUrl(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.pools.iter().next().is_none() {
        errors.push(ValidationError::NoPools);
    }

    for (pool, addresses) in config.pools.iter() {
        if addresses.is_empty() {
            errors.push(ValidationError::EmptyPool(pool.clone()));
        }
        for address in addresses {
            if !is_http_url(address) {
                errors.push(ValidationError::BackendUrl {
                    pool: pool.clone(),
                    address: address.clone(),
                });
            }
        }
    }

    for route in &config.routes {
        if route.path_prefix.is_empty() {
            errors.push(ValidationError::EmptyPrefix(route.name.clone()));
        }
        if !config.pools.contains(&route.pool) {
            errors.push(ValidationError::UnknownRoutePool {
                route: route.name.clone(),
                pool: route.pool.clone(),
            });
        }
    }

    if !config.pools.contains(&config.routing.default_pool) {
        errors.push(ValidationError::UnknownDefaultPool(
            config.routing.default_pool.clone(),
        ));
    }

    let ranges = [
        ("cache.ttl_secs", config.cache.ttl_secs),
        ("cache.op_timeout_ms", config.cache.op_timeout_ms),
        ("monitor.critical_load", config.monitor.critical_load),
        ("monitor.interval_ms", config.monitor.interval_ms),
        ("auth.timeout_ms", config.auth.timeout_ms),
        ("timeouts.upstream_secs", config.timeouts.upstream_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("security.max_body_size", config.security.max_body_size as u64),
    ];
    for (name, value) in ranges {
        if value == 0 {
            errors.push(ValidationError::Zero(name));
        }
    }

    if config.rate_limit.enabled {
        if config.rate_limit.limit == 0 {
            errors.push(ValidationError::Zero("rate_limit.limit"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::Zero("rate_limit.window_secs"));
        }
    }

    if config.auth.enabled && !is_http_url(&config.auth.validate_url) {
        errors.push(ValidationError::ValidateUrl(config.auth.validate_url.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_error() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.pools.insert("empty", vec![]);
        config.pools.insert("broken", vec!["ftp://somewhere".into()]);
        config.routes.push(RouteConfig {
            name: "ghost".into(),
            path_prefix: "/ghost".into(),
            pool: "missing".into(),
            priority: 0,
        });
        config.monitor.critical_load = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::BindAddress("not-an-address".into())));
        assert!(errors.contains(&ValidationError::EmptyPool("empty".into())));
        assert!(errors.contains(&ValidationError::BackendUrl {
            pool: "broken".into(),
            address: "ftp://somewhere".into(),
        }));
        assert!(errors.contains(&ValidationError::UnknownRoutePool {
            route: "ghost".into(),
            pool: "missing".into(),
        }));
        assert!(errors.contains(&ValidationError::Zero("monitor.critical_load")));
    }

    #[test]
    fn unknown_default_pool_is_rejected() {
        let mut config = GatewayConfig::default();
        config.routing.default_pool = "nowhere".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::UnknownDefaultPool("nowhere".into())]);
    }

    #[test]
    fn rate_limit_bounds_only_checked_when_enabled() {
        let mut config = GatewayConfig::default();
        config.rate_limit.limit = 0;
        assert!(validate_config(&config).is_ok());

        config.rate_limit.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::Zero("rate_limit.limit")]);
    }
}
