//! Startup orchestration.
//!
//! Turns a validated [`GatewayConfig`] into the collaborators the server
//! is built around.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::cache::{CacheStore, CacheStoreError, MemoryStore, RedisStore};
use crate::config::{CacheBackend, ConfigError, GatewayConfig};
use crate::http::Services;
use crate::load_balancer::ConfigurationError;
use crate::security::{RemoteTokenValidator, TokenValidatorError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cache store: {0}")]
    CacheStore(#[from] CacheStoreError),

    #[error("token validator: {0}")]
    TokenValidator(#[from] TokenValidatorError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
}

/// Pick the cache store backend and build the auth client.
pub fn services_from_config(
    config: &GatewayConfig,
    metrics: Option<PrometheusHandle>,
) -> Result<Services, StartupError> {
    let store: Arc<dyn CacheStore> = match config.cache.backend {
        CacheBackend::Redis => {
            tracing::info!(url = %config.cache.redis_url, "Using Redis cache store");
            Arc::new(RedisStore::open(&config.cache.redis_url, config.cache.op_timeout())?)
        }
        CacheBackend::Memory => {
            tracing::info!("Using in-memory cache store");
            Arc::new(MemoryStore::new())
        }
    };

    let validator = Arc::new(RemoteTokenValidator::from_config(&config.auth)?);

    Ok(Services {
        store,
        validator,
        metrics,
    })
}
