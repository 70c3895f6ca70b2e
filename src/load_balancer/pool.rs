//! Backend pool management.
//!
//! # Responsibilities
//! - Manage collections of backends grouped by pool key
//! - Apply the rotation strategy to select a backend per request
//! - Reject empty or unknown pools as configuration errors

use std::collections::HashMap;
use std::sync::Arc;

use url::Url;

use crate::config::PoolsConfig;
use crate::load_balancer::{backend::Backend, round_robin::RoundRobin, LoadBalancer};

/// Pool-level configuration problems.
///
/// Empty pools and bad addresses are caught while building the manager;
/// `UnknownPool` is what a lookup for an unconfigured key reports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("no such pool '{0}'")]
    UnknownPool(String),

    #[error("pool '{0}' has no backends")]
    EmptyPool(String),

    #[error("pool '{pool}' has invalid backend address '{address}'")]
    InvalidAddress { pool: String, address: String },
}

/// One service group: a fixed, ordered backend list plus its rotation cursor.
#[derive(Debug)]
pub struct ServicePool {
    backends: Vec<Arc<Backend>>,
    balancer: Box<dyn LoadBalancer>,
}

impl ServicePool {
    fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            backends,
            balancer: Box::new(RoundRobin::new()),
        }
    }

    /// Number of backends in rotation.
    pub fn size(&self) -> usize {
        self.backends.len()
    }
}

/// Manages backend pools and load balancing.
#[derive(Debug)]
pub struct BackendManager {
    /// Map of pool key -> pool.
    pools: HashMap<String, ServicePool>,
}

impl BackendManager {
    /// Create a new backend manager from configuration.
    pub fn new(config: &PoolsConfig) -> Result<Self, ConfigurationError> {
        let mut pools = HashMap::new();

        for (group, addresses) in config.iter() {
            if addresses.is_empty() {
                return Err(ConfigurationError::EmptyPool(group.clone()));
            }

            let mut backends = Vec::with_capacity(addresses.len());
            for address in addresses {
                let base_url =
                    Url::parse(address).map_err(|_| ConfigurationError::InvalidAddress {
                        pool: group.clone(),
                        address: address.clone(),
                    })?;
                backends.push(Arc::new(Backend::new(group.clone(), base_url)));
            }

            tracing::debug!(pool = %group, backends = backends.len(), "Backend pool configured");
            pools.insert(group.clone(), ServicePool::new(backends));
        }

        Ok(Self { pools })
    }

    /// Select the next backend for the given pool in round-robin order.
    pub fn select_backend(&self, pool_key: &str) -> Result<Arc<Backend>, ConfigurationError> {
        let pool = self
            .pools
            .get(pool_key)
            .ok_or_else(|| ConfigurationError::UnknownPool(pool_key.to_string()))?;

        pool.balancer
            .next_server(&pool.backends)
            .ok_or_else(|| ConfigurationError::EmptyPool(pool_key.to_string()))
    }

    pub fn pool(&self, pool_key: &str) -> Option<&ServicePool> {
        self.pools.get(pool_key)
    }

    pub fn contains(&self, pool_key: &str) -> bool {
        self.pools.contains_key(pool_key)
    }
}
