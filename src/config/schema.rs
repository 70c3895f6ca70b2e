//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend pools keyed by group name (e.g. "session", "user").
    pub pools: PoolsConfig,

    /// Path-prefix rules mapping requests to pools.
    pub routes: Vec<RouteConfig>,

    /// Fallback routing behaviour.
    pub routing: RoutingConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Load monitor settings.
    pub monitor: MonitorConfig,

    /// Token validation settings.
    pub auth: AuthConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    pub security: SecurityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            pools: PoolsConfig::default(),
            routes: default_routes(),
            routing: RoutingConfig::default(),
            cache: CacheConfig::default(),
            monitor: MonitorConfig::default(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// `/session` goes to the session pool; everything else falls through to
/// `routing.default_pool`.
fn default_routes() -> Vec<RouteConfig> {
    vec![RouteConfig {
        name: "session".to_string(),
        path_prefix: "/session".to_string(),
        pool: "session".to_string(),
        priority: 10,
    }]
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend pools: group name -> ordered list of base URLs.
///
/// Ordering inside a pool is the round-robin order.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PoolsConfig(pub BTreeMap<String, Vec<String>>);

impl Default for PoolsConfig {
    fn default() -> Self {
        let mut pools = BTreeMap::new();
        pools.insert(
            "session".to_string(),
            vec![
                "http://session-service-1:8001".to_string(),
                "http://session-service-2:8002".to_string(),
                "http://session-service-3:8003".to_string(),
            ],
        );
        pools.insert(
            "user".to_string(),
            vec![
                "http://user-service-1:8004".to_string(),
                "http://user-service-2:8005".to_string(),
                "http://user-service-3:8006".to_string(),
            ],
        );
        Self(pools)
    }
}

impl PoolsConfig {
    /// Create an empty pool table.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert (or replace) a pool.
    pub fn insert(&mut self, group: impl Into<String>, addresses: Vec<String>) {
        self.0.insert(group.into(), addresses);
    }

    pub fn contains(&self, group: &str) -> bool {
        self.0.contains_key(group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}

/// Route configuration mapping a path prefix to a pool.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Path prefix to match.
    pub path_prefix: String,

    /// Pool key to forward to.
    pub pool: String,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

/// Fallback routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Pool used when no route prefix matches.
    pub default_pool: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            default_pool: "user".to_string(),
        }
    }
}

/// Which store backs the response cache and rate-limit counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Redis,
    Memory,
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,

    /// Redis connection URL.
    pub redis_url: String,

    /// Time-to-live applied to every cached response, in seconds.
    pub ttl_secs: u64,

    /// Upper bound on a single store round trip, in milliseconds.
    pub op_timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Redis,
            redis_url: "redis://redis:6379".to_string(),
            ttl_secs: 60,
            op_timeout_ms: 500,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

/// Load monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Service name reported in alerts.
    pub service_name: String,

    /// Requests per interval at or above which an alert is raised.
    pub critical_load: u64,

    /// Sampling period in milliseconds.
    pub interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            service_name: "echo-server".to_string(),
            critical_load: 60,
            interval_ms: 1000,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Token validation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Wire the token-validation stage into the proxy chain.
    pub enabled: bool,

    /// Auth collaborator endpoint receiving `{"user_token": ...}`.
    pub validate_url: String,

    /// Collaborator message that marks a token as invalid (case-insensitive).
    pub invalid_message: String,

    /// Timeout for a single validation call, in milliseconds.
    pub timeout_ms: u64,

    /// Paths under these prefixes require a valid token.
    pub protected_prefixes: Vec<String>,

    /// Paths under these prefixes never require a token.
    pub exempt_prefixes: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            validate_url: "http://user-service-1:8004/validate".to_string(),
            invalid_message: "Token is invalid.".to_string(),
            timeout_ms: 5000,
            protected_prefixes: vec!["/session".to_string(), "/user".to_string()],
            exempt_prefixes: vec![
                "/session/docs".to_string(),
                "/user/docs".to_string(),
                "/session/openapi.json".to_string(),
                "/user/openapi.json".to_string(),
                "/session/status".to_string(),
                "/user/status".to_string(),
            ],
        }
    }
}

impl AuthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum requests per client within one window.
    pub limit: u64,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: 100,
            window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Timeout for a single proxied upstream call, in seconds.
    pub upstream_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 10,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
