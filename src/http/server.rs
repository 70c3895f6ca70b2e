//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the backend pools, route table and request pipelines
//! - Create the Axum router with the built-in endpoints and the proxy fallback
//! - Wire up tower-http layers (request ID, tracing, body limit, timeout)
//! - Start the Load Monitor and its alert sink alongside the listener
//! - Serve until the shutdown broadcast fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::Response;
use axum::routing::{any, get};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::cache::{CacheStore, ResponseCache};
use crate::config::GatewayConfig;
use crate::http::dispatcher::Dispatcher;
use crate::http::handlers::{metrics_handler, StaticResponder};
use crate::http::middleware::{
    chain, CacheLookup, Chain, Handler, LoadCounting, Middleware, RateLimiting, RequestLogging,
    TokenValidation,
};
use crate::load_balancer::{BackendManager, ConfigurationError, ServicePool};
use crate::monitor::{spawn_alert_logger, LoadMonitor};
use crate::routing::Router as RouteTable;
use crate::security::{ProtectedPaths, RateLimiter, TokenValidator};

/// Pending alerts before the monitor starts dropping them.
const ALERT_CHANNEL_CAPACITY: usize = 64;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub version: Arc<Chain>,
    pub health: Arc<Chain>,
    pub proxy: Arc<Chain>,
    pub metrics: Option<PrometheusHandle>,
}

/// External collaborators the server is built around.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn CacheStore>,
    pub validator: Arc<dyn TokenValidator>,
    pub metrics: Option<PrometheusHandle>,
}

/// HTTP server for the edge gateway.
pub struct GatewayServer {
    router: axum::Router,
    monitor: Arc<LoadMonitor>,
    version: Arc<StaticResponder>,
}

impl GatewayServer {
    /// Build every pipeline from configuration.
    ///
    /// Fails when a pool is empty or unparseable, or when a route points at
    /// a pool that does not exist.
    pub fn new(config: GatewayConfig, services: Services) -> Result<Self, ConfigurationError> {
        let backends = Arc::new(BackendManager::new(&config.pools)?);
        let routes = RouteTable::from_config(&config.routes, &config.routing);
        if let Some(missing) = routes.pool_keys().find(|key| !backends.contains(key)) {
            return Err(ConfigurationError::UnknownPool(missing.to_string()));
        }
        for route in routes.routes() {
            tracing::info!(
                route = %route.name,
                prefix = %route.prefix(),
                pool = %route.pool,
                backends = backends.pool(&route.pool).map_or(0, ServicePool::size),
                "Route configured"
            );
        }

        let cache = ResponseCache::new(Arc::clone(&services.store), config.cache.ttl());
        let monitor = Arc::new(LoadMonitor::from_config(&config.monitor));
        let stack = Self::middleware_stack(&config, &services, &cache, &monitor);

        let version = Arc::new(StaticResponder::version(cache.clone()));
        let health = Arc::new(StaticResponder::health());
        let dispatcher = Arc::new(Dispatcher::new(
            routes,
            backends,
            cache,
            Duration::from_secs(config.timeouts.upstream_secs),
            config.security.max_body_size,
        ));

        let state = AppState {
            version: Arc::new(chain(version.clone(), stack.clone())),
            health: Arc::new(chain(health, stack.clone())),
            proxy: Arc::new(chain(dispatcher, stack)),
            metrics: services.metrics,
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            monitor,
            version,
        })
    }

    /// Pipeline order: logging → load counting → rate limiting (optional)
    /// → token validation (optional) → cache lookup.
    fn middleware_stack(
        config: &GatewayConfig,
        services: &Services,
        cache: &ResponseCache,
        monitor: &Arc<LoadMonitor>,
    ) -> Vec<Arc<dyn Middleware>> {
        let mut stack: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(RequestLogging),
            Arc::new(LoadCounting::new(Arc::clone(monitor))),
        ];

        if config.rate_limit.enabled {
            stack.push(Arc::new(RateLimiting::new(
                RateLimiter::new(Arc::clone(&services.store)),
                config.rate_limit.limit,
                config.rate_limit.window(),
            )));
        }

        if config.auth.enabled {
            stack.push(Arc::new(TokenValidation::new(
                ProtectedPaths::from_config(&config.auth),
                Arc::clone(&services.validator),
            )));
        }

        stack.push(Arc::new(CacheLookup::new(cache.clone())));
        stack
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/version", any(version_handler))
            .route("/health", any(health_handler))
            .route("/status", any(health_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Router for in-process use (e.g. `tower::ServiceExt::oneshot`).
    pub fn router(&self) -> axum::Router {
        self.router.clone()
    }

    pub fn monitor(&self) -> Arc<LoadMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Times the `/version` handler ran instead of being served from cache.
    pub fn version_calls(&self) -> u64 {
        self.version.calls()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        let (alerts_tx, alerts_rx) = mpsc::channel(ALERT_CHANNEL_CAPACITY);
        spawn_alert_logger(alerts_rx);
        self.monitor.start(alerts_tx);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

async fn version_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.version.call(request).await
}

async fn health_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.health.call(request).await
}

async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    state.proxy.call(request).await
}
