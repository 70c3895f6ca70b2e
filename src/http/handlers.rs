//! Built-in endpoints served by the gateway itself.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::cache::{cache_key, ResponseCache};
use crate::http::middleware::Handler;
use crate::http::server::AppState;

pub const VERSION_MESSAGE: &str = "D&D Game Hosting Table v1";
pub const HEALTHY_MESSAGE: &str = "healthy";

/// A handler with a fixed body.
///
/// With a cache attached, every produced body is also written back under
/// the request's cache key.
#[derive(Debug)]
pub struct StaticResponder {
    body: &'static str,
    cache: Option<ResponseCache>,
    calls: AtomicU64,
}

impl StaticResponder {
    /// `GET /version`: populates the cache.
    pub fn version(cache: ResponseCache) -> Self {
        Self {
            body: VERSION_MESSAGE,
            cache: Some(cache),
            calls: AtomicU64::new(0),
        }
    }

    /// `GET /health`: never writes to the cache.
    pub fn health() -> Self {
        Self {
            body: HEALTHY_MESSAGE,
            cache: None,
            calls: AtomicU64::new(0),
        }
    }

    /// How many times this handler actually produced a response.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Handler for StaticResponder {
    async fn call(&self, request: Request<Body>) -> Response {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if let Some(cache) = &self.cache {
            let key = cache_key(request.uri());
            cache.store(&key, self.body).await;
        }
        (StatusCode::OK, self.body).into_response()
    }
}

/// `GET /metrics`: Prometheus text exposition, empty when metrics are off.
pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::OK.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::http::middleware::{chain, CacheLookup, Middleware};
    use std::sync::Arc;
    use std::time::Duration;

    async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn version_is_served_from_cache_on_repeat() {
        let cache = ResponseCache::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        let handler = Arc::new(StaticResponder::version(cache.clone()));
        let lookup: Arc<dyn Middleware> = Arc::new(CacheLookup::new(cache));
        let pipeline = chain(handler.clone(), vec![lookup]);

        let first = pipeline.call(get("/version")).await;
        assert_eq!(first.status(), StatusCode::OK);
        assert!(first.headers().get("x-cache").is_none());
        assert_eq!(text(first).await, VERSION_MESSAGE);

        let second = pipeline.call(get("/version")).await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(second.headers()["x-cache"], "HIT");
        assert_eq!(text(second).await, VERSION_MESSAGE);

        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn health_never_populates_cache() {
        let store = Arc::new(MemoryStore::new());
        let cache = ResponseCache::new(store.clone(), Duration::from_secs(60));
        let handler = Arc::new(StaticResponder::health());
        let lookup: Arc<dyn Middleware> = Arc::new(CacheLookup::new(cache));
        let pipeline = chain(handler.clone(), vec![lookup]);

        for _ in 0..3 {
            let response = pipeline.call(get("/health")).await;
            assert_eq!(text(response).await, HEALTHY_MESSAGE);
        }
        assert_eq!(handler.calls(), 3);
        assert!(store.is_empty());
    }
}
