//! Cache lookup stage.
//!
//! Only reads. Writing back is the terminal handler's job, since only it
//! knows whether the response is worth keeping.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::response::Response;

use crate::cache::{cache_key, ResponseCache};
use crate::http::middleware::{Middleware, Next};

pub const X_CACHE: &str = "x-cache";

#[derive(Debug, Clone)]
pub struct CacheLookup {
    cache: ResponseCache,
}

impl CacheLookup {
    pub fn new(cache: ResponseCache) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl Middleware for CacheLookup {
    async fn handle(&self, request: Request<Body>, next: Next) -> Response {
        let key = cache_key(request.uri());
        match self.cache.lookup(&key).await {
            Some(body) => {
                tracing::debug!(key = %key, "Serving from cache");
                let mut response = Response::new(Body::from(body));
                *response.status_mut() = StatusCode::OK;
                response
                    .headers_mut()
                    .insert(X_CACHE, HeaderValue::from_static("HIT"));
                response
            }
            None => next.run(request).await,
        }
    }
}
