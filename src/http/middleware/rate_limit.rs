//! Per-client rate limiting stage.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::http::middleware::{Middleware, Next};
use crate::http::request::client_identity;
use crate::http::response::GatewayError;
use crate::observability::metrics;
use crate::security::RateLimiter;

#[derive(Debug)]
pub struct RateLimiting {
    limiter: RateLimiter,
    limit: u64,
    window: Duration,
}

impl RateLimiting {
    pub fn new(limiter: RateLimiter, limit: u64, window: Duration) -> Self {
        Self {
            limiter,
            limit,
            window,
        }
    }
}

#[async_trait]
impl Middleware for RateLimiting {
    async fn handle(&self, request: Request<Body>, next: Next) -> Response {
        let client = client_identity(&request);
        if self.limiter.allow(&client, self.limit, self.window).await {
            return next.run(request).await;
        }

        tracing::warn!(client = %client, limit = self.limit, "Rate limit exceeded");
        metrics::record_rate_limited();
        GatewayError::RateLimited {
            retry_after_secs: self.window.as_secs().max(1),
        }
        .into_response()
    }
}
