//! Load counting stage.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::http::middleware::{Middleware, Next};
use crate::monitor::LoadMonitor;
use crate::observability::metrics;

/// Feeds the Load Monitor and the per-path request counter.
#[derive(Debug, Clone)]
pub struct LoadCounting {
    monitor: Arc<LoadMonitor>,
}

impl LoadCounting {
    pub fn new(monitor: Arc<LoadMonitor>) -> Self {
        Self { monitor }
    }
}

#[async_trait]
impl Middleware for LoadCounting {
    async fn handle(&self, request: Request<Body>, next: Next) -> Response {
        self.monitor.record_request();
        metrics::record_request(request.uri().path(), request.method().as_str());
        next.run(request).await
    }
}
