//! Request logging stage.

use std::time::Instant;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

use crate::http::middleware::{Middleware, Next};
use crate::http::request::request_id;

/// Logs method and path of every request, then its outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogging;

#[async_trait]
impl Middleware for RequestLogging {
    async fn handle(&self, request: Request<Body>, next: Next) -> Response {
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let request_id = request_id(request.headers()).to_string();
        let start = Instant::now();

        tracing::info!(request_id = %request_id, method = %method, path = %path, "Request received");

        let response = next.run(request).await;

        tracing::debug!(
            request_id = %request_id,
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
        response
    }
}
