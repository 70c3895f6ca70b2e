//! Token validation stage.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::{IntoResponse, Response};

use crate::http::middleware::{Middleware, Next};
use crate::http::response::GatewayError;
use crate::observability::metrics;
use crate::security::{ProtectedPaths, TokenValidator};

/// Rejects requests to protected paths whose token the validator refuses.
///
/// Unprotected and exempt paths never reach the validator.
pub struct TokenValidation {
    paths: ProtectedPaths,
    validator: Arc<dyn TokenValidator>,
}

impl TokenValidation {
    pub fn new(paths: ProtectedPaths, validator: Arc<dyn TokenValidator>) -> Self {
        Self { paths, validator }
    }
}

#[async_trait]
impl Middleware for TokenValidation {
    async fn handle(&self, request: Request<Body>, next: Next) -> Response {
        if !self.paths.is_protected(request.uri().path()) {
            return next.run(request).await;
        }

        // Body is not Sync, so only the parts may be borrowed across the call.
        let (parts, body) = request.into_parts();
        if !self.validator.is_valid(&parts.headers).await {
            tracing::info!(path = %parts.uri.path(), "Rejected request with invalid token");
            metrics::record_auth_rejection();
            return GatewayError::AuthRejected.into_response();
        }
        next.run(Request::from_parts(parts, body)).await
    }
}
