//! Request-time errors and their HTTP rendering.
//!
//! Every failure a client can see is a well-formed response with a JSON
//! body of the form `{"error": "<message>"}`.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::load_balancer::ConfigurationError;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("upstream {backend} unavailable: {reason}")]
    UpstreamUnavailable { backend: String, reason: String },

    #[error("failed to relay upstream response: {0}")]
    UpstreamRelay(String),

    #[error("The provided token was invalid.")]
    AuthRejected,

    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: u64 },

    #[error("failed to read request body: {0}")]
    InvalidRequestBody(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::UpstreamUnavailable { .. } => StatusCode::NOT_FOUND,
            GatewayError::UpstreamRelay(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::AuthRejected => StatusCode::BAD_REQUEST,
            GatewayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(json!({ "error": self.to_string() }))).into_response();
        if let GatewayError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn auth_rejection_is_400_with_fixed_message() {
        let response = GatewayError::AuthRejected.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "The provided token was invalid." })
        );
    }

    #[tokio::test]
    async fn upstream_failure_is_404() {
        let response = GatewayError::UpstreamUnavailable {
            backend: "http://session-service-1:8001".into(),
            reason: "connection refused".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("session-service-1"));
    }

    #[test]
    fn rate_limited_carries_retry_after() {
        let response = GatewayError::RateLimited { retry_after_secs: 60 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "60");
    }

    #[test]
    fn configuration_error_is_500() {
        let err: GatewayError = ConfigurationError::UnknownPool("billing".into()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            GatewayError::UpstreamRelay("eof".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
