//! Terminal proxy handler.
//!
//! # Responsibilities
//! - Resolve the pool for a path and pick a backend from it
//! - Forward method, headers and a fully buffered body
//! - Relay the upstream status, headers and body
//! - Write successful bodies back to the response cache
//!
//! # Design Decisions
//! - The body is buffered so the outbound request carries an exact
//!   `Content-Length` instead of chunked encoding
//! - No retries: one upstream failure is one client-visible failure

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::cache::{cache_key, ResponseCache};
use crate::http::middleware::Handler;
use crate::http::request::request_id;
use crate::http::response::GatewayError;
use crate::load_balancer::BackendManager;
use crate::observability::metrics;
use crate::routing::Router;

/// Connection-scoped headers that must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::HOST,
    header::CONTENT_LENGTH,
    header::TRANSFER_ENCODING,
    header::TE,
    header::TRAILER,
    header::UPGRADE,
    header::PROXY_AUTHORIZATION,
];

pub type HttpClient = Client<HttpConnector, Body>;

pub fn http_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

pub struct Dispatcher {
    router: Router,
    backends: Arc<BackendManager>,
    client: HttpClient,
    cache: ResponseCache,
    upstream_timeout: Duration,
    max_body_size: usize,
}

impl Dispatcher {
    pub fn new(
        router: Router,
        backends: Arc<BackendManager>,
        cache: ResponseCache,
        upstream_timeout: Duration,
        max_body_size: usize,
    ) -> Self {
        Self {
            router,
            backends,
            client: http_client(),
            cache,
            upstream_timeout,
            max_body_size,
        }
    }

    async fn forward(&self, request: Request<Body>) -> Result<Response, GatewayError> {
        let (parts, body) = request.into_parts();
        let request_id = request_id(&parts.headers).to_string();

        let pool = self.router.resolve(parts.uri.path());
        let backend = self.backends.select_backend(pool)?;
        let key = cache_key(&parts.uri);

        let body = axum::body::to_bytes(body, self.max_body_size)
            .await
            .map_err(|e| GatewayError::InvalidRequestBody(e.to_string()))?;

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let uri = backend
            .upstream_uri(path_and_query)
            .map_err(|e| GatewayError::UpstreamUnavailable {
                backend: backend.to_string(),
                reason: e.to_string(),
            })?;

        let mut outbound = Request::builder()
            .method(parts.method.clone())
            .uri(uri)
            .body(Body::from(body.clone()))
            .map_err(|e| GatewayError::UpstreamUnavailable {
                backend: backend.to_string(),
                reason: e.to_string(),
            })?;
        copy_end_to_end(&parts.headers, outbound.headers_mut());
        outbound
            .headers_mut()
            .insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));

        tracing::debug!(
            request_id = %request_id,
            method = %parts.method,
            pool = %pool,
            backend = %backend,
            body_len = body.len(),
            "Forwarding request"
        );

        // One deadline covers both the response head and the body.
        let deadline = tokio::time::Instant::now() + self.upstream_timeout;
        let upstream = match tokio::time::timeout_at(deadline, self.client.request(outbound)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(GatewayError::UpstreamUnavailable {
                    backend: backend.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(GatewayError::UpstreamUnavailable {
                    backend: backend.to_string(),
                    reason: format!("no response within {:?}", self.upstream_timeout),
                })
            }
        };

        let (upstream_parts, upstream_body) = upstream.into_parts();
        let bytes: Bytes = match tokio::time::timeout_at(
            deadline,
            axum::body::to_bytes(Body::new(upstream_body), usize::MAX),
        )
        .await
        {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => return Err(GatewayError::UpstreamRelay(e.to_string())),
            Err(_) => {
                return Err(GatewayError::UpstreamRelay(format!(
                    "body from {backend} not complete within {:?}",
                    self.upstream_timeout
                )))
            }
        };

        let status = upstream_parts.status;
        metrics::record_upstream_response(pool, status.as_u16());
        tracing::debug!(request_id = %request_id, backend = %backend, status = status.as_u16(), "Upstream responded");

        if status.is_success() {
            match std::str::from_utf8(&bytes) {
                Ok(text) => self.cache.store(&key, text).await,
                Err(_) => tracing::debug!(key = %key, "Skipping cache for non-UTF-8 body"),
            }
        }

        let mut response = Response::new(Body::from(bytes));
        *response.status_mut() = status;
        copy_end_to_end(&upstream_parts.headers, response.headers_mut());
        Ok(response)
    }
}

fn copy_end_to_end(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if !HOP_BY_HOP.contains(name) {
            to.append(name.clone(), value.clone());
        }
    }
}

#[async_trait]
impl Handler for Dispatcher {
    async fn call(&self, request: Request<Body>) -> Response {
        match self.forward(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Proxy request failed");
                e.into_response()
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("upstream_timeout", &self.upstream_timeout)
            .finish_non_exhaustive()
    }
}
