//! Request inspection helpers.
//!
//! # Design Decisions
//! - Request IDs are assigned by the tower-http layer before the pipeline runs
//! - Client identity trusts the first `x-forwarded-for` hop, since the gateway
//!   sits behind at most one trusted proxy

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderName, Request};

pub const X_REQUEST_ID: &str = "x-request-id";

static X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
static X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// The request ID header, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Identity used for per-client accounting.
///
/// First `x-forwarded-for` hop, else `x-real-ip`, else the peer IP, else
/// `"unknown"`.
pub fn client_identity(request: &Request<Body>) -> String {
    let header = |name: &HeaderName| {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    header(&X_FORWARDED_FOR)
        .or_else(|| header(&X_REAL_IP))
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
