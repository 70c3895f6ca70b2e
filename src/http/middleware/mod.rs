//! Request pipeline: an ordered middleware stack around a terminal handler.
//!
//! # Data Flow
//! ```text
//! chain(H, [M1, M2, ..., Mn])
//!     → M1.handle(req, next) → next.run → M2.handle ... → Mn.handle → H.call
//! ```
//!
//! # Design Decisions
//! - The first middleware in the list is the outermost
//! - A middleware short-circuits by returning without calling `next.run`
//! - The stack is shared (`Arc<[_]>`) and never mutated after construction

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;

pub mod auth;
pub mod cache;
pub mod load;
pub mod logging;
pub mod rate_limit;

pub use auth::TokenValidation;
pub use cache::CacheLookup;
pub use load::LoadCounting;
pub use logging::RequestLogging;
pub use rate_limit::RateLimiting;

/// Something that turns a request into a response.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, request: Request<Body>) -> Response;
}

/// One stage of the pipeline.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: Request<Body>, next: Next) -> Response;
}

/// The remainder of the pipeline after the current middleware.
#[derive(Clone)]
pub struct Next {
    stack: Arc<[Arc<dyn Middleware>]>,
    position: usize,
    handler: Arc<dyn Handler>,
}

impl Next {
    /// Hand the request to the next stage, or to the terminal handler when
    /// the stack is exhausted.
    pub async fn run(mut self, request: Request<Body>) -> Response {
        match self.stack.get(self.position).cloned() {
            Some(middleware) => {
                self.position += 1;
                middleware.handle(request, self).await
            }
            None => self.handler.call(request).await,
        }
    }
}

/// A composed pipeline. Itself a [`Handler`].
#[derive(Clone)]
pub struct Chain {
    stack: Arc<[Arc<dyn Middleware>]>,
    handler: Arc<dyn Handler>,
}

impl Chain {
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Wrap `handler` so that `middlewares[0]` runs first and `handler` last.
pub fn chain(handler: Arc<dyn Handler>, middlewares: Vec<Arc<dyn Middleware>>) -> Chain {
    Chain {
        stack: middlewares.into(),
        handler,
    }
}

#[async_trait]
impl Handler for Chain {
    async fn call(&self, request: Request<Body>) -> Response {
        Next {
            stack: Arc::clone(&self.stack),
            position: 0,
            handler: Arc::clone(&self.handler),
        }
        .run(request)
        .await
    }
}
