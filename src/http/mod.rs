//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, tower-http layers, request ID)
//!     → middleware/ (logging → load → [rate limit] → [auth] → cache lookup)
//!     → handlers.rs (/version, /health) or dispatcher.rs (everything else)
//!     → response.rs (GatewayError → structured JSON error)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::GatewayError;
pub use server::{AppState, GatewayServer, Services};
