//! Edge gateway library.

pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod monitor;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
