//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → pool key identified
//!     → pool.rs (look up the service pool)
//!     → round_robin.rs (advance the pool's rotation cursor)
//!     → backend.rs (base URL for the upstream request)
//!     → Return backend or ConfigurationError
//! ```
//!
//! # Design Decisions
//! - Pool membership is fixed at startup; only the cursor mutates
//! - One atomic cursor per pool, never reset while the process runs
//! - Unknown pool keys are configuration errors, not silent defaults

use std::sync::Arc;

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::Backend;
pub use pool::{BackendManager, ConfigurationError, ServicePool};
pub use round_robin::RoundRobin;

/// Strategy for picking a backend out of a pool.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the next backend, or `None` for an empty slice.
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}
