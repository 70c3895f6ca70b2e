//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client window counter in the cache store)
//!     → protected.rs (is this path guarded at all?)
//!     → token.rs (ask the auth service whether the bearer token is valid)
//!     → Pass to caching and dispatch
//! ```
//!
//! # Design Decisions
//! - Fail closed: store errors and auth transport errors both deny
//! - Guards only answer yes/no; the HTTP middleware decides the response

pub mod protected;
pub mod rate_limit;
pub mod token;

pub use protected::ProtectedPaths;
pub use rate_limit::RateLimiter;
pub use token::{RemoteTokenValidator, TokenValidator, TokenValidatorError};
