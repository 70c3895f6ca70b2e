//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (ordered prefix rule lookup)
//!     → matcher.rs (evaluate prefix conditions)
//!     → Return: pool key (matched rule or default pool)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always resolves to the same pool

pub mod matcher;
pub mod router;

pub use matcher::{AnyPrefixMatcher, Matcher, PathPrefixMatcher};
pub use router::{Route, Router};
