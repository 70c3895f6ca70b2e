//! Load monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! every request → LoadMonitor::record_request (atomic increment)
//! every interval → sample (swap counter to 0) → LoadAlert if count ≥ threshold
//!     → mpsc channel → alert sink task (warn log + metric)
//! ```
//!
//! # Design Decisions
//! - The counter is owned by the monitor; nothing else touches it
//! - Sampling runs on its own task and never waits on request handling
//! - Alert policy is decoupled from alert transport by the channel

pub mod alert;
pub mod load;

pub use alert::{spawn_alert_logger, LoadAlert};
pub use load::LoadMonitor;
