//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::{backend::Backend, LoadBalancer};

/// Round-robin selector.
/// Stores an internal rotation cursor shared by every caller of the pool.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next rotation index for a pool of `len` backends.
    ///
    /// A single `fetch_add` both reads and advances the cursor, so concurrent
    /// callers never observe the same position within a cycle.
    pub fn next_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.cursor.fetch_add(1, Ordering::Relaxed) % len)
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let index = self.next_index(backends.len())?;
        Some(Arc::clone(&backends[index]))
    }
}
