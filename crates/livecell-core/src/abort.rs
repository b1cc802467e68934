//! Cooperative cancellation token for evaluation jobs.
//!
//! Rust has no safe equivalent of an asynchronous `killThread`. The DAG
//! evaluator instead hands each job a cloneable `AbortHandle` it is expected
//! to poll at its own suspension points, and additionally aborts the job's
//! `tokio` task on invalidation so ordinary `.await` points are preempted
//! even if the evaluation function never polls the handle itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Thread-safe, cloneable cancellation flag.
#[derive(Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self {
            aborted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Relaxed)
    }

    /// Request cancellation. Safe to call from any clone.
    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let handle = AbortHandle::new();
        let clone = handle.clone();
        assert!(!handle.is_aborted());
        clone.abort();
        assert!(handle.is_aborted());
    }
}
