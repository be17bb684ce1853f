//! Cooperative cancellation shared by all task loops of a run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Run-wide stop flag.
///
/// Clones share the flag. Task loops check it once per iteration, at the
/// loop top; the harness sets it when the run duration elapses and a task
/// sets it on a fatal deadline miss.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every loop sharing this token to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the run has been cancelled
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
