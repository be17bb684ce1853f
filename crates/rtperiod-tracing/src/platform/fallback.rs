//! Logging-only provider

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{TraceEvent, TracingError, TracingMetrics, TracingProvider};

/// Provider for hosts without a kernel trace sink
///
/// Only deadline misses are logged, through `tracing`; every other event is
/// dropped so the task loops pay nothing for it.
pub struct FallbackProvider {
    deadline_misses: AtomicU64,
}

impl Default for FallbackProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackProvider {
    /// Create a new fallback provider
    pub fn new() -> Self {
        Self {
            deadline_misses: AtomicU64::new(0),
        }
    }
}

impl TracingProvider for FallbackProvider {
    fn initialize(&mut self) -> Result<(), TracingError> {
        tracing::info!("Using fallback tracing provider (structured logging only)");
        Ok(())
    }

    fn emit(&self, event: TraceEvent) {
        if let TraceEvent::DeadlineMiss {
            task,
            iteration,
            lateness_us,
        } = event
        {
            self.deadline_misses.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(task, iteration, lateness_us, "deadline miss");
        }
    }

    fn metrics(&self) -> TracingMetrics {
        TracingMetrics {
            deadline_misses: self.deadline_misses.load(Ordering::Relaxed),
            ..Default::default()
        }
    }

    fn shutdown(&mut self) {
        tracing::debug!("Fallback tracing provider shutdown");
    }
}

impl core::fmt::Debug for FallbackProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FallbackProvider")
            .field(
                "deadline_misses",
                &self.deadline_misses.load(Ordering::Relaxed),
            )
            .finish()
    }
}
