//! Tracing provider trait definition

use std::path::Path;

use crate::{TraceEvent, TracingError, TracingMetrics};

/// Trace sink trait
///
/// # RT-Safety Requirements
///
/// [`emit`](TracingProvider::emit) is called from task loops between the
/// wake-up and the workload. It must not allocate, must not block, and must
/// not fail loudly: a sink that cannot write simply counts the loss.
///
/// # Thread Safety
///
/// Every task thread shares one provider, so implementations must be
/// `Send + Sync`.
pub trait TracingProvider: Send + Sync {
    /// Open the sink.
    ///
    /// Called once before any task starts; may perform I/O.
    ///
    /// # Errors
    ///
    /// Returns [`TracingError::SinkUnavailable`] when the sink cannot be
    /// opened. The provider stays usable and drops every event.
    fn initialize(&mut self) -> Result<(), TracingError>;

    /// Emit one event (RT-safe, see trait documentation)
    fn emit(&self, event: TraceEvent);

    /// Get current tracing metrics
    fn metrics(&self) -> TracingMetrics;

    /// Check if the provider is actually writing events
    fn is_enabled(&self) -> bool {
        true
    }

    /// Close the sink. Called after all task threads were joined.
    fn shutdown(&mut self);
}

/// Create the default provider for this platform
///
/// - Linux: `TraceMarkerProvider` on [`crate::DEFAULT_TRACE_MARKER_PATH`]
/// - Other: `FallbackProvider`
pub fn create_platform_provider() -> Box<dyn TracingProvider> {
    create_provider_for_path(Path::new(crate::DEFAULT_TRACE_MARKER_PATH))
}

/// Create a provider writing to an explicit marker path
///
/// On platforms without ftrace the path is ignored and the logging fallback
/// is used.
pub fn create_provider_for_path(path: &Path) -> Box<dyn TracingProvider> {
    #[cfg(target_os = "linux")]
    {
        Box::new(crate::platform::TraceMarkerProvider::new(path))
    }

    #[cfg(not(target_os = "linux"))]
    {
        tracing::debug!(path = %path.display(), "no trace_marker on this platform");
        Box::new(crate::platform::FallbackProvider::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_platform_provider() {
        let provider = create_platform_provider();
        assert_eq!(provider.metrics().events_emitted, 0);
    }
}
