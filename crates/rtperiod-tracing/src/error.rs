//! Tracing error types

use std::path::PathBuf;

/// Tracing errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// The kernel trace sink could not be opened
    #[error("trace sink {} unavailable: {source}", .path.display())]
    SinkUnavailable {
        /// Path that was tried
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Platform has no kernel trace sink
    #[error("platform has no kernel trace sink")]
    PlatformNotSupported,

    /// Event emission failed
    #[error("trace event emission failed: {0}")]
    EmissionFailed(String),
}

impl TracingError {
    /// Check if the run can carry on with tracing suppressed.
    ///
    /// Every tracing failure is recoverable from the harness' point of view;
    /// the distinction only matters for emission failures, which may succeed
    /// on the next event.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TracingError::SinkUnavailable { .. } => false,
            TracingError::PlatformNotSupported => false,
            TracingError::EmissionFailed(_) => true,
        }
    }

    /// Check if this error means the sink is missing rather than misbehaving
    pub fn is_sink_missing(&self) -> bool {
        matches!(
            self,
            TracingError::SinkUnavailable { .. } | TracingError::PlatformNotSupported
        )
    }

    /// Create a sink-unavailable error for `path`
    pub fn sink_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TracingError::SinkUnavailable {
            path: path.into(),
            source,
        }
    }
}
