//! Tracing manager shared by all task threads

use std::path::Path;

use crate::{
    TraceEvent, TracingError, TracingMetrics, TracingProvider,
    provider::{create_platform_provider, create_provider_for_path},
};

/// Coordinates trace emission through one provider.
///
/// The harness hands `&TracingManager` to every task thread; the manager is
/// `Sync` because providers are.
///
/// ```rust,ignore
/// use rtperiod_tracing::{TracingManager, TraceEvent};
///
/// let mut manager = TracingManager::new();
/// manager.initialize().ok();
/// manager.emit(TraceEvent::TaskSpawned { task: 0 });
/// manager.shutdown();
/// ```
pub struct TracingManager {
    provider: Box<dyn TracingProvider>,
    enabled: bool,
}

impl TracingManager {
    /// Create a manager with the platform's default provider
    pub fn new() -> Self {
        Self::with_provider(create_platform_provider())
    }

    /// Create a manager writing marker lines to `path`
    pub fn with_marker_path(path: &Path) -> Self {
        Self::with_provider(create_provider_for_path(path))
    }

    /// Create a manager with a custom provider
    ///
    /// Use this for testing or custom sinks.
    pub fn with_provider(provider: Box<dyn TracingProvider>) -> Self {
        Self {
            provider,
            enabled: true,
        }
    }

    /// Create a manager that drops every event
    pub fn disabled() -> Self {
        Self {
            provider: Box::new(crate::platform::FallbackProvider::new()),
            enabled: false,
        }
    }

    /// Open the underlying sink
    ///
    /// # Errors
    ///
    /// Returns the provider's error. Callers treat it as non-fatal: the
    /// manager keeps working and emission becomes a no-op.
    pub fn initialize(&mut self) -> Result<(), TracingError> {
        self.provider.initialize()
    }

    /// Enable or disable tracing
    ///
    /// When disabled, events are silently dropped.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if events will reach a sink
    pub fn is_enabled(&self) -> bool {
        self.enabled && self.provider.is_enabled()
    }

    /// Emit an event
    #[inline]
    pub fn emit(&self, event: TraceEvent) {
        if self.enabled {
            self.provider.emit(event);
        }
    }

    /// Get current tracing metrics
    pub fn metrics(&self) -> TracingMetrics {
        self.provider.metrics()
    }

    /// Close the sink
    pub fn shutdown(&mut self) {
        self.provider.shutdown();
    }
}

impl core::fmt::Debug for TracingManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TracingManager")
            .field("enabled", &self.enabled)
            .field(
                "provider_type",
                &core::any::type_name_of_val(&*self.provider),
            )
            .finish()
    }
}

impl Default for TracingManager {
    fn default() -> Self {
        Self::new()
    }
}
