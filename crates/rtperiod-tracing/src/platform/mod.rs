//! Platform-specific trace providers

mod fallback;

#[cfg(target_os = "linux")]
mod linux;

pub use fallback::FallbackProvider;

#[cfg(target_os = "linux")]
pub use linux::TraceMarkerProvider;
