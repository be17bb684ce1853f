//! ftrace `trace_marker` provider

use crate::{MARKER_LINE_LEN, TraceEvent, TracingError, TracingMetrics, TracingProvider};
use std::fs::File;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Appends one line per event to the ftrace marker file.
///
/// # RT Safety
///
/// - Lines are formatted into a stack buffer of [`MARKER_LINE_LEN`] bytes
/// - `try_lock` keeps a task thread from blocking on another task's write;
///   a contended write is dropped and counted
///
/// # Permissions
///
/// Writing `/sys/kernel/debug/tracing/trace_marker` usually requires root.
/// Without it [`initialize`](TracingProvider::initialize) reports
/// [`TracingError::SinkUnavailable`] and the provider stays silent.
pub struct TraceMarkerProvider {
    path: PathBuf,
    trace_file: Option<Mutex<File>>,
    events_count: AtomicU64,
    events_dropped: AtomicU64,
    deadline_misses: AtomicU64,
    write_failures: AtomicU64,
}

impl TraceMarkerProvider {
    /// Create a provider for `path`; nothing is opened until `initialize`
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            trace_file: None,
            events_count: AtomicU64::new(0),
            events_dropped: AtomicU64::new(0),
            deadline_misses: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        }
    }

    /// Path this provider writes to
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn format_event(event: TraceEvent, buf: &mut [u8; MARKER_LINE_LEN]) -> usize {
        let body_len = MARKER_LINE_LEN.saturating_sub(1);
        let len = match buf.get_mut(..body_len) {
            Some(body) => {
                let mut cursor = Cursor::new(body);
                // A truncated line is still worth writing.
                if event.write_marker(&mut cursor).is_err() {
                    tracing::trace!(event = event.event_type(), "trace marker line truncated");
                }
                usize::try_from(cursor.position()).unwrap_or(body_len)
            }
            None => 0,
        };
        if let Some(slot) = buf.get_mut(len) {
            *slot = b'\n';
        }
        len.saturating_add(1)
    }

    fn write_line(&self, file: &mut File, event: TraceEvent) {
        let mut buf = [0u8; MARKER_LINE_LEN];
        let len = Self::format_event(event, &mut buf);
        let line = buf.get(..len).unwrap_or(buf.as_slice());
        if file.write_all(line).is_ok() {
            self.events_count.fetch_add(1, Ordering::Relaxed);
        } else {
            self.write_failures.fetch_add(1, Ordering::Relaxed);
        }
    }
}

impl TracingProvider for TraceMarkerProvider {
    fn initialize(&mut self) -> Result<(), TracingError> {
        match File::options().append(true).open(&self.path) {
            Ok(file) => {
                self.trace_file = Some(Mutex::new(file));
                tracing::info!(path = %self.path.display(), "trace_marker opened");
                Ok(())
            }
            Err(e) => {
                self.trace_file = None;
                Err(TracingError::sink_unavailable(&self.path, e))
            }
        }
    }

    fn emit(&self, event: TraceEvent) {
        if event.is_error() {
            self.deadline_misses.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(ref mutex) = self.trace_file {
            match mutex.try_lock() {
                Ok(mut file) => self.write_line(&mut file, event),
                Err(_) => {
                    self.events_dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    fn metrics(&self) -> TracingMetrics {
        TracingMetrics {
            events_emitted: self.events_count.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            deadline_misses: self.deadline_misses.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }

    fn is_enabled(&self) -> bool {
        self.trace_file.is_some()
    }

    fn shutdown(&mut self) {
        if let Some(file) = self.trace_file.take() {
            match file.into_inner() {
                Ok(mut f) => {
                    if let Err(e) = f.flush() {
                        tracing::warn!(error = %e, "trace_marker flush failed");
                    }
                }
                Err(_) => tracing::warn!("trace_marker lock poisoned at shutdown"),
            }
        }
        tracing::info!(metrics = %self.metrics(), "trace_marker provider shutdown");
    }
}

impl core::fmt::Debug for TraceMarkerProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TraceMarkerProvider")
            .field("path", &self.path)
            .field("open", &self.trace_file.is_some())
            .field("events_count", &self.events_count.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sink_is_reported_and_silent() {
        let mut provider = TraceMarkerProvider::new(Path::new("/nonexistent/rtperiod/trace_marker"));

        let result = provider.initialize();
        assert!(matches!(result, Err(TracingError::SinkUnavailable { .. })));
        assert!(!provider.is_enabled());

        provider.emit(TraceEvent::TaskSpawned { task: 0 });
        assert_eq!(provider.metrics().events_emitted, 0);

        provider.shutdown();
    }

    #[test]
    fn test_format_event_appends_newline() {
        let mut buf = [0u8; MARKER_LINE_LEN];
        let len = TraceMarkerProvider::format_event(TraceEvent::TaskSpawned { task: 3 }, &mut buf);
        let line = buf.get(..len).unwrap_or_default();
        assert_eq!(line, b"rtperiod_spawned task=3\n");
    }
}
