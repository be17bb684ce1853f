//! Integration tests for rtperiod-tracing

use rtperiod_tracing::{
    TraceEvent, TracingError, TracingManager, TracingMetrics, TracingProvider, trace_deadline_miss,
    trace_if_enabled, trace_wake,
};
use std::sync::{Arc, Mutex};

struct MockProvider {
    events: Arc<Mutex<Vec<TraceEvent>>>,
    initialized: bool,
}

impl MockProvider {
    fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            initialized: false,
        }
    }
}

impl TracingProvider for MockProvider {
    fn initialize(&mut self) -> Result<(), TracingError> {
        self.initialized = true;
        Ok(())
    }

    fn emit(&self, event: TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn metrics(&self) -> TracingMetrics {
        TracingMetrics::default()
    }

    fn is_enabled(&self) -> bool {
        self.initialized
    }

    fn shutdown(&mut self) {
        self.initialized = false;
    }
}

#[test]
fn test_macros_route_through_manager() -> Result<(), TracingError> {
    let provider = MockProvider::new();
    let events = provider.events.clone();

    let mut manager = TracingManager::with_provider(Box::new(provider));
    manager.initialize()?;

    trace_wake!(manager, 0, 1);
    trace_deadline_miss!(manager, 1, 4, 2_500);
    trace_if_enabled!(manager, TraceEvent::RoundRobinSlice { task: 2, slice: 1 });

    let guard = events.lock().map_err(|e| TracingError::EmissionFailed(e.to_string()))?;
    assert_eq!(guard.len(), 3);
    assert_eq!(
        guard.first(),
        Some(&TraceEvent::Wake {
            task: 0,
            iteration: 1
        })
    );
    assert!(guard.get(1).is_some_and(TraceEvent::is_error));
    drop(guard);

    manager.shutdown();
    Ok(())
}

#[test]
fn test_trace_if_enabled_skips_uninitialized_provider() {
    let provider = MockProvider::new();
    let events = provider.events.clone();
    let manager = TracingManager::with_provider(Box::new(provider));

    trace_if_enabled!(manager, TraceEvent::TaskSpawned { task: 0 });

    assert_eq!(events.lock().map(|e| e.len()).unwrap_or(usize::MAX), 0);
}

#[test]
fn test_manager_shared_across_threads() {
    let provider = MockProvider::new();
    let events = provider.events.clone();
    let manager = TracingManager::with_provider(Box::new(provider));

    std::thread::scope(|scope| {
        for task in 0..4u32 {
            let manager = &manager;
            scope.spawn(move || {
                for iteration in 1..=10 {
                    trace_wake!(manager, task, iteration);
                }
            });
        }
    });

    assert_eq!(events.lock().map(|e| e.len()).unwrap_or(0), 40);
}

#[cfg(target_os = "linux")]
mod trace_marker {
    use super::*;
    use rtperiod_tracing::platform::TraceMarkerProvider;
    use std::io::Read;

    #[test]
    fn test_marker_file_receives_one_line_per_event() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = tempfile::NamedTempFile::new()?;

        let mut manager =
            TracingManager::with_provider(Box::new(TraceMarkerProvider::new(file.path())));
        manager.initialize()?;
        assert!(manager.is_enabled());

        manager.emit(TraceEvent::TaskStart {
            task: 0,
            policy: "RR",
            priority: 50,
        });
        trace_wake!(manager, 0, 1);
        trace_deadline_miss!(manager, 0, 2, 1_200);
        manager.emit(TraceEvent::TaskTerminated {
            task: 0,
            response_us: 5_050,
            deadline_us: 20_000,
        });

        let metrics = manager.metrics();
        assert_eq!(metrics.events_emitted, 4);
        assert_eq!(metrics.deadline_misses, 1);
        manager.shutdown();

        let mut contents = String::new();
        file.as_file_mut().read_to_string(&mut contents)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines,
            [
                "rtperiod_task_start task=0 policy=RR priority=50",
                "rtperiod_wake task=0 iter=1",
                "rtperiod_deadline_miss task=0 iter=2 late_us=1200",
                "rtperiod_task_terminated task=0 response_us=5050 deadline_us=20000",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_unavailable_marker_keeps_run_silent() {
        let dir = match tempfile::tempdir() {
            Ok(dir) => dir,
            Err(e) => panic!("tempdir: {e}"),
        };
        let missing = dir.path().join("no-such-dir").join("trace_marker");

        let mut manager = TracingManager::with_marker_path(&missing);
        let err = manager.initialize();
        assert!(err.as_ref().is_err_and(TracingError::is_sink_missing));
        assert!(!manager.is_enabled());

        trace_wake!(manager, 0, 1);
        assert_eq!(manager.metrics().events_emitted, 0);
    }
}
