//! Tracing macros for the task-loop hot path

/// Emit a wake event
///
/// ```rust,ignore
/// use rtperiod_tracing::{TracingManager, trace_wake};
///
/// let manager = TracingManager::new();
/// trace_wake!(manager, 0, 1);
/// ```
#[macro_export]
macro_rules! trace_wake {
    ($tracer:expr, $task:expr, $iteration:expr) => {
        $tracer.emit($crate::TraceEvent::Wake {
            task: $task,
            iteration: $iteration,
        });
    };
}

/// Emit a deadline-miss event
///
/// ```rust,ignore
/// use rtperiod_tracing::{TracingManager, trace_deadline_miss};
///
/// let manager = TracingManager::new();
/// trace_deadline_miss!(manager, 0, 4, 2_500);
/// ```
#[macro_export]
macro_rules! trace_deadline_miss {
    ($tracer:expr, $task:expr, $iteration:expr, $lateness_us:expr) => {
        $tracer.emit($crate::TraceEvent::DeadlineMiss {
            task: $task,
            iteration: $iteration,
            lateness_us: $lateness_us,
        });
    };
}

/// Emit an event only when a sink is actually listening
///
/// Skips building the event when tracing is off, which matters inside the
/// busy loop of the workload.
///
/// ```rust,ignore
/// use rtperiod_tracing::{TracingManager, TraceEvent, trace_if_enabled};
///
/// let manager = TracingManager::new();
/// trace_if_enabled!(manager, TraceEvent::RoundRobinSlice { task: 0, slice: 1 });
/// ```
#[macro_export]
macro_rules! trace_if_enabled {
    ($tracer:expr, $event:expr) => {
        if $tracer.is_enabled() {
            $tracer.emit($event);
        }
    };
}
