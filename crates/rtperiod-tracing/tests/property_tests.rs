//! Property-based tests for rtperiod-tracing

use quickcheck_macros::quickcheck;
use rtperiod_tracing::{EventCategory, MARKER_LINE_LEN, TraceEvent};

fn marker(event: TraceEvent) -> Vec<u8> {
    let mut out = Vec::new();
    if event.write_marker(&mut out).is_err() {
        out.clear();
    }
    out
}

#[quickcheck]
fn marker_lines_are_single_line_and_fit(task: u32, iteration: u64, lateness_us: u64) -> bool {
    let line = marker(TraceEvent::DeadlineMiss {
        task,
        iteration,
        lateness_us,
    });
    !line.contains(&b'\n') && line.starts_with(b"rtperiod_") && line.len() < MARKER_LINE_LEN
}

#[quickcheck]
fn terminated_marker_fits_for_any_values(task: u32, response_us: u64, deadline_us: i64) -> bool {
    let line = marker(TraceEvent::TaskTerminated {
        task,
        response_us,
        deadline_us,
    });
    !line.is_empty() && line.len() < MARKER_LINE_LEN
}

#[quickcheck]
fn task_accessor_matches_payload(task: u32, slice: u32) -> bool {
    let event = TraceEvent::RoundRobinSlice { task, slice };
    event.task() == task && event.category() == EventCategory::Timing && !event.is_error()
}
