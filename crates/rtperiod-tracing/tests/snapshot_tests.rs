//! Snapshot tests for trace event formats

use rtperiod_tracing::TraceEvent;

fn marker(event: TraceEvent) -> String {
    let mut out = Vec::new();
    match event.write_marker(&mut out) {
        Ok(()) => String::from_utf8_lossy(&out).into_owned(),
        Err(e) => format!("<write failed: {e}>"),
    }
}

#[test]
fn test_task_start_display_snapshot() {
    let event = TraceEvent::TaskStart {
        task: 1,
        policy: "FIFO",
        priority: 95,
    };
    insta::assert_snapshot!(event.to_string(), @"TaskStart(task=1, policy=FIFO, priority=95)");
}

#[test]
fn test_deadline_miss_display_snapshot() {
    let event = TraceEvent::DeadlineMiss {
        task: 2,
        iteration: 17,
        lateness_us: 4_250,
    };
    insta::assert_snapshot!(event.to_string(), @"DeadlineMiss(task=2, iter=17, late=4250us)");
}

#[test]
fn test_terminated_display_snapshot() {
    let event = TraceEvent::TaskTerminated {
        task: 0,
        response_us: 5_012,
        deadline_us: 1_700_000_010_000,
    };
    insta::assert_snapshot!(
        event.to_string(),
        @"TaskTerminated(task=0, response=5012us, deadline=1700000010000us)"
    );
}

#[test]
fn test_rr_slice_marker_snapshot() {
    let event = TraceEvent::RoundRobinSlice { task: 3, slice: 4 };
    insta::assert_snapshot!(marker(event), @"rtperiod_rr_slice task=3 slice=4");
}

#[test]
fn test_spawned_marker_snapshot() {
    insta::assert_snapshot!(
        marker(TraceEvent::TaskSpawned { task: 7 }),
        @"rtperiod_spawned task=7"
    );
}
