//! Fallback platform implementation for non-Linux systems.
//!
//! Clocks come from the standard library; scheduling classes other than the
//! default and CPU pinning are reported as unsupported.

use std::io;
use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::clock::ClockId;
use crate::error::{HarnessError, HarnessResult};
use crate::policy::{Affinity, SchedPolicy, TaskId};
use crate::rt_setup::{ObservedSchedule, ThreadAttributes};
use crate::time::{TimeError, Timespec};

fn monotonic_anchor() -> Instant {
    static ANCHOR: OnceLock<Instant> = OnceLock::new();
    *ANCHOR.get_or_init(Instant::now)
}

fn from_duration(d: std::time::Duration) -> Result<Timespec, TimeError> {
    let sec = i64::try_from(d.as_secs()).ok().ok_or(TimeError::Overflow)?;
    Timespec::new(sec, i64::from(d.subsec_nanos()))
}

/// Read `clock` from the standard library.
///
/// There is no per-thread CPU clock here; `ThreadCpuTime` reads the
/// monotonic clock, so preemption counts against workload budgets.
pub(crate) fn clock_now(clock: ClockId) -> HarnessResult<Timespec> {
    let since = match clock {
        ClockId::Realtime => SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| HarnessError::ClockRead {
                clock,
                source: io::Error::other(e),
            })?,
        ClockId::Monotonic | ClockId::ThreadCpuTime => monotonic_anchor().elapsed(),
    };
    from_duration(since).map_err(HarnessError::from)
}

/// Relative sleep to an absolute deadline.
pub(crate) fn sleep_until(clock: ClockId, deadline: Timespec) -> HarnessResult {
    let now = clock_now(clock)?;
    if deadline > now {
        let ns = Timespec::elapsed_nanos(now, deadline)?;
        std::thread::sleep(std::time::Duration::from_nanos(ns));
    }
    Ok(())
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{what} is not supported on this platform"),
    )
}

pub(crate) fn pin_current_thread(_cpu: usize) -> io::Result<()> {
    Err(unsupported("cpu pinning"))
}

/// Only the default class without pinning can be honoured.
pub(crate) fn apply_thread_attributes(task: TaskId, attrs: &ThreadAttributes) -> HarnessResult {
    if let Affinity::Core(_) = attrs.affinity {
        return Err(HarnessError::attribute(task, "affinity", unsupported("cpu pinning")));
    }
    if attrs.policy != SchedPolicy::Other {
        return Err(HarnessError::attribute(
            task,
            "scheduling policy",
            unsupported("real-time scheduling"),
        ));
    }
    Ok(())
}

pub(crate) fn observe_current_thread() -> io::Result<ObservedSchedule> {
    Ok(ObservedSchedule {
        policy: Some(SchedPolicy::Other),
        priority: 0,
        cpu: None,
    })
}

pub(crate) fn lock_memory() -> io::Result<()> {
    Err(unsupported("memory locking"))
}
