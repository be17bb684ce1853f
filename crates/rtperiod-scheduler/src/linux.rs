//! Linux-specific platform implementation.

use std::io;

use libc::{
    CLOCK_MONOTONIC, CLOCK_REALTIME, CLOCK_THREAD_CPUTIME_ID, EINTR, MCL_CURRENT, MCL_FUTURE,
    TIMER_ABSTIME, clockid_t, cpu_set_t, sched_param, timespec,
};

use crate::clock::ClockId;
use crate::error::{HarnessError, HarnessResult};
use crate::policy::{Affinity, SchedPolicy, TaskId};
use crate::rt_setup::{ObservedSchedule, ThreadAttributes};
use crate::time::{TimeError, Timespec};

fn raw_clock(clock: ClockId) -> clockid_t {
    match clock {
        ClockId::Realtime => CLOCK_REALTIME,
        ClockId::Monotonic => CLOCK_MONOTONIC,
        ClockId::ThreadCpuTime => CLOCK_THREAD_CPUTIME_ID,
    }
}

fn to_timespec(ts: Timespec) -> Result<timespec, TimeError> {
    Ok(timespec {
        tv_sec: ts.sec().try_into().ok().ok_or(TimeError::Overflow)?,
        tv_nsec: ts.nsec().try_into().ok().ok_or(TimeError::Overflow)?,
    })
}

fn from_timespec(ts: timespec) -> Result<Timespec, TimeError> {
    Timespec::new(i64::from(ts.tv_sec), i64::from(ts.tv_nsec))
}

/// Read `clock` with `clock_gettime`.
pub(crate) fn clock_now(clock: ClockId) -> HarnessResult<Timespec> {
    let mut ts = timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
    let rc = unsafe { libc::clock_gettime(raw_clock(clock), &mut ts) };
    if rc != 0 {
        return Err(HarnessError::ClockRead {
            clock,
            source: io::Error::last_os_error(),
        });
    }
    from_timespec(ts).map_err(HarnessError::from)
}

/// Absolute sleep with `clock_nanosleep(TIMER_ABSTIME)`.
pub(crate) fn sleep_until(clock: ClockId, deadline: Timespec) -> HarnessResult {
    let target = to_timespec(deadline)?;
    loop {
        // SAFETY: `target` is a valid timespec; the remainder pointer may be
        // null because TIMER_ABSTIME never reports one.
        let rc = unsafe {
            libc::clock_nanosleep(raw_clock(clock), TIMER_ABSTIME, &target, core::ptr::null_mut())
        };
        match rc {
            0 => return Ok(()),
            EINTR => continue,
            errno => {
                return Err(HarnessError::ClockRead {
                    clock,
                    source: io::Error::from_raw_os_error(errno),
                });
            }
        }
    }
}

/// Pin the calling thread to `cpu`.
pub(crate) fn pin_current_thread(cpu: usize) -> io::Result<()> {
    let set_size = usize::try_from(libc::CPU_SETSIZE).unwrap_or(0);
    if cpu >= set_size {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cpu {cpu} is beyond the affinity mask size {set_size}"),
        ));
    }

    // SAFETY: cpu_set_t is a plain bitmask; all zero bits is the empty set.
    let mut set: cpu_set_t = unsafe { core::mem::zeroed() };
    // SAFETY: `cpu` is below CPU_SETSIZE, checked above.
    unsafe { libc::CPU_SET(cpu, &mut set) };
    // SAFETY: `set` is a valid cpu_set_t and the size passed is its size;
    // pid 0 is the calling thread.
    let rc = unsafe { libc::sched_setaffinity(0, core::mem::size_of::<cpu_set_t>(), &set) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Apply affinity, then scheduling class and priority, to the calling thread.
pub(crate) fn apply_thread_attributes(task: TaskId, attrs: &ThreadAttributes) -> HarnessResult {
    if let Affinity::Core(cpu) = attrs.affinity {
        pin_current_thread(cpu).map_err(|e| HarnessError::attribute(task, "affinity", e))?;
    }

    let param = sched_param {
        sched_priority: attrs.priority,
    };
    // SAFETY: pid 0 is the calling thread and `param` outlives the call.
    let rc = unsafe { libc::sched_setscheduler(0, attrs.policy.as_raw(), &param) };
    if rc != 0 {
        return Err(HarnessError::attribute(
            task,
            "scheduling policy",
            io::Error::last_os_error(),
        ));
    }
    Ok(())
}

/// Read back the calling thread's class, priority and current CPU.
pub(crate) fn observe_current_thread() -> io::Result<ObservedSchedule> {
    // SAFETY: pid 0 is the calling thread; no pointers are passed.
    let raw_policy = unsafe { libc::sched_getscheduler(0) };
    if raw_policy < 0 {
        return Err(io::Error::last_os_error());
    }

    let mut param = sched_param { sched_priority: 0 };
    // SAFETY: `param` is a valid, writable sched_param.
    let rc = unsafe { libc::sched_getparam(0, &mut param) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: takes no arguments; returns -1 on failure.
    let cpu = unsafe { libc::sched_getcpu() };

    Ok(ObservedSchedule {
        policy: SchedPolicy::from_raw(raw_policy),
        priority: param.sched_priority,
        cpu: usize::try_from(cpu).ok(),
    })
}

/// `mlockall(MCL_CURRENT | MCL_FUTURE)`
pub(crate) fn lock_memory() -> io::Result<()> {
    // SAFETY: only flags are passed.
    let rc = unsafe { libc::mlockall(MCL_CURRENT | MCL_FUTURE) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
