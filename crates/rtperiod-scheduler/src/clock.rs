//! POSIX clock reads and absolute-time sleep.

use core::fmt;
use core::str::FromStr;

use serde::Serialize;

use crate::error::{HarnessError, HarnessResult};
use crate::time::Timespec;

#[cfg(target_os = "linux")]
use crate::linux as platform;

#[cfg(not(target_os = "linux"))]
use crate::fallback as platform;

/// Clock a timestamp is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClockId {
    /// Wall clock; jumps with `settimeofday` and NTP steps
    Realtime,
    /// Steady clock since boot
    #[default]
    Monotonic,
    /// CPU time consumed by the calling thread
    ThreadCpuTime,
}

impl ClockId {
    /// Name used in configuration and logs
    pub const fn as_str(self) -> &'static str {
        match self {
            ClockId::Realtime => "realtime",
            ClockId::Monotonic => "monotonic",
            ClockId::ThreadCpuTime => "thread-cpu",
        }
    }

    /// Whether threads can block on this clock with an absolute deadline
    pub const fn supports_absolute_sleep(self) -> bool {
        !matches!(self, ClockId::ThreadCpuTime)
    }
}

impl fmt::Display for ClockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockId {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realtime" => Ok(ClockId::Realtime),
            "monotonic" => Ok(ClockId::Monotonic),
            "thread-cpu" => Ok(ClockId::ThreadCpuTime),
            other => Err(HarnessError::InvalidConfig(format!("unknown clock {other:?}"))),
        }
    }
}

/// Read `clock`.
///
/// # Errors
///
/// [`HarnessError::ClockRead`] if the OS rejects the read.
#[inline]
pub fn now(clock: ClockId) -> HarnessResult<Timespec> {
    platform::clock_now(clock)
}

/// Block the calling thread until `clock` reaches `deadline`.
///
/// Returns immediately if the deadline has passed. Signal interruptions are
/// retried against the same absolute deadline, so they never shorten or
/// stretch the wait.
///
/// # Errors
///
/// - [`HarnessError::InvalidConfig`] for [`ClockId::ThreadCpuTime`]
/// - [`HarnessError::ClockRead`] if the OS rejects the sleep
pub fn sleep_until(clock: ClockId, deadline: Timespec) -> HarnessResult {
    if !clock.supports_absolute_sleep() {
        return Err(HarnessError::InvalidConfig(format!(
            "cannot sleep on the {clock} clock"
        )));
    }
    platform::sleep_until(clock, deadline)
}
