//! Task identity, scheduling class and CPU affinity.

use core::fmt;
use core::str::FromStr;

use serde::Serialize;

use crate::error::HarnessError;

/// Dense task identity, `0..N` in the order tasks were configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct TaskId(pub u32);

impl TaskId {
    /// Slot index in the results store
    pub fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// OS scheduling class a task requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum SchedPolicy {
    /// Strict priority, run to block or preemption
    #[serde(rename = "FIFO")]
    Fifo,
    /// Strict priority, time-sliced among equal priorities
    #[serde(rename = "RR")]
    RoundRobin,
    /// Fair-share, priority must be 0
    #[default]
    #[serde(rename = "OTHER")]
    Other,
}

impl SchedPolicy {
    /// Every policy, in CLI order
    pub const ALL: [SchedPolicy; 3] = [SchedPolicy::Fifo, SchedPolicy::RoundRobin, SchedPolicy::Other];

    /// Name used on the command line and in reports
    pub const fn as_str(self) -> &'static str {
        match self {
            SchedPolicy::Fifo => "FIFO",
            SchedPolicy::RoundRobin => "RR",
            SchedPolicy::Other => "OTHER",
        }
    }

    /// Whether the class takes a real-time priority in `[1, 99]`
    pub const fn is_realtime(self) -> bool {
        matches!(self, SchedPolicy::Fifo | SchedPolicy::RoundRobin)
    }

    /// Inclusive priority range accepted for this class
    pub const fn priority_range(self) -> (i32, i32) {
        if self.is_realtime() { (1, 99) } else { (0, 0) }
    }

    /// Convert from the kernel policy constant.
    ///
    /// Classes the harness never requests (batch, idle, deadline) map to
    /// `None`.
    #[cfg(unix)]
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            libc::SCHED_FIFO => Some(SchedPolicy::Fifo),
            libc::SCHED_RR => Some(SchedPolicy::RoundRobin),
            libc::SCHED_OTHER => Some(SchedPolicy::Other),
            _ => None,
        }
    }

    /// Kernel policy constant
    #[cfg(unix)]
    pub const fn as_raw(self) -> i32 {
        match self {
            SchedPolicy::Fifo => libc::SCHED_FIFO,
            SchedPolicy::RoundRobin => libc::SCHED_RR,
            SchedPolicy::Other => libc::SCHED_OTHER,
        }
    }
}

impl fmt::Display for SchedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedPolicy {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIFO" => Ok(SchedPolicy::Fifo),
            "RR" => Ok(SchedPolicy::RoundRobin),
            "OTHER" => Ok(SchedPolicy::Other),
            other => Err(HarnessError::InvalidConfig(format!(
                "unknown scheduling policy {other:?} (expected FIFO, RR or OTHER)"
            ))),
        }
    }
}

/// CPU placement of a task thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Affinity {
    /// Pin to one core
    Core(usize),
    /// Let the OS place the thread
    #[default]
    Unconstrained,
}

impl Affinity {
    /// Pinned core, if any
    pub const fn core(self) -> Option<usize> {
        match self {
            Affinity::Core(cpu) => Some(cpu),
            Affinity::Unconstrained => None,
        }
    }
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Affinity::Core(cpu) => write!(f, "{cpu}"),
            Affinity::Unconstrained => f.write_str("any"),
        }
    }
}

impl FromStr for Affinity {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("any") {
            return Ok(Affinity::Unconstrained);
        }
        s.parse::<usize>().map(Affinity::Core).map_err(|e| {
            HarnessError::InvalidConfig(format!("invalid cpu {s:?}: {e} (expected a core index or 'any')"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_names_round_trip() {
        for policy in SchedPolicy::ALL {
            assert_eq!(policy.as_str().parse::<SchedPolicy>().ok(), Some(policy));
        }
    }

    #[test]
    fn test_policy_parse_is_case_sensitive() {
        assert!("fifo".parse::<SchedPolicy>().is_err());
        assert!("DEADLINE".parse::<SchedPolicy>().is_err());
        assert!("".parse::<SchedPolicy>().is_err());
    }

    #[test]
    fn test_priority_ranges() {
        assert_eq!(SchedPolicy::Fifo.priority_range(), (1, 99));
        assert_eq!(SchedPolicy::RoundRobin.priority_range(), (1, 99));
        assert_eq!(SchedPolicy::Other.priority_range(), (0, 0));
    }

    #[cfg(unix)]
    #[test]
    fn test_raw_policy_mapping() {
        for policy in SchedPolicy::ALL {
            assert_eq!(SchedPolicy::from_raw(policy.as_raw()), Some(policy));
        }
        assert_eq!(SchedPolicy::from_raw(-1), None);
    }

    #[test]
    fn test_affinity_parse() {
        assert_eq!("any".parse::<Affinity>().ok(), Some(Affinity::Unconstrained));
        assert_eq!("ANY".parse::<Affinity>().ok(), Some(Affinity::Unconstrained));
        assert_eq!("3".parse::<Affinity>().ok(), Some(Affinity::Core(3)));
        assert!("-1".parse::<Affinity>().is_err());
        assert_eq!(Affinity::Core(2).to_string(), "2");
    }
}
