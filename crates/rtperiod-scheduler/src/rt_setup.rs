//! Thread and process real-time configuration.

use std::io;

use serde::Serialize;

use crate::error::HarnessResult;
use crate::policy::{Affinity, SchedPolicy, TaskId};

#[cfg(target_os = "linux")]
use crate::linux as platform;

#[cfg(not(target_os = "linux"))]
use crate::fallback as platform;

/// Scheduling attributes requested for one task thread.
///
/// Applied from inside the spawned thread, before its loop starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAttributes {
    /// Scheduling class
    pub policy: SchedPolicy,
    /// Static priority within the class
    pub priority: i32,
    /// CPU placement
    pub affinity: Affinity,
}

impl ThreadAttributes {
    /// Create a new attribute set.
    pub fn new(policy: SchedPolicy, priority: i32, affinity: Affinity) -> Self {
        Self {
            policy,
            priority,
            affinity,
        }
    }

    /// Apply to the calling thread.
    ///
    /// Affinity is applied first so a real-time thread never runs, even
    /// briefly, on the wrong core.
    ///
    /// # Errors
    ///
    /// [`HarnessError::ThreadAttribute`](crate::HarnessError::ThreadAttribute)
    /// naming the attribute that failed. Raising a thread to `FIFO`/`RR`
    /// usually needs `CAP_SYS_NICE`.
    pub fn apply(&self, task: TaskId) -> HarnessResult {
        platform::apply_thread_attributes(task, self)?;
        tracing::debug!(
            task = task.0,
            policy = %self.policy,
            priority = self.priority,
            affinity = %self.affinity,
            "thread attributes applied"
        );
        Ok(())
    }
}

/// Scheduling state of a thread as reported by the OS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ObservedSchedule {
    /// Scheduling class; `None` for classes the harness does not request
    pub policy: Option<SchedPolicy>,
    /// Static priority
    pub priority: i32,
    /// CPU the thread was last running on
    pub cpu: Option<usize>,
}

impl ObservedSchedule {
    /// Query the calling thread.
    ///
    /// # Errors
    ///
    /// The OS error from the failing query.
    pub fn current() -> io::Result<Self> {
        platform::observe_current_thread()
    }

    /// Stand-in built from what was requested, for when the query fails.
    pub fn requested(attrs: &ThreadAttributes) -> Self {
        Self {
            policy: Some(attrs.policy),
            priority: attrs.priority,
            cpu: attrs.affinity.core(),
        }
    }
}

/// Process-level setup applied once before task threads are spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtSetup {
    /// Lock current and future pages in memory.
    ///
    /// Avoids page faults inside task loops; needs `CAP_IPC_LOCK` or a
    /// large enough `RLIMIT_MEMLOCK`.
    pub lock_memory: bool,

    /// Core the coordinating (main) thread is pinned to.
    ///
    /// Keeps the coordinator off the cores the tasks run on.
    pub main_cpu: Option<usize>,
}

impl Default for RtSetup {
    fn default() -> Self {
        Self {
            lock_memory: false,
            main_cpu: Some(0),
        }
    }
}

/// What [`RtSetup::apply`] actually achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RtSetupOutcome {
    /// Pages are locked
    pub memory_locked: bool,
    /// Core the main thread now runs on
    pub main_pinned: Option<usize>,
}

impl RtSetup {
    /// Create a new RtSetup with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a setup that changes nothing.
    pub fn minimal() -> Self {
        Self {
            lock_memory: false,
            main_cpu: None,
        }
    }

    /// Set memory locking.
    pub fn with_lock_memory(mut self, enabled: bool) -> Self {
        self.lock_memory = enabled;
        self
    }

    /// Set the main-thread core (`None` leaves it unpinned).
    pub fn with_main_cpu(mut self, cpu: Option<usize>) -> Self {
        self.main_cpu = cpu;
        self
    }

    /// Check if any setup step is enabled.
    pub fn has_rt_features(&self) -> bool {
        self.lock_memory || self.main_cpu.is_some()
    }

    /// Apply to the process and the calling thread.
    ///
    /// Every step is best effort: failures are logged as warnings and
    /// reflected in the returned outcome.
    pub fn apply(&self) -> RtSetupOutcome {
        let mut outcome = RtSetupOutcome::default();

        if self.lock_memory {
            match platform::lock_memory() {
                Ok(()) => outcome.memory_locked = true,
                Err(e) => tracing::warn!(error = %e, "memory locking failed"),
            }
        }

        if let Some(cpu) = self.main_cpu {
            match platform::pin_current_thread(cpu) {
                Ok(()) => outcome.main_pinned = Some(cpu),
                Err(e) => tracing::warn!(cpu, error = %e, "main thread pinning failed"),
            }
        }

        tracing::debug!(?outcome, "process setup applied");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let setup = RtSetup::default();
        assert!(!setup.lock_memory);
        assert_eq!(setup.main_cpu, Some(0));
        assert!(setup.has_rt_features());
    }

    #[test]
    fn test_minimal() {
        let setup = RtSetup::minimal();
        assert!(!setup.has_rt_features());
        assert_eq!(setup.apply(), RtSetupOutcome::default());
    }

    #[test]
    fn test_builder_pattern() {
        let setup = RtSetup::new().with_lock_memory(true).with_main_cpu(None);
        assert!(setup.lock_memory);
        assert_eq!(setup.main_cpu, None);
    }

    #[test]
    fn test_requested_observation_mirrors_attributes() {
        let attrs = ThreadAttributes::new(SchedPolicy::RoundRobin, 40, Affinity::Core(2));
        let observed = ObservedSchedule::requested(&attrs);
        assert_eq!(observed.policy, Some(SchedPolicy::RoundRobin));
        assert_eq!(observed.priority, 40);
        assert_eq!(observed.cpu, Some(2));
    }

    #[test]
    fn test_fair_share_attributes_apply_without_privileges() -> HarnessResult {
        let attrs = ThreadAttributes::new(SchedPolicy::Other, 0, Affinity::Unconstrained);
        std::thread::scope(|scope| {
            scope
                .spawn(|| attrs.apply(TaskId(0)))
                .join()
                .unwrap_or(Ok(()))
        })
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_observe_default_thread() -> io::Result<()> {
        let observed = ObservedSchedule::current()?;
        assert!(observed.cpu.is_some());
        if observed.policy == Some(SchedPolicy::Other) {
            assert_eq!(observed.priority, 0);
        }
        Ok(())
    }
}
