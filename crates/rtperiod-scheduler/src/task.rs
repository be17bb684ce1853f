//! Periodic task configuration.

use serde::Serialize;

use crate::error::{HarnessError, HarnessResult};
use crate::policy::{Affinity, SchedPolicy, TaskId};
use crate::rt_setup::ThreadAttributes;

/// Highest rate-monotonic priority, given to the shortest period.
pub const RM_TOP_PRIORITY: i32 = 95;

/// Priority gap between consecutive rate-monotonic ranks.
pub const RM_PRIORITY_STEP: i32 = 5;

/// Immutable description of one periodic task.
///
/// Built and validated before any thread starts; each task loop borrows
/// exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskConfig {
    id: TaskId,
    period_ms: u64,
    policy: SchedPolicy,
    priority: i32,
    affinity: Affinity,
}

impl TaskConfig {
    /// Create a validated task configuration.
    ///
    /// # Errors
    ///
    /// [`HarnessError::InvalidConfig`] if the period is zero or the priority
    /// is outside the policy's range (`[1, 99]` for `FIFO`/`RR`, exactly `0`
    /// for `OTHER`).
    pub fn new(
        id: TaskId,
        period_ms: u64,
        policy: SchedPolicy,
        priority: i32,
        affinity: Affinity,
    ) -> HarnessResult<Self> {
        if period_ms == 0 {
            return Err(HarnessError::InvalidConfig(format!(
                "task {id}: period must be positive"
            )));
        }

        let (min, max) = policy.priority_range();
        if !(min..=max).contains(&priority) {
            return Err(HarnessError::InvalidConfig(format!(
                "task {id}: priority {priority} outside [{min}, {max}] for {policy}"
            )));
        }

        Ok(Self {
            id,
            period_ms,
            policy,
            priority,
            affinity,
        })
    }

    /// Task identity
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Period in milliseconds
    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Period in microseconds
    pub fn period_us(&self) -> u64 {
        self.period_ms.saturating_mul(1_000)
    }

    /// Requested scheduling class
    pub fn policy(&self) -> SchedPolicy {
        self.policy
    }

    /// Requested priority
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Requested CPU placement
    pub fn affinity(&self) -> Affinity {
        self.affinity
    }

    /// Attributes to apply to this task's thread
    pub fn attributes(&self) -> ThreadAttributes {
        ThreadAttributes::new(self.policy, self.priority, self.affinity)
    }
}

/// Build a dense task set `0..N` sharing one policy and affinity.
///
/// Without explicit `priorities`, real-time policies get
/// [`rate_monotonic_priorities`].
///
/// # Errors
///
/// [`HarnessError::InvalidConfig`] for an empty set, a priority list of the
/// wrong length, or any task [`TaskConfig::new`] rejects.
pub fn task_set(
    periods_ms: &[u64],
    priorities: Option<&[i32]>,
    policy: SchedPolicy,
    affinity: Affinity,
) -> HarnessResult<Vec<TaskConfig>> {
    if periods_ms.is_empty() {
        return Err(HarnessError::InvalidConfig(
            "at least one task period is required".to_owned(),
        ));
    }

    let priorities = match priorities {
        Some(p) if p.len() != periods_ms.len() => {
            return Err(HarnessError::InvalidConfig(format!(
                "{} priorities given for {} periods",
                p.len(),
                periods_ms.len()
            )));
        }
        Some(p) => p.to_vec(),
        None => rate_monotonic_priorities(periods_ms, policy),
    };

    periods_ms
        .iter()
        .zip(priorities)
        .enumerate()
        .map(|(index, (&period_ms, priority))| {
            let id = u32::try_from(index)
                .map(TaskId)
                .map_err(|e| HarnessError::InvalidConfig(format!("too many tasks: {e}")))?;
            TaskConfig::new(id, period_ms, policy, priority, affinity)
        })
        .collect()
}

/// Rate-monotonic priorities: shorter period, higher priority.
///
/// The shortest period gets [`RM_TOP_PRIORITY`] and each longer distinct
/// period [`RM_PRIORITY_STEP`] less, never below 1. Equal periods share a
/// priority. `OTHER` always gets 0.
pub fn rate_monotonic_priorities(periods_ms: &[u64], policy: SchedPolicy) -> Vec<i32> {
    if !policy.is_realtime() {
        return vec![0; periods_ms.len()];
    }

    let mut distinct: Vec<u64> = periods_ms.to_vec();
    distinct.sort_unstable();
    distinct.dedup();

    periods_ms
        .iter()
        .map(|period| {
            let rank = distinct.partition_point(|p| p < period);
            let rank = i32::try_from(rank).unwrap_or(i32::MAX);
            RM_TOP_PRIORITY
                .saturating_sub(rank.saturating_mul(RM_PRIORITY_STEP))
                .max(1)
        })
        .collect()
}
