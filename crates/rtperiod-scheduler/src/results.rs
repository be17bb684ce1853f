//! Per-task timing records and the fixed-capacity store that holds them.
//!
//! The store is an arena of one record per task identity. While the task
//! threads run, each owns a [`RecordSlot`], a disjoint `&mut` borrow of its
//! record, so writes take no lock. [`ResultsStore::snapshot`] needs `&self`
//! and therefore only compiles once every slot borrow, and with it every
//! task thread scope, has ended.

use serde::Serialize;

use crate::error::{HarnessError, HarnessResult};
use crate::policy::{SchedPolicy, TaskId};
use crate::time::Timespec;

/// Timing of a task's latest iteration plus cumulative counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimingRecord {
    /// Task identity
    pub task_id: TaskId,
    /// Scheduling class observed from the OS
    pub policy: Option<SchedPolicy>,
    /// Priority observed from the OS
    pub priority: i32,
    /// CPU the thread was running on
    pub cpu: Option<usize>,
    /// Release honoured by the latest iteration
    pub start: Timespec,
    /// Instant the thread woke for that release
    pub wake: Timespec,
    /// Instant the iteration finished
    pub end: Timespec,
    /// `start + period`
    pub deadline: Timespec,
    /// Monotonic microseconds at `end`; orders completions across tasks
    pub completion_us: i64,
    /// `end - wake`
    pub execution_us: u64,
    /// `end - start`
    pub response_us: u64,
    /// Latest iteration was already late for its release
    pub deadline_missed: bool,
    /// Iterations performed, honoured and missed
    pub iterations: u64,
    /// Missed iterations
    pub missed_count: u64,
    /// Worst response time seen
    pub max_response_us: u64,
    /// Release of the first iteration
    pub first_release: Timespec,
}

impl TimingRecord {
    /// Zeroed record for `task_id`.
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            ..Self::default()
        }
    }

    /// Whether at least one iteration was recorded
    pub fn is_completed(&self) -> bool {
        self.iterations > 0
    }

    /// Check `start == first_release + (iterations - 1) * period`.
    ///
    /// Holds for every completed record of a drift-free loop, missed
    /// iterations included.
    pub fn is_drift_free(&self, period_us: u64) -> bool {
        let Some(elapsed) = self.iterations.checked_sub(1) else {
            return false;
        };
        elapsed
            .checked_mul(period_us)
            .and_then(|offset| self.first_release.add_micros(offset).ok())
            .is_some_and(|expected| expected == self.start)
    }
}

/// Write handle to one task's record.
#[derive(Debug)]
pub struct RecordSlot<'a> {
    record: &'a mut TimingRecord,
}

impl RecordSlot<'_> {
    /// Task this slot belongs to
    pub fn task_id(&self) -> TaskId {
        self.record.task_id
    }

    /// Current contents
    pub fn get(&self) -> &TimingRecord {
        &*self.record
    }

    /// Overwrite the record; the slot's task identity is kept.
    pub fn write(&mut self, record: TimingRecord) {
        let task_id = self.record.task_id;
        *self.record = TimingRecord { task_id, ..record };
    }
}

/// Fixed-capacity table of one [`TimingRecord`] per task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsStore {
    records: Box<[TimingRecord]>,
}

impl ResultsStore {
    /// Store with `n` zeroed records for tasks `0..n`.
    ///
    /// # Errors
    ///
    /// [`HarnessError::InvalidConfig`] if `n` exceeds the task id range.
    pub fn new(n: usize) -> HarnessResult<Self> {
        let records = (0..n)
            .map(|index| {
                u32::try_from(index)
                    .map(|id| TimingRecord::new(TaskId(id)))
                    .map_err(|e| HarnessError::InvalidConfig(format!("too many tasks: {e}")))
            })
            .collect::<HarnessResult<Vec<_>>>()?;
        Ok(Self {
            records: records.into_boxed_slice(),
        })
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store has no slots
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One write handle per task, in task-id order.
    pub fn slots_mut(&mut self) -> Vec<RecordSlot<'_>> {
        self.records
            .iter_mut()
            .map(|record| RecordSlot { record })
            .collect()
    }

    /// Overwrite `task`'s record from a single thread.
    ///
    /// # Errors
    ///
    /// [`HarnessError::InvalidConfig`] if `task` has no slot.
    pub fn write(&mut self, task: TaskId, record: TimingRecord) -> HarnessResult {
        let slot = self
            .records
            .get_mut(task.index())
            .ok_or_else(|| HarnessError::InvalidConfig(format!("no slot for task {task}")))?;
        *slot = TimingRecord {
            task_id: task,
            ..record
        };
        Ok(())
    }

    /// Record of `task`
    pub fn get(&self, task: TaskId) -> Option<&TimingRecord> {
        self.records.get(task.index())
    }

    /// Copy of every record, in task-id order.
    pub fn snapshot(&self) -> Vec<TimingRecord> {
        self.records.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_assigns_dense_ids() -> HarnessResult {
        let store = ResultsStore::new(3)?;
        let ids: Vec<u32> = store.snapshot().iter().map(|r| r.task_id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(store.snapshot().iter().all(|r| !r.is_completed()));
        Ok(())
    }

    #[test]
    fn test_slot_write_keeps_identity() -> HarnessResult {
        let mut store = ResultsStore::new(2)?;
        {
            let mut slots = store.slots_mut();
            if let Some(slot) = slots.get_mut(1) {
                slot.write(TimingRecord {
                    task_id: TaskId(0),
                    iterations: 4,
                    ..TimingRecord::default()
                });
                assert_eq!(slot.task_id(), TaskId(1));
                assert_eq!(slot.get().iterations, 4);
            }
        }
        assert_eq!(store.get(TaskId(1)).map(|r| r.iterations), Some(4));
        assert_eq!(store.get(TaskId(0)).map(|r| r.iterations), Some(0));
        Ok(())
    }

    #[test]
    fn test_single_threaded_write() -> HarnessResult {
        let mut store = ResultsStore::new(1)?;
        store.write(
            TaskId(0),
            TimingRecord {
                response_us: 42,
                ..TimingRecord::default()
            },
        )?;
        assert_eq!(store.get(TaskId(0)).map(|r| r.response_us), Some(42));
        assert!(store.write(TaskId(5), TimingRecord::default()).is_err());
        Ok(())
    }

    #[test]
    fn test_drift_law_check() {
        let record = TimingRecord {
            first_release: Timespec::from_micros(10_000),
            start: Timespec::from_micros(50_000),
            iterations: 5,
            ..TimingRecord::default()
        };
        assert!(record.is_drift_free(10_000));
        assert!(!record.is_drift_free(9_000));
        assert!(!TimingRecord::default().is_drift_free(10_000));
    }
}
