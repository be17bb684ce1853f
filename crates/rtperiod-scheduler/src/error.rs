//! Error types for the scheduler crate.

use std::io;

use crate::clock::ClockId;
use crate::policy::TaskId;
use crate::time::TimeError;

/// Harness errors
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// A clock could not be read or slept on
    #[error("{clock} clock failed: {source}")]
    ClockRead {
        /// Clock involved
        clock: ClockId,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// A task was already late for its release
    #[error("task {task} missed its deadline at iteration {iteration} ({lateness_us}us late)")]
    DeadlineMiss {
        /// Late task
        task: TaskId,
        /// 1-based iteration that missed
        iteration: u64,
        /// How far past the release the loop top ran
        lateness_us: u64,
    },

    /// Scheduling class, priority or affinity could not be applied
    #[error("task {task}: failed to set {attribute}: {source}")]
    ThreadAttribute {
        /// Task whose thread was being configured
        task: TaskId,
        /// Which attribute failed
        attribute: &'static str,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// The OS refused to create the task thread
    #[error("task {task}: failed to spawn thread: {source}")]
    ThreadSpawn {
        /// Task that never started
        task: TaskId,
        /// OS error
        #[source]
        source: io::Error,
    },

    /// The task thread panicked
    #[error("task {task} panicked")]
    TaskPanicked {
        /// Task whose thread panicked
        task: TaskId,
    },

    /// Rejected configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Time arithmetic failure
    #[error(transparent)]
    Time(#[from] TimeError),
}

impl HarnessError {
    /// Whether this error ends the whole run rather than one task.
    pub fn is_fatal_to_run(&self) -> bool {
        matches!(self, HarnessError::DeadlineMiss { .. })
    }

    /// Whether the run can carry on without the failed task.
    pub fn is_recoverable(&self) -> bool {
        match self {
            HarnessError::ClockRead { .. }
            | HarnessError::ThreadAttribute { .. }
            | HarnessError::ThreadSpawn { .. }
            | HarnessError::TaskPanicked { .. }
            | HarnessError::Time(_) => true,
            HarnessError::DeadlineMiss { .. } | HarnessError::InvalidConfig(_) => false,
        }
    }

    /// Task the error belongs to, if any
    pub fn task(&self) -> Option<TaskId> {
        match self {
            HarnessError::DeadlineMiss { task, .. }
            | HarnessError::ThreadAttribute { task, .. }
            | HarnessError::ThreadSpawn { task, .. }
            | HarnessError::TaskPanicked { task } => Some(*task),
            HarnessError::ClockRead { .. }
            | HarnessError::InvalidConfig(_)
            | HarnessError::Time(_) => None,
        }
    }

    /// Create a thread-attribute error
    pub fn attribute(task: TaskId, attribute: &'static str, source: io::Error) -> Self {
        HarnessError::ThreadAttribute {
            task,
            attribute,
            source,
        }
    }
}

/// Result alias for harness operations
pub type HarnessResult<T = ()> = Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_deadline_miss_is_fatal_to_run() {
        let miss = HarnessError::DeadlineMiss {
            task: TaskId(1),
            iteration: 3,
            lateness_us: 120,
        };
        assert!(miss.is_fatal_to_run());
        assert!(!miss.is_recoverable());
        assert_eq!(miss.task(), Some(TaskId(1)));

        let panicked = HarnessError::TaskPanicked { task: TaskId(0) };
        assert!(!panicked.is_fatal_to_run());
        assert!(panicked.is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = HarnessError::attribute(
            TaskId(2),
            "affinity",
            io::Error::from(io::ErrorKind::InvalidInput),
        );
        assert!(err.to_string().starts_with("task 2: failed to set affinity"));

        let err = HarnessError::from(TimeError::Overflow);
        assert_eq!(err.to_string(), "timestamp arithmetic overflowed");
        assert_eq!(err.task(), None);
    }
}
