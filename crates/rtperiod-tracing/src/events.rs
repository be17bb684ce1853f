//! Trace event definitions for periodic task loops

use core::fmt;
use std::io;

/// Events emitted by the harness and its task loops
///
/// # RT-Safety
///
/// All variants are `Copy` and carry only integers and static strings, so
/// emission from the hot loop never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceEvent {
    /// The harness spawned the thread for a task
    TaskSpawned {
        /// Task identity
        task: u32,
    },

    /// A task loop is starting, after its thread attributes were applied
    TaskStart {
        /// Task identity
        task: u32,
        /// Scheduling policy name (`FIFO`, `RR`, `OTHER`)
        policy: &'static str,
        /// Requested priority
        priority: i32,
    },

    /// A task woke at its release
    Wake {
        /// Task identity
        task: u32,
        /// 1-based iteration number
        iteration: u64,
    },

    /// A task found its release already in the past
    DeadlineMiss {
        /// Task identity
        task: u32,
        /// 1-based iteration number
        iteration: u64,
        /// How far past the release the loop top was, in microseconds
        lateness_us: u64,
    },

    /// A round-robin time slice elapsed inside the workload
    RoundRobinSlice {
        /// Task identity
        task: u32,
        /// 1-based slice counter within the current workload run
        slice: u32,
    },

    /// A task loop ended
    TaskTerminated {
        /// Task identity
        task: u32,
        /// Response time of the last iteration in microseconds
        response_us: u64,
        /// Absolute deadline of the last iteration in microseconds
        deadline_us: i64,
    },
}

impl TraceEvent {
    /// Returns the event type as a string for logging/tracing
    #[inline]
    pub const fn event_type(&self) -> &'static str {
        match self {
            TraceEvent::TaskSpawned { .. } => "task_spawned",
            TraceEvent::TaskStart { .. } => "task_start",
            TraceEvent::Wake { .. } => "wake",
            TraceEvent::DeadlineMiss { .. } => "deadline_miss",
            TraceEvent::RoundRobinSlice { .. } => "rr_slice",
            TraceEvent::TaskTerminated { .. } => "task_terminated",
        }
    }

    /// Returns the event category for filtering
    #[inline]
    pub const fn category(&self) -> EventCategory {
        match self {
            TraceEvent::TaskSpawned { .. }
            | TraceEvent::TaskStart { .. }
            | TraceEvent::TaskTerminated { .. } => EventCategory::Lifecycle,
            TraceEvent::Wake { .. } | TraceEvent::RoundRobinSlice { .. } => EventCategory::Timing,
            TraceEvent::DeadlineMiss { .. } => EventCategory::Error,
        }
    }

    /// Returns the task this event belongs to
    #[inline]
    pub const fn task(&self) -> u32 {
        match self {
            TraceEvent::TaskSpawned { task }
            | TraceEvent::TaskStart { task, .. }
            | TraceEvent::Wake { task, .. }
            | TraceEvent::DeadlineMiss { task, .. }
            | TraceEvent::RoundRobinSlice { task, .. }
            | TraceEvent::TaskTerminated { task, .. } => *task,
        }
    }

    /// Returns true if this is an error event
    #[inline]
    pub const fn is_error(&self) -> bool {
        matches!(self, TraceEvent::DeadlineMiss { .. })
    }

    /// Write the single-line `trace_marker` form of this event.
    ///
    /// The line has no trailing newline. `key=value` fields keep it easy to
    /// filter in KernelShark.
    ///
    /// # Errors
    ///
    /// Returns the writer's error, e.g. `WriteZero` when a fixed buffer is full.
    pub fn write_marker<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        match *self {
            TraceEvent::TaskSpawned { task } => write!(out, "rtperiod_spawned task={task}"),
            TraceEvent::TaskStart {
                task,
                policy,
                priority,
            } => write!(
                out,
                "rtperiod_task_start task={task} policy={policy} priority={priority}"
            ),
            TraceEvent::Wake { task, iteration } => {
                write!(out, "rtperiod_wake task={task} iter={iteration}")
            }
            TraceEvent::DeadlineMiss {
                task,
                iteration,
                lateness_us,
            } => write!(
                out,
                "rtperiod_deadline_miss task={task} iter={iteration} late_us={lateness_us}"
            ),
            TraceEvent::RoundRobinSlice { task, slice } => {
                write!(out, "rtperiod_rr_slice task={task} slice={slice}")
            }
            TraceEvent::TaskTerminated {
                task,
                response_us,
                deadline_us,
            } => write!(
                out,
                "rtperiod_task_terminated task={task} response_us={response_us} deadline_us={deadline_us}"
            ),
        }
    }
}

/// Category for trace events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    /// Spawn, start and termination
    Lifecycle,
    /// Wake-ups and slice boundaries
    Timing,
    /// Deadline misses
    Error,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceEvent::TaskSpawned { task } => write!(f, "TaskSpawned(task={task})"),
            TraceEvent::TaskStart {
                task,
                policy,
                priority,
            } => write!(
                f,
                "TaskStart(task={task}, policy={policy}, priority={priority})"
            ),
            TraceEvent::Wake { task, iteration } => {
                write!(f, "Wake(task={task}, iter={iteration})")
            }
            TraceEvent::DeadlineMiss {
                task,
                iteration,
                lateness_us,
            } => write!(
                f,
                "DeadlineMiss(task={task}, iter={iteration}, late={lateness_us}us)"
            ),
            TraceEvent::RoundRobinSlice { task, slice } => {
                write!(f, "RoundRobinSlice(task={task}, slice={slice})")
            }
            TraceEvent::TaskTerminated {
                task,
                response_us,
                deadline_us,
            } => write!(
                f,
                "TaskTerminated(task={task}, response={response_us}us, deadline={deadline_us}us)"
            ),
        }
    }
}
