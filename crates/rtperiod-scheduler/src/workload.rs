//! Bounded CPU-bound workload.
//!
//! The busy loop is measured on the per-thread CPU clock, so time spent
//! preempted does not count against the budget. Under round-robin the loop
//! also reports each elapsed time slice to the trace sink.

use rtperiod_tracing::{TraceEvent, TracingManager, trace_if_enabled};
use serde::Serialize;

use crate::clock::{self, ClockId};
use crate::error::HarnessResult;
use crate::policy::{SchedPolicy, TaskId};
use crate::time::Timespec;

/// Default busy time per iteration in microseconds.
pub const DEFAULT_BUSY_US: u64 = 5_000;

/// Default round-robin slice window in microseconds.
pub const DEFAULT_SLICE_US: u64 = 1_000;

/// Workload configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkloadConfig {
    /// CPU time burned per iteration, in microseconds.
    pub busy_us: u64,

    /// Round-robin slice window used for trace events, in microseconds.
    pub slice_us: u64,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            busy_us: DEFAULT_BUSY_US,
            slice_us: DEFAULT_SLICE_US,
        }
    }
}

impl WorkloadConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the busy time.
    pub fn with_busy_us(mut self, busy_us: u64) -> Self {
        self.busy_us = busy_us;
        self
    }

    /// Set the slice window.
    pub fn with_slice_us(mut self, slice_us: u64) -> Self {
        self.slice_us = slice_us;
        self
    }

    /// Raise zero durations to one microsecond.
    pub fn normalize(&mut self) {
        self.busy_us = self.busy_us.max(1);
        self.slice_us = self.slice_us.max(1);
    }

    /// Check both durations are positive.
    pub fn is_valid(&self) -> bool {
        self.busy_us >= 1 && self.slice_us >= 1
    }
}

/// Per-policy slice bookkeeping inside the busy loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceTracking {
    /// No slice accounting
    Off,
    /// Count elapsed round-robin windows
    RoundRobin {
        /// Window length in microseconds
        slice_us: u64,
        /// Start of the current window on the thread CPU clock
        window_start: Timespec,
        /// Windows elapsed so far
        slices: u32,
    },
}

impl SliceTracking {
    /// Pick tracking for `policy`, with the first window opening at `start`.
    pub fn for_policy(policy: SchedPolicy, slice_us: u64, start: Timespec) -> Self {
        match policy {
            SchedPolicy::RoundRobin => SliceTracking::RoundRobin {
                slice_us: slice_us.max(1),
                window_start: start,
                slices: 0,
            },
            SchedPolicy::Fifo | SchedPolicy::Other => SliceTracking::Off,
        }
    }

    /// Advance to `now`; returns the 1-based index of a window that just
    /// closed.
    pub fn observe(&mut self, now: Timespec) -> Option<u32> {
        match self {
            SliceTracking::Off => None,
            SliceTracking::RoundRobin {
                slice_us,
                window_start,
                slices,
            } => {
                let elapsed = Timespec::elapsed_micros(*window_start, now).unwrap_or(0);
                if elapsed < *slice_us {
                    return None;
                }
                *window_start = window_start.add_micros(*slice_us).unwrap_or(now);
                *slices = slices.saturating_add(1);
                Some(*slices)
            }
        }
    }

    /// Windows elapsed so far
    pub fn slices(&self) -> u32 {
        match self {
            SliceTracking::Off => 0,
            SliceTracking::RoundRobin { slices, .. } => *slices,
        }
    }
}

/// Outcome of one workload run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkloadReport {
    /// CPU time the loop actually consumed, in microseconds
    pub cpu_elapsed_us: u64,
    /// Round-robin windows that elapsed (0 unless `RR`)
    pub slices: u32,
}

/// Runs the busy loop for one task iteration.
///
/// # RT Safety
///
/// - Never sleeps or allocates
/// - Trace events are built only when a sink is listening
#[derive(Debug, Clone, Copy)]
pub struct WorkloadExecutor<'a> {
    config: WorkloadConfig,
    tracer: &'a TracingManager,
}

impl<'a> WorkloadExecutor<'a> {
    /// Create an executor reporting slices to `tracer`.
    pub fn new(mut config: WorkloadConfig, tracer: &'a TracingManager) -> Self {
        config.normalize();
        Self { config, tracer }
    }

    /// Configuration in use
    pub fn config(&self) -> &WorkloadConfig {
        &self.config
    }

    /// Occupy the calling thread for `busy_us` of its own CPU time.
    ///
    /// # Errors
    ///
    /// [`HarnessError::ClockRead`](crate::HarnessError::ClockRead) if the
    /// thread CPU clock cannot be read.
    pub fn run(&self, task: TaskId, policy: SchedPolicy) -> HarnessResult<WorkloadReport> {
        let start = clock::now(ClockId::ThreadCpuTime)?;
        let until = start.add_micros(self.config.busy_us)?;
        let mut tracking = SliceTracking::for_policy(policy, self.config.slice_us, start);

        let mut now = start;
        while now < until {
            now = clock::now(ClockId::ThreadCpuTime)?;
            if let Some(slice) = tracking.observe(now) {
                trace_if_enabled!(
                    self.tracer,
                    TraceEvent::RoundRobinSlice {
                        task: task.0,
                        slice,
                    }
                );
            }
        }

        Ok(WorkloadReport {
            cpu_elapsed_us: Timespec::elapsed_micros(start, now)?,
            slices: tracking.slices(),
        })
    }
}
