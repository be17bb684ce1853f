//! Drift-free periodic task loops for measuring the host scheduler.
//!
//! A run spawns one thread per task. Each thread is placed in its requested
//! scheduling class (`FIFO`, `RR` or `OTHER`) and CPU, then loops:
//!
//! - **Release**: the next release is the previous one plus the period, so
//!   scheduling never drifts ([`ReleaseSchedule`])
//! - **Deadline check**: a loop top already past its release is a miss,
//!   recorded or fatal per [`MissPolicy`]
//! - **Sleep**: absolute-time `clock_nanosleep` until the release
//! - **Work**: a bounded busy loop on the thread CPU clock ([`WorkloadExecutor`])
//! - **Record**: timing into the task's slot of the [`ResultsStore`]
//!
//! After every thread is joined the store is turned into a completion-ordered
//! [`Report`].
//!
//! # RT-Safety Guarantees
//!
//! - No heap allocation inside a task loop
//! - The only blocking call in a loop is the absolute-time sleep
//! - Result slots are disjoint borrows; the write path takes no lock
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use rtperiod_scheduler::prelude::*;
//! use rtperiod_tracing::TracingManager;
//!
//! # fn main() -> Result<(), HarnessError> {
//! let tasks = task_set(&[10, 20, 30], None, SchedPolicy::Other, Affinity::Core(1))?;
//! let config = HarnessConfig::new()
//!     .with_miss_policy(MissPolicy::Record)
//!     .with_run_for(Some(Duration::from_secs(1)));
//!
//! let harness = Harness::new(tasks, config, TracingManager::new())?;
//! let summary = harness.run()?;
//! print!("{}", summary.report());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]
#![deny(static_mut_refs)]
#![deny(unused_must_use)]

pub mod cancel;
pub mod clock;
pub mod error;
pub mod harness;
pub mod periodic;
pub mod policy;
pub mod release;
pub mod report;
pub mod results;
pub mod rt_setup;
pub mod task;
pub mod time;
pub mod workload;

#[cfg(target_os = "linux")]
#[expect(unsafe_code, reason = "libc clock, scheduling and affinity calls")]
mod linux;

#[cfg(not(target_os = "linux"))]
mod fallback;

pub mod prelude;

pub use cancel::CancellationToken;
pub use clock::ClockId;
pub use error::{HarnessError, HarnessResult};
pub use harness::{Harness, HarnessConfig, RunSummary, TaskFailure};
pub use periodic::{LoopState, MissPolicy, PeriodicTask};
pub use policy::{Affinity, SchedPolicy, TaskId};
pub use release::ReleaseSchedule;
pub use report::{Report, ReportLine, sort_by_completion};
pub use results::{RecordSlot, ResultsStore, TimingRecord};
pub use rt_setup::{ObservedSchedule, RtSetup, RtSetupOutcome, ThreadAttributes};
pub use task::{TaskConfig, rate_monotonic_priorities, task_set};
pub use time::{TimeError, Timespec};
pub use workload::{SliceTracking, WorkloadConfig, WorkloadExecutor, WorkloadReport};

/// Default task periods in milliseconds.
pub const DEFAULT_PERIODS_MS: [u64; 3] = [10, 20, 30];

/// Default CPU for task threads.
pub const DEFAULT_TASK_CPU: usize = 1;
