//! Prelude module for common scheduler types.
//!
//! This module provides a convenient way to import the most commonly used
//! types from the scheduler crate.

pub use crate::cancel::CancellationToken;
pub use crate::clock::ClockId;
pub use crate::error::{HarnessError, HarnessResult};
pub use crate::harness::{Harness, HarnessConfig, RunSummary};
pub use crate::periodic::MissPolicy;
pub use crate::policy::{Affinity, SchedPolicy, TaskId};
pub use crate::report::Report;
pub use crate::results::TimingRecord;
pub use crate::rt_setup::RtSetup;
pub use crate::task::{TaskConfig, task_set};
pub use crate::workload::WorkloadConfig;
pub use crate::{DEFAULT_PERIODS_MS, DEFAULT_TASK_CPU};
