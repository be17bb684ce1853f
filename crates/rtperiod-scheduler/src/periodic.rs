//! The per-thread periodic loop.
//!
//! ```text
//! Starting -> Sleeping -> Running -> Recording -> Sleeping -> ...
//! ```
//!
//! Each iteration takes the next release from a [`ReleaseSchedule`]. If the
//! loop top is already past it the iteration is a deadline miss; otherwise
//! the thread blocks until the release on an absolute timer, runs the
//! workload and records its timing into the task's [`RecordSlot`].

use core::fmt;
use core::str::FromStr;

use rtperiod_tracing::{TraceEvent, TracingManager, trace_deadline_miss, trace_wake};
use serde::Serialize;

use crate::cancel::CancellationToken;
use crate::clock::{self, ClockId};
use crate::error::{HarnessError, HarnessResult};
use crate::release::ReleaseSchedule;
use crate::results::{RecordSlot, TimingRecord};
use crate::rt_setup::ObservedSchedule;
use crate::task::TaskConfig;
use crate::time::Timespec;
use crate::workload::WorkloadExecutor;

/// What a task does when it finds itself late for a release.
///
/// Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissPolicy {
    /// Record the miss, cancel every task and fail the run
    #[default]
    Abort,
    /// Record the miss, skip sleep and workload, keep going
    Record,
}

impl MissPolicy {
    /// Name used in configuration
    pub const fn as_str(self) -> &'static str {
        match self {
            MissPolicy::Abort => "abort",
            MissPolicy::Record => "record",
        }
    }
}

impl fmt::Display for MissPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissPolicy {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort" => Ok(MissPolicy::Abort),
            "record" => Ok(MissPolicy::Record),
            other => Err(HarnessError::InvalidConfig(format!(
                "unknown miss policy {other:?} (expected abort or record)"
            ))),
        }
    }
}

/// Where a loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Applying attributes and computing the first release
    Starting,
    /// Blocked until the next release
    Sleeping,
    /// Running the workload
    Running,
    /// Writing the iteration's timing
    Recording,
    /// Left the loop
    Terminated,
}

/// One task's loop, run on that task's thread.
#[derive(Debug)]
pub struct PeriodicTask<'a> {
    config: &'a TaskConfig,
    clock: ClockId,
    miss_policy: MissPolicy,
    workload: WorkloadExecutor<'a>,
    tracer: &'a TracingManager,
    cancel: &'a CancellationToken,
    state: LoopState,
    observe_failed: bool,
}

impl<'a> PeriodicTask<'a> {
    /// Create a loop for `config`.
    pub fn new(
        config: &'a TaskConfig,
        workload: WorkloadExecutor<'a>,
        tracer: &'a TracingManager,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            config,
            clock: ClockId::Monotonic,
            miss_policy: MissPolicy::Abort,
            workload,
            tracer,
            cancel,
            state: LoopState::Starting,
            observe_failed: false,
        }
    }

    /// Set the clock releases are computed on.
    pub fn with_clock(mut self, clock: ClockId) -> Self {
        self.clock = clock;
        self
    }

    /// Set the deadline-miss handling.
    pub fn with_miss_policy(mut self, miss_policy: MissPolicy) -> Self {
        self.miss_policy = miss_policy;
        self
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run until cancelled or a fatal miss, on the calling thread.
    ///
    /// Applies the task's thread attributes first. The slot holds the
    /// latest iteration after every iteration, so it stays meaningful
    /// whichever way the loop ends.
    ///
    /// # Errors
    ///
    /// - [`HarnessError::ThreadAttribute`] if the attributes cannot be applied
    /// - [`HarnessError::DeadlineMiss`] under [`MissPolicy::Abort`]
    /// - [`HarnessError::ClockRead`] or [`HarnessError::Time`] from the clock
    pub fn run(&mut self, slot: &mut RecordSlot<'_>) -> HarnessResult {
        self.state = LoopState::Starting;
        let id = self.config.id();

        let result = self.config.attributes().apply(id).and_then(|()| {
            self.tracer.emit(TraceEvent::TaskStart {
                task: id.0,
                policy: self.config.policy().as_str(),
                priority: self.config.priority(),
            });
            let start = clock::now(self.clock)?;
            let mut schedule = ReleaseSchedule::new(start, self.config.period_us())?;
            let mut record = TimingRecord {
                first_release: schedule.first(),
                ..TimingRecord::new(id)
            };
            self.run_loop(&mut schedule, &mut record, slot)
        });

        self.state = LoopState::Terminated;
        let last = slot.get();
        self.tracer.emit(TraceEvent::TaskTerminated {
            task: id.0,
            response_us: last.response_us,
            deadline_us: last.deadline.as_micros(),
        });
        result
    }

    fn run_loop(
        &mut self,
        schedule: &mut ReleaseSchedule,
        record: &mut TimingRecord,
        slot: &mut RecordSlot<'_>,
    ) -> HarnessResult {
        let id = self.config.id();
        let policy = self.config.policy();

        loop {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            let now = clock::now(self.clock)?;
            let release = schedule.advance()?;
            let iteration = schedule.released();

            if now > release {
                let lateness_us = Timespec::elapsed_micros(release, now)?;
                trace_deadline_miss!(self.tracer, id.0, iteration, lateness_us);

                self.state = LoopState::Recording;
                self.record(record, release, now, now, true)?;
                slot.write(*record);

                match self.miss_policy {
                    MissPolicy::Abort => {
                        self.cancel.cancel();
                        tracing::error!(task = id.0, iteration, lateness_us, "fatal deadline miss");
                        return Err(HarnessError::DeadlineMiss {
                            task: id,
                            iteration,
                            lateness_us,
                        });
                    }
                    MissPolicy::Record => continue,
                }
            }

            self.state = LoopState::Sleeping;
            clock::sleep_until(self.clock, release)?;
            let wake = clock::now(self.clock)?;
            trace_wake!(self.tracer, id.0, iteration);

            self.state = LoopState::Running;
            self.workload.run(id, policy)?;
            let end = clock::now(self.clock)?;

            self.state = LoopState::Recording;
            self.record(record, release, wake, end, false)?;
            slot.write(*record);
        }
    }

    fn observe(&mut self) -> ObservedSchedule {
        match ObservedSchedule::current() {
            Ok(observed) => observed,
            Err(e) => {
                if !self.observe_failed {
                    self.observe_failed = true;
                    tracing::warn!(
                        task = self.config.id().0,
                        error = %e,
                        "cannot observe thread scheduling, reporting requested values"
                    );
                }
                ObservedSchedule::requested(&self.config.attributes())
            }
        }
    }

    fn record(
        &mut self,
        record: &mut TimingRecord,
        release: Timespec,
        wake: Timespec,
        end: Timespec,
        missed: bool,
    ) -> HarnessResult {
        let observed = self.observe();
        let completion = match self.clock {
            ClockId::Monotonic => end,
            ClockId::Realtime | ClockId::ThreadCpuTime => clock::now(ClockId::Monotonic)?,
        };
        // A wall-clock step backwards reads as zero rather than an error.
        let execution_us = Timespec::elapsed_micros(wake, end).unwrap_or(0);
        let response_us = Timespec::elapsed_micros(release, end).unwrap_or(0);

        record.policy = observed.policy;
        record.priority = observed.priority;
        record.cpu = observed.cpu;
        record.start = release;
        record.wake = wake;
        record.end = end;
        record.deadline = release.add_micros(self.config.period_us())?;
        record.completion_us = completion.as_micros();
        record.execution_us = execution_us;
        record.response_us = response_us;
        record.deadline_missed = missed;
        record.iterations = record.iterations.saturating_add(1);
        if missed {
            record.missed_count = record.missed_count.saturating_add(1);
        }
        record.max_response_us = record.max_response_us.max(response_us);
        Ok(())
    }
}
