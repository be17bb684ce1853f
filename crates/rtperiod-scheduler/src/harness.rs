//! Runs a task set: one scoped thread per task, supervised until the run
//! duration elapses, a fatal miss cancels the run, or every task has ended.

use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use rtperiod_tracing::{TraceEvent, TracingManager};

use crate::cancel::CancellationToken;
use crate::clock::ClockId;
use crate::error::{HarnessError, HarnessResult};
use crate::periodic::{MissPolicy, PeriodicTask};
use crate::policy::TaskId;
use crate::report::Report;
use crate::results::{ResultsStore, TimingRecord};
use crate::task::TaskConfig;
use crate::workload::{WorkloadConfig, WorkloadExecutor};

/// How often the supervising thread checks on the tasks.
const SUPERVISE_POLL: Duration = Duration::from_millis(1);

/// Run-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HarnessConfig {
    /// Workload every task runs per iteration
    pub workload: WorkloadConfig,
    /// Deadline-miss handling
    pub miss_policy: MissPolicy,
    /// Clock releases are computed and slept on
    pub clock: ClockId,
    /// Cancel the run after this long; `None` runs until a fatal miss or
    /// until every task has ended
    pub run_for: Option<Duration>,
}

impl HarnessConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the workload.
    pub fn with_workload(mut self, workload: WorkloadConfig) -> Self {
        self.workload = workload;
        self
    }

    /// Set the deadline-miss handling.
    pub fn with_miss_policy(mut self, miss_policy: MissPolicy) -> Self {
        self.miss_policy = miss_policy;
        self
    }

    /// Set the release clock.
    pub fn with_clock(mut self, clock: ClockId) -> Self {
        self.clock = clock;
        self
    }

    /// Set the run duration.
    pub fn with_run_for(mut self, run_for: Option<Duration>) -> Self {
        self.run_for = run_for;
        self
    }

    /// Check the settings can drive a run.
    ///
    /// # Errors
    ///
    /// [`HarnessError::InvalidConfig`] for a clock threads cannot sleep on or
    /// a zero workload.
    pub fn validate(&self) -> HarnessResult {
        if !self.clock.supports_absolute_sleep() {
            return Err(HarnessError::InvalidConfig(format!(
                "{} cannot be used as the release clock",
                self.clock
            )));
        }
        if !self.workload.is_valid() {
            return Err(HarnessError::InvalidConfig(
                "workload busy and slice times must be positive".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A task that ended with an error that did not stop the run.
#[derive(Debug)]
pub struct TaskFailure {
    /// Failed task
    pub task: TaskId,
    /// Why it ended
    pub error: HarnessError,
}

/// Outcome of a run that was not cut short by a fatal miss.
#[derive(Debug)]
pub struct RunSummary {
    records: Vec<TimingRecord>,
    failures: Vec<TaskFailure>,
    elapsed: Duration,
}

impl RunSummary {
    /// One record per task, in task-id order
    pub fn records(&self) -> &[TimingRecord] {
        &self.records
    }

    /// Tasks that ended with an error
    pub fn failures(&self) -> &[TaskFailure] {
        &self.failures
    }

    /// Wall time from first spawn to last join
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Completion-ordered report of the tasks that ran
    pub fn report(&self) -> Report {
        Report::from_records(&self.records)
    }
}

/// Spawns and supervises one periodic loop per task.
#[derive(Debug)]
pub struct Harness {
    tasks: Vec<TaskConfig>,
    config: HarnessConfig,
    tracer: TracingManager,
}

impl Harness {
    /// Create a harness for a dense task set.
    ///
    /// # Errors
    ///
    /// [`HarnessError::InvalidConfig`] if the set is empty, task `i` does not
    /// have id `i`, or [`HarnessConfig::validate`] fails.
    pub fn new(
        tasks: Vec<TaskConfig>,
        config: HarnessConfig,
        tracer: TracingManager,
    ) -> HarnessResult<Self> {
        if tasks.is_empty() {
            return Err(HarnessError::InvalidConfig("no tasks to run".to_owned()));
        }
        if let Some((index, task)) = tasks
            .iter()
            .enumerate()
            .find(|(index, task)| task.id().index() != *index)
        {
            return Err(HarnessError::InvalidConfig(format!(
                "task at position {index} has id {}",
                task.id()
            )));
        }
        config.validate()?;

        Ok(Self {
            tasks,
            config,
            tracer,
        })
    }

    /// Task set
    pub fn tasks(&self) -> &[TaskConfig] {
        &self.tasks
    }

    /// Run-wide settings
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Trace sink shared by the tasks
    pub fn tracer(&self) -> &TracingManager {
        &self.tracer
    }

    /// Give back the trace sink, e.g. to shut it down.
    pub fn into_tracer(self) -> TracingManager {
        self.tracer
    }

    /// Run with a fresh cancellation token.
    ///
    /// # Errors
    ///
    /// See [`Harness::run_with_token`].
    pub fn run(&self) -> HarnessResult<RunSummary> {
        self.run_with_token(&CancellationToken::new())
    }

    /// Run until `cancel` is set, the run duration elapses or every task has
    /// ended, then join all tasks.
    ///
    /// Per-task failures are collected in [`RunSummary::failures`].
    ///
    /// # Errors
    ///
    /// [`HarnessError::DeadlineMiss`] if a task missed under
    /// [`MissPolicy::Abort`]; no summary is produced.
    pub fn run_with_token(&self, cancel: &CancellationToken) -> HarnessResult<RunSummary> {
        let mut store = ResultsStore::new(self.tasks.len())?;
        tracing::info!(
            tasks = self.tasks.len(),
            clock = %self.config.clock,
            miss_policy = %self.config.miss_policy,
            busy_us = self.config.workload.busy_us,
            run_for_ms = self.config.run_for.map(|d| d.as_millis()),
            "starting run"
        );

        let started = Instant::now();
        let outcomes = thread::scope(|scope| {
            let mut outcomes = Vec::with_capacity(self.tasks.len());
            let mut handles = Vec::with_capacity(self.tasks.len());

            for (task, mut slot) in self.tasks.iter().zip(store.slots_mut()) {
                let workload = WorkloadExecutor::new(self.config.workload, &self.tracer);
                let mut periodic = PeriodicTask::new(task, workload, &self.tracer, cancel)
                    .with_clock(self.config.clock)
                    .with_miss_policy(self.config.miss_policy);

                let spawned = thread::Builder::new()
                    .name(format!("rtperiod-{}", task.id()))
                    .spawn_scoped(scope, move || periodic.run(&mut slot));

                match spawned {
                    Ok(handle) => {
                        self.tracer.emit(TraceEvent::TaskSpawned { task: task.id().0 });
                        handles.push((task.id(), handle));
                    }
                    Err(source) => {
                        outcomes.push((
                            task.id(),
                            Err(HarnessError::ThreadSpawn {
                                task: task.id(),
                                source,
                            }),
                        ));
                    }
                }
            }

            self.supervise(cancel, started, &handles);

            for (task, handle) in handles {
                let result = handle
                    .join()
                    .unwrap_or_else(|_| Err(HarnessError::TaskPanicked { task }));
                outcomes.push((task, result));
            }
            outcomes
        });
        let elapsed = started.elapsed();

        let mut fatal = None;
        let mut failures = Vec::new();
        for (task, result) in outcomes {
            match result {
                Ok(()) => {}
                Err(error) if error.is_fatal_to_run() => {
                    tracing::error!(task = task.0, error = %error, "run aborted");
                    if fatal.is_none() {
                        fatal = Some(error);
                    }
                }
                Err(error) => {
                    tracing::error!(task = task.0, error = %error, "task failed");
                    failures.push(TaskFailure { task, error });
                }
            }
        }
        if let Some(error) = fatal {
            return Err(error);
        }

        tracing::info!(
            elapsed_ms = elapsed.as_millis(),
            failures = failures.len(),
            "run finished"
        );
        Ok(RunSummary {
            records: store.snapshot(),
            failures,
            elapsed,
        })
    }

    /// Wait for cancellation, the run duration, or every task ending; then
    /// make sure every task sees the cancellation.
    fn supervise(
        &self,
        cancel: &CancellationToken,
        started: Instant,
        handles: &[(TaskId, ScopedJoinHandle<'_, HarnessResult>)],
    ) {
        let stop_at = self
            .config
            .run_for
            .and_then(|run_for| started.checked_add(run_for));

        loop {
            if cancel.is_cancelled() || handles.iter().all(|(_, h)| h.is_finished()) {
                break;
            }
            let poll = match stop_at {
                Some(stop_at) => {
                    let remaining = stop_at.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        tracing::info!("run duration elapsed, cancelling tasks");
                        break;
                    }
                    remaining.min(SUPERVISE_POLL)
                }
                None => SUPERVISE_POLL,
            };
            thread::sleep(poll);
        }
        cancel.cancel();
    }
}
