//! rtperiod - periodic real-time task harness
//!
//! Spawns one periodic thread per task under the chosen scheduling policy,
//! runs a fixed CPU workload every period and prints the tasks' timing in
//! completion order.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rtperiod_scheduler::workload::{DEFAULT_BUSY_US, DEFAULT_SLICE_US};
use rtperiod_scheduler::{
    Affinity, CancellationToken, ClockId, DEFAULT_TASK_CPU, Harness, HarnessConfig, MissPolicy,
    RtSetup, SchedPolicy, WorkloadConfig, task_set,
};
use rtperiod_tracing::TracingManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{CliError, EXIT_FAILURE};

#[derive(Parser, Debug)]
#[command(name = "rtperiod")]
#[command(about = "Run periodic tasks under a scheduling policy and report their timing")]
#[command(version)]
#[command(long_about = "
rtperiod spawns one thread per task period, places each thread in the requested
scheduling class and CPU, and releases it every period on an absolute timer.
Each release runs a fixed amount of CPU work. When the run ends the latest
timing of every task is printed, ordered by completion time.

FIFO and RR usually need CAP_SYS_NICE or root. Use --json for machine-readable
output.
")]
struct Cli {
    /// Scheduling policy for every task
    #[arg(value_enum)]
    policy: PolicyArg,

    /// Task periods in milliseconds, one task per period
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "10,20,30",
        env = "RTPERIOD_PERIODS"
    )]
    periods: Vec<u64>,

    /// Explicit priorities, one per period (default: rate-monotonic)
    #[arg(long, value_delimiter = ',', env = "RTPERIOD_PRIORITIES")]
    priorities: Option<Vec<i32>>,

    /// CPU every task is pinned to, or "any"
    #[arg(long, default_value_t = Affinity::Core(DEFAULT_TASK_CPU), env = "RTPERIOD_CPU")]
    cpu: Affinity,

    /// Stop after this many milliseconds (default: run until interrupted)
    #[arg(long, env = "RTPERIOD_DURATION_MS")]
    duration_ms: Option<u64>,

    /// What a late task does
    #[arg(long, value_enum, default_value_t = MissPolicyArg::Abort, env = "RTPERIOD_MISS_POLICY")]
    miss_policy: MissPolicyArg,

    /// CPU time each iteration burns, in microseconds
    #[arg(long, default_value_t = DEFAULT_BUSY_US, env = "RTPERIOD_BUSY_US")]
    busy_us: u64,

    /// Round-robin slice length tracked by the workload, in microseconds
    #[arg(long, default_value_t = DEFAULT_SLICE_US)]
    slice_us: u64,

    /// Clock releases are computed and slept on
    #[arg(long, value_enum, default_value_t = ClockArg::Monotonic)]
    clock: ClockArg,

    /// Write trace events to this trace_marker file
    #[arg(long, env = "RTPERIOD_TRACE_MARKER", conflicts_with = "no_trace")]
    trace_marker: Option<PathBuf>,

    /// Do not emit trace events
    #[arg(long)]
    no_trace: bool,

    /// CPU the main thread is pinned to, or "any"
    #[arg(long, default_value = "0")]
    main_cpu: Affinity,

    /// Lock all process memory before starting the tasks
    #[arg(long)]
    lock_memory: bool,

    /// Output in JSON format for machine parsing
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum PolicyArg {
    #[value(name = "FIFO")]
    Fifo,
    #[value(name = "RR")]
    Rr,
    #[value(name = "OTHER")]
    Other,
}

impl From<PolicyArg> for SchedPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Fifo => SchedPolicy::Fifo,
            PolicyArg::Rr => SchedPolicy::RoundRobin,
            PolicyArg::Other => SchedPolicy::Other,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum MissPolicyArg {
    Abort,
    Record,
}

impl From<MissPolicyArg> for MissPolicy {
    fn from(arg: MissPolicyArg) -> Self {
        match arg {
            MissPolicyArg::Abort => MissPolicy::Abort,
            MissPolicyArg::Record => MissPolicy::Record,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ClockArg {
    Monotonic,
    Realtime,
}

impl From<ClockArg> for ClockId {
    fn from(arg: ClockArg) -> Self {
        match arg {
            ClockArg::Monotonic => ClockId::Monotonic,
            ClockArg::Realtime => ClockId::Realtime,
        }
    }
}

impl Cli {
    fn harness_config(&self) -> HarnessConfig {
        HarnessConfig::new()
            .with_workload(
                WorkloadConfig::new()
                    .with_busy_us(self.busy_us)
                    .with_slice_us(self.slice_us),
            )
            .with_miss_policy(self.miss_policy.into())
            .with_clock(self.clock.into())
            .with_run_for(self.duration_ms.map(Duration::from_millis))
    }

    fn rt_setup(&self) -> RtSetup {
        RtSetup::new()
            .with_lock_memory(self.lock_memory)
            .with_main_cpu(self.main_cpu.core())
    }

    /// Open the trace sink. An unavailable sink only turns tracing off.
    fn tracer(&self) -> TracingManager {
        if self.no_trace {
            return TracingManager::disabled();
        }

        let mut tracer = match &self.trace_marker {
            Some(path) => TracingManager::with_marker_path(path),
            None => TracingManager::new(),
        };
        match tracer.initialize() {
            Ok(()) => tracing::info!("trace sink ready"),
            Err(e) => {
                tracing::warn!(error = %e, "trace sink unavailable, continuing without trace events");
                tracer.set_enabled(false);
            }
        }
        tracer
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("rtperiod={log_level},rtperiod_scheduler={log_level},rtperiod_tracing={log_level}")
                    .into()
            }),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<CliError>()
        .map_or(EXIT_FAILURE, CliError::exit_code)
}

fn run(cli: &Cli) -> Result<()> {
    let policy = SchedPolicy::from(cli.policy);
    let tasks = task_set(&cli.periods, cli.priorities.as_deref(), policy, cli.cpu)
        .map_err(CliError::from)?;
    let harness =
        Harness::new(tasks, cli.harness_config(), cli.tracer()).map_err(CliError::from)?;

    // Ctrl-C ends the run the same way the duration does
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::info!("interrupted, stopping tasks");
        on_interrupt.cancel();
    })
    .context("failed to install Ctrl-C handler")?;

    let setup = cli.rt_setup().apply();
    tracing::info!(
        policy = %policy,
        tasks = harness.tasks().len(),
        memory_locked = setup.memory_locked,
        main_pinned = ?setup.main_pinned,
        "harness ready"
    );
    if !cli.json {
        output::print_run_start(&harness, policy, &setup);
    }

    let result = harness.run_with_token(&cancel);
    let mut tracer = harness.into_tracer();
    if tracer.is_enabled() {
        let metrics = tracer.metrics();
        if metrics.is_healthy() {
            tracing::info!(%metrics, "trace sink closed");
        } else {
            tracing::warn!(%metrics, "trace events were lost");
        }
    }
    tracer.shutdown();
    let summary = result.map_err(CliError::from)?;

    let report = summary.report();
    if report.is_empty() {
        let first_failure = summary.failures().first().map(|f| f.error.to_string());
        return Err(CliError::NoTaskRan(first_failure).into());
    }

    output::print_summary(&report, summary.failures(), summary.elapsed(), cli.json)?;
    Ok(())
}
