//! Output formatting for CLI responses
//!
//! The report goes to stdout; progress and errors go to stderr.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Error;
use colored::*;
use rtperiod_scheduler::{Harness, Report, RtSetupOutcome, SchedPolicy, TaskFailure};
use serde_json::json;

use crate::error::CliError;

/// Print error in JSON format
pub fn print_error_json(error: &Error) {
    let error_json = json!({
        "success": false,
        "error": {
            "message": error.to_string(),
            "type": error_type_name(error)
        }
    });
    match serde_json::to_string_pretty(&error_json) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Failed to format error as JSON: {e}"),
    }
}

/// Print error in human-readable format
pub fn print_error_human(error: &Error) {
    eprintln!("{} {}", "Error:".red().bold(), error);

    let mut source = error.source();
    while let Some(err) = source {
        eprintln!("  {} {}", "Caused by:".yellow(), err);
        source = err.source();
    }
}

fn error_type_name(error: &Error) -> &'static str {
    match error.downcast_ref::<CliError>() {
        Some(CliError::InvalidConfiguration(_)) => "invalid_configuration",
        Some(CliError::DeadlineMiss(_)) => "deadline_miss",
        Some(CliError::NoTaskRan(_)) => "no_task_ran",
        Some(CliError::Harness(_)) => "harness",
        Some(CliError::JsonError(_)) => "json",
        None => "unknown",
    }
}

/// Announce the run on stderr.
pub fn print_run_start(harness: &Harness, policy: SchedPolicy, setup: &RtSetupOutcome) {
    let periods: Vec<String> = harness
        .tasks()
        .iter()
        .map(|t| t.period_ms().to_string())
        .collect();
    let config = harness.config();

    eprintln!(
        "{} {} tasks under {} (periods {} ms, busy {}us, miss policy {}, {} clock)",
        "Running".green().bold(),
        harness.tasks().len(),
        policy.as_str().bold(),
        periods.join(","),
        config.workload.busy_us,
        config.miss_policy,
        config.clock
    );
    match config.run_for {
        Some(run_for) => eprintln!("  Duration: {} ms", run_for.as_millis()),
        None => eprintln!("  Duration: {}", "until interrupted (Ctrl-C prints the report)".dimmed()),
    }
    if let Some(cpu) = setup.main_pinned {
        eprintln!("  Main thread pinned to CPU {cpu}");
    }
    if setup.memory_locked {
        eprintln!("  Memory locked");
    }
    if !harness.tracer().is_enabled() {
        eprintln!("  Trace events: {}", "off".dimmed());
    }
}

/// Print the finished run's report.
///
/// # Errors
///
/// Returns an error if the JSON document cannot be serialized.
pub fn print_summary(
    report: &Report,
    failures: &[TaskFailure],
    elapsed: Duration,
    json: bool,
) -> Result<(), CliError> {
    if json {
        let output = summary_json(report, failures, elapsed);
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for failure in failures {
        eprintln!(
            "{} task {}: {}",
            "Failed:".red().bold(),
            failure.task,
            failure.error
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = write_report_human(&mut out, report, elapsed) {
        tracing::warn!(error = %e, "failed to write report");
    }
    Ok(())
}

fn summary_json(report: &Report, failures: &[TaskFailure], elapsed: Duration) -> serde_json::Value {
    let failures: Vec<serde_json::Value> = failures
        .iter()
        .map(|f| json!({ "task": f.task, "error": f.error.to_string() }))
        .collect();

    json!({
        "success": true,
        "elapsed_ms": u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        "total_misses": report.total_misses(),
        "report": report,
        "failures": failures
    })
}

/// Write the report lines, one per task in completion order, followed by a
/// miss summary.
pub fn write_report_human<W: Write>(
    out: &mut W,
    report: &Report,
    elapsed: Duration,
) -> io::Result<()> {
    writeln!(
        out,
        "{} ({} tasks, {} ms)",
        "Report".bold(),
        report.lines().len(),
        elapsed.as_millis()
    )?;
    for line in report.lines() {
        writeln!(out, "{line}")?;
    }

    match report.total_misses() {
        0 => writeln!(out, "{}", "No deadline misses".green()),
        misses => writeln!(out, "{} {misses} deadline misses", "!".yellow().bold()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtperiod_scheduler::{HarnessError, TaskId, TimingRecord};

    fn record(id: u32, completion_us: i64, misses: u64) -> TimingRecord {
        TimingRecord {
            policy: Some(SchedPolicy::Other),
            cpu: Some(1),
            completion_us,
            execution_us: 5_001,
            response_us: 5_040,
            max_response_us: 5_090,
            iterations: 10,
            missed_count: misses,
            ..TimingRecord::new(TaskId(id))
        }
    }

    fn render(report: &Report) -> io::Result<String> {
        colored::control::set_override(false);
        let mut out = Vec::new();
        write_report_human(&mut out, report, Duration::from_millis(200))?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_human_report_is_completion_ordered() -> io::Result<()> {
        let report = Report::from_records(&[record(0, 900, 0), record(1, 400, 0)]);
        insta::assert_snapshot!(render(&report)?, @r"
        Report (2 tasks, 200 ms)
        completion=400 task=1 policy=OTHER cpu=1 priority=0 exec=5001us response=5040us max_response=5090us deadline=0 iterations=10 misses=0
        completion=900 task=0 policy=OTHER cpu=1 priority=0 exec=5001us response=5040us max_response=5090us deadline=0 iterations=10 misses=0
        No deadline misses
        ");
        Ok(())
    }

    #[test]
    fn test_human_report_counts_misses() -> io::Result<()> {
        let report = Report::from_records(&[record(0, 10, 2), record(1, 20, 1)]);
        let text = render(&report)?;
        assert!(text.ends_with("! 3 deadline misses\n"));
        Ok(())
    }

    #[test]
    fn test_summary_json_shape() {
        let report = Report::from_records(&[record(2, 50, 1)]);
        let failures = [TaskFailure {
            task: TaskId(0),
            error: HarnessError::TaskPanicked { task: TaskId(0) },
        }];
        let value = summary_json(&report, &failures, Duration::from_millis(120));

        assert_eq!(value.pointer("/success"), Some(&json!(true)));
        assert_eq!(value.pointer("/elapsed_ms"), Some(&json!(120)));
        assert_eq!(value.pointer("/total_misses"), Some(&json!(1)));
        assert_eq!(value.pointer("/report/lines/0/task_id"), Some(&json!(2)));
        assert_eq!(value.pointer("/report/lines/0/policy"), Some(&json!("OTHER")));
        assert_eq!(value.pointer("/failures/0/task"), Some(&json!(0)));
        assert_eq!(
            value.pointer("/failures/0/error"),
            Some(&json!("task 0 panicked"))
        );
    }
}
