//! Completion-ordered report of a finished run.

use core::fmt;

use serde::Serialize;

use crate::policy::{SchedPolicy, TaskId};
use crate::results::TimingRecord;

/// Records in completion order: ascending `completion_us`, ties broken by
/// ascending task id.
pub fn sort_by_completion(records: &[TimingRecord]) -> Vec<TimingRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|r| (r.completion_us, r.task_id));
    sorted
}

/// One task's row in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    /// Task identity
    pub task_id: TaskId,
    /// Observed scheduling class name
    pub policy: &'static str,
    /// Observed CPU
    pub cpu: Option<usize>,
    /// Observed priority
    pub priority: i32,
    /// Monotonic microseconds at completion
    pub completion_us: i64,
    /// Workload time of the latest iteration
    pub execution_us: u64,
    /// Release-to-completion time of the latest iteration
    pub response_us: u64,
    /// Worst response time over the run
    pub max_response_us: u64,
    /// Deadline of the latest iteration, microseconds on the release clock
    pub deadline_us: i64,
    /// Iterations performed
    pub iterations: u64,
    /// Missed iterations
    pub misses: u64,
}

impl From<&TimingRecord> for ReportLine {
    fn from(r: &TimingRecord) -> Self {
        Self {
            task_id: r.task_id,
            policy: r.policy.map_or("?", SchedPolicy::as_str),
            cpu: r.cpu,
            priority: r.priority,
            completion_us: r.completion_us,
            execution_us: r.execution_us,
            response_us: r.response_us,
            max_response_us: r.max_response_us,
            deadline_us: r.deadline.as_micros(),
            iterations: r.iterations,
            misses: r.missed_count,
        }
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "completion={} task={} policy={} cpu=",
            self.completion_us, self.task_id, self.policy
        )?;
        match self.cpu {
            Some(cpu) => write!(f, "{cpu}")?,
            None => f.write_str("?")?,
        }
        write!(
            f,
            " priority={} exec={}us response={}us max_response={}us deadline={} iterations={} misses={}",
            self.priority,
            self.execution_us,
            self.response_us,
            self.max_response_us,
            self.deadline_us,
            self.iterations,
            self.misses
        )
    }
}

/// Rows of every task that completed at least one iteration, in completion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    lines: Vec<ReportLine>,
}

impl Report {
    /// Build from the store snapshot.
    pub fn from_records(records: &[TimingRecord]) -> Self {
        let completed: Vec<TimingRecord> = records
            .iter()
            .filter(|r| r.is_completed())
            .copied()
            .collect();
        Self {
            lines: sort_by_completion(&completed)
                .iter()
                .map(ReportLine::from)
                .collect(),
        }
    }

    /// Rows in completion order
    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    /// Whether no task completed
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Missed iterations across all tasks
    pub fn total_misses(&self) -> u64 {
        self.lines
            .iter()
            .fold(0u64, |acc, line| acc.saturating_add(line.misses))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u32, completion_us: i64) -> TimingRecord {
        TimingRecord {
            task_id: TaskId(id),
            completion_us,
            iterations: 1,
            ..TimingRecord::default()
        }
    }

    fn ids(records: &[TimingRecord]) -> Vec<u32> {
        records.iter().map(|r| r.task_id.0).collect()
    }

    #[test]
    fn test_sort_by_completion() {
        let records = [record(0, 300), record(1, 100), record(2, 200)];
        assert_eq!(ids(&sort_by_completion(&records)), vec![1, 2, 0]);
    }

    #[test]
    fn test_sort_breaks_ties_by_task_id() {
        let records = [record(2, 500), record(1, 500)];
        assert_eq!(ids(&sort_by_completion(&records)), vec![1, 2]);
    }

    #[test]
    fn test_report_skips_tasks_that_never_ran() {
        let records = [record(0, 10), TimingRecord::new(TaskId(1)), record(2, 5)];
        let report = Report::from_records(&records);
        let order: Vec<u32> = report.lines().iter().map(|l| l.task_id.0).collect();
        assert_eq!(order, vec![2, 0]);
        assert!(Report::from_records(&[]).is_empty());
    }

    #[test]
    fn test_report_line_display() {
        let r = TimingRecord {
            policy: Some(SchedPolicy::Fifo),
            cpu: Some(1),
            priority: 95,
            execution_us: 5_003,
            response_us: 5_020,
            max_response_us: 5_100,
            missed_count: 1,
            iterations: 12,
            ..record(0, 1_234)
        };
        insta::assert_snapshot!(
            ReportLine::from(&r).to_string(),
            @"completion=1234 task=0 policy=FIFO cpu=1 priority=95 exec=5003us response=5020us max_response=5100us deadline=0 iterations=12 misses=1"
        );
    }

    #[test]
    fn test_report_serializes_to_json() -> Result<(), serde_json::Error> {
        let report = Report::from_records(&[record(3, 77)]);
        let json = serde_json::to_value(&report)?;
        assert_eq!(json.pointer("/lines/0/task_id"), Some(&serde_json::json!(3)));
        assert_eq!(json.pointer("/lines/0/policy"), Some(&serde_json::json!("?")));
        assert_eq!(json.pointer("/lines/0/cpu"), Some(&serde_json::Value::Null));
        Ok(())
    }
}
