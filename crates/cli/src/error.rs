//! Error types for the rtperiod CLI

use rtperiod_scheduler::HarnessError;
use thiserror::Error;

/// Exit code for a run stopped by a fatal deadline miss
pub const EXIT_DEADLINE_MISS: u8 = 3;
/// Exit code for rejected configuration
pub const EXIT_INVALID_CONFIG: u8 = 4;
/// Exit code for anything else
pub const EXIT_FAILURE: u8 = 1;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Run aborted: {0}")]
    DeadlineMiss(#[source] HarnessError),

    #[error("No task completed an iteration{}", .0.as_deref().map(|e| format!(" (first failure: {e})")).unwrap_or_default())]
    NoTaskRan(Option<String>),

    #[error("Harness error: {0}")]
    Harness(#[source] HarnessError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::DeadlineMiss(_) => EXIT_DEADLINE_MISS,
            CliError::InvalidConfiguration(_) => EXIT_INVALID_CONFIG,
            CliError::NoTaskRan(_) | CliError::Harness(_) | CliError::JsonError(_) => EXIT_FAILURE,
        }
    }
}

impl From<HarnessError> for CliError {
    fn from(error: HarnessError) -> Self {
        match error {
            HarnessError::InvalidConfig(msg) => CliError::InvalidConfiguration(msg),
            e @ HarnessError::DeadlineMiss { .. } => CliError::DeadlineMiss(e),
            e => CliError::Harness(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtperiod_scheduler::TaskId;

    #[test]
    fn test_harness_errors_map_to_exit_codes() {
        let miss = CliError::from(HarnessError::DeadlineMiss {
            task: TaskId(0),
            iteration: 2,
            lateness_us: 4_000,
        });
        assert_eq!(miss.exit_code(), EXIT_DEADLINE_MISS);

        let config = CliError::from(HarnessError::InvalidConfig("bad".to_owned()));
        assert_eq!(config.exit_code(), EXIT_INVALID_CONFIG);
        assert_eq!(config.to_string(), "Invalid configuration: bad");

        let panicked = CliError::from(HarnessError::TaskPanicked { task: TaskId(1) });
        assert_eq!(panicked.exit_code(), EXIT_FAILURE);
    }

    #[test]
    fn test_no_task_ran_names_first_failure() {
        assert_eq!(
            CliError::NoTaskRan(None).to_string(),
            "No task completed an iteration"
        );
        assert_eq!(
            CliError::NoTaskRan(Some("denied".to_owned())).to_string(),
            "No task completed an iteration (first failure: denied)"
        );
    }
}
