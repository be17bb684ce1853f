//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use rtperiod_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_parse, must_some};
pub use crate::{assert_in_range, assert_sorted, assert_uniform_step};

/// Result type for tests that use `?`
pub type TestResult = Result<(), Box<dyn std::error::Error>>;
