//! Shared test utilities for rtperiod.
//!
//! - [`mod@must`] - Unwrap helpers with `#[track_caller]` panic locations
//! - [`assertions`] - Range and ordering assertion macros for timing data
//! - [`prelude`] - Convenience re-exports
//!
//! ```rust,ignore
//! use rtperiod_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod assertions;
pub mod must;
pub mod prelude;

pub use must::*;
