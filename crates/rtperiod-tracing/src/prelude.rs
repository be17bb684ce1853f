//! Prelude for rtperiod-tracing
//!
//! ```rust,ignore
//! use rtperiod_tracing::prelude::*;
//!
//! let manager = TracingManager::new();
//! trace_wake!(manager, 0, 1);
//! ```

pub use crate::{
    EventCategory, TraceEvent, TracingError, TracingManager, TracingMetrics, TracingProvider,
    trace_deadline_miss, trace_if_enabled, trace_wake,
};
