//! Kernel trace sink for rtperiod task loops.
//!
//! Periodic task loops report their lifecycle (spawn, start, wake, deadline
//! miss, round-robin slice, termination) as [`TraceEvent`]s. The events are
//! routed through a [`TracingProvider`]:
//! - **Linux**: one line per event appended to the ftrace `trace_marker`
//!   file, so the run lines up with scheduler activity in KernelShark
//! - **Other platforms**: structured logging of deadline misses only
//!
//! The sink is optional. When it cannot be opened the provider reports
//! [`TracingError::SinkUnavailable`] once and every later emission is a
//! silent no-op, so a run behaves identically with or without it.
//!
//! # RT-Safety Guarantees
//!
//! - [`TraceEvent`] is `Copy` and formatted into a fixed stack buffer
//! - Emission never blocks: a contended sink drops the event and counts it
//!
//! # Example
//!
//! ```rust,ignore
//! use rtperiod_tracing::{TracingManager, TraceEvent, trace_wake};
//!
//! let mut manager = TracingManager::new();
//! if let Err(e) = manager.initialize() {
//!     eprintln!("tracing disabled: {e}");
//! }
//!
//! trace_wake!(manager, 0, 1);
//! manager.emit(TraceEvent::TaskSpawned { task: 0 });
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod error;
pub mod events;
pub mod macros;
pub mod manager;
pub mod metrics;
pub mod platform;
pub mod prelude;
pub mod provider;

pub use error::TracingError;
pub use events::{EventCategory, TraceEvent};
pub use manager::TracingManager;
pub use metrics::TracingMetrics;
pub use provider::TracingProvider;

/// Default location of the ftrace marker file.
pub const DEFAULT_TRACE_MARKER_PATH: &str = "/sys/kernel/debug/tracing/trace_marker";

/// Maximum length of a single marker line, including the trailing newline.
pub const MARKER_LINE_LEN: usize = 256;
