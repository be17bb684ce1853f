//! Counters a trace provider keeps about its sink

/// Snapshot of a provider's counters
///
/// Providers count with atomics on the emit path and copy them into this
/// struct on request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracingMetrics {
    /// Events written to the sink
    pub events_emitted: u64,

    /// Events dropped because another thread held the sink
    pub events_dropped: u64,

    /// Deadline-miss events seen, written or not
    pub deadline_misses: u64,

    /// Writes the sink rejected
    pub write_failures: u64,
}

impl TracingMetrics {
    /// Events that never reached the sink
    pub fn events_lost(&self) -> u64 {
        self.events_dropped.saturating_add(self.write_failures)
    }

    /// Fraction of events that never reached the sink
    pub fn drop_rate(&self) -> f64 {
        let lost = self.events_lost();
        let total = self.events_emitted.saturating_add(lost);
        if total == 0 {
            return 0.0;
        }
        (lost as f64) / (total as f64)
    }

    /// Under 1% dropped and no failed writes
    pub fn is_healthy(&self) -> bool {
        self.drop_rate() < 0.01 && self.write_failures == 0
    }
}

impl core::fmt::Display for TracingMetrics {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "emitted={} dropped={} misses={} write_failures={} drop_rate={:.2}%",
            self.events_emitted,
            self.events_dropped,
            self.deadline_misses,
            self.write_failures,
            self.drop_rate() * 100.0
        )
    }
}
