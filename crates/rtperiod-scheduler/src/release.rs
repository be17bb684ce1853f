//! Drift-free release schedule.
//!
//! Each release is the previous release plus one period. The clock is read
//! once, when the schedule is created; late iterations never push later
//! releases back, so errors cannot accumulate.

use crate::time::{TimeError, Timespec};

/// Absolute release times of one periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseSchedule {
    first: Timespec,
    next: Timespec,
    period_us: u64,
    released: u64,
}

impl ReleaseSchedule {
    /// Schedule whose first release is one period after `start`.
    ///
    /// # Errors
    ///
    /// [`TimeError::Overflow`] if the first release does not fit.
    pub fn new(start: Timespec, period_us: u64) -> Result<Self, TimeError> {
        let first = start.add_micros(period_us)?;
        Ok(Self {
            first,
            next: first,
            period_us,
            released: 0,
        })
    }

    /// First release
    pub fn first(&self) -> Timespec {
        self.first
    }

    /// Release the next [`advance`](Self::advance) will hand out
    pub fn next_release(&self) -> Timespec {
        self.next
    }

    /// Period in microseconds
    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Releases handed out so far
    pub fn released(&self) -> u64 {
        self.released
    }

    /// Hand out the current release and step one period forward.
    ///
    /// # Errors
    ///
    /// [`TimeError::Overflow`] if the following release does not fit; the
    /// schedule is left unchanged.
    pub fn advance(&mut self) -> Result<Timespec, TimeError> {
        let current = self.next;
        self.next = current.add_micros(self.period_us)?;
        self.released = self.released.saturating_add(1);
        Ok(current)
    }

    /// Release `index` (0-based), computed directly from the first one.
    ///
    /// # Errors
    ///
    /// [`TimeError::Overflow`] if the offset or the result does not fit.
    pub fn nth(&self, index: u64) -> Result<Timespec, TimeError> {
        let offset = index
            .checked_mul(self.period_us)
            .ok_or(TimeError::Overflow)?;
        self.first.add_micros(offset)
    }
}
