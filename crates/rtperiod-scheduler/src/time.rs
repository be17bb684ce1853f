//! Absolute-time arithmetic on `(seconds, nanoseconds)` timestamps.
//!
//! Every release and deadline in a task loop is a [`Timespec`] read from, or
//! derived from, a POSIX clock. The helpers here are total: overflow and
//! reversed intervals are reported as [`TimeError`] instead of wrapping.

use core::cmp::Ordering;
use core::fmt;

use serde::Serialize;

/// Nanoseconds in one second.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Nanoseconds in one microsecond.
pub const NANOS_PER_MICRO: i64 = 1_000;

/// Microseconds in one second.
pub const MICROS_PER_SEC: i64 = 1_000_000;

const MICROS_PER_SEC_U64: u64 = 1_000_000;

/// Time arithmetic errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// Result does not fit in the timestamp range
    #[error("timestamp arithmetic overflowed")]
    Overflow,

    /// Interval end precedes its start
    #[error("interval end {end} precedes start {start}")]
    InvalidInterval {
        /// Interval start
        start: Timespec,
        /// Interval end
        end: Timespec,
    },
}

/// A point on a POSIX clock.
///
/// `nsec` is always in `[0, 1_000_000_000)`, so the derived ordering on
/// `(sec, nsec)` is the chronological one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timespec {
    sec: i64,
    nsec: i64,
}

impl Timespec {
    /// The clock epoch.
    pub const ZERO: Timespec = Timespec { sec: 0, nsec: 0 };

    /// Build a timestamp, folding any out-of-range `nsec` into `sec`.
    ///
    /// # Errors
    ///
    /// [`TimeError::Overflow`] if the folded seconds do not fit.
    pub fn new(sec: i64, nsec: i64) -> Result<Self, TimeError> {
        let carry = nsec.div_euclid(NANOS_PER_SEC);
        let sec = sec.checked_add(carry).ok_or(TimeError::Overflow)?;
        Ok(Self {
            sec,
            nsec: nsec.rem_euclid(NANOS_PER_SEC),
        })
    }

    /// Timestamp `us` microseconds after the epoch (negative is before).
    pub const fn from_micros(us: i64) -> Self {
        Self {
            sec: us.div_euclid(MICROS_PER_SEC),
            nsec: us.rem_euclid(MICROS_PER_SEC) * NANOS_PER_MICRO,
        }
    }

    /// Whole seconds
    pub const fn sec(&self) -> i64 {
        self.sec
    }

    /// Nanoseconds within the second
    pub const fn nsec(&self) -> i64 {
        self.nsec
    }

    /// Add `us` microseconds, carrying whole seconds.
    ///
    /// # Errors
    ///
    /// [`TimeError::Overflow`] if the seconds field would overflow.
    pub fn add_micros(self, us: u64) -> Result<Self, TimeError> {
        let Ok(whole_secs) = i64::try_from(us / MICROS_PER_SEC_U64) else {
            return Err(TimeError::Overflow);
        };
        let Ok(sub_micros) = i64::try_from(us % MICROS_PER_SEC_U64) else {
            return Err(TimeError::Overflow);
        };

        let mut sec = self.sec.checked_add(whole_secs).ok_or(TimeError::Overflow)?;
        // Both terms are below one second, so one carry is enough.
        let mut nsec = self
            .nsec
            .checked_add(sub_micros.saturating_mul(NANOS_PER_MICRO))
            .ok_or(TimeError::Overflow)?;
        if nsec >= NANOS_PER_SEC {
            nsec = nsec.saturating_sub(NANOS_PER_SEC);
            sec = sec.checked_add(1).ok_or(TimeError::Overflow)?;
        }

        Ok(Self { sec, nsec })
    }

    /// Chronological comparison
    pub fn compare(a: &Self, b: &Self) -> Ordering {
        a.cmp(b)
    }

    /// Microseconds since the clock epoch, truncating sub-microsecond
    /// nanoseconds and saturating at the `i64` range.
    pub fn as_micros(self) -> i64 {
        self.sec
            .saturating_mul(MICROS_PER_SEC)
            .saturating_add(self.nsec / NANOS_PER_MICRO)
    }

    /// Microseconds from `start` to `end`.
    ///
    /// # Errors
    ///
    /// - [`TimeError::InvalidInterval`] if `end` precedes `start`
    /// - [`TimeError::Overflow`] if the span does not fit
    pub fn elapsed_micros(start: Self, end: Self) -> Result<u64, TimeError> {
        Self::elapsed_nanos(start, end).map(|ns| ns / 1_000)
    }

    /// Nanoseconds from `start` to `end`.
    ///
    /// # Errors
    ///
    /// Same as [`Timespec::elapsed_micros`].
    pub fn elapsed_nanos(start: Self, end: Self) -> Result<u64, TimeError> {
        if end < start {
            return Err(TimeError::InvalidInterval { start, end });
        }

        let mut sec = end.sec.checked_sub(start.sec).ok_or(TimeError::Overflow)?;
        let mut nsec = end.nsec.saturating_sub(start.nsec);
        if nsec < 0 {
            nsec = nsec.saturating_add(NANOS_PER_SEC);
            sec = sec.saturating_sub(1);
        }

        let (Ok(sec), Ok(nsec)) = (u64::try_from(sec), u64::try_from(nsec)) else {
            return Err(TimeError::Overflow);
        };
        sec.checked_mul(1_000_000_000)
            .and_then(|ns| ns.checked_add(nsec))
            .ok_or(TimeError::Overflow)
    }
}

impl fmt::Display for Timespec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(sec: i64, nsec: i64) -> Timespec {
        match Timespec::new(sec, nsec) {
            Ok(t) => t,
            Err(e) => panic!("timespec({sec}, {nsec}): {e}"),
        }
    }

    #[test]
    fn test_new_folds_nanoseconds() {
        assert_eq!(ts(1, 1_500_000_000), ts(2, 500_000_000));
        assert_eq!(ts(1, -1), ts(0, 999_999_999));
        assert_eq!(Timespec::new(i64::MAX, NANOS_PER_SEC), Err(TimeError::Overflow));
    }

    #[test]
    fn test_add_micros_carries_single_second() -> Result<(), TimeError> {
        let t = ts(10, 999_500_000).add_micros(1_000)?;
        assert_eq!(t, ts(11, 500_000));
        Ok(())
    }

    #[test]
    fn test_add_micros_carries_many_seconds() -> Result<(), TimeError> {
        let t = ts(1, 900_000_000).add_micros(3_200_000)?;
        assert_eq!(t, ts(5, 100_000_000));
        assert_eq!(t.nsec(), 100_000_000);
        Ok(())
    }

    #[test]
    fn test_add_micros_overflow_is_reported() {
        assert_eq!(ts(i64::MAX, 0).add_micros(1_000_000), Err(TimeError::Overflow));
        assert_eq!(
            ts(i64::MAX, 999_999_999).add_micros(1),
            Err(TimeError::Overflow)
        );
    }

    #[test]
    fn test_compare_is_lexicographic() {
        assert_eq!(Timespec::compare(&ts(1, 5), &ts(2, 0)), Ordering::Less);
        assert_eq!(Timespec::compare(&ts(2, 5), &ts(2, 4)), Ordering::Greater);
        assert_eq!(Timespec::compare(&ts(3, 3), &ts(3, 3)), Ordering::Equal);
    }

    #[test]
    fn test_as_micros_truncates_nanoseconds() {
        assert_eq!(ts(2, 345_678_999).as_micros(), 2_345_678);
        assert_eq!(Timespec::from_micros(-1).as_micros(), -1);
        assert_eq!(ts(i64::MAX, 0).as_micros(), i64::MAX);
    }

    #[test]
    fn test_elapsed_borrows_from_seconds() -> Result<(), TimeError> {
        let start = ts(5, 900_000_000);
        let end = ts(7, 100_000_000);
        assert_eq!(Timespec::elapsed_micros(start, end)?, 1_200_000);
        assert_eq!(Timespec::elapsed_micros(end, end)?, 0);
        Ok(())
    }

    #[test]
    fn test_elapsed_rejects_reversed_interval() {
        let start = ts(7, 0);
        let end = ts(6, 999_999_999);
        assert_eq!(
            Timespec::elapsed_micros(start, end),
            Err(TimeError::InvalidInterval { start, end })
        );
    }

    #[test]
    fn test_display_pads_nanoseconds() {
        assert_eq!(ts(12, 5_000).to_string(), "12.000005000");
    }
}
