//! Time interval type shared by measurements, states and candidates.
//!
//! All timestamps in the pipeline are integer nanoseconds.

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};

/// Nanoseconds in one second.
pub const NANOSECONDS_PER_SECOND: i64 = 1_000_000_000;

/// A closed time interval `[start, stop]` in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    start: i64,
    stop: i64,
}

impl TimeRange {
    /// Create a new time range. `stop` must not precede `start`.
    pub fn new(start: i64, stop: i64) -> Result<Self> {
        if stop < start {
            return Err(Error::InvalidArgument(format!(
                "time range stop {} precedes start {}",
                stop, start
            )));
        }
        Ok(Self { start, stop })
    }

    /// A zero-length range for an instantaneous reading.
    pub fn instant(timestamp: i64) -> Self {
        Self {
            start: timestamp,
            stop: timestamp,
        }
    }

    /// Start of the interval.
    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// End of the interval.
    #[inline]
    pub fn stop(&self) -> i64 {
        self.stop
    }

    /// Length of the interval in nanoseconds.
    #[inline]
    pub fn duration(&self) -> i64 {
        self.stop - self.start
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.min(other.start),
            stop: self.stop.max(other.stop),
        }
    }

    /// Whether `timestamp` lies within the interval (inclusive).
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_range() {
        assert!(TimeRange::new(10, 5).is_err());
    }

    #[test]
    fn test_instant_has_zero_duration() {
        let range = TimeRange::instant(42);
        assert_eq!(range.duration(), 0);
        assert!(range.contains(42));
    }

    #[test]
    fn test_union_covers_both() {
        let a = TimeRange::new(10, 20).unwrap();
        let b = TimeRange::new(15, 30).unwrap();
        let u = a.union(&b);
        assert_eq!(u.start(), 10);
        assert_eq!(u.stop(), 30);
    }
}
