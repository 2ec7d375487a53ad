//! Wall-clock interval measurement with microsecond resolution.
//!
//! The time source is the monotonic [`Instant`] clock, but intervals are carried
//! as explicit `(seconds, microseconds)` pairs so that the subtraction contract
//! stays observable: a negative result (end before start) is flagged rather than
//! silently absorbed, giving callers an assertion point for timer anomalies.

use std::time::Instant;

/// A point in time expressed as whole seconds plus sub-second microseconds,
/// relative to some caller-chosen origin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timestamp {
    secs: i64,
    micros: i32,
}

impl Timestamp {
    /// Creates a timestamp from an explicit seconds/microseconds pair.
    ///
    /// `micros` is expected to be in `0..1_000_000`; values outside that range
    /// are accepted and simply participate in the borrow arithmetic of
    /// [`Timestamp::delta`].
    #[must_use]
    pub fn new(secs: i64, micros: i32) -> Self {
        Self { secs, micros }
    }

    /// Captures the current time relative to `origin`.
    #[must_use]
    pub fn since(origin: Instant) -> Self {
        let elapsed = origin.elapsed();

        Self {
            secs: i64::try_from(elapsed.as_secs())
                .expect("monotonic elapsed time cannot exceed i64 seconds within a process run"),
            micros: elapsed.subsec_micros() as i32,
        }
    }

    /// Computes `after - before` as a normalized interval.
    ///
    /// When the microsecond subtraction underflows, a second is borrowed so the
    /// microsecond component of the result is always in `0..1_000_000`. A result
    /// with a negative seconds component means `after` was earlier than `before`;
    /// callers must treat that as a timer anomaly, not use it silently.
    #[must_use]
    pub fn delta(before: Self, after: Self) -> TimeDelta {
        let mut secs = after.secs - before.secs;
        let mut micros = after.micros - before.micros;

        if micros < 0 {
            micros += 1_000_000;
            secs -= 1; // borrow
        }

        TimeDelta { secs, micros }
    }
}

/// A normalized time interval: whole seconds plus microseconds in `0..1_000_000`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimeDelta {
    secs: i64,
    micros: i32,
}

impl TimeDelta {
    /// Whole-second component of the interval.
    #[must_use]
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// Sub-second microsecond component, always in `0..1_000_000`.
    #[must_use]
    pub fn subsec_micros(&self) -> i32 {
        self.micros
    }

    /// Whether the interval is negative, i.e. the end timestamp preceded the
    /// start timestamp.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.secs < 0
    }

    /// The interval in microseconds. Negative intervals yield negative values.
    #[must_use]
    pub fn as_micros(&self) -> f64 {
        self.secs as f64 * 1e6 + f64::from(self.micros)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_timestamps_yield_zero() {
        let t = Timestamp::new(12, 345_678);

        let delta = Timestamp::delta(t, t);

        assert_eq!(delta.secs(), 0);
        assert_eq!(delta.subsec_micros(), 0);
        assert!(!delta.is_negative());
        assert_eq!(delta.as_micros(), 0.0);
    }

    #[test]
    fn microsecond_underflow_borrows_a_second() {
        let before = Timestamp::new(1, 800_000);
        let after = Timestamp::new(2, 100_000);

        let delta = Timestamp::delta(before, after);

        assert_eq!(delta.secs(), 0);
        assert_eq!(delta.subsec_micros(), 300_000);
        assert!(!delta.is_negative());
        assert_eq!(delta.as_micros(), 300_000.0);
    }

    #[test]
    fn end_before_start_is_flagged_negative() {
        let before = Timestamp::new(5, 0);
        let after = Timestamp::new(4, 999_000);

        let delta = Timestamp::delta(before, after);

        assert!(delta.is_negative());
        assert_eq!(delta.as_micros(), -1_000.0);
    }

    #[test]
    fn small_negative_interval_keeps_normalized_micros() {
        let before = Timestamp::new(0, 5);
        let after = Timestamp::new(0, 2);

        let delta = Timestamp::delta(before, after);

        assert!(delta.is_negative());
        assert_eq!(delta.secs(), -1);
        assert_eq!(delta.subsec_micros(), 999_997);
        assert_eq!(delta.as_micros(), -3.0);
    }

    #[test]
    fn captured_timestamps_are_monotonic() {
        let origin = Instant::now();

        let before = Timestamp::since(origin);
        let after = Timestamp::since(origin);

        assert!(!Timestamp::delta(before, after).is_negative());
    }
}
