// 💰 Fee Calculator - Elapsed time → amount owed
//
// Billing is per started hour with a one-hour floor:
//   billed_hours = max(ceil(elapsed_seconds / 3600), 1)
//   fee          = billed_hours * rate_per_hour
//
// A stay of 0s, 59s or 3600s costs one hour; 3601s or 5400s costs two.

use crate::error::{LotError, LotResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SECONDS_PER_HOUR: i64 = 3600;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeCalculator {
    pub rate_per_hour: f64,
}

impl FeeCalculator {
    /// A negative or non-finite rate falls back to the default rate.
    pub fn new(rate_per_hour: f64) -> Self {
        if !rate_per_hour.is_finite() || rate_per_hour < 0.0 {
            warn!(
                rate = rate_per_hour,
                fallback = crate::config::DEFAULT_RATE_PER_HOUR,
                "invalid hourly rate, using default"
            );
            return Self::default();
        }
        Self { rate_per_hour }
    }

    /// Seconds between `entry` and `now`; `ClockSkew` if `now` is earlier.
    pub fn elapsed_seconds(entry: DateTime<Utc>, now: DateTime<Utc>) -> LotResult<i64> {
        let elapsed = (now - entry).num_seconds();
        if elapsed < 0 {
            return Err(LotError::ClockSkew {
                entry: entry.timestamp(),
                now: now.timestamp(),
            });
        }
        Ok(elapsed)
    }

    /// Whole hours charged for a stay of `elapsed_seconds`.
    pub fn billed_hours(elapsed_seconds: i64) -> i64 {
        let started = (elapsed_seconds.max(0) + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR;
        started.max(1)
    }

    /// Price a stay. Clock skew is billed as a zero-length stay.
    pub fn compute_fee(&self, entry: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let elapsed = match Self::elapsed_seconds(entry, now) {
            Ok(elapsed) => elapsed,
            Err(e) => {
                warn!(error = %e, "billing minimum charge");
                0
            }
        };
        (Self::billed_hours(elapsed) as f64 * self.rate_per_hour).max(0.0)
    }

    /// Hours parked so far, fractional, for display.
    pub fn hours_parked(entry: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        Self::elapsed_seconds(entry, now).unwrap_or(0) as f64 / SECONDS_PER_HOUR as f64
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        Self {
            rate_per_hour: crate::config::DEFAULT_RATE_PER_HOUR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_zero_elapsed_bills_one_hour() {
        let calc = FeeCalculator::new(100.0);
        assert_eq!(calc.compute_fee(t0(), t0()), 100.0);
    }

    #[test]
    fn test_two_hours() {
        let calc = FeeCalculator::new(100.0);
        assert_eq!(calc.compute_fee(t0(), t0() + Duration::seconds(7200)), 200.0);
    }

    #[test]
    fn test_partial_hour_rounds_up() {
        let calc = FeeCalculator::new(100.0);
        assert_eq!(calc.compute_fee(t0(), t0() + Duration::seconds(5400)), 200.0);
        assert_eq!(calc.compute_fee(t0(), t0() + Duration::seconds(3601)), 200.0);
        assert_eq!(calc.compute_fee(t0(), t0() + Duration::seconds(3600)), 100.0);
        assert_eq!(calc.compute_fee(t0(), t0() + Duration::seconds(30)), 100.0);
    }

    #[test]
    fn test_clock_skew_bills_minimum() {
        let calc = FeeCalculator::new(80.0);
        let fee = calc.compute_fee(t0(), t0() - Duration::hours(3));
        assert_eq!(fee, 80.0);

        let err = FeeCalculator::elapsed_seconds(t0(), t0() - Duration::seconds(1)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::ClockSkew);
    }

    #[test]
    fn test_fee_monotonic_in_time() {
        let calc = FeeCalculator::new(100.0);
        let mut last = 0.0;
        for minutes in (0..600).step_by(7) {
            let fee = calc.compute_fee(t0(), t0() + Duration::minutes(minutes));
            assert!(fee >= last, "fee dropped at {} minutes", minutes);
            last = fee;
        }
    }

    #[test]
    fn test_fee_never_negative() {
        let calc = FeeCalculator::new(-50.0);
        assert_eq!(calc.rate_per_hour, 100.0);
        assert_eq!(FeeCalculator::new(f64::NAN).rate_per_hour, 100.0);

        let tampered = FeeCalculator { rate_per_hour: -10.0 };
        assert_eq!(tampered.compute_fee(t0(), t0() + Duration::hours(2)), 0.0);
    }

    #[test]
    fn test_hours_parked() {
        let hours = FeeCalculator::hours_parked(t0(), t0() + Duration::minutes(90));
        assert!((hours - 1.5).abs() < f64::EPSILON);
    }
}
