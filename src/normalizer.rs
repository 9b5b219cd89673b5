//! Factor normalization
//!
//! This module maps raw factor values onto a 0-1 "goodness" scale relative to a
//! personal sweet spot:
//! - Gaussian falloff `exp(-z²)` with `z = (raw - optimal) / tolerance`
//! - Exactly 1.0 at the optimum, symmetric, never negative
//! - Missing values resolved by a single swappable policy

use crate::types::{DailyLog, Factor, SweetSpot, UserHistory};
use serde::{Deserialize, Serialize};

/// How a factor missing from a logged day is turned into a raw value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValuePolicy {
    /// Treat the missing value as 0. This is an approximation: it usually
    /// lands far from the optimum and pulls the day's contribution down.
    #[default]
    Zero,
    /// Carry forward the most recent earlier value, or 0 if there is none
    LastKnown,
}

impl MissingValuePolicy {
    /// Raw value of `factor` for `log`, applying the policy when it is absent
    pub fn resolve(&self, log: &DailyLog, factor: Factor, history: &UserHistory) -> f64 {
        if let Some(value) = log.value(factor) {
            return value;
        }
        match self {
            MissingValuePolicy::Zero => 0.0,
            MissingValuePolicy::LastKnown => history
                .last_known_before(factor, log.date)
                .unwrap_or(0.0),
        }
    }
}

/// Normalizer for converting raw factor values to goodness scores
pub struct FactorNormalizer;

impl FactorNormalizer {
    /// Goodness of `raw` against a sweet spot, in [0, 1]
    pub fn normalize(raw: f64, spot: &SweetSpot) -> f64 {
        if spot.tolerance.is_nan() || spot.tolerance <= 0.0 {
            return if raw == spot.optimal { 1.0 } else { 0.0 };
        }

        let z = (raw - spot.optimal) / spot.tolerance;
        let goodness = (-z * z).exp();
        if goodness.is_nan() {
            return 0.0;
        }
        goodness.clamp(0.0, 1.0)
    }

    /// Normalized value of `factor` on a logged day
    pub fn normalize_log(
        log: &DailyLog,
        factor: Factor,
        spot: &SweetSpot,
        policy: MissingValuePolicy,
        history: &UserHistory,
    ) -> f64 {
        let raw = policy.resolve(log, factor, history);
        Self::normalize(raw, spot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_peak_at_optimal() {
        let spot = SweetSpot::new(7.0, 1.5);
        assert_eq!(FactorNormalizer::normalize(7.0, &spot), 1.0);
    }

    #[test]
    fn test_reference_falloff() {
        // activity 5 against optimal 8, tolerance 2: z = -1.5, exp(-2.25)
        let spot = SweetSpot::new(8.0, 2.0);
        let value = FactorNormalizer::normalize(5.0, &spot);
        assert!((value - (-2.25_f64).exp()).abs() < 1e-12);
        assert!((value - 0.1054).abs() < 0.0001);
    }

    #[test]
    fn test_symmetric_and_monotonic() {
        let spot = SweetSpot::new(5.0, 2.0);
        let mut previous = 1.0;
        for step in 1..=40 {
            let distance = step as f64 * 0.25;
            let above = FactorNormalizer::normalize(5.0 + distance, &spot);
            let below = FactorNormalizer::normalize(5.0 - distance, &spot);
            assert!((above - below).abs() < 1e-12);
            assert!(above <= previous);
            previous = above;
        }
    }

    #[test]
    fn test_bounded_for_extreme_inputs() {
        let spot = SweetSpot::new(6.0, 1.5);
        for raw in [-1e300, -50.0, 0.0, 6.0, 12.0, 1e300, f64::INFINITY, f64::NAN] {
            let value = FactorNormalizer::normalize(raw, &spot);
            assert!((0.0..=1.0).contains(&value), "raw {raw} gave {value}");
        }
    }

    #[test]
    fn test_zero_tolerance_is_exact_match_only() {
        let spot = SweetSpot::new(3.0, 0.0);
        assert_eq!(FactorNormalizer::normalize(3.0, &spot), 1.0);
        assert_eq!(FactorNormalizer::normalize(3.1, &spot), 0.0);
    }

    #[test]
    fn test_missing_value_policies() {
        let history = UserHistory::from_logs(vec![
            DailyLog::new(date("2024-03-01")).with(Factor::Sleep, 7.0),
            DailyLog::new(date("2024-03-02")).with(Factor::Mood, 6.0),
        ]);
        let today = history.get(date("2024-03-02")).unwrap();

        assert_eq!(
            MissingValuePolicy::Zero.resolve(today, Factor::Sleep, &history),
            0.0
        );
        assert_eq!(
            MissingValuePolicy::LastKnown.resolve(today, Factor::Sleep, &history),
            7.0
        );
        assert_eq!(
            MissingValuePolicy::LastKnown.resolve(today, Factor::Focus, &history),
            0.0
        );
        // Recorded values are never replaced
        assert_eq!(
            MissingValuePolicy::Zero.resolve(today, Factor::Mood, &history),
            6.0
        );
    }

    #[test]
    fn test_missing_as_zero_is_normalized() {
        let history = UserHistory::new();
        let log = DailyLog::new(date("2024-03-01")).with(Factor::Mood, 5.0);
        let spot = SweetSpot::new(3.0, 2.0);

        let value = FactorNormalizer::normalize_log(
            &log,
            Factor::Social,
            &spot,
            MissingValuePolicy::Zero,
            &history,
        );
        // raw 0 against optimal 3, tolerance 2: z = -1.5
        assert!((value - (-2.25_f64).exp()).abs() < 1e-12);
    }
}
