//! Temporal lag smoothing
//!
//! A factor's effective value for a date blends the normalized values of that
//! date and the two preceding dates. Days with no log contribute nothing; the
//! remaining weights are not rescaled, so short histories score lower.

use crate::config::LagWeights;
use crate::normalizer::{FactorNormalizer, MissingValuePolicy};
use crate::types::{Factor, SweetSpot, UserHistory};
use chrono::{Days, NaiveDate};

/// Number of days blended into one effective value
pub const LAG_DAYS: usize = 3;

/// Lag smoother over today, yesterday and two days ago
#[derive(Debug, Clone, Copy, Default)]
pub struct LagSmoother {
    weights: LagWeights,
}

impl LagSmoother {
    pub fn new(weights: LagWeights) -> Self {
        Self { weights }
    }

    /// Blend normalized values ordered by day offset (index 0 = today).
    /// `None` marks a day without a log.
    pub fn smooth(&self, values: [Option<f64>; LAG_DAYS]) -> f64 {
        values
            .iter()
            .zip(self.weights.as_array())
            .map(|(value, weight)| value.unwrap_or(0.0) * weight)
            .sum()
    }

    /// Effective value of `factor` at `date`, normalizing each of the three
    /// days against the same sweet spot
    pub fn lagged_factor(
        &self,
        history: &UserHistory,
        factor: Factor,
        date: NaiveDate,
        spot: &SweetSpot,
        policy: MissingValuePolicy,
    ) -> f64 {
        let mut values = [None; LAG_DAYS];
        for (offset, slot) in values.iter_mut().enumerate() {
            let Some(day) = date.checked_sub_days(Days::new(offset as u64)) else {
                continue;
            };
            *slot = history
                .get(day)
                .map(|log| FactorNormalizer::normalize_log(log, factor, spot, policy, history));
        }
        self.smooth(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DailyLog;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_full_three_days() {
        let smoother = LagSmoother::default();
        let value = smoother.smooth([Some(1.0), Some(0.5), Some(0.2)]);
        assert!((value - (0.6 + 0.15 + 0.02)).abs() < 1e-12);
    }

    #[test]
    fn test_today_only_is_not_renormalized() {
        let smoother = LagSmoother::default();
        let value = smoother.smooth([Some(0.8), None, None]);
        assert!((value - 0.6 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_missing_today_still_counts_history() {
        let smoother = LagSmoother::default();
        let value = smoother.smooth([None, Some(1.0), Some(1.0)]);
        assert!((value - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_lagged_factor_from_history() {
        let spot = SweetSpot::new(8.0, 2.0);
        let history = UserHistory::from_logs(vec![
            DailyLog::new(date("2024-03-08")).with(Factor::Sleep, 8.0),
            DailyLog::new(date("2024-03-10")).with(Factor::Sleep, 8.0),
        ]);

        let value = LagSmoother::default().lagged_factor(
            &history,
            Factor::Sleep,
            date("2024-03-10"),
            &spot,
            MissingValuePolicy::Zero,
        );
        // today 1.0, yesterday absent, two days ago 1.0
        assert!((value - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_lagged_factor_single_day() {
        let spot = SweetSpot::new(7.0, 1.5);
        let history =
            UserHistory::from_logs(vec![DailyLog::new(date("2024-03-10")).with(Factor::Sleep, 7.0)]);

        let value = LagSmoother::default().lagged_factor(
            &history,
            Factor::Sleep,
            date("2024-03-10"),
            &spot,
            MissingValuePolicy::Zero,
        );
        assert!((value - 0.6).abs() < 1e-12);
    }
}
