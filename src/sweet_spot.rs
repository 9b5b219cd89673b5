//! Sweet spot estimation
//!
//! This module derives a personal optimum and tolerance for each factor from a
//! trailing window of the user's own history. Only days on which the user felt
//! at least as good as their median mood are used, so the optimum describes
//! what a good day looks like for this user.
//!
//! Sparse history is not an error: below the qualifying-day minimum the
//! configured default for the factor is returned instead.

use crate::config::ScoringConfig;
use crate::types::{Factor, SweetSpot, SweetSpotSet, UserHistory};
use chrono::NaiveDate;
use tracing::debug;

/// Estimator for per-factor sweet spots
#[derive(Debug, Clone)]
pub struct SweetSpotEstimator {
    window_days: usize,
    tolerance_floor: f64,
    min_qualifying_days: usize,
    defaults: SweetSpotSet,
}

impl Default for SweetSpotEstimator {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl SweetSpotEstimator {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            window_days: config.sweet_spot_window_days,
            tolerance_floor: config.tolerance_floor,
            min_qualifying_days: config.min_qualifying_days,
            defaults: config.default_sweet_spots,
        }
    }

    /// Estimate the sweet spot of `factor` from the window ending at `date`
    pub fn estimate(&self, history: &UserHistory, factor: Factor, date: NaiveDate) -> SweetSpot {
        let moods: Vec<f64> = history
            .window(date, self.window_days)
            .filter_map(|log| log.mood)
            .filter(|m| m.is_finite())
            .collect();

        let Some(median_mood) = median(moods) else {
            return self.fallback(factor, date, 0);
        };

        // Values of the factor on days at or above the median mood
        let values: Vec<f64> = history
            .window(date, self.window_days)
            .filter(|log| log.mood.is_some_and(|m| m >= median_mood))
            .filter_map(|log| log.value(factor))
            .filter(|v| v.is_finite())
            .collect();

        if values.len() < self.min_qualifying_days {
            return self.fallback(factor, date, values.len());
        }

        let optimal = mean(&values);
        let tolerance = population_std_dev(&values, optimal).max(self.tolerance_floor);

        SweetSpot::estimated(optimal, tolerance, values.len())
    }

    /// Estimate sweet spots for every factor
    pub fn estimate_all(&self, history: &UserHistory, date: NaiveDate) -> SweetSpotSet {
        SweetSpotSet::from_fn(|factor| self.estimate(history, factor, date))
    }

    fn fallback(&self, factor: Factor, date: NaiveDate, qualifying: usize) -> SweetSpot {
        debug!(
            %factor,
            %date,
            qualifying,
            required = self.min_qualifying_days,
            "insufficient history for sweet spot, using default"
        );
        *self.defaults.get(factor)
    }
}

/// Median of a sample; mean of the two middle values for even sizes
fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
