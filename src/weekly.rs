//! Weekly aggregation
//!
//! The weekly figure is the plain mean of the daily scores that exist inside
//! the trailing window. Days without a log are left out of both the sum and
//! the count, so a partially logged week is not dragged toward zero.

use crate::config::DEFAULT_WEEKLY_WINDOW;
use crate::types::{window_start, LifeScoreResult, WeeklyAverage};
use chrono::NaiveDate;

/// Averages daily Life Scores over a trailing window
#[derive(Debug, Clone, Copy)]
pub struct WeeklyAggregator {
    window_days: usize,
}

impl Default for WeeklyAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_WEEKLY_WINDOW)
    }
}

impl WeeklyAggregator {
    pub fn new(window_days: usize) -> Self {
        Self { window_days }
    }

    /// First and last date of the window ending at `reference`
    pub fn window(&self, reference: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        window_start(reference, self.window_days).map(|start| (start, reference))
    }

    /// Mean score of the results dated inside the window, or `None` when the
    /// window holds no scored day
    pub fn average(&self, results: &[LifeScoreResult], reference: NaiveDate) -> Option<WeeklyAverage> {
        let (start, end) = self.window(reference)?;
        let scores: Vec<f64> = results
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .map(|r| r.score)
            .collect();

        if scores.is_empty() {
            return None;
        }

        Some(WeeklyAverage {
            reference_date: reference,
            average: scores.iter().sum::<f64>() / scores.len() as f64,
            days_counted: scores.len(),
        })
    }
}
