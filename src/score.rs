//! Life Score calculation and banding

use crate::config::{BandThresholds, DEFAULT_LIFE_BETA};
use crate::types::Band;

/// Calculator combining Mood and Stability into a 0-100 score
#[derive(Debug, Clone, Copy)]
pub struct LifeScoreCalculator {
    beta: f64,
    thresholds: BandThresholds,
}

impl Default for LifeScoreCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_LIFE_BETA, BandThresholds::default())
    }
}

impl LifeScoreCalculator {
    pub fn new(beta: f64, thresholds: BandThresholds) -> Self {
        Self { beta, thresholds }
    }

    /// score = 100 * (beta * mood + (1 - beta) * stability)
    pub fn score(&self, mood: f64, stability: f64) -> f64 {
        (100.0 * (self.beta * mood + (1.0 - self.beta) * stability)).clamp(0.0, 100.0)
    }

    /// Band of a score; each threshold belongs to the band above it
    pub fn band(&self, score: f64) -> Band {
        if score >= self.thresholds.green_from {
            Band::Green
        } else if score >= self.thresholds.yellow_from {
            Band::Yellow
        } else {
            Band::Red
        }
    }

    pub fn calculate(&self, mood: f64, stability: f64) -> (f64, Band) {
        let score = self.score(mood, stability);
        (score, self.band(score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_band_boundaries() {
        let calc = LifeScoreCalculator::default();
        assert_eq!(calc.band(0.0), Band::Red);
        assert_eq!(calc.band(49.999), Band::Red);
        assert_eq!(calc.band(50.0), Band::Yellow);
        assert_eq!(calc.band(74.999), Band::Yellow);
        assert_eq!(calc.band(75.0), Band::Green);
        assert_eq!(calc.band(100.0), Band::Green);
    }

    #[test]
    fn test_score_blend() {
        let calc = LifeScoreCalculator::default();
        let score = calc.score(0.8, 0.4);
        assert!((score - 100.0 * (0.65 * 0.8 + 0.35 * 0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_score_bounds() {
        let calc = LifeScoreCalculator::default();
        for mood in [0.0, 0.1, 0.5, 0.9, 1.0] {
            for stability in [0.0, 0.2, 0.7, 1.0] {
                let (score, _) = calc.calculate(mood, stability);
                assert!((0.0..=100.0).contains(&score));
            }
        }
        assert_eq!(calc.score(0.0, 0.0), 0.0);
        assert!((calc.score(1.0, 1.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_custom_thresholds() {
        let calc = LifeScoreCalculator::new(
            0.65,
            BandThresholds {
                yellow_from: 40.0,
                green_from: 60.0,
            },
        );
        assert_eq!(calc.band(45.0), Band::Yellow);
        assert_eq!(calc.band(60.0), Band::Green);
    }
}
