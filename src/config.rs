//! Scoring configuration
//!
//! All model constants live here. The defaults reproduce the reference model;
//! deployments may override any of them from TOML or JSON, and `validate`
//! guards the invariants the pipeline relies on (weight sets sum to one,
//! blend factors stay in [0, 1], windows are non-empty).

use crate::error::ScoreError;
use crate::normalizer::MissingValuePolicy;
use crate::types::{SweetSpot, SweetSpotSet};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Weight of the direct mood signal in the Mood component (α)
pub const DEFAULT_MOOD_ALPHA: f64 = 0.7;

/// Weight of Mood in the final Life Score (β)
pub const DEFAULT_LIFE_BETA: f64 = 0.65;

/// Lower bound for any estimated tolerance
pub const DEFAULT_TOLERANCE_FLOOR: f64 = 1.5;

/// Sweet-spot estimation window in days
pub const DEFAULT_SWEET_SPOT_WINDOW: usize = 14;

/// Weekly average window in days
pub const DEFAULT_WEEKLY_WINDOW: usize = 7;

/// Minimum qualifying days before a sweet spot is estimated instead of defaulted
pub const DEFAULT_MIN_QUALIFYING_DAYS: usize = 2;

pub const DEFAULT_LAG_WEIGHTS: LagWeights = LagWeights {
    today: 0.6,
    yesterday: 0.3,
    two_days_ago: 0.1,
};

pub const DEFAULT_STABILITY_WEIGHTS: StabilityWeights = StabilityWeights {
    sleep: 0.35,
    activity: 0.20,
    focus: 0.30,
    social: 0.15,
};

pub const DEFAULT_BAND_THRESHOLDS: BandThresholds = BandThresholds {
    yellow_from: 50.0,
    green_from: 75.0,
};

/// Fallback sweet spots used until a user has enough history
pub const DEFAULT_SWEET_SPOTS: SweetSpotSet = SweetSpotSet {
    mood: SweetSpot::new(7.0, 2.0),
    sleep: SweetSpot::new(8.0, 2.0),
    activity: SweetSpot::new(5.0, 2.0),
    focus: SweetSpot::new(6.0, 2.0),
    social: SweetSpot::new(3.0, 2.0),
};

/// Tolerated rounding error when checking that a weight set sums to one
const WEIGHT_SUM_EPSILON: f64 = 1e-9;

/// Decay weights for today, yesterday and two days ago
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagWeights {
    pub today: f64,
    pub yesterday: f64,
    pub two_days_ago: f64,
}

impl LagWeights {
    /// Weights ordered by day offset (0 = today)
    pub fn as_array(&self) -> [f64; 3] {
        [self.today, self.yesterday, self.two_days_ago]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

impl Default for LagWeights {
    fn default() -> Self {
        DEFAULT_LAG_WEIGHTS
    }
}

/// Per-factor weights of the Stability component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityWeights {
    pub sleep: f64,
    pub activity: f64,
    pub focus: f64,
    pub social: f64,
}

impl StabilityWeights {
    pub fn sum(&self) -> f64 {
        self.sleep + self.activity + self.focus + self.social
    }
}

impl Default for StabilityWeights {
    fn default() -> Self {
        DEFAULT_STABILITY_WEIGHTS
    }
}

/// Lower bounds (inclusive) of the yellow and green bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub yellow_from: f64,
    pub green_from: f64,
}

impl Default for BandThresholds {
    fn default() -> Self {
        DEFAULT_BAND_THRESHOLDS
    }
}

/// Complete set of tunable scoring constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Mood = alpha * M_eff + (1 - alpha) * M_hat
    pub mood_alpha: f64,
    /// Life = beta * Mood + (1 - beta) * Stability
    pub life_beta: f64,
    pub lag_weights: LagWeights,
    pub stability_weights: StabilityWeights,
    pub band_thresholds: BandThresholds,
    pub default_sweet_spots: SweetSpotSet,
    pub tolerance_floor: f64,
    pub sweet_spot_window_days: usize,
    pub weekly_window_days: usize,
    pub min_qualifying_days: usize,
    pub missing_value_policy: MissingValuePolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            mood_alpha: DEFAULT_MOOD_ALPHA,
            life_beta: DEFAULT_LIFE_BETA,
            lag_weights: DEFAULT_LAG_WEIGHTS,
            stability_weights: DEFAULT_STABILITY_WEIGHTS,
            band_thresholds: DEFAULT_BAND_THRESHOLDS,
            default_sweet_spots: DEFAULT_SWEET_SPOTS,
            tolerance_floor: DEFAULT_TOLERANCE_FLOOR,
            sweet_spot_window_days: DEFAULT_SWEET_SPOT_WINDOW,
            weekly_window_days: DEFAULT_WEEKLY_WINDOW,
            min_qualifying_days: DEFAULT_MIN_QUALIFYING_DAYS,
            missing_value_policy: MissingValuePolicy::default(),
        }
    }
}

impl ScoringConfig {
    /// Parse and validate a TOML configuration
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ScoreError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json(json: &str) -> Result<Self, ScoreError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file; `.json` files are parsed as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self, ScoreError> {
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_toml_str(&contents),
        }
    }

    /// Check the invariants every scoring stage assumes
    pub fn validate(&self) -> Result<(), ScoreError> {
        check_unit_interval("mood_alpha", self.mood_alpha)?;
        check_unit_interval("life_beta", self.life_beta)?;

        let lag = self.lag_weights.as_array();
        check_weight_set("lag_weights", &lag)?;

        let stability = [
            self.stability_weights.sleep,
            self.stability_weights.activity,
            self.stability_weights.focus,
            self.stability_weights.social,
        ];
        check_weight_set("stability_weights", &stability)?;

        let bands = &self.band_thresholds;
        if !(0.0..=100.0).contains(&bands.yellow_from)
            || !(0.0..=100.0).contains(&bands.green_from)
            || bands.yellow_from >= bands.green_from
        {
            return Err(ScoreError::InvalidConfig(format!(
                "band thresholds must satisfy 0 <= yellow_from < green_from <= 100 (got {} and {})",
                bands.yellow_from, bands.green_from
            )));
        }

        if !self.tolerance_floor.is_finite() || self.tolerance_floor <= 0.0 {
            return Err(ScoreError::InvalidConfig(format!(
                "tolerance_floor must be positive (got {})",
                self.tolerance_floor
            )));
        }

        for factor in crate::types::Factor::ALL {
            let spot = self.default_sweet_spots.get(factor);
            if !spot.optimal.is_finite() || !spot.tolerance.is_finite() {
                return Err(ScoreError::InvalidConfig(format!(
                    "default sweet spot for {factor} must be finite"
                )));
            }
            if spot.tolerance < self.tolerance_floor {
                return Err(ScoreError::InvalidConfig(format!(
                    "default tolerance for {factor} ({}) is below the floor ({})",
                    spot.tolerance, self.tolerance_floor
                )));
            }
        }

        if self.sweet_spot_window_days == 0 || self.weekly_window_days == 0 {
            return Err(ScoreError::InvalidConfig(
                "windows must span at least one day".to_string(),
            ));
        }

        if self.min_qualifying_days == 0 {
            return Err(ScoreError::InvalidConfig(
                "min_qualifying_days must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_unit_interval(name: &str, value: f64) -> Result<(), ScoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ScoreError::InvalidConfig(format!(
            "{name} must be within [0, 1] (got {value})"
        )))
    }
}

fn check_weight_set(name: &str, weights: &[f64]) -> Result<(), ScoreError> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ScoreError::InvalidConfig(format!(
            "{name} must be non-negative (got {weights:?})"
        )));
    }
    let sum: f64 = weights.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
        return Err(ScoreError::InvalidConfig(format!(
            "{name} must sum to 1.0 (got {sum})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_weight_sets_sum_to_one() {
        assert!((DEFAULT_LAG_WEIGHTS.sum() - 1.0).abs() < WEIGHT_SUM_EPSILON);
        assert!((DEFAULT_STABILITY_WEIGHTS.sum() - 1.0).abs() < WEIGHT_SUM_EPSILON);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ScoringConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mood_alpha, 0.7);
        assert_eq!(config.life_beta, 0.65);
        assert_eq!(config.lag_weights.as_array(), [0.6, 0.3, 0.1]);
        assert_eq!(config.sweet_spot_window_days, 14);
        assert_eq!(config.weekly_window_days, 7);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ScoringConfig::from_toml_str(
            r#"
            life_beta = 0.5

            [default_sweet_spots.sleep]
            optimal = 7.5
            tolerance = 1.5
            "#,
        )
        .unwrap();

        assert_eq!(config.life_beta, 0.5);
        assert_eq!(config.mood_alpha, DEFAULT_MOOD_ALPHA);
        assert_eq!(config.default_sweet_spots.sleep.optimal, 7.5);
        assert_eq!(config.default_sweet_spots.focus, DEFAULT_SWEET_SPOTS.focus);
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let result = ScoringConfig::from_toml_str(
            r#"
            [stability_weights]
            sleep = 0.5
            activity = 0.2
            focus = 0.3
            social = 0.15
            "#,
        );
        assert!(matches!(result, Err(ScoreError::InvalidConfig(_))));

        let mut config = ScoringConfig::default();
        config.lag_weights.two_days_ago = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let mut config = ScoringConfig::default();
        config.mood_alpha = 1.2;
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.band_thresholds.yellow_from = 80.0;
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.default_sweet_spots.social.tolerance = 1.0;
        assert!(config.validate().is_err());

        let mut config = ScoringConfig::default();
        config.weekly_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let result = ScoringConfig::from_toml_str("alpha = 0.7");
        assert!(matches!(result, Err(ScoreError::ConfigParseError(_))));
    }

    #[test]
    fn test_json_config() {
        let config = ScoringConfig::from_json(r#"{"missing_value_policy": "last_known"}"#).unwrap();
        assert_eq!(config.missing_value_policy, MissingValuePolicy::LastKnown);
    }
}
