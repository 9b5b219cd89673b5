//! Stability aggregation
//!
//! Stability is a fixed weighted sum of the four lagged, normalized lifestyle
//! factors. The weights must sum to one so Stability stays in [0, 1].

use crate::config::StabilityWeights;
use crate::types::LifestyleValues;

/// Weighted aggregator for the Stability component
#[derive(Debug, Clone, Copy, Default)]
pub struct StabilityAggregator {
    weights: StabilityWeights,
}

impl StabilityAggregator {
    pub fn new(weights: StabilityWeights) -> Self {
        debug_assert!(
            (weights.sum() - 1.0).abs() < 1e-9,
            "stability weights must sum to 1.0"
        );
        Self { weights }
    }

    /// Stability score (0-1) from lagged lifestyle values
    pub fn aggregate(&self, values: &LifestyleValues) -> f64 {
        let w = &self.weights;
        let stability = w.sleep * values.sleep
            + w.activity * values.activity
            + w.focus * values.focus
            + w.social * values.social;
        stability.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_STABILITY_WEIGHTS;
    use crate::normalizer::FactorNormalizer;
    use crate::types::SweetSpot;

    #[test]
    fn test_weights_sum_to_one() {
        assert!((DEFAULT_STABILITY_WEIGHTS.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_all_perfect_is_one() {
        let values = LifestyleValues {
            sleep: 1.0,
            activity: 1.0,
            focus: 1.0,
            social: 1.0,
        };
        let stability = StabilityAggregator::default().aggregate(&values);
        assert!((stability - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_sum() {
        let values = LifestyleValues {
            sleep: 1.0,
            activity: 0.0,
            focus: 0.5,
            social: 0.0,
        };
        let stability = StabilityAggregator::default().aggregate(&values);
        assert!((stability - (0.35 + 0.15)).abs() < 1e-12);
    }

    #[test]
    fn test_hand_computed_reference_day() {
        // sleep 7h against 7 / 1.5, activity 5 against 8 / 2,
        // focus 4 against 6 / 2, social 3 against 3 / 2
        let sleep = FactorNormalizer::normalize(7.0, &SweetSpot::new(7.0, 1.5));
        let activity = FactorNormalizer::normalize(5.0, &SweetSpot::new(8.0, 2.0));
        let focus = FactorNormalizer::normalize(4.0, &SweetSpot::new(6.0, 2.0));
        let social = FactorNormalizer::normalize(3.0, &SweetSpot::new(3.0, 2.0));

        assert_eq!(sleep, 1.0);
        assert!((activity - 0.105_399_224_561_864_3).abs() < 1e-15);
        assert!((focus - 0.367_879_441_171_442_3).abs() < 1e-15);
        assert_eq!(social, 1.0);

        let stability = StabilityAggregator::default().aggregate(&LifestyleValues {
            sleep,
            activity,
            focus,
            social,
        });
        // 0.35 + 0.20 * 0.1053992 + 0.30 * 0.3678794 + 0.15
        let expected = 0.35 + 0.20 * 0.105_399_224_561_864_3 + 0.30 * 0.367_879_441_171_442_3 + 0.15;
        assert!((stability - expected).abs() < 1e-12);
        assert!((stability - 0.631_443_677).abs() < 1e-9);
    }
}
