//! Mood projection
//!
//! The Mood component blends the user's own lagged mood signal with a proxy
//! derived from Stability. The proxy is the Stability score itself.

use crate::config::DEFAULT_MOOD_ALPHA;
use serde::{Deserialize, Serialize};

/// Mood component together with its two inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoodComponent {
    /// Blended mood (0-1)
    pub value: f64,
    /// Lagged, normalized mood
    pub m_eff: f64,
    /// Stability-derived proxy
    pub m_hat: f64,
}

/// Projector blending direct mood with the Stability proxy
#[derive(Debug, Clone, Copy)]
pub struct MoodProjector {
    alpha: f64,
}

impl Default for MoodProjector {
    fn default() -> Self {
        Self::new(DEFAULT_MOOD_ALPHA)
    }
}

impl MoodProjector {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }

    /// Mood proxy predicted from Stability
    pub fn proxy(stability: f64) -> f64 {
        stability
    }

    /// Mood = alpha * M_eff + (1 - alpha) * M_hat
    pub fn project(&self, m_eff: f64, stability: f64) -> MoodComponent {
        let m_hat = Self::proxy(stability);
        let value = (self.alpha * m_eff + (1.0 - self.alpha) * m_hat).clamp(0.0, 1.0);
        MoodComponent {
            value,
            m_eff,
            m_hat,
        }
    }
}
