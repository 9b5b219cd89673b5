//! Pipeline orchestration
//!
//! This module provides the public scoring API. `LifeScorer` is the pure
//! pipeline from a history snapshot to a scored day; `LifeScoreEngine` binds
//! a scorer to a `HistoryStore` for callers that work with user ids.

use crate::config::ScoringConfig;
use crate::error::ScoreError;
use crate::lag::LagSmoother;
use crate::mood::MoodProjector;
use crate::score::LifeScoreCalculator;
use crate::stability::StabilityAggregator;
use crate::store::HistoryStore;
use crate::sweet_spot::SweetSpotEstimator;
use crate::types::{
    DailyLog, Factor, LifeScoreResult, LifestyleValues, ScoreBreakdown, SweetSpotSet, UserHistory,
    WeeklyAverage,
};
use crate::weekly::WeeklyAggregator;
use chrono::NaiveDate;
use tracing::debug;

/// Pure scoring pipeline over a history snapshot.
///
/// Pipeline stages:
/// 1. SweetSpotEstimator - Personal optimum and tolerance per factor
/// 2. FactorNormalizer - Raw values to 0-1 goodness (inside the smoother)
/// 3. LagSmoother - Blend today with the two previous days
/// 4. StabilityAggregator / MoodProjector - The two components
/// 5. LifeScoreCalculator - Final 0-100 score and band
#[derive(Debug, Clone)]
pub struct LifeScorer {
    config: ScoringConfig,
    estimator: SweetSpotEstimator,
    smoother: LagSmoother,
    stability: StabilityAggregator,
    mood: MoodProjector,
    calculator: LifeScoreCalculator,
    weekly: WeeklyAggregator,
}

impl Default for LifeScorer {
    fn default() -> Self {
        Self::build(ScoringConfig::default())
    }
}

impl LifeScorer {
    /// Create a scorer after validating the configuration
    pub fn new(config: ScoringConfig) -> Result<Self, ScoreError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ScoringConfig) -> Self {
        Self {
            estimator: SweetSpotEstimator::from_config(&config),
            smoother: LagSmoother::new(config.lag_weights),
            stability: StabilityAggregator::new(config.stability_weights),
            mood: MoodProjector::new(config.mood_alpha),
            calculator: LifeScoreCalculator::new(config.life_beta, config.band_thresholds),
            weekly: WeeklyAggregator::new(config.weekly_window_days),
            config,
        }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Sweet spots in effect for `date`
    pub fn sweet_spots(&self, history: &UserHistory, date: NaiveDate) -> SweetSpotSet {
        self.estimator.estimate_all(history, date)
    }

    /// Score one date. Never fails: sparse or missing data lowers the score
    /// through the documented fallbacks instead.
    pub fn score_day(&self, history: &UserHistory, date: NaiveDate) -> LifeScoreResult {
        let sweet_spots = self.sweet_spots(history, date);
        let policy = self.config.missing_value_policy;
        let lagged_of = |factor: Factor| {
            self.smoother
                .lagged_factor(history, factor, date, sweet_spots.get(factor), policy)
        };

        let lagged = LifestyleValues {
            sleep: lagged_of(Factor::Sleep),
            activity: lagged_of(Factor::Activity),
            focus: lagged_of(Factor::Focus),
            social: lagged_of(Factor::Social),
        };
        let stability = self.stability.aggregate(&lagged);

        let m_eff = lagged_of(Factor::Mood);
        let mood = self.mood.project(m_eff, stability);

        let (score, band) = self.calculator.calculate(mood.value, stability);

        debug!(
            %date,
            score,
            %band,
            mood = mood.value,
            stability,
            "life score computed"
        );

        LifeScoreResult {
            date,
            mood_component: mood.value,
            stability_component: stability,
            score,
            band,
            breakdown: ScoreBreakdown {
                m_eff: mood.m_eff,
                m_hat: mood.m_hat,
                lagged,
                sweet_spots,
            },
        }
    }

    /// Scores of every logged day in the weekly window ending at `reference`,
    /// each computed as of its own date
    pub fn daily_scores(&self, history: &UserHistory, reference: NaiveDate) -> Vec<LifeScoreResult> {
        history
            .window(reference, self.config.weekly_window_days)
            .map(|log| self.score_day(history, log.date))
            .collect()
    }

    /// Mean score over the logged days of the weekly window, `None` if there are none
    pub fn weekly_average(&self, history: &UserHistory, reference: NaiveDate) -> Option<WeeklyAverage> {
        let scores = self.daily_scores(history, reference);
        self.weekly.average(&scores, reference)
    }
}

/// Scoring engine bound to a history store.
///
/// Use this when callers address users by id and the history lives elsewhere.
pub struct LifeScoreEngine<S: HistoryStore> {
    store: S,
    scorer: LifeScorer,
}

impl<S: HistoryStore> LifeScoreEngine<S> {
    /// Create an engine with a validated configuration
    pub fn new(store: S, config: ScoringConfig) -> Result<Self, ScoreError> {
        Ok(Self {
            store,
            scorer: LifeScorer::new(config)?,
        })
    }

    /// Create an engine using the default constants
    pub fn with_defaults(store: S) -> Self {
        Self {
            store,
            scorer: LifeScorer::default(),
        }
    }

    pub fn scorer(&self) -> &LifeScorer {
        &self.scorer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Life Score for `reference_date`.
    ///
    /// A user with no logs at all gets `ScoreError::NotEnoughData`.
    pub fn compute_today_score(
        &self,
        user_id: &str,
        reference_date: NaiveDate,
    ) -> Result<LifeScoreResult, ScoreError> {
        let history = self.non_empty_history(user_id)?;
        Ok(self.scorer.score_day(&history, reference_date))
    }

    /// Weekly average ending at `reference_date`; `None` when no day in the
    /// window has a log
    pub fn compute_weekly_average(
        &self,
        user_id: &str,
        reference_date: NaiveDate,
    ) -> Result<Option<WeeklyAverage>, ScoreError> {
        let history = self.store.history(user_id)?;
        Ok(self.scorer.weekly_average(&history, reference_date))
    }

    /// The user's history exactly as stored
    pub fn export_raw_history(&self, user_id: &str) -> Result<UserHistory, ScoreError> {
        self.store.history(user_id)
    }

    /// Insert or correct the log for `log.date`
    pub fn append_or_update_log(&mut self, user_id: &str, log: DailyLog) -> Result<(), ScoreError> {
        self.store.upsert_log(user_id, log)
    }

    /// Sweet spots in effect for the user on `reference_date`
    pub fn sweet_spots(
        &self,
        user_id: &str,
        reference_date: NaiveDate,
    ) -> Result<SweetSpotSet, ScoreError> {
        let history = self.store.history(user_id)?;
        Ok(self.scorer.sweet_spots(&history, reference_date))
    }

    fn non_empty_history(&self, user_id: &str) -> Result<UserHistory, ScoreError> {
        let history = self.store.history(user_id)?;
        if history.is_empty() {
            return Err(ScoreError::NotEnoughData(format!(
                "no logs recorded for user {user_id}"
            )));
        }
        Ok(history)
    }
}
