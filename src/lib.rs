//! Axis Life Score - Personal-baseline wellbeing scoring engine
//!
//! Axis turns a user's daily self-reports (mood, sleep, activity, focus, social)
//! into a single 0-100 Life Score through a deterministic pipeline:
//! sweet-spot estimation → normalization → lag smoothing → Stability and Mood
//! components → banded Life Score.
//!
//! "Normal" is defined per user: each factor is scored against the values the
//! user reported on their better days, not against a population norm.
//!
//! ## Modules
//!
//! - **Scoring**: pure functions of a `UserHistory` snapshot (`LifeScorer`)
//! - **Stores**: the `HistoryStore` seam with in-memory and JSON-file backends
//! - **Engine**: `LifeScoreEngine`, the user-id based entry points

pub mod config;
pub mod error;
pub mod lag;
pub mod mood;
pub mod normalizer;
pub mod pipeline;
pub mod score;
pub mod stability;
pub mod store;
pub mod sweet_spot;
pub mod types;
pub mod weekly;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::ScoringConfig;
pub use error::ScoreError;
pub use normalizer::MissingValuePolicy;
pub use pipeline::{LifeScoreEngine, LifeScorer};
pub use store::{HistoryStore, InMemoryHistoryStore, JsonFileHistoryStore};
pub use types::{
    Band, DailyLog, Factor, LifeScoreResult, SweetSpot, SweetSpotSet, UserHistory, WeeklyAverage,
};

/// Library version
pub const AXIS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the command line
pub const PRODUCER_NAME: &str = "axis-life-score";
