//! Core types for the Axis scoring pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: daily logs and the per-user history, derived sweet spots, and the
//! scored output.

use crate::error::ScoreError;
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A self-reported daily factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    Mood,
    Sleep,
    Activity,
    Focus,
    Social,
}

impl Factor {
    /// Every factor, mood first
    pub const ALL: [Factor; 5] = [
        Factor::Mood,
        Factor::Sleep,
        Factor::Activity,
        Factor::Focus,
        Factor::Social,
    ];

    /// The four lifestyle factors that feed the Stability component
    pub const LIFESTYLE: [Factor; 4] = [
        Factor::Sleep,
        Factor::Activity,
        Factor::Focus,
        Factor::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Mood => "mood",
            Factor::Sleep => "sleep",
            Factor::Activity => "activity",
            Factor::Focus => "focus",
            Factor::Social => "social",
        }
    }

    /// Inclusive range accepted at entry time.
    ///
    /// Mood is a 1-10 rating, sleep is hours in a night (0-12), and the
    /// remaining factors are 0-10 self ratings.
    pub fn valid_range(&self) -> (f64, f64) {
        match self {
            Factor::Mood => (1.0, 10.0),
            Factor::Sleep => (0.0, 12.0),
            Factor::Activity | Factor::Focus | Factor::Social => (0.0, 10.0),
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's self-report for a single calendar date.
///
/// Every value is optional: a missing field stays absent until normalization,
/// where the configured missing-value policy decides what it means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    /// Calendar date, unique per user
    pub date: NaiveDate,
    /// Mood rating (user-defined scale, 1-10 in the reference entry flow)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<f64>,
    /// Hours slept the previous night
    #[serde(
        default,
        rename = "sleep",
        alias = "sleep_hours",
        skip_serializing_if = "Option::is_none"
    )]
    pub sleep_hours: Option<f64>,
    /// Physical activity (0-10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<f64>,
    /// Focus / productivity (0-10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<f64>,
    /// Social connection (0-10)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<f64>,
    /// When the entry was recorded. Offset-less timestamps are read as UTC.
    #[serde(
        default,
        rename = "ts",
        deserialize_with = "deserialize_logged_at",
        skip_serializing_if = "Option::is_none"
    )]
    pub logged_at: Option<DateTime<Utc>>,
}

fn deserialize_logged_at<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse_logged_at(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.fff]` taken as UTC
fn parse_logged_at(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Ok(dt.with_timezone(&Utc)),
        Err(_) => s
            .parse::<NaiveDateTime>()
            .map(|naive| Utc.from_utc_datetime(&naive)),
    }
}

impl DailyLog {
    /// Create an empty log for the given date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            mood: None,
            sleep_hours: None,
            activity: None,
            focus: None,
            social: None,
            logged_at: None,
        }
    }

    /// Builder-style setter for a single factor
    pub fn with(mut self, factor: Factor, value: f64) -> Self {
        self.set(factor, Some(value));
        self
    }

    /// Recorded value for a factor, if any
    pub fn value(&self, factor: Factor) -> Option<f64> {
        match factor {
            Factor::Mood => self.mood,
            Factor::Sleep => self.sleep_hours,
            Factor::Activity => self.activity,
            Factor::Focus => self.focus,
            Factor::Social => self.social,
        }
    }

    pub fn set(&mut self, factor: Factor, value: Option<f64>) {
        let slot = match factor {
            Factor::Mood => &mut self.mood,
            Factor::Sleep => &mut self.sleep_hours,
            Factor::Activity => &mut self.activity,
            Factor::Focus => &mut self.focus,
            Factor::Social => &mut self.social,
        };
        *slot = value;
    }

    /// True when no factor has been recorded
    pub fn is_empty(&self) -> bool {
        Factor::ALL.iter().all(|f| self.value(*f).is_none())
    }

    /// Check recorded values against the entry ranges of each factor.
    ///
    /// Scoring never calls this; it is for the surfaces that accept new logs.
    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.is_empty() {
            return Err(ScoreError::InvalidLog(format!(
                "log for {} has no recorded values",
                self.date
            )));
        }

        for factor in Factor::ALL {
            if let Some(value) = self.value(factor) {
                let (lo, hi) = factor.valid_range();
                if !value.is_finite() || value < lo || value > hi {
                    return Err(ScoreError::InvalidLog(format!(
                        "{factor} = {value} on {} is outside {lo}..={hi}",
                        self.date
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Date-ordered daily logs for a single user, at most one per date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "HistoryFile", into = "HistoryFile")]
pub struct UserHistory {
    logs: BTreeMap<NaiveDate, DailyLog>,
}

/// On-disk layout of a user's history
#[derive(Serialize, Deserialize)]
struct HistoryFile {
    #[serde(default)]
    entries: Vec<DailyLog>,
}

impl From<HistoryFile> for UserHistory {
    fn from(file: HistoryFile) -> Self {
        Self::from_logs(file.entries)
    }
}

impl From<UserHistory> for HistoryFile {
    fn from(history: UserHistory) -> Self {
        Self {
            entries: history.logs.into_values().collect(),
        }
    }
}

impl UserHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from logs in any order; later duplicates of a date win
    pub fn from_logs(logs: impl IntoIterator<Item = DailyLog>) -> Self {
        let mut history = Self::new();
        for log in logs {
            history.upsert(log);
        }
        history
    }

    /// Insert a log, replacing any existing log for the same date.
    /// Returns the replaced log.
    pub fn upsert(&mut self, log: DailyLog) -> Option<DailyLog> {
        self.logs.insert(log.date, log)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.logs.get(&date)
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    /// Logs in chronological order
    pub fn iter(&self) -> impl Iterator<Item = &DailyLog> {
        self.logs.values()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.logs.keys().next_back().copied()
    }

    /// Logs in the `days`-long window ending at `end` (inclusive), oldest first
    pub fn window(&self, end: NaiveDate, days: usize) -> impl Iterator<Item = &DailyLog> {
        let start = window_start(end, days);
        let range = match start {
            Some(start) => self.logs.range(start..=end),
            // Empty range for a zero-length window
            None => self.logs.range(end..end),
        };
        range.map(|(_, log)| log)
    }

    /// Most recent recorded value of `factor` strictly before `date`
    pub fn last_known_before(&self, factor: Factor, date: NaiveDate) -> Option<f64> {
        self.logs
            .range(..date)
            .rev()
            .find_map(|(_, log)| log.value(factor))
    }

    /// Load a history from JSON (`{"entries": [...]}`)
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to JSON in date order
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// First date of a `days`-long window ending at `end`, or `None` when empty
pub(crate) fn window_start(end: NaiveDate, days: usize) -> Option<NaiveDate> {
    if days == 0 {
        return None;
    }
    Some(
        end.checked_sub_days(Days::new(days as u64 - 1))
            .unwrap_or(NaiveDate::MIN),
    )
}

/// Where a sweet spot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweetSpotSource {
    /// Estimated from the user's own recent history
    Estimated,
    /// Configured fallback
    #[default]
    Default,
}

/// Personal optimum and tolerance for one factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweetSpot {
    pub optimal: f64,
    pub tolerance: f64,
    #[serde(default)]
    pub source: SweetSpotSource,
    /// Number of days the estimate was computed from
    #[serde(default)]
    pub sample_days: usize,
}

impl SweetSpot {
    /// A configured (non-estimated) sweet spot
    pub const fn new(optimal: f64, tolerance: f64) -> Self {
        Self {
            optimal,
            tolerance,
            source: SweetSpotSource::Default,
            sample_days: 0,
        }
    }

    pub fn estimated(optimal: f64, tolerance: f64, sample_days: usize) -> Self {
        Self {
            optimal,
            tolerance,
            source: SweetSpotSource::Estimated,
            sample_days,
        }
    }

    pub fn is_default(&self) -> bool {
        self.source == SweetSpotSource::Default
    }
}

/// One sweet spot per factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweetSpotSet {
    pub mood: SweetSpot,
    pub sleep: SweetSpot,
    pub activity: SweetSpot,
    pub focus: SweetSpot,
    pub social: SweetSpot,
}

impl Default for SweetSpotSet {
    fn default() -> Self {
        crate::config::DEFAULT_SWEET_SPOTS
    }
}

impl SweetSpotSet {
    pub fn get(&self, factor: Factor) -> &SweetSpot {
        match factor {
            Factor::Mood => &self.mood,
            Factor::Sleep => &self.sleep,
            Factor::Activity => &self.activity,
            Factor::Focus => &self.focus,
            Factor::Social => &self.social,
        }
    }

    /// Build a set by evaluating `f` for every factor
    pub fn from_fn(mut f: impl FnMut(Factor) -> SweetSpot) -> Self {
        Self {
            mood: f(Factor::Mood),
            sleep: f(Factor::Sleep),
            activity: f(Factor::Activity),
            focus: f(Factor::Focus),
            social: f(Factor::Social),
        }
    }
}

/// Lagged, normalized values of the four lifestyle factors (each 0-1)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LifestyleValues {
    pub sleep: f64,
    pub activity: f64,
    pub focus: f64,
    pub social: f64,
}

/// Qualitative band of a Life Score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Red,
    Yellow,
    Green,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Red => "red",
            Band::Yellow => "yellow",
            Band::Green => "green",
        }
    }

    /// Short human description used by the command line
    pub fn label(&self) -> &'static str {
        match self {
            Band::Red => "low",
            Band::Yellow => "steady",
            Band::Green => "high",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermediate values behind a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Lagged, normalized mood
    pub m_eff: f64,
    /// Stability-derived mood proxy
    pub m_hat: f64,
    /// Lagged, normalized lifestyle factors
    pub lagged: LifestyleValues,
    /// Sweet spots the day was normalized against
    pub sweet_spots: SweetSpotSet,
}

/// Life Score for one user on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeScoreResult {
    pub date: NaiveDate,
    /// Mood component (0-1)
    pub mood_component: f64,
    /// Stability component (0-1)
    pub stability_component: f64,
    /// Final score (0-100)
    pub score: f64,
    pub band: Band,
    pub breakdown: ScoreBreakdown,
}

impl LifeScoreResult {
    /// Score rounded to a whole number for display
    pub fn rounded_score(&self) -> u8 {
        self.score.round().clamp(0.0, 100.0) as u8
    }
}

/// Mean Life Score over a trailing window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAverage {
    pub reference_date: NaiveDate,
    pub average: f64,
    /// Days in the window that had a log
    pub days_counted: usize,
}
