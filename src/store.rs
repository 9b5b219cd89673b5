//! History stores
//!
//! The scoring pipeline only ever sees an immutable `UserHistory` snapshot.
//! Stores own everything about where that snapshot comes from and how new
//! logs are persisted.

use crate::error::ScoreError;
use crate::types::{DailyLog, UserHistory};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Read/write access to per-user daily logs
pub trait HistoryStore {
    /// Full history for a user; an unknown user has an empty history
    fn history(&self, user_id: &str) -> Result<UserHistory, ScoreError>;

    /// Insert a log, replacing any existing log for the same date
    fn upsert_log(&mut self, user_id: &str, log: DailyLog) -> Result<(), ScoreError>;
}

/// Store keeping every history in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryHistoryStore {
    users: HashMap<String, UserHistory>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a user's whole history
    pub fn insert_history(&mut self, user_id: &str, history: UserHistory) {
        self.users.insert(user_id.to_string(), history);
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn history(&self, user_id: &str) -> Result<UserHistory, ScoreError> {
        Ok(self.users.get(user_id).cloned().unwrap_or_default())
    }

    fn upsert_log(&mut self, user_id: &str, log: DailyLog) -> Result<(), ScoreError> {
        self.users
            .entry(user_id.to_string())
            .or_default()
            .upsert(log);
        Ok(())
    }
}

/// Store persisting one JSON file per user (`user_<id>.json`) in a directory
#[derive(Debug, Clone)]
pub struct JsonFileHistoryStore {
    data_dir: PathBuf,
}

impl JsonFileHistoryStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of a user's history file
    pub fn user_file(&self, user_id: &str) -> Result<PathBuf, ScoreError> {
        validate_user_id(user_id)?;
        Ok(self.data_dir.join(format!("user_{user_id}.json")))
    }

    /// Ids of every user with a history file
    pub fn user_ids(&self) -> Result<Vec<String>, ScoreError> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(id) = name
                .strip_prefix("user_")
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                if validate_user_id(id).is_ok() {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Write a user's whole history, replacing the file atomically
    pub fn save_history(&self, user_id: &str, history: &UserHistory) -> Result<(), ScoreError> {
        let path = self.user_file(user_id)?;
        fs::create_dir_all(&self.data_dir)?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, history.to_json_pretty()?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl HistoryStore for JsonFileHistoryStore {
    fn history(&self, user_id: &str) -> Result<UserHistory, ScoreError> {
        let path = self.user_file(user_id)?;
        if !path.exists() {
            return Ok(UserHistory::new());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(UserHistory::from_json(&contents)?)
    }

    fn upsert_log(&mut self, user_id: &str, log: DailyLog) -> Result<(), ScoreError> {
        let mut history = self.history(user_id)?;
        let date = log.date;
        let replaced = history.upsert(log).is_some();
        self.save_history(user_id, &history)?;

        info!(user_id, %date, replaced, entries = history.len(), "daily log saved");
        Ok(())
    }
}

/// User ids become file names, so only a conservative character set is allowed
fn validate_user_id(user_id: &str) -> Result<(), ScoreError> {
    let valid = !user_id.is_empty()
        && user_id.len() <= 64
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(ScoreError::InvalidUserId(user_id.to_string()))
    }
}
