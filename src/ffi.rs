//! FFI bindings for Axis Life Score
//!
//! This module provides C-compatible functions for calling the scorer from other
//! languages. Histories, logs and results cross the boundary as JSON. All
//! functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `axis_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::ScoringConfig;
use crate::error::ScoreError;
use crate::pipeline::{LifeScoreEngine, LifeScorer};
use crate::store::InMemoryHistoryStore;
use crate::types::{DailyLog, UserHistory};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Read a required string argument
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Result<String, ScoreError> {
    cstr_to_string(ptr)
        .ok_or_else(|| ScoreError::InvalidArgument(format!("Invalid {name} string pointer")))
}

fn parse_date(date: &str) -> Result<NaiveDate, ScoreError> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|e| ScoreError::DateParseError(format!("{date}: {e}")))
}

/// Build a scorer from an optional JSON configuration (NULL = defaults)
unsafe fn scorer_from(config_json: *const c_char) -> Result<LifeScorer, ScoreError> {
    match cstr_to_string(config_json) {
        Some(json) => LifeScorer::new(ScoringConfig::from_json(&json)?),
        None => Ok(LifeScorer::default()),
    }
}

/// Serialize an FFI result, or record the error and return NULL
fn finish<T: Serialize>(result: Result<T, ScoreError>) -> *mut c_char {
    match result.and_then(|value| Ok(serde_json::to_string(&value)?)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Score one date of a history and return the LifeScoreResult as JSON.
///
/// # Safety
/// - `history_json` and `date` must be valid null-terminated C strings.
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `axis_free_string`.
/// - Returns NULL on error; call `axis_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn axis_score_day(
    history_json: *const c_char,
    date: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    finish((|| {
        let history = UserHistory::from_json(&required_arg(history_json, "history JSON")?)?;
        let date = parse_date(&required_arg(date, "date")?)?;
        let scorer = scorer_from(config_json)?;
        Ok(scorer.score_day(&history, date))
    })())
}

/// Weekly average ending at `date`, as JSON. The JSON value `null` means the
/// window holds no logged day.
///
/// # Safety
/// - `history_json` and `date` must be valid null-terminated C strings.
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `axis_free_string`.
/// - Returns NULL on error; call `axis_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn axis_weekly_average(
    history_json: *const c_char,
    date: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    finish((|| {
        let history = UserHistory::from_json(&required_arg(history_json, "history JSON")?)?;
        let date = parse_date(&required_arg(date, "date")?)?;
        let scorer = scorer_from(config_json)?;
        Ok(scorer.weekly_average(&history, date))
    })())
}

/// Sweet spots in effect at `date`, as JSON.
///
/// # Safety
/// - `history_json` and `date` must be valid null-terminated C strings.
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a newly allocated string that must be freed with `axis_free_string`.
/// - Returns NULL on error; call `axis_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn axis_sweet_spots(
    history_json: *const c_char,
    date: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    finish((|| {
        let history = UserHistory::from_json(&required_arg(history_json, "history JSON")?)?;
        let date = parse_date(&required_arg(date, "date")?)?;
        let scorer = scorer_from(config_json)?;
        Ok(scorer.sweet_spots(&history, date))
    })())
}

// ============================================================================
// Stateful Engine API
// ============================================================================

/// Opaque handle to an engine over an in-memory store
pub struct AxisEngineHandle {
    engine: LifeScoreEngine<InMemoryHistoryStore>,
}

/// Create a new engine with an empty in-memory store.
///
/// # Safety
/// - `config_json` may be NULL to use the default configuration.
/// - Returns a pointer to a newly allocated engine; free it with `axis_engine_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn axis_engine_new(config_json: *const c_char) -> *mut AxisEngineHandle {
    clear_last_error();

    let config = match cstr_to_string(config_json) {
        Some(json) => match ScoringConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        None => ScoringConfig::default(),
    };

    match LifeScoreEngine::new(InMemoryHistoryStore::new(), config) {
        Ok(engine) => Box::into_raw(Box::new(AxisEngineHandle { engine })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `axis_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn axis_engine_free(engine: *mut AxisEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Insert or correct one daily log (JSON) for a user.
///
/// Logs outside the entry ranges are rejected and nothing is stored.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `axis_engine_new`.
/// - `user_id` and `log_json` must be valid null-terminated C strings.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn axis_engine_upsert_log(
    engine: *mut AxisEngineHandle,
    user_id: *const c_char,
    log_json: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *engine;

    let result = (|| {
        let user_id = required_arg(user_id, "user_id")?;
        let log: DailyLog = serde_json::from_str(&required_arg(log_json, "log JSON")?)?;
        log.validate()?;
        handle.engine.append_or_update_log(&user_id, log)
    })();

    match result {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Score a user's date and return the LifeScoreResult as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `axis_engine_new`.
/// - `user_id` and `date` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `axis_free_string`.
/// - Returns NULL on error (including a user with no logs yet).
#[no_mangle]
pub unsafe extern "C" fn axis_engine_score(
    engine: *const AxisEngineHandle,
    user_id: *const c_char,
    date: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    finish((|| {
        let user_id = required_arg(user_id, "user_id")?;
        let date = parse_date(&required_arg(date, "date")?)?;
        handle.engine.compute_today_score(&user_id, date)
    })())
}

/// Export a user's history as JSON.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `axis_engine_new`.
/// - `user_id` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `axis_free_string`.
#[no_mangle]
pub unsafe extern "C" fn axis_engine_export(
    engine: *const AxisEngineHandle,
    user_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    finish((|| {
        let user_id = required_arg(user_id, "user_id")?;
        handle.engine.export_raw_history(&user_id)
    })())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Axis functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an Axis function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn axis_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Axis function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn axis_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn axis_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    fn sample_history() -> CString {
        CString::new(
            r#"{
                "entries": [
                    {"date": "2024-03-10", "mood": 7, "sleep": 8, "activity": 5, "focus": 6, "social": 3}
                ]
            }"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        axis_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_score_day() {
        let history = sample_history();
        let date = CString::new("2024-03-10").unwrap();

        unsafe {
            let result = axis_score_day(history.as_ptr(), date.as_ptr(), ptr::null());
            let json: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();

            assert_eq!(json["date"], "2024-03-10");
            assert_eq!(json["band"], "yellow");
            assert!((json["score"].as_f64().unwrap() - 60.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ffi_weekly_average_no_data() {
        let history = CString::new(r#"{"entries": []}"#).unwrap();
        let date = CString::new("2024-03-10").unwrap();

        unsafe {
            let result = axis_weekly_average(history.as_ptr(), date.as_ptr(), ptr::null());
            assert_eq!(take_string(result), "null");
        }
    }

    #[test]
    fn test_ffi_invalid_date_sets_error() {
        let history = sample_history();
        let date = CString::new("10/03/2024").unwrap();

        unsafe {
            let result = axis_sweet_spots(history.as_ptr(), date.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = axis_last_error();
            assert!(!error.is_null());
            let message = CStr::from_ptr(error).to_str().unwrap();
            assert!(message.contains("Date parse error"));
        }
    }

    #[test]
    fn test_ffi_invalid_config_rejected() {
        let history = sample_history();
        let date = CString::new("2024-03-10").unwrap();
        let config = CString::new(r#"{"mood_alpha": 2.0}"#).unwrap();

        unsafe {
            let result = axis_score_day(history.as_ptr(), date.as_ptr(), config.as_ptr());
            assert!(result.is_null());
            assert!(!axis_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_engine_lifecycle() {
        unsafe {
            let engine = axis_engine_new(ptr::null());
            assert!(!engine.is_null());

            let user = CString::new("42").unwrap();
            let date = CString::new("2024-03-10").unwrap();

            // No logs yet
            let result = axis_engine_score(engine, user.as_ptr(), date.as_ptr());
            assert!(result.is_null());

            let log = CString::new(
                r#"{"date": "2024-03-10", "mood": 7, "sleep": 8, "activity": 5, "focus": 6, "social": 3}"#,
            )
            .unwrap();
            assert_eq!(axis_engine_upsert_log(engine, user.as_ptr(), log.as_ptr()), 0);

            let result = axis_engine_score(engine, user.as_ptr(), date.as_ptr());
            let json: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(json["band"], "yellow");

            let exported = take_string(axis_engine_export(engine, user.as_ptr()));
            let history = UserHistory::from_json(&exported).unwrap();
            assert_eq!(history.len(), 1);

            axis_engine_free(engine);
        }
    }

    #[test]
    fn test_ffi_engine_rejects_out_of_range_log() {
        unsafe {
            let engine = axis_engine_new(ptr::null());
            let user = CString::new("42").unwrap();

            for bad in [
                r#"{"date": "2024-03-10", "mood": 500, "sleep": -40}"#,
                r#"{"date": "2024-03-10"}"#,
            ] {
                let log = CString::new(bad).unwrap();
                assert_eq!(axis_engine_upsert_log(engine, user.as_ptr(), log.as_ptr()), -1);

                let message = CStr::from_ptr(axis_last_error()).to_str().unwrap();
                assert!(message.contains("Invalid daily log"), "{message}");
            }

            let exported = take_string(axis_engine_export(engine, user.as_ptr()));
            assert!(UserHistory::from_json(&exported).unwrap().is_empty());

            axis_engine_free(engine);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = CStr::from_ptr(axis_version()).to_str().unwrap();
            assert_eq!(version, env!("CARGO_PKG_VERSION"));
        }
    }
}
