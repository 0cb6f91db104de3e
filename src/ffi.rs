//! FFI bindings for Cohort Flux
//!
//! This module provides C-compatible functions for calling the engine from other
//! languages. All functions take null-terminated C strings (snapshot JSON, and an
//! optional engine config JSON where NULL means defaults) and return allocated
//! memory that must be freed by the caller using `cohort_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::error::ComputeError;
use crate::export::{to_csv_string, to_json};
use crate::pipeline::{analyze, snapshot_to_series_json, CohortReport};
use crate::snapshot::ContentSnapshot;

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

/// Hand a result across the boundary, recording the error on failure
fn finish(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Parse snapshot and optional config, then run the pipeline
unsafe fn run_report(
    snapshot_json: *const c_char,
    config_json: *const c_char,
) -> Result<CohortReport, ComputeError> {
    let snapshot = cstr_to_string(snapshot_json)
        .ok_or_else(|| ComputeError::ParseError("Invalid snapshot string pointer".to_string()))?;
    let snapshot = ContentSnapshot::from_json(&snapshot)?;

    let config = match cstr_to_string(config_json) {
        Some(json) => EngineConfig::from_json(&json)?,
        None => EngineConfig::default(),
    };

    analyze(&snapshot, &config)
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute the encoded series payload for a snapshot.
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string.
/// - `config_json` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `cohort_free_string`.
/// - Returns NULL on error; call `cohort_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn cohort_snapshot_to_series(
    snapshot_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let snapshot = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot string pointer");
            return ptr::null_mut();
        }
    };
    let config = cstr_to_string(config_json);

    finish(snapshot_to_series_json(&snapshot, config.as_deref()))
}

/// Compute one window's leaderboard as a JSON array.
///
/// # Safety
/// - Same pointer rules as `cohort_snapshot_to_series`.
/// - Returns NULL when `window_index` is negative or out of range.
#[no_mangle]
pub unsafe extern "C" fn cohort_breakout(
    snapshot_json: *const c_char,
    config_json: *const c_char,
    window_index: i32,
) -> *mut c_char {
    clear_last_error();

    if window_index < 0 {
        set_last_error("Window index must not be negative");
        return ptr::null_mut();
    }

    let result = run_report(snapshot_json, config_json)
        .and_then(|report| to_json(report.breakout(window_index as usize)?));
    finish(result)
}

/// Compute the flat export as CSV text.
///
/// # Safety
/// - Same pointer rules as `cohort_snapshot_to_series`.
#[no_mangle]
pub unsafe extern "C" fn cohort_export_csv(
    snapshot_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = run_report(snapshot_json, config_json)
        .and_then(|report| to_csv_string(&report.flat_records()));
    finish(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Cohort Flux functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Cohort Flux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn cohort_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Cohort Flux call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn cohort_last_error() -> *const c_char {
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
pub unsafe extern "C" fn cohort_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
