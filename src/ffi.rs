//! FFI bindings for Ironsight
//!
//! This module provides C-compatible functions for calling Ironsight from other
//! languages. All functions use C strings (null-terminated) and return allocated
//! memory that must be freed by the caller using `ironsight_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::str::FromStr;

use crate::catalog::LiftCategory;
use crate::error::AnalyticsError;
use crate::pipeline::{analyze_snapshot, parse_date, StrengthProcessor};
use crate::standards::{classify_lift, percentile, standards_for_bodyweight};

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

/// Record an analytics error as `CODE: message`
fn set_analytics_error(err: &AnalyticsError) {
    set_last_error(&format!("{}: {}", err.code(), err));
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

/// Read a required string argument, recording an error when it is unusable
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a snapshot JSON document and return the strength report JSON.
///
/// # Safety
/// - `json` and `today` must be valid null-terminated C strings; `today` is
///   `YYYY-MM-DD`.
/// - Returns a newly allocated string that must be freed with `ironsight_free_string`.
/// - Returns NULL on error; call `ironsight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ironsight_analyze_snapshot(
    json: *const c_char,
    today: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json_str) = required_arg(json, "JSON") else {
        return ptr::null_mut();
    };
    let Some(today_str) = required_arg(today, "date") else {
        return ptr::null_mut();
    };

    let result = parse_date(&today_str).and_then(|date| analyze_snapshot(&json_str, date));
    match result {
        Ok(report) => string_to_cstr(&report),
        Err(e) => {
            set_analytics_error(&e);
            ptr::null_mut()
        }
    }
}

/// Classify a value against the standards for a category and bodyweight.
///
/// Returns a JSON object with the interpolated thresholds, tier, next tier,
/// delta, progress and percentile.
///
/// # Safety
/// - `category` must be a valid null-terminated C string (e.g. `"bench_press"`).
/// - Returns a newly allocated string that must be freed with `ironsight_free_string`.
/// - Returns NULL on error; call `ironsight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ironsight_classify_lift(
    category: *const c_char,
    bodyweight_kg: f64,
    value_kg: f64,
) -> *mut c_char {
    clear_last_error();

    let Some(category_str) = required_arg(category, "category") else {
        return ptr::null_mut();
    };

    let category = match LiftCategory::from_str(&category_str) {
        Ok(c) => c,
        Err(e) => {
            set_analytics_error(&e);
            return ptr::null_mut();
        }
    };

    let thresholds = standards_for_bodyweight(category, bodyweight_kg);
    let classification = classify_lift(value_kg, &thresholds);
    let body = serde_json::json!({
        "category": category,
        "bodyweight_kg": bodyweight_kg,
        "value_kg": value_kg,
        "thresholds": thresholds,
        "tier": classification.tier,
        "next_tier": classification.next_tier,
        "delta_to_next": classification.delta_to_next,
        "progress_pct": classification.progress_pct,
        "percentile": percentile(value_kg, &thresholds),
    });

    match serde_json::to_string(&body) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_analytics_error(&AnalyticsError::JsonError(e));
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a StrengthProcessor
pub struct StrengthProcessorHandle {
    processor: StrengthProcessor,
}

/// Create a new StrengthProcessor.
///
/// # Safety
/// - `config_json` may be NULL for the default configuration, otherwise a valid
///   null-terminated C string holding an engine configuration.
/// - Returns a pointer to a newly allocated processor that must be freed with
///   `ironsight_processor_free`.
/// - Returns NULL on error; call `ironsight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ironsight_processor_new(
    config_json: *const c_char,
) -> *mut StrengthProcessorHandle {
    clear_last_error();

    let mut processor = StrengthProcessor::new();
    if !config_json.is_null() {
        let Some(config_str) = required_arg(config_json, "config") else {
            return ptr::null_mut();
        };
        if let Err(e) = processor.load_config(&config_str) {
            set_analytics_error(&e);
            return ptr::null_mut();
        }
    }

    Box::into_raw(Box::new(StrengthProcessorHandle { processor }))
}

/// Free a StrengthProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `ironsight_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn ironsight_processor_free(processor: *mut StrengthProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Rebuild the processor's analysis from a snapshot.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `ironsight_processor_new`.
/// - `json` and `today` must be valid null-terminated C strings.
/// - Returns 0 on success, non-zero on error; the previous analysis is kept on error.
/// - On error, call `ironsight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ironsight_processor_reload(
    processor: *mut StrengthProcessorHandle,
    json: *const c_char,
    today: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let Some(json_str) = required_arg(json, "JSON") else {
        return -1;
    };
    let Some(today_str) = required_arg(today, "date") else {
        return -1;
    };

    let result = parse_date(&today_str).and_then(|date| handle.processor.reload(&json_str, date));
    match result {
        Ok(_) => 0,
        Err(e) => {
            set_analytics_error(&e);
            -1
        }
    }
}

/// Encode the processor's current analysis.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `ironsight_processor_new`.
/// - Returns a newly allocated string that must be freed with `ironsight_free_string`.
/// - Returns NULL on error (including before the first successful reload);
///   call `ironsight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn ironsight_processor_report(
    processor: *mut StrengthProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    match handle.processor.report_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_analytics_error(&e);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Ironsight functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an Ironsight function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn ironsight_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Ironsight function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn ironsight_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Ironsight library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn ironsight_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
