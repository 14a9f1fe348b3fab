//! FFI bindings for the activity monitor
//!
//! C-compatible functions for hosts that deliver interaction events from
//! another language (a webview shell, a native UI toolkit). All strings are
//! null-terminated; strings returned by these functions are allocated here and
//! must be freed with `activity_monitor_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::MonitorConfig;
use crate::detector::ExpiryToken;
use crate::error::MonitorError;
use crate::logger::{ActivityLogger, IngestOutcome};
use crate::schema::InteractionClassifier;
use crate::types::InteractionEvent;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

fn result_to_cstr(result: Result<String, MonitorError>) -> *mut c_char {
    match result {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Monitor lifecycle
// ============================================================================

/// Opaque handle to an ActivityLogger
pub struct MonitorHandle {
    logger: ActivityLogger,
    started: bool,
}

impl MonitorHandle {
    /// Hosts send their own timestamps, so the start-up entry is stamped with
    /// the first event's time rather than this process's clock.
    fn ingest(&mut self, event: InteractionEvent) -> IngestOutcome {
        if !self.started {
            self.logger.start_at(event.timestamp_ms);
            self.started = true;
        }
        self.logger.ingest(event)
    }

    fn reset(&mut self) {
        self.logger.reset();
        self.started = false;
    }
}

/// Create a monitor. `config_json` may be NULL for defaults.
///
/// The start-up entry is recorded with the first ingested event.
///
/// # Safety
/// - `config_json` must be NULL or a valid null-terminated C string.
/// - Must be freed with `activity_monitor_free`.
/// - Returns NULL on error; call `activity_monitor_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_new(config_json: *const c_char) -> *mut MonitorHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        MonitorConfig::default()
    } else {
        let json = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match MonitorConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let logger = ActivityLogger::with_config(config);
    Box::into_raw(Box::new(MonitorHandle {
        logger,
        started: false,
    }))
}

/// Free a monitor.
///
/// # Safety
/// - `monitor` must be a pointer returned by `activity_monitor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_free(monitor: *mut MonitorHandle) {
    if !monitor.is_null() {
        let handle = Box::from_raw(monitor);
        handle.logger.dispose();
    }
}

/// Classify and ingest one raw interaction (JSON object).
///
/// Returns the ingestion outcome as JSON: stats, window count, raised
/// signals and the expiry token to pass back to
/// `activity_monitor_fire_expiry` once the warning's TTL has elapsed.
///
/// # Safety
/// - `monitor` must be a valid pointer returned by `activity_monitor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with
///   `activity_monitor_free_string`, or NULL on error.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_ingest_json(
    monitor: *mut MonitorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if monitor.is_null() {
        set_last_error("Null monitor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *monitor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = InteractionClassifier::parse_line(&json_str)
        .map_err(MonitorError::from)
        .and_then(|raw| InteractionClassifier::classify(&raw).map_err(MonitorError::from))
        .and_then(|event| {
            let outcome = handle.ingest(event);
            Ok(serde_json::to_string(&outcome)?)
        });

    result_to_cstr(result)
}

/// Clear all monitor state.
///
/// # Safety
/// - `monitor` must be a valid pointer returned by `activity_monitor_new`.
/// - Returns 0 on success, -1 on a null pointer.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_reset(monitor: *mut MonitorHandle) -> i32 {
    clear_last_error();

    if monitor.is_null() {
        set_last_error("Null monitor pointer");
        return -1;
    }

    (*monitor).reset();
    0
}

/// Deferred warning expiry.
///
/// # Safety
/// - `monitor` must be a valid pointer returned by `activity_monitor_new`.
/// - Returns 1 if the warning was cleared, 0 if `token` was superseded,
///   -1 on a null pointer.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_fire_expiry(monitor: *mut MonitorHandle, token: u64) -> i32 {
    clear_last_error();

    if monitor.is_null() {
        set_last_error("Null monitor pointer");
        return -1;
    }

    i32::from((*monitor).logger.fire_expiry(ExpiryToken(token)))
}

/// Export the full log as a plain-text report.
///
/// # Safety
/// - `monitor` must be a valid pointer returned by `activity_monitor_new`.
/// - Returns a newly allocated string, or NULL when the log is empty or on
///   error; call `activity_monitor_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_export_report(monitor: *const MonitorHandle) -> *mut c_char {
    clear_last_error();

    if monitor.is_null() {
        set_last_error("Null monitor pointer");
        return ptr::null_mut();
    }

    result_to_cstr((*monitor).logger.export_report())
}

/// Snapshot of stats, warning and full log as JSON.
///
/// # Safety
/// - `monitor` must be a valid pointer returned by `activity_monitor_new`.
/// - Returns a newly allocated string that must be freed with
///   `activity_monitor_free_string`, or NULL on error.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_snapshot_json(monitor: *const MonitorHandle) -> *mut c_char {
    clear_last_error();

    if monitor.is_null() {
        set_last_error("Null monitor pointer");
        return ptr::null_mut();
    }

    result_to_cstr((*monitor).logger.snapshot().to_json())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by a monitor function.
///
/// # Safety
/// - `ptr` must be a pointer returned by a monitor function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next monitor call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn activity_monitor_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        activity_monitor_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_monitor_lifecycle() {
        unsafe {
            let monitor = activity_monitor_new(ptr::null());
            assert!(!monitor.is_null());

            let click = CString::new(
                r#"{"type": "click", "timestamp_ms": 1000, "target": {"tag": "BUTTON", "text": "Go"}, "path_length": 4}"#,
            )
            .unwrap();
            let outcome = take_string(activity_monitor_ingest_json(monitor, click.as_ptr()));
            let value: serde_json::Value = serde_json::from_str(&outcome).unwrap();
            assert_eq!(value["stats"]["clicks"], 1);
            assert_eq!(value["window_count"], 1);

            let report = take_string(activity_monitor_export_report(monitor));
            assert_eq!(report.lines().count(), 2);
            assert!(report.lines().next().unwrap().contains("SYSTEM Activity monitor started"));
            assert!(report.contains("CLICK  element: Go  path-length: 4"));

            let snapshot = take_string(activity_monitor_snapshot_json(monitor));
            let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
            assert_eq!(value["entries"].as_array().unwrap().len(), 2);

            assert_eq!(activity_monitor_reset(monitor), 0);
            assert!(activity_monitor_export_report(monitor).is_null());
            assert!(!activity_monitor_last_error().is_null());

            activity_monitor_free(monitor);
        }
    }

    #[test]
    fn test_ffi_expiry_token() {
        unsafe {
            let monitor = activity_monitor_new(ptr::null());
            let mut token = None;
            for i in 0..25 {
                let json = CString::new(format!(
                    r#"{{"type": "click", "timestamp_ms": {}}}"#,
                    1000 + i * 10
                ))
                .unwrap();
                let outcome = take_string(activity_monitor_ingest_json(monitor, json.as_ptr()));
                let value: serde_json::Value = serde_json::from_str(&outcome).unwrap();
                token = value["expiry"].as_u64();
            }

            let token = token.expect("25th click raises a warning");
            assert_eq!(activity_monitor_fire_expiry(monitor, token + 1), 0);
            assert_eq!(activity_monitor_fire_expiry(monitor, token), 1);

            activity_monitor_free(monitor);
        }
    }

    #[test]
    fn test_ffi_host_timeline_before_wall_clock() {
        unsafe {
            let monitor = activity_monitor_new(ptr::null());
            let mut last = serde_json::Value::Null;
            for i in 0..30 {
                let json = CString::new(format!(
                    r#"{{"type": "click", "timestamp_ms": {}}}"#,
                    1000 + i * 1000
                ))
                .unwrap();
                let outcome = take_string(activity_monitor_ingest_json(monitor, json.as_ptr()));
                last = serde_json::from_str(&outcome).unwrap();
                assert!(last["window_count"].as_u64().unwrap() <= 6);
                assert!(last["signals"].as_array().unwrap().is_empty());
            }
            assert_eq!(last["window_count"], 6);

            let snapshot = take_string(activity_monitor_snapshot_json(monitor));
            let value: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
            assert_eq!(value["entries"][0]["timestamp_ms"], 1000);
            assert_eq!(value["entries"][30]["timestamp_ms"], 30000);
            assert_eq!(value["warning"]["active"], false);

            // After a reset the next event starts a new timeline
            assert_eq!(activity_monitor_reset(monitor), 0);
            let json = CString::new(r#"{"type": "blur", "timestamp_ms": 5}"#).unwrap();
            take_string(activity_monitor_ingest_json(monitor, json.as_ptr()));
            let report = take_string(activity_monitor_export_report(monitor));
            assert_eq!(report.lines().count(), 2);
            assert!(report.lines().next().unwrap().contains("SYSTEM Activity monitor started"));

            activity_monitor_free(monitor);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let monitor = activity_monitor_new(ptr::null());
            let bad = CString::new(r#"{"type": "hover", "timestamp_ms": 1}"#).unwrap();

            let result = activity_monitor_ingest_json(monitor, bad.as_ptr());
            assert!(result.is_null());

            let error = CStr::from_ptr(activity_monitor_last_error()).to_str().unwrap();
            assert!(error.contains("hover"));

            assert!(activity_monitor_ingest_json(ptr::null_mut(), bad.as_ptr()).is_null());
            assert_eq!(activity_monitor_reset(ptr::null_mut()), -1);

            activity_monitor_free(monitor);
        }
    }

    #[test]
    fn test_ffi_invalid_config() {
        unsafe {
            let config = CString::new(r#"{"click_window_ms": 0}"#).unwrap();
            assert!(activity_monitor_new(config.as_ptr()).is_null());
            assert!(!activity_monitor_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = CStr::from_ptr(activity_monitor_version()).to_str().unwrap();
            assert!(!version.is_empty());
        }
    }
}
