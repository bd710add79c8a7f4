//! Unit tests for the logging module
//!
//! These tests swap the global logger for a capturing implementation, so
//! they are serialized to avoid interfering with each other.

use super::*;
use serial_test::serial;
use std::sync::{Arc, Mutex};

/// Logger that records entries for assertions
struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn install_capture_logger() -> Arc<Mutex<Vec<LogEntry>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    set_logger(CaptureLogger {
        entries: entries.clone(),
    });
    entries
}

// ============================================================================
// SEVERITY LEVELS
// ============================================================================

#[test]
fn test_severity_ordering() {
    // Severities are ordered from least to most severe
    assert!(LogSeverity::Trace < LogSeverity::Debug);
    assert!(LogSeverity::Debug < LogSeverity::Info);
    assert!(LogSeverity::Info < LogSeverity::Warn);
    assert!(LogSeverity::Warn < LogSeverity::Error);
}

// ============================================================================
// MACRO DISPATCH
// ============================================================================

#[test]
#[serial]
fn test_info_macro_reaches_logger() {
    let entries = install_capture_logger();

    crate::rhi_info!("polaris::test", "hello {}", 42);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Info);
    assert_eq!(entries[0].source, "polaris::test");
    assert_eq!(entries[0].message, "hello 42");
    assert!(entries[0].file.is_none());
    assert!(entries[0].line.is_none());

    drop(entries);
    reset_logger();
}

#[test]
#[serial]
fn test_error_macro_carries_location() {
    let entries = install_capture_logger();

    crate::rhi_error!("polaris::test", "boom");

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].severity, LogSeverity::Error);
    // Error logs carry file:line details
    assert!(entries[0].file.is_some());
    assert!(entries[0].line.is_some());

    drop(entries);
    reset_logger();
}

#[test]
#[serial]
fn test_all_severity_macros() {
    let entries = install_capture_logger();

    crate::rhi_trace!("polaris::test", "trace");
    crate::rhi_debug!("polaris::test", "debug");
    crate::rhi_info!("polaris::test", "info");
    crate::rhi_warn!("polaris::test", "warn");
    crate::rhi_error!("polaris::test", "error");

    let entries = entries.lock().unwrap();
    let severities: Vec<LogSeverity> = entries.iter().map(|entry| entry.severity).collect();
    assert_eq!(
        severities,
        vec![
            LogSeverity::Trace,
            LogSeverity::Debug,
            LogSeverity::Info,
            LogSeverity::Warn,
            LogSeverity::Error,
        ]
    );

    drop(entries);
    reset_logger();
}

// ============================================================================
// LOGGER REPLACEMENT
// ============================================================================

#[test]
#[serial]
fn test_reset_logger_stops_capture() {
    let entries = install_capture_logger();
    reset_logger();

    // After reset, entries go to the DefaultLogger, not the capture
    crate::rhi_info!("polaris::test", "after reset");
    assert!(entries.lock().unwrap().is_empty());
}

// ============================================================================
// FATAL PATH
// ============================================================================

#[test]
#[serial]
#[should_panic(expected = "fatal graphics error")]
fn test_fatal_macro_panics() {
    // The fatal path logs, then aborts the calling thread
    reset_logger();
    crate::rhi_fatal!("polaris::test", "unrecoverable backend failure");
}
