//! Integration tests for the Engine logging system
//!
//! These tests verify the log channel through the public API only.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use stellar_2d_engine::stellar2d::Engine;
use stellar_2d_engine::stellar2d::log::{Logger, LogEntry, LogSeverity};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test::module", "Test info message".to_string());
    Engine::log(LogSeverity::Warn, "test::module", "Test warning message".to_string());
    Engine::log(LogSeverity::Error, "test::module", "Test error message".to_string());

    let captured_entries = entries.lock().unwrap();
    assert_eq!(captured_entries.len(), 3);
    assert_eq!(captured_entries[0].severity, LogSeverity::Info);
    assert_eq!(captured_entries[0].source, "test::module");
    assert_eq!(captured_entries[1].message, "Test warning message");
    assert_eq!(captured_entries[2].severity, LogSeverity::Error);
    drop(captured_entries);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_error_logging_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log_detailed(
        LogSeverity::Error,
        "test::error",
        "vkAllocateMemory failed".to_string(),
        "vulkan_buffer.rs",
        42,
    );

    let captured_entries = entries.lock().unwrap();
    assert_eq!(captured_entries.len(), 1);
    let entry = &captured_entries[0];
    assert_eq!(entry.file, Some("vulkan_buffer.rs"));
    assert_eq!(entry.line, Some(42));
    drop(captured_entries);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_exported_macros() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    stellar_2d_engine::engine_info!("test::macros", "{} images", 3);
    let err = stellar_2d_engine::engine_err!("test::macros", "surface lost");

    assert_eq!(err.to_string(), "Backend error: surface lost");
    let captured = entries.lock().unwrap();
    assert_eq!(captured.len(), 2);
    assert_eq!(captured[0].message, "3 images");
    assert!(captured[1].file.is_some());
    drop(captured);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test", "Message 1".to_string());
    assert_eq!(entries.lock().unwrap().len(), 1);

    Engine::reset_logger();

    // Goes to the default logger, not captured
    Engine::log(LogSeverity::Info, "test", "Message 2".to_string());
    assert_eq!(entries.lock().unwrap().len(), 1);
}

#[test]
#[serial]
fn test_integration_logging_different_severities() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Trace, "test", "Trace message".to_string());
    Engine::log(LogSeverity::Debug, "test", "Debug message".to_string());
    Engine::log(LogSeverity::Info, "test", "Info message".to_string());
    Engine::log(LogSeverity::Warn, "test", "Warn message".to_string());
    Engine::log(LogSeverity::Error, "test", "Error message".to_string());

    let severities: Vec<LogSeverity> = entries.lock().unwrap().iter().map(|e| e.severity).collect();
    assert_eq!(
        severities,
        vec![LogSeverity::Trace, LogSeverity::Debug, LogSeverity::Info, LogSeverity::Warn, LogSeverity::Error]
    );

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_engine_lifecycle() {
    Engine::initialize().unwrap();
    assert!(Engine::is_initialized());
    Engine::initialize().unwrap();
    Engine::shutdown();
    assert!(!Engine::is_initialized());
    Engine::shutdown();
}
