//! Integration tests for the engine logging system
//!
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use ssao_engine::ssao::{Engine, Error};
use ssao_engine::ssao::log::{Logger, LogEntry, LogSeverity};
use ssao_engine::{engine_bail, engine_err, engine_info, engine_warn};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Captures entries for verification
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

fn failing_operation(label: &str) -> ssao_engine::ssao::Result<()> {
    engine_bail!("ssao::test", "cannot create '{}'", label)
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_integration_custom_logger_receives_macros() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    engine_info!("ssao::test", "frame {} rendered", 3);
    engine_warn!("ssao::test", "fence slow");

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].severity, LogSeverity::Info);
        assert_eq!(captured[0].source, "ssao::test");
        assert_eq!(captured[0].message, "frame 3 rendered");
        assert_eq!(captured[0].file, None);
        assert_eq!(captured[1].severity, LogSeverity::Warn);
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_engine_err_logs_with_location() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let error = engine_err!("ssao::test", "descriptor pool {} failed", 2);
    assert!(matches!(error, Error::BackendError(ref message) if message == "descriptor pool 2 failed"));

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].severity, LogSeverity::Error);
        assert!(captured[0].file.is_some());
        assert!(captured[0].line.is_some());
    }

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_engine_bail_returns_error() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    let result = failing_operation("gbuffer");
    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(entries.lock().unwrap()[0].message, "cannot create 'gbuffer'");

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_min_severity_filters() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);
    Engine::set_min_severity(LogSeverity::Warn);

    Engine::log(LogSeverity::Trace, "test", "Trace message".to_string());
    Engine::log(LogSeverity::Info, "test", "Info message".to_string());
    Engine::log(LogSeverity::Warn, "test", "Warn message".to_string());
    Engine::log(LogSeverity::Error, "test", "Error message".to_string());

    {
        let captured = entries.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].severity, LogSeverity::Warn);
        assert_eq!(captured[1].severity, LogSeverity::Error);
    }

    Engine::reset_logger();
    assert_eq!(Engine::min_severity(), LogSeverity::Trace);
}

#[test]
#[serial]
fn test_integration_logger_reset() {
    let (test_logger, entries) = TestLogger::new();
    Engine::set_logger(test_logger);

    Engine::log(LogSeverity::Info, "test", "Message 1".to_string());
    assert_eq!(entries.lock().unwrap().len(), 1);

    Engine::reset_logger();

    // Goes to the default logger
    Engine::log(LogSeverity::Info, "test", "Message 2".to_string());
    assert_eq!(entries.lock().unwrap().len(), 1);
}
