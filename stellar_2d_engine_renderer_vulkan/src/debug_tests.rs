//! Unit tests for the validation messenger helpers
//!
//! The callback itself needs a live instance; everything it is built from is
//! tested here without a GPU.

use super::*;

#[test]
fn test_severity_flags_errors_only() {
    let flags = severity_flags(DebugSeverity::ErrorsOnly);
    assert_eq!(flags, vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
}

#[test]
fn test_severity_flags_errors_and_warnings() {
    let flags = severity_flags(DebugSeverity::ErrorsAndWarnings);
    assert!(flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR));
    assert!(flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING));
    assert!(!flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO));
}

#[test]
fn test_severity_flags_all() {
    let flags = severity_flags(DebugSeverity::All);
    assert!(flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
    assert!(flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO));
}

#[test]
fn test_log_severity_mapping() {
    assert_eq!(log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR), LogSeverity::Error);
    assert_eq!(log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING), LogSeverity::Warn);
    assert_eq!(log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::INFO), LogSeverity::Info);
    assert_eq!(log_severity(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE), LogSeverity::Debug);
}

#[test]
fn test_message_type_label() {
    assert_eq!(message_type_label(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION), "Validation");
    assert_eq!(message_type_label(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE), "Performance");
    assert_eq!(message_type_label(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL), "General");
}

#[test]
fn test_format_message_marks_repeats() {
    let first = format_message("Validation", "VUID-1", "bad layout", 1);
    assert_eq!(first, "[Validation] VUID-1: bad layout");

    let third = format_message("Validation", "VUID-1", "bad layout", 3);
    assert_eq!(third, "[Validation] [x3] VUID-1: bad layout");
}

#[test]
fn test_validation_stats_total() {
    let stats = ValidationStats { errors: 1, warnings: 2, info: 3, verbose: 4 };
    assert_eq!(stats.total(), 10);
    assert_eq!(ValidationStats::default().total(), 0);
}

#[test]
fn test_validation_report_clean_run() {
    let report = validation_report(&ValidationStats::default(), 0);
    assert!(report.contains("No validation messages"));
    assert!(!report.contains("Total:"));
}

#[test]
fn test_validation_report_lists_non_zero_counters() {
    let stats = ValidationStats { errors: 2, warnings: 0, info: 1, verbose: 0 };
    let report = validation_report(&stats, 1);
    assert!(report.contains("Errors:"));
    assert!(!report.contains("Warnings:"));
    assert!(report.contains("Info:"));
    assert!(report.contains("Total:"));
    assert!(report.contains("1 message(s) appeared multiple times"));
}
