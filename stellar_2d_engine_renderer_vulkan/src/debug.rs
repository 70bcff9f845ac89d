/// Vulkan Debug Messenger - Routes validation layer messages into the engine log
///
/// Messages are counted per severity and identical messages are tracked so
/// repeats can be reported as `[xN]` instead of flooding the log.

use ash::vk;
use colored::Colorize;
use rustc_hash::FxHashMap;
use stellar_2d_engine::stellar2d::Engine;
use stellar_2d_engine::stellar2d::log::LogSeverity;
use stellar_2d_engine::stellar2d::render::DebugSeverity;
use std::ffi::CStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Log source used for every validation message
pub const VALIDATION_SOURCE: &str = "stellar2d::vulkan::validation";

/// Global validation statistics (thread-safe atomic counters)
static VALIDATION_STATS: ValidationStatsTracker = ValidationStatsTracker::new();

/// Global message tracker for grouping identical messages
static MESSAGE_TRACKER: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Validation message counters since the device was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }
}

/// Thread-safe validation statistics tracker
struct ValidationStatsTracker {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl ValidationStatsTracker {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn increment(&self, severity: LogSeverity) {
        let counter = match severity {
            LogSeverity::Error => &self.errors,
            LogSeverity::Warn => &self.warnings,
            LogSeverity::Info => &self.info,
            LogSeverity::Debug | LogSeverity::Trace => &self.verbose,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get_stats(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Reset counters and the duplicate tracker (called when the messenger is created)
pub fn init_debug_tracking() {
    VALIDATION_STATS.reset();
    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        *tracker = Some(FxHashMap::default());
    }
}

/// Stop tracking duplicates (called before the messenger is destroyed)
pub fn cleanup_debug_tracking() {
    if let Ok(mut tracker) = MESSAGE_TRACKER.lock() {
        *tracker = None;
    }
}

/// Get current validation statistics
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.get_stats()
}

/// Number of distinct messages that were reported more than once
pub fn duplicate_message_count() -> usize {
    MESSAGE_TRACKER
        .lock()
        .ok()
        .and_then(|tracker| {
            tracker.as_ref().map(|messages| messages.values().filter(|&&count| count > 1).count())
        })
        .unwrap_or(0)
}

/// Human-readable summary of `stats`, colored for a terminal
pub fn validation_report(stats: &ValidationStats, duplicates: usize) -> String {
    if stats.total() == 0 {
        return format!("{}", "No validation messages".green().bold());
    }

    let mut lines = vec![format!("{}", "=== Validation Statistics Report ===".bright_blue().bold())];
    if stats.errors > 0 {
        lines.push(format!("  {} {}", "Errors:".red().bold(), stats.errors));
    }
    if stats.warnings > 0 {
        lines.push(format!("  {} {}", "Warnings:".yellow().bold(), stats.warnings));
    }
    if stats.info > 0 {
        lines.push(format!("  {} {}", "Info:".cyan(), stats.info));
    }
    if stats.verbose > 0 {
        lines.push(format!("  {} {}", "Verbose:".bright_black(), stats.verbose));
    }
    lines.push(format!("  {} {}", "Total:".white().bold(), stats.total()));
    if duplicates > 0 {
        lines.push(format!("  {} message(s) appeared multiple times", duplicates));
    }
    lines.join("\n")
}

/// Print the validation summary to stdout
pub fn print_validation_stats_report() {
    println!("\n{}\n", validation_report(&get_validation_stats(), duplicate_message_count()));
}

/// Messenger severity mask for the configured verbosity
pub fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

/// Engine log severity of a validation message
pub fn log_severity(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> LogSeverity {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        LogSeverity::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        LogSeverity::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        LogSeverity::Info
    } else {
        LogSeverity::Debug
    }
}

/// Short label of the message category
pub fn message_type_label(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Record one occurrence of `message`, returning how often it was seen
fn track_message(message: &str) -> u32 {
    let Ok(mut guard) = MESSAGE_TRACKER.lock() else {
        return 1;
    };
    let messages = guard.get_or_insert_with(FxHashMap::default);
    let count = messages.entry(message.to_string()).or_insert(0);
    *count += 1;
    *count
}

/// Format a validation message as it appears in the engine log
pub fn format_message(type_label: &str, message_id: &str, message: &str, occurrences: u32) -> String {
    if occurrences > 1 {
        format!("[{}] [x{}] {}: {}", type_label, occurrences, message_id, message)
    } else {
        format!("[{}] {}: {}", type_label, message_id, message)
    }
}

unsafe fn c_str_or<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> &'a str {
    if ptr.is_null() {
        fallback
    } else {
        CStr::from_ptr(ptr).to_str().unwrap_or("Invalid UTF-8")
    }
}

/// Vulkan debug messenger callback
///
/// Called by the validation layers. The message is counted, grouped with its
/// previous occurrences and forwarded to `Engine::log`.
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = &*p_callback_data;
    let message_id = c_str_or(callback_data.p_message_id_name, "Unknown");
    let message = c_str_or(callback_data.p_message, "No message");

    let severity = log_severity(message_severity);
    VALIDATION_STATS.increment(severity);
    let occurrences = track_message(message);

    Engine::log(
        severity,
        VALIDATION_SOURCE,
        format_message(message_type_label(message_type), message_id, message, occurrences),
    );

    // Never abort the Vulkan call that triggered the message
    vk::FALSE
}

#[cfg(test)]
#[path = "debug_tests.rs"]
mod tests;
