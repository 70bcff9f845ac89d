//! Stellar2D Engine - process-wide services shared by the core and the backends
//!
//! The engine owns the log channel (logger + minimum severity). Rendering state
//! itself lives in the graphics plugin, so the engine only tracks whether it was
//! initialized and where diagnostics go.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Minimum severity forwarded to the logger
static LOG_LEVEL: RwLock<LogSeverity> = RwLock::new(LogSeverity::Trace);

struct EngineState {
    initialized: RwLock<bool>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            initialized: RwLock::new(false),
        }
    }
}

fn logger() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)))
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// # Example
///
/// ```no_run
/// use stellar_2d_engine::stellar2d::Engine;
///
/// Engine::initialize()?;
/// // load the graphics plugin, create contexts, render...
/// Engine::shutdown();
/// # Ok::<(), stellar_2d_engine::stellar2d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Initialize the engine
    ///
    /// Calling it again while initialized is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` if the engine state lock is poisoned.
    pub fn initialize() -> Result<()> {
        let state = ENGINE_STATE.get_or_init(EngineState::new);
        let mut initialized = state.initialized.write()
            .map_err(|_| Error::BackendError("Engine state lock poisoned".to_string()))?;

        if !*initialized {
            *initialized = true;
            crate::engine_info!("stellar2d::Engine", "Engine initialized");
        }
        Ok(())
    }

    /// Shutdown the engine
    ///
    /// Plugins must be deinitialized before this is called. Calling it twice, or
    /// without a prior `initialize()`, does nothing.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut initialized) = state.initialized.write() {
                if *initialized {
                    *initialized = false;
                    crate::engine_info!("stellar2d::Engine", "Engine shut down");
                }
            }
        }
    }

    /// Whether `initialize()` has been called without a matching `shutdown()`
    pub fn is_initialized() -> bool {
        ENGINE_STATE.get()
            .and_then(|state| state.initialized.read().ok().map(|flag| *flag))
            .unwrap_or(false)
    }

    /// Reset engine state for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut initialized) = state.initialized.write() {
                *initialized = false;
            }
        }
        Self::set_log_level(LogSeverity::Trace);
        Self::reset_logger();
    }

    // ===== LOGGING API =====

    /// Set a custom logger
    ///
    /// # Example
    ///
    /// ```no_run
    /// use stellar_2d_engine::stellar2d::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger_impl: L) {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(logger_impl);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        if let Ok(mut lock) = logger().write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Drop every entry below `severity`
    pub fn set_log_level(severity: LogSeverity) {
        if let Ok(mut level) = LOG_LEVEL.write() {
            *level = severity;
        }
    }

    /// Current minimum severity
    pub fn log_level() -> LogSeverity {
        LOG_LEVEL.read().map(|level| *level).unwrap_or(LogSeverity::Trace)
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by macros like engine_info!, engine_warn!, etc.
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Internal logging method with file:line information (for ERROR logs)
    ///
    /// Used by engine_error!, engine_err! and engine_bail!.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(entry: LogEntry) {
        if entry.severity < Self::log_level() {
            return;
        }
        if let Ok(lock) = logger().read() {
            lock.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
