//! Backend configuration

use std::path::PathBuf;
use std::time::Duration;
use crate::error::{Error, Result};

/// Default number of frames the CPU may record ahead of the GPU
pub const FRAMES_IN_FLIGHT: usize = 2;

/// Validation message filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything, including info and verbose
    All,
}

/// Graphics backend configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Application name reported to the driver
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Enable validation layers and the debug messenger
    pub enable_validation: bool,
    /// Which validation messages reach the engine log
    pub debug_severity: DebugSeverity,
    /// Directory holding `default.vert.spv` and `default.frag.spv`
    pub shader_dir: PathBuf,
    /// Prefer MAILBOX presentation over FIFO when available
    pub prefer_low_latency: bool,
    /// Depth of the frame ring
    pub frames_in_flight: usize,
    /// Upper bound on a single fence wait
    pub fence_timeout: Duration,
    /// Color used when `display` opens a frame that was never cleared
    pub clear_color: [f32; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Stellar2D Application".to_string(),
            app_version: (1, 0, 0),
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            shader_dir: PathBuf::from("bin/Shaders"),
            prefer_low_latency: true,
            frames_in_flight: FRAMES_IN_FLIGHT,
            fence_timeout: Duration::from_secs(5),
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

impl Config {
    /// Reject configurations the backend cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::InvalidArgument("frames_in_flight must be at least 1".to_string()));
        }
        if self.fence_timeout.is_zero() {
            return Err(Error::InvalidArgument("fence_timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Fence timeout in nanoseconds, saturated to `u64::MAX`
    pub fn fence_timeout_ns(&self) -> u64 {
        u64::try_from(self.fence_timeout.as_nanos()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
