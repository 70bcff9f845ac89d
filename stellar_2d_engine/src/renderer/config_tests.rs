//! Unit tests for Config

use std::path::PathBuf;
use std::time::Duration;
use crate::error::Error;
use crate::renderer::{Config, DebugSeverity, FRAMES_IN_FLIGHT};

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.shader_dir, PathBuf::from("bin/Shaders"));
    assert_eq!(config.frames_in_flight, FRAMES_IN_FLIGHT);
    assert_eq!(config.fence_timeout, Duration::from_secs(5));
    assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);
    assert!(config.prefer_low_latency);
    assert_eq!(config.debug_severity, DebugSeverity::ErrorsAndWarnings);
    assert_eq!(config.enable_validation, cfg!(debug_assertions));
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_frames_in_flight_rejected() {
    let config = Config { frames_in_flight: 0, ..Config::default() };
    assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
}

#[test]
fn test_zero_timeout_rejected() {
    let config = Config { fence_timeout: Duration::ZERO, ..Config::default() };
    assert!(config.validate().is_err());
}

#[test]
fn test_fence_timeout_ns() {
    assert_eq!(Config::default().fence_timeout_ns(), 5_000_000_000);

    let config = Config { fence_timeout: Duration::MAX, ..Config::default() };
    assert_eq!(config.fence_timeout_ns(), u64::MAX);
}
