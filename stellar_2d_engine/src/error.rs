//! Error types for the Stellar2D engine
//!
//! This module defines the error type shared by the core crate and the
//! rendering backends: argument validation, resource exhaustion, GPU API
//! failures and transient presentation errors.

use std::fmt;

/// Result type for Stellar2D operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stellar2D errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan, etc.)
    BackendError(String),

    /// Out of GPU (or host) memory
    OutOfMemory,

    /// Invalid resource (buffer, image, pipeline, etc.)
    InvalidResource(String),

    /// Initialization failed (engine, plugin, subsystems)
    InitializationFailed(String),

    /// Null/zero-sized or otherwise malformed input, rejected before any side effect
    InvalidArgument(String),

    /// The selected GPU exposes no graphics-capable queue family
    NoSuitableQueueFamily,

    /// No device memory type satisfies the requested type bits and property flags
    NoMatchingMemoryType,

    /// A SPIR-V binary is missing, empty or malformed
    ShaderLoadFailed(String),

    /// A pipeline object (or one of its dependencies) could not be created
    PipelineCreateFailed(String),

    /// A graphics API call returned a non-success result code
    GpuApi {
        /// Name of the failing call
        operation: String,
        /// Raw result code reported by the API
        code: i32,
    },

    /// The presentation surface changed and the swapchain must be recreated
    SurfaceOutOfDate,

    /// The logical device was lost
    DeviceLost,

    /// A bounded GPU wait expired
    Timeout,
}

impl Error {
    /// Whether the error is recoverable by recreating the swapchain and redrawing
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::SurfaceOutOfDate)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::NoSuitableQueueFamily => write!(f, "No suitable queue family"),
            Error::NoMatchingMemoryType => write!(f, "No matching memory type"),
            Error::ShaderLoadFailed(msg) => write!(f, "Shader load failed: {}", msg),
            Error::PipelineCreateFailed(msg) => write!(f, "Pipeline creation failed: {}", msg),
            Error::GpuApi { operation, code } => {
                write!(f, "GPU API error in {}: result code {}", operation, code)
            }
            Error::SurfaceOutOfDate => write!(f, "Surface out of date"),
            Error::DeviceLost => write!(f, "Device lost"),
            Error::Timeout => write!(f, "GPU wait timed out"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
