//! GraphicsDevice trait - the resource factory seen by backend-agnostic code

use crate::error::Result;
use crate::renderer::{Buffer, BufferDesc};

/// Factory for GPU resources
///
/// Implemented by the backend device handle. Resources returned by the device
/// keep it alive, so they can be dropped in any order relative to it.
pub trait GraphicsDevice {
    /// Backend buffer type
    type Buffer: Buffer;

    /// Create a buffer
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the descriptor is malformed (checked before any GPU call)
    /// - `NoMatchingMemoryType` if no memory type satisfies `desc.memory`
    /// - `OutOfMemory` if the allocation fails
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Self::Buffer>;

    /// Block until the GPU has finished all submitted work
    fn wait_idle(&self) -> Result<()>;
}
