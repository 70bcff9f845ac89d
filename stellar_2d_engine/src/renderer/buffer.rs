//! Buffer trait and buffer descriptor

use bitflags::bitflags;
use crate::error::{Error, Result};

bitflags! {
    /// How a buffer is bound by the GPU
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex (or per-instance) attribute source
        const VERTEX = 1 << 0;
        /// Index source
        const INDEX = 1 << 1;
        /// Uniform/constant buffer
        const UNIFORM = 1 << 2;
        /// Source of a transfer command
        const TRANSFER_SRC = 1 << 3;
        /// Destination of a transfer command
        const TRANSFER_DST = 1 << 4;
    }
}

bitflags! {
    /// Required properties of the memory backing a buffer or image
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemoryProperty: u32 {
        /// Fast GPU-local memory
        const DEVICE_LOCAL = 1 << 0;
        /// CPU can map the memory
        const HOST_VISIBLE = 1 << 1;
        /// CPU writes are visible without explicit flushes
        const HOST_COHERENT = 1 << 2;
    }
}

impl MemoryProperty {
    /// Mappable, coherent memory used for every CPU-written buffer
    pub const UPLOAD: Self = Self::HOST_VISIBLE.union(Self::HOST_COHERENT);
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferDesc {
    /// Buffer usage
    pub usage: BufferUsage,
    /// Size in bytes
    pub size: u64,
    /// Memory properties the allocation must satisfy
    pub memory: MemoryProperty,
}

impl BufferDesc {
    /// Host-visible vertex buffer of `size` bytes
    pub fn vertex(size: u64) -> Self {
        Self { usage: BufferUsage::VERTEX, size, memory: MemoryProperty::UPLOAD }
    }

    /// Host-visible index buffer of `size` bytes
    pub fn index(size: u64) -> Self {
        Self { usage: BufferUsage::INDEX, size, memory: MemoryProperty::UPLOAD }
    }

    /// Host-visible uniform buffer of `size` bytes
    pub fn uniform(size: u64) -> Self {
        Self { usage: BufferUsage::UNIFORM, size, memory: MemoryProperty::UPLOAD }
    }

    /// Check the descriptor before any device call
    pub fn validate(&self) -> Result<()> {
        if self.size == 0 {
            return Err(Error::InvalidArgument("buffer size is 0".to_string()));
        }
        if self.usage.is_empty() {
            return Err(Error::InvalidArgument("buffer usage is empty".to_string()));
        }
        Ok(())
    }
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types (e.g., DeviceBuffer).
/// The buffer is destroyed when dropped.
pub trait Buffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Update buffer data
    ///
    /// # Arguments
    ///
    /// * `offset` - Offset into the buffer in bytes
    /// * `data` - Data to write (`offset + data.len()` must not exceed `size()`)
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;
}

/// Check that `data` fits in a buffer of `size` bytes at `offset`
pub fn check_write_range(size: u64, offset: u64, data: &[u8]) -> Result<()> {
    let end = offset.checked_add(data.len() as u64);
    match end {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::InvalidArgument(format!(
            "write of {} bytes at offset {} exceeds buffer size {}",
            data.len(), offset, size
        ))),
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
