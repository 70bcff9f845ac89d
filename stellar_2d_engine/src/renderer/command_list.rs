//! CommandList trait - the recording surface used by the batch renderer

use crate::error::Result;
use crate::renderer::Buffer;

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit unsigned indices
    U16,
    /// 32-bit unsigned indices
    U32,
}

impl IndexType {
    /// Size of one index in bytes
    pub fn size_bytes(&self) -> u64 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Command list for recording draw commands
///
/// Only the commands needed to replay batched geometry are abstracted; render
/// pass and pipeline state stay backend-side.
pub trait CommandList {
    /// Buffer type the backend binds
    type Buffer: Buffer;

    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Bind consecutive vertex buffer bindings starting at `first_binding`, offset 0
    fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[&Self::Buffer]) -> Result<()>;

    /// Bind an index buffer at offset 0
    fn bind_index_buffer(&mut self, buffer: &Self::Buffer, index_type: IndexType) -> Result<()>;

    /// Draw `instance_count` instances of `index_count` indices
    fn draw_indexed(&mut self, index_count: u32, instance_count: u32) -> Result<()>;
}
