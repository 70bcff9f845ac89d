//! GPU-visible geometry records.
//!
//! `Vertex2D` feeds vertex binding 0, `MeshInstance` feeds the per-instance
//! binding 1. Both layouts are shared byte-for-byte with `default.vert`.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Caller-chosen identifier of an uploaded mesh
pub type MeshTypeId = u32;

/// One mesh vertex
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex2D {
    /// Model-space position (location 0)
    pub position: [f32; 2],
    /// RGBA color (location 1)
    pub color: [f32; 4],
}

impl Vertex2D {
    pub const fn new(position: [f32; 2], color: [f32; 4]) -> Self {
        Self { position, color }
    }
}

/// Per-instance draw payload
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshInstance {
    /// Mesh to draw; not read by the shader
    pub mesh_type: MeshTypeId,
    /// Model-space scale (location 2)
    pub scale: [f32; 2],
    /// World position, `z` is depth in `[0, 1]` (location 3)
    pub position: [f32; 3],
    /// Color multiplier (location 4)
    pub color: [f32; 4],
}

impl MeshInstance {
    /// Byte offset of `scale`
    pub const SCALE_OFFSET: u32 = 4;
    /// Byte offset of `position`
    pub const POSITION_OFFSET: u32 = 12;
    /// Byte offset of `color`
    pub const COLOR_OFFSET: u32 = 24;
}

impl Vertex2D {
    /// Byte offset of `color`
    pub const COLOR_OFFSET: u32 = 8;
}

/// Borrowed mesh description handed to `upload_mesh`
#[derive(Debug, Clone, Copy)]
pub struct Mesh2D<'a> {
    pub type_id: MeshTypeId,
    pub vertices: &'a [Vertex2D],
    /// Triangle list, 32-bit indices
    pub indices: &'a [u32],
}

/// Contents of the uniform buffer at set 0, binding 0
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ViewUniform {
    pub projection: Mat4,
}

impl ViewUniform {
    /// Aspect-correcting orthographic projection for a `width` x `height` surface
    ///
    /// The shorter axis spans `[-1, 1]`, +y points up, depth maps `[0, 1]` to itself.
    pub fn for_extent(width: u32, height: u32) -> Self {
        let (w, h) = (width.max(1) as f32, height.max(1) as f32);
        let (half_w, half_h) = if w >= h { (w / h, 1.0) } else { (1.0, h / w) };
        // Vulkan clip space has +y down, so bottom and top are swapped
        Self {
            projection: Mat4::orthographic_lh(-half_w, half_w, half_h, -half_h, 0.0, 1.0),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
