//! Registry of uploaded meshes, keyed by caller-chosen type id.
//!
//! Meshes live until `clear()` or drop; there is no individual removal. A
//! handful of mesh types is expected, so lookup is a linear scan.

use bytemuck::cast_slice;
use crate::error::{Error, Result};
use crate::renderer::{Buffer, BufferDesc, GraphicsDevice};
use crate::resource::mesh::{Mesh2D, MeshTypeId};

/// GPU buffers of one uploaded mesh
pub struct MeshData<B> {
    type_id: MeshTypeId,
    vertex_buffer: B,
    vertex_count: u32,
    index_buffer: B,
    index_count: u32,
}

impl<B: Buffer> MeshData<B> {
    pub fn type_id(&self) -> MeshTypeId {
        self.type_id
    }

    pub fn vertex_buffer(&self) -> &B {
        &self.vertex_buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn index_buffer(&self) -> &B {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Triangles drawn per instance
    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }
}

/// Owner of every uploaded mesh
pub struct MeshManager<B> {
    meshes: Vec<MeshData<B>>,
}

impl<B: Buffer> Default for MeshManager<B> {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(message: String) -> Error {
    crate::engine_error!("stellar2d::MeshManager", "Mesh upload rejected: {}", message);
    Error::InvalidArgument(message)
}

impl<B: Buffer> MeshManager<B> {
    pub fn new() -> Self {
        Self { meshes: Vec::new() }
    }

    /// Check a mesh description without touching the device
    pub fn validate(&self, mesh: &Mesh2D<'_>) -> Result<()> {
        if mesh.vertices.is_empty() {
            return Err(invalid(format!("mesh type {} has no vertices", mesh.type_id)));
        }
        if mesh.indices.is_empty() {
            return Err(invalid(format!("mesh type {} has no indices", mesh.type_id)));
        }
        if mesh.indices.len() % 3 != 0 {
            return Err(invalid(format!(
                "mesh type {} has {} indices, not a multiple of 3",
                mesh.type_id,
                mesh.indices.len()
            )));
        }
        if u32::try_from(mesh.vertices.len()).is_err() || u32::try_from(mesh.indices.len()).is_err() {
            return Err(invalid(format!("mesh type {} is too large", mesh.type_id)));
        }
        let vertex_count = mesh.vertices.len() as u32;
        if let Some(index) = mesh.indices.iter().find(|&&index| index >= vertex_count) {
            return Err(invalid(format!(
                "mesh type {} references vertex {} but has {} vertices",
                mesh.type_id, index, vertex_count
            )));
        }
        if self.get_mesh_data_by_type(mesh.type_id).is_some() {
            return Err(invalid(format!("mesh type {} is already uploaded", mesh.type_id)));
        }
        Ok(())
    }

    /// Upload a mesh into host-visible vertex and index buffers
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for empty geometry, an index count that is not a
    ///   multiple of 3, an out-of-range index or a duplicate type id (no device call)
    /// - `OutOfMemory` / `NoMatchingMemoryType` from buffer creation; buffers
    ///   already created by this call are released
    pub fn upload_mesh<D>(&mut self, device: &D, mesh: &Mesh2D<'_>) -> Result<()>
    where
        D: GraphicsDevice<Buffer = B>,
    {
        self.validate(mesh)?;

        let vertex_bytes: &[u8] = cast_slice(mesh.vertices);
        let index_bytes: &[u8] = cast_slice(mesh.indices);

        let vertex_buffer = device.create_buffer(&BufferDesc::vertex(vertex_bytes.len() as u64))?;
        vertex_buffer.update(0, vertex_bytes)?;
        let index_buffer = device.create_buffer(&BufferDesc::index(index_bytes.len() as u64))?;
        index_buffer.update(0, index_bytes)?;

        if self.meshes.len() == self.meshes.capacity() {
            self.meshes.reserve(self.meshes.len().max(4));
        }
        self.meshes.push(MeshData {
            type_id: mesh.type_id,
            vertex_buffer,
            vertex_count: mesh.vertices.len() as u32,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        });

        crate::engine_debug!(
            "stellar2d::MeshManager",
            "Uploaded mesh type {} ({} vertices, {} indices)",
            mesh.type_id,
            mesh.vertices.len(),
            mesh.indices.len()
        );
        Ok(())
    }

    /// Find an uploaded mesh
    pub fn get_mesh_data_by_type(&self, type_id: MeshTypeId) -> Option<&MeshData<B>> {
        self.meshes.iter().find(|mesh| mesh.type_id == type_id)
    }

    /// Number of uploaded meshes
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Release every mesh
    pub fn clear(&mut self) {
        self.meshes.clear();
    }
}

#[cfg(test)]
#[path = "mesh_manager_tests.rs"]
mod tests;
