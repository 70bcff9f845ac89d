//! Per-frame instance batching.
//!
//! Instances are grouped by mesh type in first-seen order and replayed as one
//! instanced indexed draw per type. Batches and their upload buffers keep
//! their capacity across frames (high-water mark), so a steady scene stops
//! allocating after its first frames.

use bytemuck::cast_slice;
use rustc_hash::{FxHashMap, FxHashSet};
use crate::error::{Error, Result};
use crate::renderer::{Buffer, BufferDesc, CommandList, GraphicsDevice, IndexType};
use crate::resource::mesh::{MeshInstance, MeshTypeId};
use crate::resource::mesh_manager::MeshManager;

/// Counters of one recorded frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Number of draw calls recorded
    pub draw_calls: u32,
    /// Number of instances drawn
    pub instances: u32,
    /// Number of triangles drawn (all instances)
    pub triangles: u64,
}

/// Instances of one mesh type collected for the current frame
pub struct MeshInstanceBatch<B> {
    mesh_type: MeshTypeId,
    instances: Vec<MeshInstance>,
    /// One upload buffer per frame slot, so a slot in flight is never overwritten
    upload_buffers: Vec<Option<B>>,
}

impl<B: Buffer> MeshInstanceBatch<B> {
    fn new(mesh_type: MeshTypeId, frame_slots: usize) -> Self {
        Self {
            mesh_type,
            instances: Vec::new(),
            upload_buffers: (0..frame_slots).map(|_| None).collect(),
        }
    }

    pub fn mesh_type(&self) -> MeshTypeId {
        self.mesh_type
    }

    pub fn instances(&self) -> &[MeshInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Instances the batch can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.instances.capacity()
    }

    /// Size of the upload buffer of `frame_slot`, if one was created
    pub fn upload_buffer_size(&self, frame_slot: usize) -> Option<u64> {
        self.upload_buffers.get(frame_slot)?.as_ref().map(|buffer| buffer.size())
    }

    fn push(&mut self, instance: MeshInstance) {
        if self.instances.len() == self.instances.capacity() {
            self.instances.reserve(self.instances.len().max(16));
        }
        self.instances.push(instance);
    }

    /// Copy the instances into the slot's upload buffer, growing it if needed
    fn upload<D>(&mut self, device: &D, frame_slot: usize) -> Result<&B>
    where
        D: GraphicsDevice<Buffer = B>,
    {
        let bytes: &[u8] = cast_slice(&self.instances);
        let needed = bytes.len() as u64;
        let slot = &mut self.upload_buffers[frame_slot];

        let too_small = slot.as_ref().map_or(true, |buffer| buffer.size() < needed);
        if too_small {
            // Drop the old buffer first; the slot's fence has signaled
            *slot = None;
            let size = needed.next_power_of_two();
            *slot = Some(device.create_buffer(&BufferDesc::vertex(size))?);
        }

        match slot {
            Some(buffer) => {
                buffer.update(0, bytes)?;
                Ok(&*buffer)
            }
            None => Err(Error::InvalidResource("instance upload buffer missing".to_string())),
        }
    }
}

/// Collects instances between `clear` and `display` and records them
pub struct BatchRenderer<B> {
    batches: Vec<MeshInstanceBatch<B>>,
    index: FxHashMap<MeshTypeId, usize>,
    frame_slots: usize,
    warned_missing: FxHashSet<MeshTypeId>,
}

impl<B: Buffer> BatchRenderer<B> {
    /// Create a renderer recording into a ring of `frame_slots` slots
    pub fn new(frame_slots: usize) -> Self {
        Self {
            batches: Vec::new(),
            index: FxHashMap::default(),
            frame_slots: frame_slots.max(1),
            warned_missing: FxHashSet::default(),
        }
    }

    /// Queue one instance for the current frame
    pub fn add_instance(&mut self, instance: MeshInstance) {
        let position = match self.index.get(&instance.mesh_type) {
            Some(&position) => position,
            None => {
                let position = self.batches.len();
                self.batches.push(MeshInstanceBatch::new(instance.mesh_type, self.frame_slots));
                self.index.insert(instance.mesh_type, position);
                position
            }
        };
        self.batches[position].push(instance);
    }

    /// Empty every batch, keeping batches, capacity and upload buffers
    pub fn reset_batches(&mut self) {
        for batch in &mut self.batches {
            batch.instances.clear();
        }
    }

    /// Batches in first-seen order
    pub fn batches(&self) -> &[MeshInstanceBatch<B>] {
        &self.batches
    }

    pub fn batch(&self, mesh_type: MeshTypeId) -> Option<&MeshInstanceBatch<B>> {
        self.index.get(&mesh_type).map(|&position| &self.batches[position])
    }

    /// Instances queued for the current frame
    pub fn instance_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.len()).sum()
    }

    /// Upload every non-empty batch and record one instanced draw per batch
    ///
    /// Vertex binding 0 receives the mesh vertices, binding 1 the instances.
    /// Batches whose mesh type was never uploaded are skipped.
    pub fn record<D, C>(
        &mut self,
        device: &D,
        meshes: &MeshManager<B>,
        cmd: &mut C,
        frame_slot: usize,
    ) -> Result<FrameStats>
    where
        D: GraphicsDevice<Buffer = B>,
        C: CommandList<Buffer = B>,
    {
        if frame_slot >= self.frame_slots {
            return Err(Error::InvalidArgument(format!(
                "frame slot {} out of range ({} slots)",
                frame_slot, self.frame_slots
            )));
        }

        let mut stats = FrameStats::default();
        for batch in &mut self.batches {
            if batch.is_empty() {
                continue;
            }
            let Some(mesh) = meshes.get_mesh_data_by_type(batch.mesh_type) else {
                if self.warned_missing.insert(batch.mesh_type) {
                    crate::engine_warn!(
                        "stellar2d::BatchRenderer",
                        "Skipping {} instances of mesh type {}: mesh was never uploaded",
                        batch.len(),
                        batch.mesh_type
                    );
                }
                continue;
            };

            let instance_count = batch.len() as u32;
            let instance_buffer = batch.upload(device, frame_slot)?;

            cmd.bind_vertex_buffers(0, &[mesh.vertex_buffer(), instance_buffer])?;
            cmd.bind_index_buffer(mesh.index_buffer(), IndexType::U32)?;
            cmd.draw_indexed(mesh.index_count(), instance_count)?;

            stats.draw_calls += 1;
            stats.instances += instance_count;
            stats.triangles += mesh.triangle_count() as u64 * instance_count as u64;
        }

        crate::engine_trace!(
            "stellar2d::BatchRenderer",
            "Recorded {} draws, {} instances",
            stats.draw_calls,
            stats.instances
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "batch_renderer_tests.rs"]
mod tests;
