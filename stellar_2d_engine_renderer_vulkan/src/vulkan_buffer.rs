/// DeviceBuffer - Vulkan buffer with its own memory block

use stellar_2d_engine::stellar2d::{Error, Result};
use stellar_2d_engine::stellar2d::render::{
    check_write_range, Buffer as RendererBuffer, BufferDesc, BufferUsage,
};
use stellar_2d_engine::{engine_error, engine_trace};
use ash::vk;

use crate::vulkan_context::Device;
use crate::vulkan_format::{buffer_usage_to_vk, memory_property_to_vk, vk_error};

/// Vulkan buffer implementation
///
/// Exclusively owned, bound to a dedicated allocation at offset 0.
pub struct DeviceBuffer {
    device: Device,
    pub(crate) buffer: vk::Buffer,
    memory: vk::DeviceMemory,
    size: u64,
    usage: BufferUsage,
    memory_flags: vk::MemoryPropertyFlags,
}

impl DeviceBuffer {
    /// Create a buffer and bind freshly allocated memory to it
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the size is 0 or the usage is empty
    /// - `NoMatchingMemoryType` if no memory type has the requested properties
    /// - `OutOfMemory` if the allocation fails
    pub fn new(device: &Device, desc: &BufferDesc) -> Result<Self> {
        desc.validate().map_err(|e| {
            engine_error!("stellar2d::vulkan", "Rejected buffer description: {}", e);
            e
        })?;

        let memory_flags = memory_property_to_vk(desc.memory);

        unsafe {
            let queue_families = [device.graphics_queue_family()];
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(buffer_usage_to_vk(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .queue_family_indices(&queue_families);

            let buffer = device.raw().create_buffer(&buffer_create_info, None)
                .map_err(|e| vk_error("vkCreateBuffer", e))?;

            // From here on, drop releases whatever was created
            let mut this = Self {
                device: device.clone(),
                buffer,
                memory: vk::DeviceMemory::null(),
                size: desc.size,
                usage: desc.usage,
                memory_flags,
            };

            let requirements = device.raw().get_buffer_memory_requirements(buffer);
            let memory_type = device
                .find_memory_type(requirements.memory_type_bits, memory_flags)
                .ok_or_else(|| {
                    engine_error!("stellar2d::vulkan",
                        "No memory type with {:?} for a {} byte buffer", memory_flags, desc.size);
                    Error::NoMatchingMemoryType
                })?;

            let allocate_info = vk::MemoryAllocateInfo::default()
                .allocation_size(requirements.size)
                .memory_type_index(memory_type);

            this.memory = device.raw().allocate_memory(&allocate_info, None)
                .map_err(|e| {
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("stellar2d::vulkan",
                        "Out of GPU memory for buffer (required: {:.2} MB): {:?}", size_mb, e);
                    Error::OutOfMemory
                })?;

            device.raw().bind_buffer_memory(buffer, this.memory, 0)
                .map_err(|e| vk_error("vkBindBufferMemory", e))?;

            engine_trace!("stellar2d::vulkan", "Created {} byte buffer ({:?})", desc.size, desc.usage);
            Ok(this)
        }
    }

    /// Copy `data` to the start of the buffer
    ///
    /// Only valid for host-visible memory; `data` must fit in the buffer.
    pub fn memcpy(&self, data: &[u8]) -> Result<()> {
        self.write(0, data)
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Whether the CPU can map this buffer
    pub fn is_host_visible(&self) -> bool {
        self.memory_flags.contains(vk::MemoryPropertyFlags::HOST_VISIBLE)
    }

    /// Get the underlying Vulkan buffer
    pub fn raw(&self) -> vk::Buffer {
        self.buffer
    }

    fn write(&self, offset: u64, data: &[u8]) -> Result<()> {
        if !self.is_host_visible() {
            engine_error!("stellar2d::vulkan", "Buffer update failed: memory is not host-visible");
            return Err(Error::InvalidResource("buffer memory is not host-visible".to_string()));
        }
        check_write_range(self.size, offset, data)?;
        if data.is_empty() {
            return Ok(());
        }

        unsafe {
            let mapped = self.device.raw()
                .map_memory(self.memory, offset, data.len() as u64, vk::MemoryMapFlags::empty())
                .map_err(|e| vk_error("vkMapMemory", e))?;

            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped as *mut u8, data.len());

            // Upload memory is HOST_COHERENT, no flush
            self.device.raw().unmap_memory(self.memory);
        }
        Ok(())
    }
}

impl RendererBuffer for DeviceBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.write(offset, data)
    }
}

impl Drop for DeviceBuffer {
    fn drop(&mut self) {
        unsafe {
            // The buffer may still be referenced by in-flight work
            self.device.raw().device_wait_idle().ok();
            self.device.raw().destroy_buffer(self.buffer, None);
            self.device.raw().free_memory(self.memory, None);
        }
    }
}
