/// Conversions between engine types and Vulkan enums/flags

use ash::vk;
use stellar_2d_engine::engine_error;
use stellar_2d_engine::stellar2d::Error;
use stellar_2d_engine::stellar2d::render::{BufferUsage, IndexType, MemoryProperty};

/// Convert BufferUsage to Vulkan buffer usage flags
pub fn buffer_usage_to_vk(usage: BufferUsage) -> vk::BufferUsageFlags {
    let mut flags = vk::BufferUsageFlags::empty();
    if usage.contains(BufferUsage::VERTEX) {
        flags |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if usage.contains(BufferUsage::INDEX) {
        flags |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if usage.contains(BufferUsage::UNIFORM) {
        flags |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    if usage.contains(BufferUsage::TRANSFER_SRC) {
        flags |= vk::BufferUsageFlags::TRANSFER_SRC;
    }
    if usage.contains(BufferUsage::TRANSFER_DST) {
        flags |= vk::BufferUsageFlags::TRANSFER_DST;
    }
    flags
}

/// Convert MemoryProperty to Vulkan memory property flags
pub fn memory_property_to_vk(memory: MemoryProperty) -> vk::MemoryPropertyFlags {
    let mut flags = vk::MemoryPropertyFlags::empty();
    if memory.contains(MemoryProperty::DEVICE_LOCAL) {
        flags |= vk::MemoryPropertyFlags::DEVICE_LOCAL;
    }
    if memory.contains(MemoryProperty::HOST_VISIBLE) {
        flags |= vk::MemoryPropertyFlags::HOST_VISIBLE;
    }
    if memory.contains(MemoryProperty::HOST_COHERENT) {
        flags |= vk::MemoryPropertyFlags::HOST_COHERENT;
    }
    flags
}

/// Convert IndexType to Vulkan index type
pub fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

/// Whether a depth format also carries a stencil component
pub fn has_stencil(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D16_UNORM_S8_UINT
    )
}

/// Image aspect of a depth attachment in `format`
pub fn depth_aspect(format: vk::Format) -> vk::ImageAspectFlags {
    if has_stencil(format) {
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    } else {
        vk::ImageAspectFlags::DEPTH
    }
}

/// Engine error for a failed Vulkan call (without logging)
pub fn vk_result_to_error(operation: &str, result: vk::Result) -> Error {
    match result {
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => Error::OutOfMemory,
        vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost,
        vk::Result::TIMEOUT => Error::Timeout,
        vk::Result::ERROR_OUT_OF_DATE_KHR => Error::SurfaceOutOfDate,
        other => Error::GpuApi {
            operation: operation.to_string(),
            code: other.as_raw(),
        },
    }
}

/// Log a failed Vulkan call and convert it with `vk_result_to_error`
pub fn vk_error(operation: &str, result: vk::Result) -> Error {
    engine_error!("stellar2d::vulkan", "{} failed: {:?}", operation, result);
    vk_result_to_error(operation, result)
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
