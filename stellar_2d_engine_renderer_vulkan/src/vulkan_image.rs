/// DeviceImage - Vulkan image with its own memory block and view
///
/// Also hosts the layout-transition helpers shared with the swapchain, whose
/// images are owned by the presentation engine.

use stellar_2d_engine::stellar2d::{Error, Result};
use stellar_2d_engine::{engine_error, engine_trace};
use ash::vk;

use crate::vulkan_context::Device;
use crate::vulkan_format::vk_error;

/// Description of a 2D single-mip image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDesc {
    pub extent: vk::Extent2D,
    pub format: vk::Format,
    pub usage: vk::ImageUsageFlags,
    pub aspect: vk::ImageAspectFlags,
}

/// Vulkan image implementation
pub struct DeviceImage {
    device: Device,
    image: vk::Image,
    memory: vk::DeviceMemory,
    view: vk::ImageView,
    desc: ImageDesc,
}

impl DeviceImage {
    /// Create a device-local image, bind its memory and create its view
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the extent is empty
    /// - `NoMatchingMemoryType` / `OutOfMemory` on allocation failure
    pub fn new(device: &Device, desc: &ImageDesc) -> Result<Self> {
        if desc.extent.width == 0 || desc.extent.height == 0 {
            engine_error!("stellar2d::vulkan", "Rejected image with empty extent {:?}", desc.extent);
            return Err(Error::InvalidArgument(format!("image extent {:?} is empty", desc.extent)));
        }

        unsafe {
            let image_create_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(desc.format)
                .extent(vk::Extent3D {
                    width: desc.extent.width,
                    height: desc.extent.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(desc.usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = device.raw().create_image(&image_create_info, None)
                .map_err(|e| vk_error("vkCreateImage", e))?;

            // From here on, drop releases whatever was created
            let mut this = Self {
                device: device.clone(),
                image,
                memory: vk::DeviceMemory::null(),
                view: vk::ImageView::null(),
                desc: *desc,
            };

            let requirements = device.raw().get_image_memory_requirements(image);
            let memory_type = device
                .find_memory_type(requirements.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)
                .ok_or_else(|| {
                    engine_error!("stellar2d::vulkan", "No device-local memory type for image");
                    Error::NoMatchingMemoryType
                })?;

            let allocate_info = vk::MemoryAllocateInfo::default()
                .allocation_size(requirements.size)
                .memory_type_index(memory_type);

            this.memory = device.raw().allocate_memory(&allocate_info, None)
                .map_err(|e| {
                    engine_error!("stellar2d::vulkan",
                        "Out of GPU memory for {}x{} image: {:?}",
                        desc.extent.width, desc.extent.height, e);
                    Error::OutOfMemory
                })?;

            device.raw().bind_image_memory(image, this.memory, 0)
                .map_err(|e| vk_error("vkBindImageMemory", e))?;

            this.view = create_image_view(device.raw(), image, desc.format, desc.aspect)?;

            engine_trace!("stellar2d::vulkan", "Created {}x{} image ({:?})",
                desc.extent.width, desc.extent.height, desc.format);
            Ok(this)
        }
    }

    pub fn raw(&self) -> vk::Image {
        self.image
    }

    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.desc.extent
    }

    pub fn format(&self) -> vk::Format {
        self.desc.format
    }

    pub fn usage(&self) -> vk::ImageUsageFlags {
        self.desc.usage
    }

    /// Whether this is a depth(/stencil) attachment
    pub fn is_depth(&self) -> bool {
        self.desc.usage.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
    }

    /// Record a layout transition of the whole image
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `old == new`.
    pub fn change_layout(&self, cmd: vk::CommandBuffer, old: vk::ImageLayout, new: vk::ImageLayout) -> Result<()> {
        record_layout_transition(self.device.raw(), cmd, self.image, self.desc.aspect, old, new)
    }

    /// Record a clear of the whole image
    ///
    /// Transitions `old` to `TRANSFER_DST`, clears the color or depth aspect
    /// depending on the usage, and leaves the image in its steady layout
    /// (`PRESENT_SRC` for color, `DEPTH_STENCIL_ATTACHMENT_OPTIMAL` for depth).
    pub fn clear(&self, cmd: vk::CommandBuffer, old: vk::ImageLayout, clear_value: vk::ClearValue) -> Result<()> {
        let device = self.device.raw();
        let range = subresource_range(self.desc.aspect);

        if old != vk::ImageLayout::TRANSFER_DST_OPTIMAL {
            self.change_layout(cmd, old, vk::ImageLayout::TRANSFER_DST_OPTIMAL)?;
        }

        let final_layout = unsafe {
            if self.is_depth() {
                device.cmd_clear_depth_stencil_image(
                    cmd,
                    self.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &clear_value.depth_stencil,
                    &[range],
                );
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
            } else {
                device.cmd_clear_color_image(
                    cmd,
                    self.image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &clear_value.color,
                    &[range],
                );
                vk::ImageLayout::PRESENT_SRC_KHR
            }
        };

        self.change_layout(cmd, vk::ImageLayout::TRANSFER_DST_OPTIMAL, final_layout)
    }
}

impl Drop for DeviceImage {
    fn drop(&mut self) {
        unsafe {
            let device = self.device.raw();
            device.device_wait_idle().ok();
            device.destroy_image_view(self.view, None);
            device.destroy_image(self.image, None);
            device.free_memory(self.memory, None);
        }
    }
}

/// Create a 2D view over the first mip and layer
pub fn create_image_view(
    device: &ash::Device,
    image: vk::Image,
    format: vk::Format,
    aspect: vk::ImageAspectFlags,
) -> Result<vk::ImageView> {
    let create_info = vk::ImageViewCreateInfo::default()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .components(vk::ComponentMapping {
            r: vk::ComponentSwizzle::IDENTITY,
            g: vk::ComponentSwizzle::IDENTITY,
            b: vk::ComponentSwizzle::IDENTITY,
            a: vk::ComponentSwizzle::IDENTITY,
        })
        .subresource_range(subresource_range(aspect));

    unsafe {
        device.create_image_view(&create_info, None)
            .map_err(|e| vk_error("vkCreateImageView", e))
    }
}

/// Whole-image range (one mip, one layer)
pub fn subresource_range(aspect: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: aspect,
        base_mip_level: 0,
        level_count: 1,
        base_array_layer: 0,
        layer_count: 1,
    }
}

/// Access mask and pipeline stage that touch an image in `layout`
pub fn layout_access(layout: vk::ImageLayout) -> (vk::AccessFlags, vk::PipelineStageFlags) {
    match layout {
        vk::ImageLayout::UNDEFINED => (vk::AccessFlags::empty(), vk::PipelineStageFlags::TOP_OF_PIPE),
        vk::ImageLayout::TRANSFER_DST_OPTIMAL => {
            (vk::AccessFlags::TRANSFER_WRITE, vk::PipelineStageFlags::TRANSFER)
        }
        vk::ImageLayout::TRANSFER_SRC_OPTIMAL => {
            (vk::AccessFlags::TRANSFER_READ, vk::PipelineStageFlags::TRANSFER)
        }
        vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL => (
            vk::AccessFlags::COLOR_ATTACHMENT_READ | vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        ),
        vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => (
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
        ),
        // The render pass writes the image before it is presented
        vk::ImageLayout::PRESENT_SRC_KHR => (
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
        ),
        _ => (
            vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE,
            vk::PipelineStageFlags::ALL_COMMANDS,
        ),
    }
}

/// Barrier moving `image` from `old` to `new`
pub fn layout_barrier(
    image: vk::Image,
    aspect: vk::ImageAspectFlags,
    old: vk::ImageLayout,
    new: vk::ImageLayout,
) -> vk::ImageMemoryBarrier<'static> {
    let (src_access, _) = layout_access(old);
    let (dst_access, _) = layout_access(new);
    vk::ImageMemoryBarrier::default()
        .old_layout(old)
        .new_layout(new)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(subresource_range(aspect))
        .src_access_mask(src_access)
        .dst_access_mask(dst_access)
}

/// Record a pipeline barrier transitioning `image` from `old` to `new`
pub fn record_layout_transition(
    device: &ash::Device,
    cmd: vk::CommandBuffer,
    image: vk::Image,
    aspect: vk::ImageAspectFlags,
    old: vk::ImageLayout,
    new: vk::ImageLayout,
) -> Result<()> {
    if old == new {
        return Err(Error::InvalidArgument(format!("layout transition {:?} -> {:?} is a no-op", old, new)));
    }
    let (_, src_stage) = layout_access(old);
    let (_, dst_stage) = layout_access(new);
    let barrier = layout_barrier(image, aspect, old, new);

    unsafe {
        device.cmd_pipeline_barrier(
            cmd,
            src_stage,
            dst_stage,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "vulkan_image_tests.rs"]
mod tests;
