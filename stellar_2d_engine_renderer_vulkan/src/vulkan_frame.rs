/// FrameData - one frame-in-flight slot
///
/// Owns a command pool with its command buffer, the render fence signaled when
/// the slot's submission completes, and the two semaphores ordering
/// acquire -> render -> present.

use stellar_2d_engine::stellar2d::Result;
use stellar_2d_engine::stellar2d::render::FrameSlot;
use stellar_2d_engine::engine_trace;
use ash::vk;
use std::time::Duration;

use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::Device;
use crate::vulkan_format::vk_error;

pub struct FrameData {
    device: Device,
    command_pool: vk::CommandPool,
    command_list: CommandList,
    render_fence: vk::Fence,
    /// Signaled when rendering finished, waited by presentation
    render_semaphore: vk::Semaphore,
    /// Signaled when the acquired image is available, waited by submission
    present_semaphore: vk::Semaphore,
}

impl FrameData {
    /// Create a slot whose fence starts signaled
    pub fn new(device: &Device) -> Result<Self> {
        unsafe {
            let raw = device.raw();

            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(device.graphics_queue_family());
            let command_pool = raw.create_command_pool(&pool_create_info, None)
                .map_err(|e| vk_error("vkCreateCommandPool", e))?;

            let command_list = match CommandList::allocate(device, command_pool) {
                Ok(command_list) => command_list,
                Err(e) => {
                    raw.destroy_command_pool(command_pool, None);
                    return Err(e);
                }
            };

            // From here on, drop releases whatever was created
            let mut this = Self {
                device: device.clone(),
                command_pool,
                command_list,
                render_fence: vk::Fence::null(),
                render_semaphore: vk::Semaphore::null(),
                present_semaphore: vk::Semaphore::null(),
            };

            let fence_create_info = vk::FenceCreateInfo::default()
                .flags(vk::FenceCreateFlags::SIGNALED);
            this.render_fence = raw.create_fence(&fence_create_info, None)
                .map_err(|e| vk_error("vkCreateFence", e))?;

            let semaphore_create_info = vk::SemaphoreCreateInfo::default();
            this.render_semaphore = raw.create_semaphore(&semaphore_create_info, None)
                .map_err(|e| vk_error("vkCreateSemaphore", e))?;
            this.present_semaphore = raw.create_semaphore(&semaphore_create_info, None)
                .map_err(|e| vk_error("vkCreateSemaphore", e))?;

            Ok(this)
        }
    }

    /// Create `count` slots
    pub fn create_ring(device: &Device, count: usize) -> Result<Vec<FrameData>> {
        (0..count).map(|_| FrameData::new(device)).collect()
    }

    pub fn render_fence(&self) -> vk::Fence {
        self.render_fence
    }

    pub fn render_semaphore(&self) -> vk::Semaphore {
        self.render_semaphore
    }

    pub fn present_semaphore(&self) -> vk::Semaphore {
        self.present_semaphore
    }

    /// Return an acquired but unsubmitted slot to a consistent state
    ///
    /// Consumes the pending present semaphore and re-signals the fence through
    /// an empty submission, so the next `wait_ready` does not block forever.
    /// Only valid after `wait_ready` succeeded for this frame.
    pub fn abandon(&mut self) -> Result<()> {
        unsafe {
            self.device.raw()
                .reset_fences(&[self.render_fence])
                .map_err(|e| vk_error("vkResetFences", e))?;
        }
        self.device.submit_empty(self.present_semaphore, self.render_fence)?;
        engine_trace!("stellar2d::vulkan", "Frame slot abandoned");
        Ok(())
    }

    /// Whether the fence is currently signaled (non-blocking)
    pub fn is_ready(&self) -> bool {
        unsafe { self.device.raw().get_fence_status(self.render_fence).unwrap_or(false) }
    }
}

impl FrameSlot for FrameData {
    type CommandList = CommandList;

    fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let timeout_ns = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
        unsafe {
            self.device.raw()
                .wait_for_fences(&[self.render_fence], true, timeout_ns)
                .map_err(|e| vk_error("vkWaitForFences", e))
        }
    }

    fn reset(&mut self) -> Result<()> {
        unsafe {
            let raw = self.device.raw();
            raw.reset_fences(&[self.render_fence])
                .map_err(|e| vk_error("vkResetFences", e))?;
            raw.reset_command_pool(self.command_pool, vk::CommandPoolResetFlags::empty())
                .map_err(|e| vk_error("vkResetCommandPool", e))?;
        }
        self.command_list.mark_reset();
        engine_trace!("stellar2d::vulkan", "Frame slot reset");
        Ok(())
    }

    fn command_list(&mut self) -> &mut CommandList {
        &mut self.command_list
    }
}

impl Drop for FrameData {
    fn drop(&mut self) {
        unsafe {
            let raw = self.device.raw();
            raw.device_wait_idle().ok();
            raw.destroy_semaphore(self.present_semaphore, None);
            raw.destroy_semaphore(self.render_semaphore, None);
            raw.destroy_fence(self.render_fence, None);
            // Frees the command buffer too
            raw.destroy_command_pool(self.command_pool, None);
        }
    }
}
