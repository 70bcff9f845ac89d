/// Swapchain - presentable images of one window surface
///
/// Owns the surface, the swapchain handle, one view per image, the depth image
/// shared by every color image and a command pool for one-shot layout setup.
/// Recreation (`reinit`) keeps the old swapchain until the new one exists.

use stellar_2d_engine::stellar2d::{Error, Result, Window};
use stellar_2d_engine::stellar2d::render::{recreate_with_dependents, Config, SwapchainDependent};
use stellar_2d_engine::{engine_debug, engine_error, engine_info, engine_warn};
use ash::vk;

use crate::vulkan_context::Device;
use crate::vulkan_format::{depth_aspect, vk_error};
use crate::vulkan_image::{
    create_image_view, record_layout_transition, subresource_range, DeviceImage, ImageDesc,
};

/// Vulkan swapchain implementation
pub struct Swapchain {
    device: Device,
    surface: vk::SurfaceKHR,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    depth_image: Option<DeviceImage>,
    depth_format: vk::Format,
    surface_format: vk::SurfaceFormatKHR,
    size: SwapchainSize,
    present_mode: vk::PresentModeKHR,
    /// Pool for one-shot layout initialisation of fresh images
    command_pool: vk::CommandPool,
    prefer_low_latency: bool,
    acquire_timeout_ns: u64,
}

/// A freshly created swapchain handle and the parameters it was created with
struct CreatedSwapchain {
    handle: vk::SwapchainKHR,
    surface_format: vk::SurfaceFormatKHR,
    size: SwapchainSize,
    present_mode: vk::PresentModeKHR,
}

/// Window size a swapchain was built for and the extent the surface granted
///
/// The two differ when the surface fixes its extent or clamps the window size
/// to its supported range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapchainSize {
    pub window: (u32, u32),
    pub extent: vk::Extent2D,
}

impl SwapchainSize {
    pub fn for_window(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> Self {
        Self {
            window: (width, height),
            extent: clamp_extent(capabilities, width, height),
        }
    }

    /// Whether a window of `window_size` would get this swapchain again
    pub fn matches(&self, window_size: (u32, u32)) -> bool {
        self.window == window_size
    }
}

impl Swapchain {
    /// Create the surface of `window` and a swapchain sized to it
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the window has a zero size
    /// - `NoSuitableQueueFamily` if the graphics queue cannot present to the surface
    /// - `InitializationFailed` if the surface cannot be created
    pub fn new(device: &Device, window: &dyn Window, config: &Config) -> Result<Self> {
        let (width, height) = window.size();
        if width == 0 || height == 0 {
            engine_error!("stellar2d::vulkan", "Cannot create a swapchain for a {}x{} window", width, height);
            return Err(Error::InvalidArgument(format!("window size {}x{} is empty", width, height)));
        }

        let display_handle = window.display_handle()
            .map_err(|e| {
                engine_error!("stellar2d::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
        let window_handle = window.window_handle()
            .map_err(|e| {
                engine_error!("stellar2d::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;

        let surface = unsafe {
            ash_window::create_surface(
                &device.entry,
                &device.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!("stellar2d::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?
        };

        // From here on, drop releases whatever was created
        let mut this = Self {
            device: device.clone(),
            surface,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            image_views: Vec::new(),
            depth_image: None,
            depth_format: vk::Format::UNDEFINED,
            surface_format: vk::SurfaceFormatKHR::default(),
            size: SwapchainSize::default(),
            present_mode: vk::PresentModeKHR::FIFO,
            command_pool: vk::CommandPool::null(),
            prefer_low_latency: config.prefer_low_latency,
            acquire_timeout_ns: config.fence_timeout_ns(),
        };

        unsafe {
            let can_present = device.surface_loader
                .get_physical_device_surface_support(device.physical_device(), device.graphics_queue_family(), surface)
                .map_err(|e| vk_error("vkGetPhysicalDeviceSurfaceSupportKHR", e))?;
            if !can_present {
                engine_error!("stellar2d::vulkan",
                    "Graphics queue family {} cannot present to this surface", device.graphics_queue_family());
                return Err(Error::NoSuitableQueueFamily);
            }

            let pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(device.graphics_queue_family())
                .flags(vk::CommandPoolCreateFlags::TRANSIENT);
            this.command_pool = device.raw().create_command_pool(&pool_create_info, None)
                .map_err(|e| vk_error("vkCreateCommandPool", e))?;
        }

        this.depth_format = device.find_depth_format()?;
        let created = this.create_handle(window, vk::SwapchainKHR::null())?;
        this.adopt(created)?;

        engine_info!("stellar2d::vulkan",
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            this.size.extent.width, this.size.extent.height, this.images.len(),
            this.surface_format.format, this.present_mode);
        Ok(this)
    }

    /// Recreate the swapchain for the current window size
    ///
    /// The old swapchain is passed as `oldSwapchain` and only destroyed once
    /// the new one exists; a failed creation leaves it intact. `dependents`
    /// are notified after the per-image state was rebuilt.
    ///
    /// If rebuilding the per-image state fails, the swapchain is left empty
    /// (`is_ready` is false) and every dependent is told it was lost; the
    /// next successful `reinit` restores both.
    pub fn reinit(
        &mut self,
        window: &dyn Window,
        dependents: &mut [&mut dyn SwapchainDependent<Swapchain>],
    ) -> Result<()> {
        let (width, height) = window.size();
        if width == 0 || height == 0 {
            return Err(Error::InvalidArgument(format!("window size {}x{} is empty", width, height)));
        }

        unsafe {
            self.device.raw().device_wait_idle()
                .map_err(|e| vk_error("vkDeviceWaitIdle", e))?;
        }

        let created = self.create_handle(window, self.swapchain)?;

        // The new swapchain exists: retire the old one
        self.release();
        recreate_with_dependents(&mut *self, |swapchain| swapchain.adopt_or_release(created), dependents)?;

        engine_info!("stellar2d::vulkan",
            "Swapchain recreated: {}x{}, {} images",
            self.size.extent.width, self.size.extent.height, self.images.len());
        Ok(())
    }

    /// Query the surface and create a swapchain handle
    fn create_handle(&self, window: &dyn Window, old_swapchain: vk::SwapchainKHR) -> Result<CreatedSwapchain> {
        let (width, height) = window.size();
        let physical_device = self.device.physical_device();
        let surface_loader = &self.device.surface_loader;

        unsafe {
            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .map_err(|e| vk_error("vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;
            let formats = surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)
                .map_err(|e| vk_error("vkGetPhysicalDeviceSurfaceFormatsKHR", e))?;
            let present_modes = surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
                .map_err(|e| vk_error("vkGetPhysicalDeviceSurfacePresentModesKHR", e))?;

            let previous = (self.surface_format.format != vk::Format::UNDEFINED).then_some(self.surface_format);
            let surface_format = choose_surface_format(&formats, previous)
                .ok_or_else(|| {
                    engine_error!("stellar2d::vulkan", "Surface advertises no formats");
                    Error::InitializationFailed("Surface advertises no formats".to_string())
                })?;
            let size = SwapchainSize::for_window(&capabilities, width, height);
            let extent = size.extent;
            if extent.width == 0 || extent.height == 0 {
                return Err(Error::InvalidArgument(format!("surface extent {:?} is empty", extent)));
            }
            if !size.matches((extent.width, extent.height)) {
                engine_debug!("stellar2d::vulkan",
                    "Surface grants {}x{} for a {}x{} window", extent.width, extent.height, width, height);
            }
            let present_mode = choose_present_mode(&present_modes, self.prefer_low_latency);
            let image_count = choose_image_count(&capabilities);

            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true)
                .old_swapchain(old_swapchain);

            let handle = self.device.swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| {
                    engine_error!("stellar2d::vulkan", "Failed to create swapchain: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create swapchain: {:?}", e))
                })?;

            Ok(CreatedSwapchain { handle, surface_format, size, present_mode })
        }
    }

    /// `adopt`, releasing the half-built state on failure
    fn adopt_or_release(&mut self, created: CreatedSwapchain) -> Result<()> {
        let result = self.adopt(created);
        if let Err(e) = &result {
            engine_warn!("stellar2d::vulkan", "Swapchain rebuild failed, rendering paused until the next resize: {}", e);
            self.release();
        }
        result
    }

    /// Take ownership of a new handle and build its per-image state
    fn adopt(&mut self, created: CreatedSwapchain) -> Result<()> {
        self.swapchain = created.handle;
        self.surface_format = created.surface_format;
        self.size = created.size;
        self.present_mode = created.present_mode;

        self.images = unsafe {
            self.device.swapchain_loader
                .get_swapchain_images(self.swapchain)
                .map_err(|e| vk_error("vkGetSwapchainImagesKHR", e))?
        };

        for &image in &self.images {
            let view = create_image_view(
                self.device.raw(),
                image,
                self.surface_format.format,
                vk::ImageAspectFlags::COLOR,
            )?;
            self.image_views.push(view);
        }

        let aspect = depth_aspect(self.depth_format);
        let depth_image = DeviceImage::new(&self.device, &ImageDesc {
            extent: self.size.extent,
            format: self.depth_format,
            usage: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
            aspect,
        })?;
        let depth_raw = depth_image.raw();
        self.depth_image = Some(depth_image);

        // Steady layouts: PRESENT_SRC for color, attachment-optimal for depth
        let raw = self.device.raw();
        let images = &self.images;
        self.device.submit_one_shot(self.command_pool, |cmd| {
            for &image in images {
                record_layout_transition(
                    raw,
                    cmd,
                    image,
                    vk::ImageAspectFlags::COLOR,
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::PRESENT_SRC_KHR,
                )?;
            }
            record_layout_transition(
                raw,
                cmd,
                depth_raw,
                aspect,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            )
        })?;

        engine_debug!("stellar2d::vulkan", "Initialized layouts of {} swapchain images", self.images.len());
        Ok(())
    }

    /// Destroy the views, the depth image and the swapchain handle
    fn release(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.raw().destroy_image_view(view, None);
            }
        }
        self.image_views.clear();
        self.images.clear();
        self.depth_image = None;
        unsafe {
            self.device.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
        self.swapchain = vk::SwapchainKHR::null();
    }

    /// Acquire the next presentable image, signaling `semaphore` when it is available
    ///
    /// Returns `None` when the swapchain is out of date (nothing is signaled).
    pub fn acquire_next_image(&self, semaphore: vk::Semaphore) -> Result<Option<u32>> {
        unsafe {
            match self.device.swapchain_loader.acquire_next_image(
                self.swapchain,
                self.acquire_timeout_ns,
                semaphore,
                vk::Fence::null(),
            ) {
                Ok((image_index, _suboptimal)) => Ok(Some(image_index)),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    engine_debug!("stellar2d::vulkan", "Swapchain out of date during acquire");
                    Ok(None)
                }
                Err(e) => Err(vk_error("vkAcquireNextImageKHR", e)),
            }
        }
    }

    /// Present `image_index` once `wait` is signaled
    ///
    /// Returns `false` when the swapchain is out of date or suboptimal.
    pub fn present(&self, image_index: u32, wait: vk::Semaphore) -> Result<bool> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            match self.device.swapchain_loader.queue_present(self.device.graphics_queue, &present_info) {
                Ok(false) => Ok(true),
                Ok(true) => {
                    engine_debug!("stellar2d::vulkan", "Swapchain suboptimal during present");
                    Ok(false)
                }
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                    engine_debug!("stellar2d::vulkan", "Swapchain out of date during present");
                    Ok(false)
                }
                Err(e) => Err(vk_error("vkQueuePresentKHR", e)),
            }
        }
    }

    /// Record a clear of image `image_index` to `color`
    ///
    /// The image goes PRESENT_SRC -> TRANSFER_DST -> PRESENT_SRC.
    pub fn record_clear(&self, cmd: vk::CommandBuffer, image_index: u32, color: [f32; 4]) -> Result<()> {
        let image = *self.images.get(image_index as usize).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "image index {} out of range ({} images)",
                image_index,
                self.images.len()
            ))
        })?;
        let raw = self.device.raw();

        record_layout_transition(
            raw,
            cmd,
            image,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )?;

        unsafe {
            raw.cmd_clear_color_image(
                cmd,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &vk::ClearColorValue { float32: color },
                &[subresource_range(vk::ImageAspectFlags::COLOR)],
            );
        }

        record_layout_transition(
            raw,
            cmd,
            image,
            vk::ImageAspectFlags::COLOR,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::PRESENT_SRC_KHR,
        )
    }

    /// Whether the swapchain was built for the window's current size
    pub fn matches_window(&self, window: &dyn Window) -> bool {
        self.size.matches(window.size())
    }

    /// Whether images, views and depth exist (false after a failed `reinit`)
    pub fn is_ready(&self) -> bool {
        self.swapchain != vk::SwapchainKHR::null() && self.depth_image.is_some() && !self.images.is_empty()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.size.extent
    }

    pub fn size(&self) -> SwapchainSize {
        self.size
    }

    pub fn format(&self) -> vk::Format {
        self.surface_format.format
    }

    pub fn depth_format(&self) -> vk::Format {
        self.depth_format
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    pub fn depth_view(&self) -> vk::ImageView {
        self.depth_image.as_ref().map_or(vk::ImageView::null(), DeviceImage::view)
    }

    pub fn raw(&self) -> vk::SwapchainKHR {
        self.swapchain
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.device.raw().device_wait_idle().ok();
        }
        self.release();
        unsafe {
            self.device.raw().destroy_command_pool(self.command_pool, None);
            self.device.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

/// Swapchain extent for a `width` x `height` window
///
/// A fixed `current_extent` wins; otherwise the window size is clamped to the
/// supported range.
pub fn clamp_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        capabilities.current_extent
    } else {
        vk::Extent2D {
            width: width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        }
    }
}

/// MAILBOX when low latency is preferred and available, FIFO otherwise
pub fn choose_present_mode(available: &[vk::PresentModeKHR], prefer_low_latency: bool) -> vk::PresentModeKHR {
    if prefer_low_latency && available.contains(&vk::PresentModeKHR::MAILBOX) {
        vk::PresentModeKHR::MAILBOX
    } else {
        // Always supported
        vk::PresentModeKHR::FIFO
    }
}

/// One image more than the minimum, clamped to the maximum (0 = unbounded)
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count.min(capabilities.max_image_count)
    } else {
        image_count
    }
}

/// Keep `previous` if still advertised, else take the first advertised format
pub fn choose_surface_format(
    formats: &[vk::SurfaceFormatKHR],
    previous: Option<vk::SurfaceFormatKHR>,
) -> Option<vk::SurfaceFormatKHR> {
    if let Some(previous) = previous {
        if formats.contains(&previous) {
            return Some(previous);
        }
    }
    let first = *formats.first()?;
    if first.format == vk::Format::UNDEFINED {
        // The surface has no preference
        Some(vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: first.color_space,
        })
    } else {
        Some(first)
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
