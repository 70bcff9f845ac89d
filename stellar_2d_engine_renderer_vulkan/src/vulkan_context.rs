/// GpuContext - Vulkan instance, GPU and logical device shared by every resource
///
/// Contains everything needed for GPU operations:
/// - Entry and instance (surface creation)
/// - Physical device and its memory-type table
/// - Logical device, graphics queue and its family
/// - Surface and swapchain extension loaders
/// - Optional validation messenger
///
/// Resources hold a `Device` (an `Arc<GpuContext>`), so the logical device is
/// destroyed only after the last of them.

use ash::vk;
use stellar_2d_engine::stellar2d::{Error, Result};
use stellar_2d_engine::stellar2d::render::{BufferDesc, Config, GraphicsDevice};
use stellar_2d_engine::{engine_debug, engine_error, engine_info, engine_warn};
use std::ffi::{CStr, CString};
use std::ops::Deref;
use std::sync::Arc;

use crate::vulkan_buffer::DeviceBuffer;
use crate::vulkan_format::vk_error;

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Shared GPU context for all Vulkan resources.
pub struct GpuContext {
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Vulkan logical device
    pub(crate) device: ash::Device,
    /// Graphics queue for command submission and presentation
    pub(crate) graphics_queue: vk::Queue,
    /// Graphics queue family index
    pub(crate) graphics_queue_family: u32,
    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl GpuContext {
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    /// Whether the validation messenger is active
    pub fn validation_enabled(&self) -> bool {
        self.debug_messenger.is_some()
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            // Wait for device to finish
            self.device.device_wait_idle().ok();
            self.device.destroy_device(None);

            // Stop tracking before the messenger goes away
            crate::debug::cleanup_debug_tracking();
            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
        engine_info!("stellar2d::vulkan", "Vulkan device destroyed");
    }
}

/// Reference-counted handle to the GPU context
///
/// Every GPU object keeps a clone, which keeps the device alive while the
/// object exists.
#[derive(Clone)]
pub struct Device(Arc<GpuContext>);

impl Deref for Device {
    type Target = GpuContext;

    fn deref(&self) -> &GpuContext {
        &self.0
    }
}

impl Device {
    /// Create the instance, pick GPU 0 and create the logical device
    ///
    /// No window exists yet, so every surface extension the loader advertises
    /// is enabled; swapchains are created later per window.
    ///
    /// # Errors
    ///
    /// - `InitializationFailed` if the loader, instance or GPU is unavailable
    /// - `NoSuitableQueueFamily` if GPU 0 has no graphics queue
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("stellar2d::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            let app_name = CString::new(config.app_name.clone())
                .map_err(|_| Error::InvalidArgument("app_name contains a NUL byte".to_string()))?;
            let (major, minor, patch) = config.app_version;

            // Application Info
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"Stellar2D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            // Instance extensions: every advertised surface extension
            let available = entry.enumerate_instance_extension_properties(None)
                .map_err(|e| {
                    engine_error!("stellar2d::vulkan", "Failed to enumerate instance extensions: {:?}", e);
                    Error::InitializationFailed(format!("Failed to enumerate instance extensions: {:?}", e))
                })?;
            let available_names: Vec<&CStr> = available
                .iter()
                .filter_map(|ext| ext.extension_name_as_c_str().ok())
                .collect();
            let surface_extensions = select_surface_extensions(&available_names);
            if !surface_extensions.contains(&ash::khr::surface::NAME) {
                engine_error!("stellar2d::vulkan", "VK_KHR_surface is not available");
                return Err(Error::InitializationFailed("VK_KHR_surface is not available".to_string()));
            }
            let mut extension_names: Vec<*const std::os::raw::c_char> =
                surface_extensions.iter().map(|name| name.as_ptr()).collect();

            // Validation layers (skipped with a warning when not installed)
            let enable_validation = config.enable_validation && Self::validation_layer_available(&entry);
            if config.enable_validation && !enable_validation {
                engine_warn!("stellar2d::vulkan",
                    "Validation requested but {:?} is not installed", VALIDATION_LAYER);
            }
            let layer_names = if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
                vec![VALIDATION_LAYER.as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("stellar2d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            // Setup debug messenger if validation is enabled
            let (debug_utils_loader, debug_messenger) = if enable_validation {
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                crate::debug::init_debug_tracking();

                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(crate::debug::severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
                    )
                    .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

                match debug_utils.create_debug_utils_messenger(&debug_info, None) {
                    Ok(messenger) => (Some(debug_utils), Some(messenger)),
                    Err(e) => {
                        engine_warn!("stellar2d::vulkan", "Failed to create debug messenger: {:?}", e);
                        (None, None)
                    }
                }
            } else {
                (None, None)
            };

            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let (physical_device, graphics_family_index, device) =
                match Self::create_logical_device(&instance) {
                    Ok(created) => created,
                    Err(e) => {
                        // Release the instance before reporting
                        crate::debug::cleanup_debug_tracking();
                        if let (Some(debug_utils), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                            debug_utils.destroy_debug_utils_messenger(messenger, None);
                        }
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                };

            let memory_properties = instance.get_physical_device_memory_properties(physical_device);
            let graphics_queue = device.get_device_queue(graphics_family_index, 0);
            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);

            let properties = instance.get_physical_device_properties(physical_device);
            let gpu_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|_| "Unknown GPU".to_string());
            engine_info!("stellar2d::vulkan",
                "Vulkan device created on {} (graphics family {}, {} memory types, validation {})",
                gpu_name,
                graphics_family_index,
                memory_properties.memory_type_count,
                if debug_messenger.is_some() { "on" } else { "off" });

            Ok(Device(Arc::new(GpuContext {
                entry,
                instance,
                physical_device,
                memory_properties,
                device,
                graphics_queue,
                graphics_queue_family: graphics_family_index,
                surface_loader,
                swapchain_loader,
                debug_utils_loader,
                debug_messenger,
            })))
        }
    }

    unsafe fn validation_layer_available(entry: &ash::Entry) -> bool {
        entry
            .enumerate_instance_layer_properties()
            .map(|layers| {
                layers
                    .iter()
                    .any(|layer| layer.layer_name_as_c_str().map_or(false, |name| name == VALIDATION_LAYER))
            })
            .unwrap_or(false)
    }

    /// Pick GPU 0, find its graphics family and create the logical device
    unsafe fn create_logical_device(
        instance: &ash::Instance,
    ) -> Result<(vk::PhysicalDevice, u32, ash::Device)> {
        // Pick Physical Device
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!("stellar2d::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

        let physical_device = physical_devices
            .into_iter()
            .next()
            .ok_or_else(|| {
                engine_error!("stellar2d::vulkan", "No Vulkan-capable GPU found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })?;

        // Find Queue Families
        let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
        let graphics_family_index = find_graphics_queue_family(&queue_families)
            .ok_or_else(|| {
                engine_error!("stellar2d::vulkan", "No graphics queue family found");
                Error::NoSuitableQueueFamily
            })?;

        // Create Logical Device
        let queue_priorities = [1.0];
        let queue_create_infos = [
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities),
        ];

        let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::default();

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names)
            .enabled_features(&device_features);

        let device = instance
            .create_device(physical_device, &device_create_info, None)
            .map_err(|e| {
                engine_error!("stellar2d::vulkan", "Failed to create logical device: {:?}", e);
                Error::InitializationFailed(format!("Failed to create device: {:?}", e))
            })?;

        Ok((physical_device, graphics_family_index, device))
    }

    /// Vulkan logical device
    pub fn raw(&self) -> &ash::Device {
        &self.0.device
    }

    /// Index of a memory type allowed by `type_bits` with all `flags`
    pub fn find_memory_type(&self, type_bits: u32, flags: vk::MemoryPropertyFlags) -> Option<u32> {
        find_memory_type(&self.0.memory_properties, type_bits, flags)
    }

    /// First depth format usable as an optimal-tiling depth attachment
    pub fn find_depth_format(&self) -> Result<vk::Format> {
        const CANDIDATES: [vk::Format; 3] = [
            vk::Format::D32_SFLOAT,
            vk::Format::D32_SFLOAT_S8_UINT,
            vk::Format::D24_UNORM_S8_UINT,
        ];
        CANDIDATES
            .into_iter()
            .find(|&format| unsafe {
                self.0.instance
                    .get_physical_device_format_properties(self.0.physical_device, format)
                    .optimal_tiling_features
                    .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
            })
            .ok_or_else(|| {
                engine_error!("stellar2d::vulkan", "No supported depth format");
                Error::InitializationFailed("No supported depth format".to_string())
            })
    }

    /// Submit one command buffer on the graphics queue
    ///
    /// Waits `wait` at the color-output stage and signals `signal` and `fence`.
    pub fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: vk::Semaphore,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<()> {
        let wait_semaphores = [wait];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [signal];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.0.device
                .queue_submit(self.0.graphics_queue, &[submit_info], fence)
                .map_err(|e| vk_error("vkQueueSubmit", e))
        }
    }

    /// Consume `wait` without rendering and signal `fence`
    ///
    /// Used to return an acquired-but-abandoned frame slot to a consistent state.
    pub fn submit_empty(&self, wait: vk::Semaphore, fence: vk::Fence) -> Result<()> {
        let wait_semaphores = [wait];
        let wait_stages = [vk::PipelineStageFlags::TOP_OF_PIPE];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages);

        unsafe {
            self.0.device
                .queue_submit(self.0.graphics_queue, &[submit_info], fence)
                .map_err(|e| vk_error("vkQueueSubmit", e))
        }
    }

    /// Record a one-shot command buffer from `pool`, submit it and wait for the queue
    pub fn submit_one_shot<F>(&self, pool: vk::CommandPool, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer) -> Result<()>,
    {
        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffers = self.0.device
                .allocate_command_buffers(&allocate_info)
                .map_err(|e| vk_error("vkAllocateCommandBuffers", e))?;

            let result = (|| {
                let begin_info = vk::CommandBufferBeginInfo::default()
                    .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
                self.0.device
                    .begin_command_buffer(command_buffers[0], &begin_info)
                    .map_err(|e| vk_error("vkBeginCommandBuffer", e))?;
                record(command_buffers[0])?;
                self.0.device
                    .end_command_buffer(command_buffers[0])
                    .map_err(|e| vk_error("vkEndCommandBuffer", e))?;

                let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
                self.0.device
                    .queue_submit(self.0.graphics_queue, &[submit_info], vk::Fence::null())
                    .map_err(|e| vk_error("vkQueueSubmit", e))?;
                self.0.device
                    .queue_wait_idle(self.0.graphics_queue)
                    .map_err(|e| vk_error("vkQueueWaitIdle", e))
            })();

            self.0.device.free_command_buffers(pool, &command_buffers);
            result
        }
    }

    /// Number of live handles to this device
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl GraphicsDevice for Device {
    type Buffer = DeviceBuffer;

    fn create_buffer(&self, desc: &BufferDesc) -> Result<DeviceBuffer> {
        DeviceBuffer::new(self, desc)
    }

    fn wait_idle(&self) -> Result<()> {
        engine_debug!("stellar2d::vulkan", "Waiting for device idle");
        unsafe {
            self.0.device
                .device_wait_idle()
                .map_err(|e| vk_error("vkDeviceWaitIdle", e))
        }
    }
}

/// Index of the first memory type allowed by `type_bits` that has all `flags`
///
/// Index 0 is a legal match, so "not found" is `None`.
pub fn find_memory_type(
    properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    flags: vk::MemoryPropertyFlags,
) -> Option<u32> {
    let count = properties.memory_type_count.min(vk::MAX_MEMORY_TYPES as u32);
    (0..count).find(|&index| {
        type_bits & (1 << index) != 0
            && properties.memory_types[index as usize].property_flags.contains(flags)
    })
}

/// Index of the first queue family with graphics support
pub fn find_graphics_queue_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .position(|family| family.queue_count > 0 && family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|index| index as u32)
}

/// Surface extensions from `available` that are worth enabling
pub fn select_surface_extensions(available: &[&CStr]) -> Vec<&'static CStr> {
    const KNOWN: [&CStr; 7] = [
        ash::khr::surface::NAME,
        ash::khr::win32_surface::NAME,
        ash::khr::xlib_surface::NAME,
        ash::khr::xcb_surface::NAME,
        ash::khr::wayland_surface::NAME,
        ash::khr::android_surface::NAME,
        ash::ext::metal_surface::NAME,
    ];
    KNOWN
        .into_iter()
        .filter(|known| available.contains(known))
        .collect()
}

#[cfg(test)]
#[path = "vulkan_context_tests.rs"]
mod tests;
