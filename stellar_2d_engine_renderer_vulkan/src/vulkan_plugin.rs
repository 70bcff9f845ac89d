/// VulkanGraphicsPlugin - the backend's plugin function table
///
/// Plugin-global state (device, shared meshes, configuration) lives behind a
/// process-wide mutex between `init` and `deinit`. Errors are logged and
/// folded into the `bool` / `RenderStatus` contracts of `GraphicsPlugin`.

use stellar_2d_engine::stellar2d::{Engine, Error, Result, Window};
use stellar_2d_engine::stellar2d::render::Config;
use stellar_2d_engine::stellar2d::resource::{Mesh2D, MeshInstance, MeshManager};
use stellar_2d_engine::stellar2d::plugin::{
    GraphicsContext, GraphicsPlugin, PlatformFlags, PluginData, PluginDescriptor, PluginType,
    PluginVersion, RenderStatus,
};
use stellar_2d_engine::{engine_debug, engine_error, engine_info, engine_warn};
use std::sync::{Mutex, MutexGuard};

use crate::vulkan_buffer::DeviceBuffer;
use crate::vulkan_context::Device;
use crate::vulkan_graphics_context::VulkanGraphicsContext;

/// Plugin name reported in the descriptor
pub const PLUGIN_NAME: &str = "stellar2d-vulkan";

struct PluginState {
    // Meshes drop before the device
    meshes: MeshManager<DeviceBuffer>,
    device: Device,
    config: Config,
}

static STATE: Mutex<Option<PluginState>> = Mutex::new(None);

fn lock_state() -> MutexGuard<'static, Option<PluginState>> {
    // A panic mid-frame leaves the GPU objects themselves valid
    STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Graphics function table of the Vulkan backend
pub struct VulkanGraphicsPlugin;

static PLUGIN: VulkanGraphicsPlugin = VulkanGraphicsPlugin;

static DESCRIPTOR: PluginDescriptor = PluginDescriptor {
    plugin_type: PluginType::Graphics,
    name: PLUGIN_NAME,
    version: PluginVersion { year: 2026, month: 10, day: 19 },
    license: "MIT OR Apache-2.0",
    platform: PlatformFlags::WINDOWS
        .union(PlatformFlags::LINUX)
        .union(PlatformFlags::ANDROID),
    plugin_data: PluginData::Graphics(&PLUGIN),
    init: plugin_init,
    deinit: plugin_deinit,
};

/// Descriptor lookup resolved by the plugin loader
#[no_mangle]
pub extern "Rust" fn stellar2d_plugin_descriptor() -> &'static PluginDescriptor {
    &DESCRIPTOR
}

fn plugin_init() -> bool {
    VulkanGraphicsPlugin::init_with_config(Config::default()).is_ok()
}

fn plugin_deinit() {
    VulkanGraphicsPlugin::deinit();
}

impl VulkanGraphicsPlugin {
    /// Create the device with `config`; a no-op when already initialized
    pub fn init_with_config(config: Config) -> Result<()> {
        Engine::initialize()?;
        config.validate()?;

        let mut state = lock_state();
        if state.is_some() {
            engine_debug!("stellar2d::vulkan", "Plugin already initialized");
            return Ok(());
        }

        let device = Device::new(&config)?;
        *state = Some(PluginState {
            meshes: MeshManager::new(),
            device,
            config,
        });
        engine_info!("stellar2d::vulkan", "Plugin {} initialized", PLUGIN_NAME);
        Ok(())
    }

    /// Release the meshes and the device
    ///
    /// Contexts still alive keep the device itself alive until they are dropped.
    pub fn deinit() {
        let Some(state) = lock_state().take() else {
            return;
        };
        let outstanding = state.device.strong_count() - 1;
        if outstanding > 0 {
            engine_warn!("stellar2d::vulkan",
                "Plugin deinitialized with {} device handles still alive", outstanding);
        }
        drop(state);
        engine_info!("stellar2d::vulkan", "Plugin {} deinitialized", PLUGIN_NAME);
    }

    pub fn is_initialized() -> bool {
        lock_state().is_some()
    }

    /// The plugin's static descriptor
    pub fn descriptor() -> &'static PluginDescriptor {
        &DESCRIPTOR
    }

    fn context<'a>(context: &'a mut dyn GraphicsContext, operation: &str) -> Option<&'a mut VulkanGraphicsContext> {
        let context = context.as_any_mut().downcast_mut::<VulkanGraphicsContext>();
        if context.is_none() {
            engine_error!("stellar2d::vulkan", "{}: context was not created by {}", operation, PLUGIN_NAME);
        }
        context
    }
}

fn not_initialized(operation: &str) -> Error {
    engine_error!("stellar2d::vulkan", "{}: plugin not initialized", operation);
    Error::InvalidResource(format!("{}: plugin not initialized", operation))
}

impl GraphicsPlugin for VulkanGraphicsPlugin {
    fn context_create(&self, window: &dyn Window) -> Option<Box<dyn GraphicsContext>> {
        let state = lock_state();
        let Some(state) = state.as_ref() else {
            not_initialized("context_create");
            return None;
        };
        match VulkanGraphicsContext::new(&state.device, window, &state.config) {
            Ok(context) => Some(Box::new(context)),
            Err(e) => {
                engine_error!("stellar2d::vulkan", "context_create failed: {}", e);
                None
            }
        }
    }

    fn context_destroy(&self, context: Box<dyn GraphicsContext>) {
        // Drop waits for the context's GPU work
        drop(context);
    }

    fn context_resize(&self, context: &mut dyn GraphicsContext, window: &dyn Window) -> bool {
        let Some(context) = Self::context(context, "context_resize") else {
            return false;
        };
        match context.resize(window) {
            Ok(()) => true,
            Err(e) => {
                engine_error!("stellar2d::vulkan", "context_resize failed: {}", e);
                false
            }
        }
    }

    fn mesh_upload_2d(&self, mesh: &Mesh2D<'_>) -> bool {
        let mut state = lock_state();
        let Some(state) = state.as_mut() else {
            not_initialized("mesh_upload_2d");
            return false;
        };
        match state.meshes.upload_mesh(&state.device, mesh) {
            Ok(()) => true,
            Err(e) => {
                engine_error!("stellar2d::vulkan", "mesh_upload_2d(type {}) failed: {}", mesh.type_id, e);
                false
            }
        }
    }

    fn draw_2d(&self, context: &mut dyn GraphicsContext, instance: &MeshInstance) -> RenderStatus {
        let Some(context) = Self::context(context, "draw_2d") else {
            return RenderStatus::Err;
        };
        context.draw(*instance);
        RenderStatus::Ok
    }

    fn clear(&self, context: &mut dyn GraphicsContext, window: &dyn Window) -> RenderStatus {
        let Some(context) = Self::context(context, "clear") else {
            return RenderStatus::Err;
        };
        let result = context.clear(window);
        if let Err(e) = &result {
            if !matches!(e, Error::SurfaceOutOfDate) {
                engine_error!("stellar2d::vulkan", "clear failed: {}", e);
            }
        }
        RenderStatus::from_result(&result)
    }

    fn display(&self, context: &mut dyn GraphicsContext, window: &dyn Window) -> RenderStatus {
        let Some(context) = Self::context(context, "display") else {
            return RenderStatus::Err;
        };
        let state = lock_state();
        let result = match state.as_ref() {
            Some(state) => context.display(window, &state.meshes),
            None => Err(not_initialized("display")),
        };
        if let Err(e) = &result {
            if !matches!(e, Error::SurfaceOutOfDate) {
                engine_error!("stellar2d::vulkan", "display failed: {}", e);
            }
        }
        RenderStatus::from_result(&result)
    }
}

#[cfg(test)]
#[path = "vulkan_plugin_tests.rs"]
mod tests;
