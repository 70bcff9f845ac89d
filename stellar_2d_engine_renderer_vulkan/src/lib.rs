/*!
# Stellar 2D Engine - Vulkan Backend

Vulkan implementation of the Stellar2D graphics plugin.

The backend implements the stellar_2d_engine GPU traits with Ash, reuses the
core mesh manager and batch renderer, and exports its `PluginDescriptor`
through the `stellar2d_plugin_descriptor` symbol.

## Architecture

- **Device**: instance, GPU, logical device and queue shared by every resource
- **Swapchain**: surface, presentable images and the shared depth image
- **RenderPass / FrameData**: framebuffers, frame ring and the default pipeline
- **VulkanGraphicsContext**: per-window clear / draw / display cycle
- **VulkanGraphicsPlugin**: plugin function table over the global device state

Hosts that link the crate directly can skip the loader:

```no_run
use stellar_2d_engine::stellar2d::plugin::GraphicsPlugin;
use stellar_2d_engine::stellar2d::render::Config;
use stellar_2d_engine_renderer_vulkan::stellar2d::VulkanGraphicsPlugin;

# fn run(window: &winit::window::Window) -> stellar_2d_engine::stellar2d::Result<()> {
VulkanGraphicsPlugin::init_with_config(Config::default())?;
let descriptor = stellar_2d_engine_renderer_vulkan::stellar2d_plugin_descriptor();
if let Some(graphics) = descriptor.graphics() {
    let _context = graphics.context_create(window);
}
# Ok(())
# }
```
*/

mod debug;
mod vulkan_buffer;
mod vulkan_command_list;
mod vulkan_context;
mod vulkan_format;
mod vulkan_frame;
mod vulkan_graphics_context;
mod vulkan_image;
mod vulkan_pipeline;
mod vulkan_plugin;
mod vulkan_render_pass;
mod vulkan_shader;
mod vulkan_swapchain;

pub use vulkan_plugin::stellar2d_plugin_descriptor;

// Main stellar2d namespace module
pub mod stellar2d {
    pub use crate::vulkan_context::{Device, GpuContext};
    pub use crate::vulkan_buffer::DeviceBuffer;
    pub use crate::vulkan_image::{DeviceImage, ImageDesc};
    pub use crate::vulkan_command_list::CommandList;
    pub use crate::vulkan_frame::FrameData;
    pub use crate::vulkan_swapchain::Swapchain;
    pub use crate::vulkan_render_pass::{PipelineVariant, RenderPass};
    pub use crate::vulkan_pipeline::GraphicsPipeline;
    pub use crate::vulkan_shader::ShaderModule;
    pub use crate::vulkan_graphics_context::VulkanGraphicsContext;
    pub use crate::vulkan_plugin::{VulkanGraphicsPlugin, PLUGIN_NAME};

    // Validation statistics
    pub mod debug {
        pub use crate::debug::{
            duplicate_message_count, get_validation_stats, print_validation_stats_report,
            validation_report, ValidationStats,
        };
    }
}
