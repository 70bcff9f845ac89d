/*!
# Stellar 2D Engine

Core traits and types for the Stellar2D rendering backend.

This crate is backend-agnostic. A graphics backend (Vulkan) implements the GPU
traits, reuses the mesh manager and batch renderer, and exports itself through
the plugin ABI.

## Architecture

- **GraphicsDevice / Buffer / CommandList**: minimal GPU abstraction
- **FrameRing / FrameSlot**: frames-in-flight synchronization
- **SwapchainDependent**: rebuild hooks run after swapchain recreation
- **MeshManager**: uploaded mesh registry
- **BatchRenderer**: per-frame instance batching, one draw per mesh type
- **PluginDescriptor / GraphicsPlugin / GraphicsContext**: plugin ABI
- **Engine**: log channel shared by the core and the backends
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod renderer;
pub mod resource;
pub mod plugin;
pub mod window;

// Main stellar2d namespace module
pub mod stellar2d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Window collaborator
    pub use crate::window::Window;

    // Logging sub-module (types only; the engine_* macros live at the crate root)
    pub mod log {
        pub use crate::log::{format_entry, Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Render sub-module with the GPU abstractions
    pub mod render {
        pub use crate::renderer::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Plugin ABI sub-module
    pub mod plugin {
        pub use crate::plugin::*;
    }
}

// Re-export math library at crate root
pub use glam;
