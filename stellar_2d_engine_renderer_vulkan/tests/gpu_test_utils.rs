#![allow(dead_code)]
//! GPU test utilities - shared device and window for the Vulkan integration tests
//!
//! One hidden window lives for the whole test process, its EventLoop is leaked
//! because it cannot be stored in a static. Surfaces are created per test, so
//! tests that build a context run `#[serial]`.
//!
//! The default shaders must be compiled into `bin/Shaders/` at the workspace root:
//!
//! ```text
//! glslc shaders/default.vert -o bin/Shaders/default.vert.spv
//! glslc shaders/default.frag -o bin/Shaders/default.frag.spv
//! ```

use stellar_2d_engine::stellar2d::render::Config;
use stellar_2d_engine_renderer_vulkan::stellar2d::Device;
use std::path::PathBuf;
use std::sync::OnceLock;
use winit::event_loop::{EventLoop, EventLoopBuilder};
use winit::window::Window;

// Platform-specific imports for EventLoop threading
#[cfg(target_os = "windows")]
use winit::platform::windows::EventLoopBuilderExtWindows;
#[cfg(target_os = "linux")]
use winit::platform::x11::EventLoopBuilderExtX11;

static GPU_DEVICE: OnceLock<Device> = OnceLock::new();

/// Note: EventLoop is intentionally leaked with mem::forget to keep Window valid
static GPU_WINDOW: OnceLock<Window> = OnceLock::new();

/// Configuration used by every GPU test
pub fn test_config() -> Config {
    Config {
        app_name: "Stellar2D GPU Tests".to_string(),
        shader_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../bin/Shaders")),
        enable_validation: true,
        ..Config::default()
    }
}

/// Shared device, created on first use
pub fn test_device() -> Device {
    GPU_DEVICE
        .get_or_init(|| Device::new(&test_config()).expect("Failed to create Device for tests"))
        .clone()
}

/// Shared hidden window, created on first use
pub fn test_window() -> &'static Window {
    GPU_WINDOW.get_or_init(|| {
        let (window, event_loop) = create_test_window();
        // Leak EventLoop intentionally to keep Window valid
        std::mem::forget(event_loop);
        window
    })
}

/// Create a hidden 800x600 window with an EventLoop usable off the main thread
#[allow(deprecated)]
pub fn create_test_window() -> (Window, EventLoop<()>) {
    // cargo test runs tests outside the main thread
    let event_loop = {
        #[cfg(any(target_os = "windows", target_os = "linux"))]
        {
            EventLoopBuilder::new()
                .with_any_thread(true)
                .build()
                .unwrap()
        }
        #[cfg(not(any(target_os = "windows", target_os = "linux")))]
        {
            EventLoopBuilder::new().build().unwrap()
        }
    };

    let window_attrs = Window::default_attributes()
        .with_title("Stellar2D GPU Test Window")
        .with_inner_size(winit::dpi::PhysicalSize::new(800, 600))
        .with_visible(false); // Hidden window for tests

    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}
