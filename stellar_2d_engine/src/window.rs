//! Window collaborator - what the graphics backend needs from the host window

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// A presentable window
///
/// The backend creates its surface from the raw handles and sizes the
/// swapchain from `size()`.
pub trait Window: HasDisplayHandle + HasWindowHandle {
    /// Drawable size in physical pixels
    fn size(&self) -> (u32, u32);

    /// A zero-sized (minimized) window cannot back a swapchain
    fn is_minimized(&self) -> bool {
        let (width, height) = self.size();
        width == 0 || height == 0
    }
}

impl Window for winit::window::Window {
    fn size(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }
}
