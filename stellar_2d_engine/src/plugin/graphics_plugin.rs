//! Graphics plugin function table and per-window context

use std::any::Any;
use crate::error::{Error, Result};
use crate::resource::{FrameStats, Mesh2D, MeshInstance};
use crate::window::Window;

/// Outcome of a frame operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The operation completed
    Ok,
    /// The swapchain is stale: drop this frame, resize if needed, restart from `clear`
    Continue,
    /// Unrecoverable failure
    Err,
}

impl RenderStatus {
    /// Map an operation result onto the plugin contract
    pub fn from_result<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => RenderStatus::Ok,
            Err(Error::SurfaceOutOfDate) => RenderStatus::Continue,
            Err(_) => RenderStatus::Err,
        }
    }
}

/// Per-window rendering state owned by the host
///
/// Backends downcast through `as_any_mut` to reach their concrete context.
pub trait GraphicsContext: Send {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Counters of the last displayed frame
    fn stats(&self) -> FrameStats;
}

/// Function table of a graphics plugin
///
/// Errors are logged by the backend and folded into `bool`/`RenderStatus`.
pub trait GraphicsPlugin: Send + Sync {
    /// Create a rendering context for `window`
    fn context_create(&self, window: &dyn Window) -> Option<Box<dyn GraphicsContext>>;

    /// Destroy a context (waits for its GPU work)
    fn context_destroy(&self, context: Box<dyn GraphicsContext>);

    /// Recreate the swapchain after the window changed size
    fn context_resize(&self, context: &mut dyn GraphicsContext, window: &dyn Window) -> bool;

    /// Upload a mesh shared by every context
    fn mesh_upload_2d(&self, mesh: &Mesh2D<'_>) -> bool;

    /// Queue one instance for the current frame
    fn draw_2d(&self, context: &mut dyn GraphicsContext, instance: &MeshInstance) -> RenderStatus;

    /// Open a frame and clear the swapchain image
    fn clear(&self, context: &mut dyn GraphicsContext, window: &dyn Window) -> RenderStatus;

    /// Record queued instances, submit and present
    fn display(&self, context: &mut dyn GraphicsContext, window: &dyn Window) -> RenderStatus;
}
