/// VulkanGraphicsContext - per-window rendering state
///
/// Frame protocol: `clear` opens a frame (wait slot, acquire image, begin
/// recording) and records the image clear; `draw` queues instances; `display`
/// records the batches inside the render pass, submits, presents and advances
/// the frame ring. A stale swapchain surfaces as `Error::SurfaceOutOfDate`.

use stellar_2d_engine::stellar2d::{Error, Result, Window};
use stellar_2d_engine::stellar2d::render::{
    Buffer as RendererBuffer, BufferDesc, CommandList as RendererCommandList, Config, FrameSlot,
    SwapchainDependent,
};
use stellar_2d_engine::stellar2d::resource::{BatchRenderer, FrameStats, MeshInstance, MeshManager, ViewUniform};
use stellar_2d_engine::stellar2d::plugin::GraphicsContext;
use stellar_2d_engine::{engine_debug, engine_info, engine_trace, engine_warn};
use std::any::Any;

use crate::vulkan_buffer::DeviceBuffer;
use crate::vulkan_context::Device;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_swapchain::Swapchain;

/// Rendering context of one window
pub struct VulkanGraphicsContext {
    // Fields drop in declaration order: GPU users before the device
    batches: BatchRenderer<DeviceBuffer>,
    render_pass: RenderPass,
    uniform_buffer: DeviceBuffer,
    swapchain: Swapchain,
    device: Device,
    /// Swapchain image of the open frame
    image_index: Option<u32>,
    clear_color: [f32; 4],
    stats: FrameStats,
}

impl VulkanGraphicsContext {
    /// Create the swapchain, render pass and projection uniform for `window`
    pub fn new(device: &Device, window: &dyn Window, config: &Config) -> Result<Self> {
        config.validate()?;

        let swapchain = Swapchain::new(device, window, config)?;
        let render_pass = RenderPass::init_default(device, &swapchain, config)?;

        let uniform_buffer = DeviceBuffer::new(
            device,
            &BufferDesc::uniform(std::mem::size_of::<ViewUniform>() as u64),
        )?;
        let extent = swapchain.extent();
        uniform_buffer.update(0, ViewUniform::for_extent(extent.width, extent.height).as_bytes())?;

        if let Some(pipeline) = render_pass.pipeline() {
            pipeline.write_to_descriptor_set(&uniform_buffer);
        }

        engine_info!("stellar2d::vulkan", "Graphics context created ({}x{})", extent.width, extent.height);

        Ok(Self {
            batches: BatchRenderer::new(config.frames_in_flight),
            render_pass,
            uniform_buffer,
            swapchain,
            device: device.clone(),
            image_index: None,
            clear_color: config.clear_color,
            stats: FrameStats::default(),
        })
    }

    /// Open a frame if needed and clear the swapchain image
    ///
    /// # Errors
    ///
    /// `SurfaceOutOfDate` if the window is minimized, no longer matches the
    /// swapchain, a failed resize left nothing to render to, or the swapchain
    /// went stale during acquire.
    pub fn clear(&mut self, window: &dyn Window) -> Result<()> {
        let result = self.record_clear(window);
        if result.is_err() {
            self.discard_frame();
        }
        result
    }

    fn record_clear(&mut self, window: &dyn Window) -> Result<()> {
        let image_index = self.begin_frame(window)?;
        let color = self.clear_color;
        let frame = self.render_pass.frames_mut().current_mut();
        let cmd = frame.command_list().command_buffer();
        self.swapchain.record_clear(cmd, image_index, color)
    }

    /// Open a frame unless one is already open, returning its image index
    fn begin_frame(&mut self, window: &dyn Window) -> Result<u32> {
        if let Some(image_index) = self.image_index {
            return Ok(image_index);
        }
        if window.is_minimized() || !self.swapchain.matches_window(window) {
            engine_debug!("stellar2d::vulkan", "Window size {:?} differs from the swapchain", window.size());
            return Err(Error::SurfaceOutOfDate);
        }
        if !self.is_renderable() {
            engine_debug!("stellar2d::vulkan", "Swapchain has no usable images, waiting for a resize");
            return Err(Error::SurfaceOutOfDate);
        }

        let frames = self.render_pass.frames_mut();
        frames.wait_current()?;

        let present_semaphore = frames.current().present_semaphore();
        // Out of date: nothing was signaled and the fence is untouched
        let image_index = self.swapchain
            .acquire_next_image(present_semaphore)?
            .ok_or(Error::SurfaceOutOfDate)?;
        self.image_index = Some(image_index);

        self.render_pass.frames_mut().begin_current()?;
        engine_trace!("stellar2d::vulkan",
            "Frame opened: image {}, slot {}", image_index, self.render_pass.frames().current_index());
        Ok(image_index)
    }

    /// Queue one instance for the open frame
    pub fn draw(&mut self, instance: MeshInstance) {
        self.batches.add_instance(instance);
    }

    /// Record the queued batches, submit and present
    ///
    /// Opens (and clears) a frame first when `clear` was not called.
    pub fn display(&mut self, window: &dyn Window, meshes: &MeshManager<DeviceBuffer>) -> Result<()> {
        let result = self.record_and_present(window, meshes);
        if result.is_err() {
            self.discard_frame();
            self.batches.reset_batches();
        }
        result
    }

    fn record_and_present(&mut self, window: &dyn Window, meshes: &MeshManager<DeviceBuffer>) -> Result<()> {
        if self.image_index.is_none() {
            self.record_clear(window)?;
        }
        let image_index = self.image_index.ok_or(Error::SurfaceOutOfDate)?;

        // Copy the handles out before borrowing the frame mutably
        let extent = self.swapchain.extent();
        let render_pass = self.render_pass.raw();
        let framebuffer = self.render_pass.framebuffer(image_index)?;
        let (pipeline, pipeline_layout, descriptor_set) = {
            let pipeline = self.render_pass.pipeline()
                .ok_or_else(|| Error::InvalidResource("render pass has no pipeline".to_string()))?;
            (pipeline.raw(), pipeline.layout(), pipeline.descriptor_set())
        };
        let frame_slot = self.render_pass.frames().current_index();

        let frame = self.render_pass.frames_mut().current_mut();
        let present_semaphore = frame.present_semaphore();
        let render_semaphore = frame.render_semaphore();
        let render_fence = frame.render_fence();

        let cmd = frame.command_list();
        cmd.begin_render_pass(render_pass, framebuffer, extent)?;
        cmd.set_viewport_scissor(extent)?;
        cmd.bind_pipeline(pipeline)?;
        cmd.bind_descriptor_set(pipeline_layout, descriptor_set)?;
        let stats = self.batches.record(&self.device, meshes, cmd, frame_slot)?;
        cmd.end_render_pass()?;
        cmd.end()?;

        self.device.submit(cmd.command_buffer(), present_semaphore, render_semaphore, render_fence)?;

        // Submitted: the slot's fence will signal whatever happens next
        self.image_index = None;
        self.render_pass.frames_mut().advance();
        self.batches.reset_batches();
        self.stats = stats;

        if !self.swapchain.present(image_index, render_semaphore)? {
            return Err(Error::SurfaceOutOfDate);
        }
        Ok(())
    }

    /// Drop the open frame, if any, leaving its slot reusable
    fn discard_frame(&mut self) {
        if self.image_index.take().is_none() {
            return;
        }
        if let Err(e) = self.render_pass.frames_mut().current_mut().abandon() {
            engine_warn!("stellar2d::vulkan", "Failed to abandon frame: {}", e);
        }
    }

    /// Recreate the swapchain for the window's current size
    ///
    /// Minimized windows are skipped; the next `resize` with a real size
    /// does the work.
    pub fn resize(&mut self, window: &dyn Window) -> Result<()> {
        if window.is_minimized() {
            engine_debug!("stellar2d::vulkan", "Resize deferred: window is minimized");
            return Ok(());
        }

        self.discard_frame();
        self.swapchain.reinit(
            window,
            &mut [&mut self.render_pass as &mut dyn SwapchainDependent<Swapchain>],
        )?;

        let extent = self.swapchain.extent();
        self.uniform_buffer.update(0, ViewUniform::for_extent(extent.width, extent.height).as_bytes())?;
        self.batches.reset_batches();

        engine_info!("stellar2d::vulkan", "Graphics context resized to {}x{}", extent.width, extent.height);
        Ok(())
    }

    pub fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    /// Whether the swapchain and the framebuffers built on it are both usable
    ///
    /// False after a failed `resize` until a later one succeeds.
    pub fn is_renderable(&self) -> bool {
        self.swapchain.is_ready()
            && self.render_pass.framebuffer_count() == self.swapchain.image_count()
    }

    /// Whether a frame is open (between `clear` and `display`)
    pub fn is_frame_open(&self) -> bool {
        self.image_index.is_some()
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    pub fn batches(&self) -> &BatchRenderer<DeviceBuffer> {
        &self.batches
    }
}

impl GraphicsContext for VulkanGraphicsContext {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn stats(&self) -> FrameStats {
        self.stats
    }
}

impl Drop for VulkanGraphicsContext {
    fn drop(&mut self) {
        self.discard_frame();
        unsafe {
            self.device.raw().device_wait_idle().ok();
        }
    }
}
