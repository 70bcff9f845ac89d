/// RenderPass - render-pass object, per-image framebuffers, frame ring and pipeline
///
/// The color attachment is loaded (the frame's clear step already wrote it)
/// and stays in PRESENT_SRC outside the pass; depth is cleared every pass.
/// After swapchain recreation only the framebuffers and frame slots are
/// rebuilt; the render pass and pipeline survive because formats are fixed.

use stellar_2d_engine::stellar2d::{Error, Result};
use stellar_2d_engine::stellar2d::render::{Config, FrameRing, SwapchainDependent};
use stellar_2d_engine::{engine_debug, engine_error, engine_info, engine_warn};
use ash::vk;
use std::time::Duration;

use crate::vulkan_context::Device;
use crate::vulkan_format::vk_error;
use crate::vulkan_frame::FrameData;
use crate::vulkan_pipeline::GraphicsPipeline;
use crate::vulkan_swapchain::Swapchain;

/// Pipelines a render pass can drive
pub enum PipelineVariant {
    /// Vertex-colored instanced meshes
    Default(GraphicsPipeline),
}

impl PipelineVariant {
    pub fn pipeline(&self) -> &GraphicsPipeline {
        match self {
            PipelineVariant::Default(pipeline) => pipeline,
        }
    }
}

/// Vulkan render pass with everything sized to the swapchain
pub struct RenderPass {
    // Drop order: pipeline and frames before the render pass they reference
    pipeline: Option<PipelineVariant>,
    frames: FrameRing<FrameData>,
    framebuffers: Vec<vk::Framebuffer>,
    render_pass: vk::RenderPass,
    device: Device,
    color_format: vk::Format,
    depth_format: vk::Format,
    frames_in_flight: usize,
    fence_timeout: Duration,
}

impl RenderPass {
    /// Create the default render pass for `swapchain`
    pub fn init_default(device: &Device, swapchain: &Swapchain, config: &Config) -> Result<Self> {
        config.validate()?;

        let frames = FrameRing::new(
            FrameData::create_ring(device, config.frames_in_flight)?,
            config.fence_timeout,
        )?;
        let render_pass = create_render_pass(device, swapchain.format(), swapchain.depth_format())?;

        // From here on, drop releases whatever was created
        let mut this = Self {
            pipeline: None,
            frames,
            framebuffers: Vec::new(),
            render_pass,
            device: device.clone(),
            color_format: swapchain.format(),
            depth_format: swapchain.depth_format(),
            frames_in_flight: config.frames_in_flight,
            fence_timeout: config.fence_timeout,
        };

        this.create_framebuffers(swapchain)?;
        this.pipeline = Some(PipelineVariant::Default(
            GraphicsPipeline::init_default(device, render_pass, config)?,
        ));

        engine_info!("stellar2d::vulkan",
            "Render pass ready: {} framebuffers, {} frames in flight",
            this.framebuffers.len(), this.frames_in_flight);
        Ok(this)
    }

    fn create_framebuffers(&mut self, swapchain: &Swapchain) -> Result<()> {
        let extent = swapchain.extent();
        let depth_view = swapchain.depth_view();

        for &color_view in swapchain.image_views() {
            let attachments = [color_view, depth_view];
            let create_info = vk::FramebufferCreateInfo::default()
                .render_pass(self.render_pass)
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            let framebuffer = unsafe {
                self.device.raw().create_framebuffer(&create_info, None)
                    .map_err(|e| vk_error("vkCreateFramebuffer", e))?
            };
            self.framebuffers.push(framebuffer);
        }
        Ok(())
    }

    fn destroy_framebuffers(&mut self) {
        unsafe {
            for &framebuffer in &self.framebuffers {
                self.device.raw().destroy_framebuffer(framebuffer, None);
            }
        }
        self.framebuffers.clear();
    }

    pub fn raw(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Framebuffer of swapchain image `image_index`
    pub fn framebuffer(&self, image_index: u32) -> Result<vk::Framebuffer> {
        self.framebuffers.get(image_index as usize).copied().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "no framebuffer for image {} ({} framebuffers)",
                image_index,
                self.framebuffers.len()
            ))
        })
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    pub fn frames(&self) -> &FrameRing<FrameData> {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameRing<FrameData> {
        &mut self.frames
    }

    pub fn pipeline(&self) -> Option<&GraphicsPipeline> {
        self.pipeline.as_ref().map(PipelineVariant::pipeline)
    }
}

impl SwapchainDependent<Swapchain> for RenderPass {
    fn on_swapchain_recreated(&mut self, swapchain: &Swapchain) -> Result<()> {
        if swapchain.format() != self.color_format || swapchain.depth_format() != self.depth_format {
            engine_error!("stellar2d::vulkan",
                "Swapchain formats changed ({:?}/{:?} -> {:?}/{:?})",
                self.color_format, self.depth_format, swapchain.format(), swapchain.depth_format());
            return Err(Error::InvalidResource("swapchain formats changed on recreation".to_string()));
        }

        unsafe {
            self.device.raw().device_wait_idle()
                .map_err(|e| vk_error("vkDeviceWaitIdle", e))?;
        }

        self.destroy_framebuffers();
        self.frames = FrameRing::new(
            FrameData::create_ring(&self.device, self.frames_in_flight)?,
            self.fence_timeout,
        )?;
        self.create_framebuffers(swapchain)?;

        engine_debug!("stellar2d::vulkan",
            "Rebuilt {} framebuffers and {} frame slots", self.framebuffers.len(), self.frames.len());
        Ok(())
    }

    fn on_swapchain_lost(&mut self) {
        unsafe {
            self.device.raw().device_wait_idle().ok();
        }
        self.destroy_framebuffers();
        engine_warn!("stellar2d::vulkan", "Swapchain lost: framebuffers released until the next resize");
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().device_wait_idle().ok();
        }
        self.pipeline = None;
        self.destroy_framebuffers();
        unsafe {
            self.device.raw().destroy_render_pass(self.render_pass, None);
        }
    }
}

/// Attachment descriptions: color loaded and kept in PRESENT_SRC, depth cleared
pub fn attachment_descriptions(color_format: vk::Format, depth_format: vk::Format) -> [vk::AttachmentDescription; 2] {
    [
        vk::AttachmentDescription::default()
            .format(color_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::LOAD)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::PRESENT_SRC_KHR)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR),
        vk::AttachmentDescription::default()
            .format(depth_format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
            .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
    ]
}

fn create_render_pass(device: &Device, color_format: vk::Format, depth_format: vk::Format) -> Result<vk::RenderPass> {
    let attachments = attachment_descriptions(color_format, depth_format);

    let color_refs = [vk::AttachmentReference {
        attachment: 0,
        layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
    }];
    let depth_ref = vk::AttachmentReference {
        attachment: 1,
        layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    };

    let subpasses = [vk::SubpassDescription::default()
        .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
        .color_attachments(&color_refs)
        .depth_stencil_attachment(&depth_ref)];

    // Order the pass after the clear transfer and the previous frame's depth use
    let dependencies = [vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(
            vk::PipelineStageFlags::TRANSFER
                | vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
        )
        .dst_stage_mask(
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
        )
        .src_access_mask(
            vk::AccessFlags::TRANSFER_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )
        .dst_access_mask(
            vk::AccessFlags::COLOR_ATTACHMENT_READ
                | vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )];

    let create_info = vk::RenderPassCreateInfo::default()
        .attachments(&attachments)
        .subpasses(&subpasses)
        .dependencies(&dependencies);

    unsafe {
        device.raw().create_render_pass(&create_info, None)
            .map_err(|e| vk_error("vkCreateRenderPass", e))
    }
}

#[cfg(test)]
#[path = "vulkan_render_pass_tests.rs"]
mod tests;
