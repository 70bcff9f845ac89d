/// CommandList - Vulkan implementation of the engine CommandList trait

use stellar_2d_engine::stellar2d::{Error, Result};
use stellar_2d_engine::stellar2d::render::{CommandList as RendererCommandList, IndexType};
use ash::vk;

use crate::vulkan_buffer::DeviceBuffer;
use crate::vulkan_context::Device;
use crate::vulkan_format::{index_type_to_vk, vk_error};

/// Vulkan command list implementation
///
/// Wraps one primary command buffer allocated from a frame's command pool.
/// The pool owns the buffer memory; resetting the pool recycles it.
pub struct CommandList {
    device: Device,
    command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
}

impl CommandList {
    /// Allocate a primary command buffer from `pool`
    pub fn allocate(device: &Device, pool: vk::CommandPool) -> Result<Self> {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = unsafe {
            device.raw().allocate_command_buffers(&allocate_info)
                .map_err(|e| vk_error("vkAllocateCommandBuffers", e))?
        };

        Ok(Self {
            device: device.clone(),
            command_buffer: command_buffers[0],
            is_recording: false,
            in_render_pass: false,
        })
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    /// Forget the recording state after the owning pool was reset
    pub(crate) fn mark_reset(&mut self) {
        self.is_recording = false;
        self.in_render_pass = false;
    }

    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::InvalidResource("Command list not recording".to_string()));
        }
        Ok(())
    }

    /// Begin `render_pass` on `framebuffer`, clearing depth to 1.0
    pub fn begin_render_pass(
        &mut self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
    ) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidResource("Render pass already begun".to_string()));
        }

        // Color is loaded (cleared by the frame's clear step), depth is cleared
        let clear_values = [
            vk::ClearValue { color: vk::ClearColorValue { float32: [0.0; 4] } },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
        ];

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(&clear_values);

        unsafe {
            self.device.raw().cmd_begin_render_pass(
                self.command_buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
        }
        self.in_render_pass = true;
        Ok(())
    }

    pub fn end_render_pass(&mut self) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::InvalidResource("No render pass to end".to_string()));
        }
        unsafe {
            self.device.raw().cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    /// Set the dynamic viewport and scissor to cover `extent`
    pub fn set_viewport_scissor(&mut self, extent: vk::Extent2D) -> Result<()> {
        self.ensure_recording()?;

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        unsafe {
            self.device.raw().cmd_set_viewport(self.command_buffer, 0, &[viewport]);
            self.device.raw().cmd_set_scissor(self.command_buffer, 0, &[scissor]);
        }
        Ok(())
    }

    pub fn bind_pipeline(&mut self, pipeline: vk::Pipeline) -> Result<()> {
        self.ensure_recording()?;
        unsafe {
            self.device.raw().cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline,
            );
        }
        Ok(())
    }

    /// Bind `descriptor_set` as set 0 of `pipeline_layout`
    pub fn bind_descriptor_set(
        &mut self,
        pipeline_layout: vk::PipelineLayout,
        descriptor_set: vk::DescriptorSet,
    ) -> Result<()> {
        self.ensure_recording()?;
        unsafe {
            self.device.raw().cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline_layout,
                0, // first_set
                &[descriptor_set],
                &[], // dynamic_offsets
            );
        }
        Ok(())
    }
}

impl RendererCommandList for CommandList {
    type Buffer = DeviceBuffer;

    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::InvalidResource("Command list already recording".to_string()));
        }

        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device.raw()
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| vk_error("vkBeginCommandBuffer", e))?;
        }
        self.is_recording = true;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidResource("Render pass still open".to_string()));
        }

        unsafe {
            self.device.raw()
                .end_command_buffer(self.command_buffer)
                .map_err(|e| vk_error("vkEndCommandBuffer", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn bind_vertex_buffers(&mut self, first_binding: u32, buffers: &[&DeviceBuffer]) -> Result<()> {
        self.ensure_recording()?;

        let handles: Vec<vk::Buffer> = buffers.iter().map(|buffer| buffer.raw()).collect();
        let offsets = vec![0u64; handles.len()];

        unsafe {
            self.device.raw().cmd_bind_vertex_buffers(
                self.command_buffer,
                first_binding,
                &handles,
                &offsets,
            );
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &DeviceBuffer, index_type: IndexType) -> Result<()> {
        self.ensure_recording()?;
        unsafe {
            self.device.raw().cmd_bind_index_buffer(
                self.command_buffer,
                buffer.raw(),
                0,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32) -> Result<()> {
        if !self.in_render_pass {
            return Err(Error::InvalidResource("draw_indexed outside a render pass".to_string()));
        }
        unsafe {
            self.device.raw().cmd_draw_indexed(
                self.command_buffer,
                index_count,
                instance_count,
                0, // first_index
                0, // vertex_offset
                0, // first_instance
            );
        }
        Ok(())
    }
}
