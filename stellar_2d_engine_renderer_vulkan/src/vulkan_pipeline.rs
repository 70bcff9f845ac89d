/// GraphicsPipeline - the default 2D pipeline and its descriptor objects
///
/// One uniform buffer (the view projection) at set 0, binding 0, visible to
/// the vertex stage. Vertices come from binding 0, per-instance data from
/// binding 1.

use stellar_2d_engine::stellar2d::{Error, Result};
use stellar_2d_engine::stellar2d::render::Config;
use stellar_2d_engine::stellar2d::resource::{MeshInstance, Vertex2D};
use stellar_2d_engine::{engine_error, engine_info};
use ash::vk;

use crate::vulkan_buffer::DeviceBuffer;
use crate::vulkan_context::Device;
use crate::vulkan_shader::ShaderModule;

/// Vertex shader file inside `Config::shader_dir`
pub const DEFAULT_VERTEX_SHADER: &str = "default.vert.spv";
/// Fragment shader file inside `Config::shader_dir`
pub const DEFAULT_FRAGMENT_SHADER: &str = "default.frag.spv";

fn pipeline_error(what: &str, result: vk::Result) -> Error {
    engine_error!("stellar2d::vulkan", "Failed to create {}: {:?}", what, result);
    Error::PipelineCreateFailed(format!("Failed to create {}: {:?}", what, result))
}

/// Vulkan graphics pipeline with its descriptor set
pub struct GraphicsPipeline {
    device: Device,
    descriptor_pool: vk::DescriptorPool,
    set_layout: vk::DescriptorSetLayout,
    /// Freed with the pool
    descriptor_set: vk::DescriptorSet,
    pipeline_layout: vk::PipelineLayout,
    pipeline: vk::Pipeline,
}

impl GraphicsPipeline {
    /// Build the default pipeline for subpass 0 of `render_pass`
    ///
    /// # Errors
    ///
    /// - `ShaderLoadFailed` if a shader is missing, empty, misaligned or not valid SPIR-V
    /// - `PipelineCreateFailed` if any Vulkan object cannot be created
    pub fn init_default(device: &Device, render_pass: vk::RenderPass, config: &Config) -> Result<Self> {
        // Shaders first: nothing to release when they are missing
        let vertex_shader = ShaderModule::from_file(
            device,
            &config.shader_dir.join(DEFAULT_VERTEX_SHADER),
            vk::ShaderStageFlags::VERTEX,
        )?;
        let fragment_shader = ShaderModule::from_file(
            device,
            &config.shader_dir.join(DEFAULT_FRAGMENT_SHADER),
            vk::ShaderStageFlags::FRAGMENT,
        )?;

        let raw = device.raw();

        // From here on, drop releases whatever was created
        let mut this = Self {
            device: device.clone(),
            descriptor_pool: vk::DescriptorPool::null(),
            set_layout: vk::DescriptorSetLayout::null(),
            descriptor_set: vk::DescriptorSet::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            pipeline: vk::Pipeline::null(),
        };

        unsafe {
            let pool_sizes = [vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1,
            }];
            let pool_info = vk::DescriptorPoolCreateInfo::default()
                .pool_sizes(&pool_sizes)
                .max_sets(1);
            this.descriptor_pool = raw.create_descriptor_pool(&pool_info, None)
                .map_err(|e| pipeline_error("descriptor pool", e))?;

            let bindings = [vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX)];
            let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            this.set_layout = raw.create_descriptor_set_layout(&layout_info, None)
                .map_err(|e| pipeline_error("descriptor set layout", e))?;

            let set_layouts = [this.set_layout];
            let allocate_info = vk::DescriptorSetAllocateInfo::default()
                .descriptor_pool(this.descriptor_pool)
                .set_layouts(&set_layouts);
            this.descriptor_set = raw.allocate_descriptor_sets(&allocate_info)
                .map_err(|e| pipeline_error("descriptor set", e))?[0];

            let pipeline_layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
            this.pipeline_layout = raw.create_pipeline_layout(&pipeline_layout_info, None)
                .map_err(|e| pipeline_error("pipeline layout", e))?;

            let shader_stages = [vertex_shader.stage_info(), fragment_shader.stage_info()];

            // Vertex input state
            let vertex_bindings = vertex_binding_descriptions();
            let vertex_attributes = vertex_attribute_descriptions();
            let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
                .vertex_binding_descriptions(&vertex_bindings)
                .vertex_attribute_descriptions(&vertex_attributes);

            let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
                .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
                .primitive_restart_enable(false);

            // Viewport state (dynamic)
            let viewport_state = vk::PipelineViewportStateCreateInfo::default()
                .viewport_count(1)
                .scissor_count(1);

            let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
                .depth_clamp_enable(false)
                .rasterizer_discard_enable(false)
                .polygon_mode(vk::PolygonMode::FILL)
                .line_width(1.0)
                .cull_mode(vk::CullModeFlags::NONE)
                .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
                .depth_bias_enable(false);

            let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
                .depth_test_enable(true)
                .depth_write_enable(true)
                .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL)
                .depth_bounds_test_enable(false)
                .stencil_test_enable(false);

            let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
                .sample_shading_enable(false)
                .rasterization_samples(vk::SampleCountFlags::TYPE_1);

            let color_blend_attachment = alpha_blend_attachment();
            let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
                .logic_op_enable(false)
                .attachments(std::slice::from_ref(&color_blend_attachment));

            let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
            let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
                .dynamic_states(&dynamic_states);

            let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&shader_stages)
                .vertex_input_state(&vertex_input_state)
                .input_assembly_state(&input_assembly_state)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization_state)
                .depth_stencil_state(&depth_stencil_state)
                .multisample_state(&multisample_state)
                .color_blend_state(&color_blend_state)
                .dynamic_state(&dynamic_state)
                .layout(this.pipeline_layout)
                .render_pass(render_pass)
                .subpass(0);

            let pipelines = raw.create_graphics_pipelines(
                vk::PipelineCache::null(),
                &[pipeline_create_info],
                None,
            )
            .map_err(|(_, e)| pipeline_error("graphics pipeline", e))?;
            this.pipeline = pipelines[0];
        }

        engine_info!("stellar2d::vulkan", "Default graphics pipeline created");
        Ok(this)
    }

    /// Point binding 0 of the descriptor set at the whole of `uniform_buffer`
    pub fn write_to_descriptor_set(&self, uniform_buffer: &DeviceBuffer) {
        let buffer_infos = [vk::DescriptorBufferInfo {
            buffer: uniform_buffer.raw(),
            offset: 0,
            range: vk::WHOLE_SIZE,
        }];
        let writes = [vk::WriteDescriptorSet::default()
            .dst_set(self.descriptor_set)
            .dst_binding(0)
            .dst_array_element(0)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .buffer_info(&buffer_infos)];

        unsafe {
            self.device.raw().update_descriptor_sets(&writes, &[]);
        }
    }

    pub fn raw(&self) -> vk::Pipeline {
        self.pipeline
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.pipeline_layout
    }

    pub fn descriptor_set(&self) -> vk::DescriptorSet {
        self.descriptor_set
    }
}

impl Drop for GraphicsPipeline {
    fn drop(&mut self) {
        unsafe {
            let raw = self.device.raw();
            raw.device_wait_idle().ok();
            raw.destroy_pipeline(self.pipeline, None);
            raw.destroy_pipeline_layout(self.pipeline_layout, None);
            raw.destroy_descriptor_set_layout(self.set_layout, None);
            raw.destroy_descriptor_pool(self.descriptor_pool, None);
        }
    }
}

/// Binding 0: `Vertex2D` per vertex, binding 1: `MeshInstance` per instance
pub fn vertex_binding_descriptions() -> [vk::VertexInputBindingDescription; 2] {
    [
        vk::VertexInputBindingDescription {
            binding: 0,
            stride: std::mem::size_of::<Vertex2D>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        },
        vk::VertexInputBindingDescription {
            binding: 1,
            stride: std::mem::size_of::<MeshInstance>() as u32,
            input_rate: vk::VertexInputRate::INSTANCE,
        },
    ]
}

/// Locations 0-1 read `Vertex2D`, locations 2-4 read `MeshInstance`
pub fn vertex_attribute_descriptions() -> [vk::VertexInputAttributeDescription; 5] {
    [
        vk::VertexInputAttributeDescription {
            location: 0,
            binding: 0,
            format: vk::Format::R32G32_SFLOAT,
            offset: 0,
        },
        vk::VertexInputAttributeDescription {
            location: 1,
            binding: 0,
            format: vk::Format::R32G32B32A32_SFLOAT,
            offset: Vertex2D::COLOR_OFFSET,
        },
        vk::VertexInputAttributeDescription {
            location: 2,
            binding: 1,
            format: vk::Format::R32G32_SFLOAT,
            offset: MeshInstance::SCALE_OFFSET,
        },
        vk::VertexInputAttributeDescription {
            location: 3,
            binding: 1,
            format: vk::Format::R32G32B32_SFLOAT,
            offset: MeshInstance::POSITION_OFFSET,
        },
        vk::VertexInputAttributeDescription {
            location: 4,
            binding: 1,
            format: vk::Format::R32G32B32A32_SFLOAT,
            offset: MeshInstance::COLOR_OFFSET,
        },
    ]
}

/// Straight alpha blending: `src * a + dst * (1 - a)`
pub fn alpha_blend_attachment() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState::default()
        .color_write_mask(vk::ColorComponentFlags::RGBA)
        .blend_enable(true)
        .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
        .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
        .color_blend_op(vk::BlendOp::ADD)
        .src_alpha_blend_factor(vk::BlendFactor::ONE)
        .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
        .alpha_blend_op(vk::BlendOp::ADD)
}

#[cfg(test)]
#[path = "vulkan_pipeline_tests.rs"]
mod tests;
