//! Pipeline layout and graphics pipeline creation.
//!
//! - [`PipelineLayout`] wraps `VkPipelineLayout` and enforces the
//!   push-constant budget
//! - [`PipelineConfig`] is the fixed-function state as a plain value
//! - [`GraphicsPipelineBuilder`] combines shaders, vertex input, a config and
//!   a render pass into a [`Pipeline`]
//!
//! Viewport and scissor are always dynamic so a resize never touches baked
//! pipeline state.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swapframe_rhi::device::Device;
//! use swapframe_rhi::pipeline::{GraphicsPipelineBuilder, PipelineLayout};
//! use swapframe_rhi::shader::ShaderModule;
//! use swapframe_rhi::vertex::Vertex;
//! use ash::vk;
//!
//! # fn example(
//! #     device: Arc<Device>,
//! #     vert: &ShaderModule,
//! #     frag: &ShaderModule,
//! #     render_pass: vk::RenderPass,
//! # ) -> Result<(), swapframe_rhi::RhiError> {
//! let layout = PipelineLayout::new(device.clone(), &[])?;
//! let pipeline = GraphicsPipelineBuilder::new(render_pass)
//!     .vertex_shader(vert)
//!     .fragment_shader(frag)
//!     .vertex_binding(Vertex::binding_description())
//!     .vertex_attributes(&Vertex::attribute_descriptions())
//!     .build(device, &layout)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::shader::ShaderModule;

/// Push-constant bytes every Vulkan implementation guarantees.
pub const PUSH_CONSTANT_BUDGET: u32 = 128;

/// Checks that every range fits inside `limit` bytes.
///
/// Offsets and sizes must also be multiples of four, as Vulkan requires.
pub fn validate_push_constant_ranges(
    ranges: &[vk::PushConstantRange],
    limit: u32,
) -> RhiResult<()> {
    for range in ranges {
        let end = range.offset.checked_add(range.size);
        let misaligned = !range.offset.is_multiple_of(4) || !range.size.is_multiple_of(4);
        if range.size == 0 || misaligned || end.is_none_or(|end| end > limit) {
            return Err(RhiError::PushConstantBudget {
                offset: range.offset,
                size: range.size,
                limit,
            });
        }
    }
    Ok(())
}

/// Vulkan pipeline layout.
///
/// Only push-constant ranges are supported; nothing in this workspace binds
/// descriptor sets.
pub struct PipelineLayout {
    device: Arc<Device>,
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Creates a layout with the given push-constant ranges.
    ///
    /// # Errors
    ///
    /// [`RhiError::PushConstantBudget`] when a range does not fit in
    /// [`PUSH_CONSTANT_BUDGET`] bytes.
    pub fn new(device: Arc<Device>, push_constant_ranges: &[vk::PushConstantRange]) -> RhiResult<Self> {
        validate_push_constant_ranges(push_constant_ranges, PUSH_CONSTANT_BUDGET)?;

        let create_info =
            vk::PipelineLayoutCreateInfo::default().push_constant_ranges(push_constant_ranges);

        let layout = unsafe {
            device
                .handle()
                .create_pipeline_layout(&create_info, None)
                .map_err(RhiError::creating("pipeline layout"))?
        };

        debug!(
            "Created pipeline layout with {} push constant range(s)",
            push_constant_ranges.len()
        );

        Ok(Self {
            device,
            layout,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_pipeline_layout(self.layout, None);
        }
        debug!("Pipeline layout destroyed");
    }
}

/// Graphics pipeline object.
pub struct Pipeline {
    device: Arc<Device>,
    pipeline: vk::Pipeline,
    render_pass: vk::RenderPass,
}

impl Pipeline {
    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }

    /// Render pass this pipeline was built against.
    #[inline]
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_pipeline(self.pipeline, None);
        }
        info!("Graphics pipeline destroyed");
    }
}

/// Fixed-function state of a graphics pipeline.
///
/// A plain value: copy it, adjust fields, hand it to the builder. Defaults
/// are a triangle list, filled and unculled, one sample, depth test and
/// write with `LESS`, and opaque color output.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    pub topology: vk::PrimitiveTopology,
    pub polygon_mode: vk::PolygonMode,
    pub cull_mode: vk::CullModeFlags,
    pub front_face: vk::FrontFace,
    pub line_width: f32,
    pub samples: vk::SampleCountFlags,
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: vk::CompareOp,
    pub subpass: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::CLOCKWISE,
            line_width: 1.0,
            samples: vk::SampleCountFlags::TYPE_1,
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: vk::CompareOp::LESS,
            subpass: 0,
        }
    }
}

impl PipelineConfig {
    /// Dynamic states every pipeline declares.
    pub const DYNAMIC_STATES: [vk::DynamicState; 2] =
        [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];

    /// Opaque output: the fragment color replaces the attachment.
    fn color_blend_attachment(&self) -> vk::PipelineColorBlendAttachmentState {
        vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(false)
            .src_color_blend_factor(vk::BlendFactor::ONE)
            .dst_color_blend_factor(vk::BlendFactor::ZERO)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
    }
}

/// Builder for a render-pass bound graphics pipeline.
pub struct GraphicsPipelineBuilder<'a> {
    render_pass: vk::RenderPass,
    vertex_shader: Option<&'a ShaderModule>,
    fragment_shader: Option<&'a ShaderModule>,
    vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    config: PipelineConfig,
}

impl<'a> GraphicsPipelineBuilder<'a> {
    /// Starts a builder for a pipeline used inside `render_pass`.
    pub fn new(render_pass: vk::RenderPass) -> Self {
        Self {
            render_pass,
            vertex_shader: None,
            fragment_shader: None,
            vertex_bindings: Vec::new(),
            vertex_attributes: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    pub fn vertex_shader(mut self, shader: &'a ShaderModule) -> Self {
        self.vertex_shader = Some(shader);
        self
    }

    pub fn fragment_shader(mut self, shader: &'a ShaderModule) -> Self {
        self.fragment_shader = Some(shader);
        self
    }

    pub fn vertex_binding(mut self, binding: vk::VertexInputBindingDescription) -> Self {
        self.vertex_bindings.push(binding);
        self
    }

    pub fn vertex_attributes(mut self, attributes: &[vk::VertexInputAttributeDescription]) -> Self {
        self.vertex_attributes.extend_from_slice(attributes);
        self
    }

    /// Replaces the fixed-function state.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn subpass(mut self, subpass: u32) -> Self {
        self.config.subpass = subpass;
        self
    }

    /// Creates the pipeline.
    ///
    /// # Errors
    ///
    /// [`RhiError::PipelineError`] if a shader stage or the render pass is
    /// missing, [`RhiError::ResourceCreation`] if the driver rejects it.
    pub fn build(self, device: Arc<Device>, layout: &PipelineLayout) -> RhiResult<Pipeline> {
        let vertex_shader = self
            .vertex_shader
            .ok_or_else(|| RhiError::PipelineError("Vertex shader is required".to_string()))?;

        let fragment_shader = self
            .fragment_shader
            .ok_or_else(|| RhiError::PipelineError("Fragment shader is required".to_string()))?;

        if self.render_pass == vk::RenderPass::null() {
            return Err(RhiError::PipelineError(
                "A render pass is required".to_string(),
            ));
        }

        let config = &self.config;

        let shader_stages = [
            vertex_shader.stage_create_info(),
            fragment_shader.stage_create_info(),
        ];

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&self.vertex_bindings)
            .vertex_attribute_descriptions(&self.vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(config.topology)
            .primitive_restart_enable(false);

        // Counts only; the rectangles are set per frame.
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(config.polygon_mode)
            .line_width(config.line_width)
            .cull_mode(config.cull_mode)
            .front_face(config.front_face)
            .depth_bias_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(config.samples)
            .min_sample_shading(1.0);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(config.depth_test_enable)
            .depth_write_enable(config.depth_write_enable)
            .depth_compare_op(config.depth_compare_op)
            .depth_bounds_test_enable(false)
            .min_depth_bounds(0.0)
            .max_depth_bounds(1.0)
            .stencil_test_enable(false);

        let color_blend_attachments = [config.color_blend_attachment()];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .logic_op(vk::LogicOp::COPY)
            .attachments(&color_blend_attachments)
            .blend_constants([0.0; 4]);

        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&PipelineConfig::DYNAMIC_STATES);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .depth_stencil_state(&depth_stencil_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout.handle())
            .render_pass(self.render_pass)
            .subpass(config.subpass)
            .base_pipeline_handle(vk::Pipeline::null())
            .base_pipeline_index(-1);

        let pipelines = unsafe {
            device
                .handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
                .map_err(|(_, result)| RhiError::creating("graphics pipeline")(result))?
        };
        let pipeline = pipelines.into_iter().next().ok_or_else(|| {
            RhiError::PipelineError("Driver returned no pipeline".to_string())
        })?;

        info!(
            "Graphics pipeline created (subpass {}, {} vertex attribute(s))",
            config.subpass,
            self.vertex_attributes.len()
        );

        Ok(Pipeline {
            device,
            pipeline,
            render_pass: self.render_pass,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(offset: u32, size: u32) -> vk::PushConstantRange {
        vk::PushConstantRange {
            stage_flags: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            offset,
            size,
        }
    }

    #[test]
    fn test_push_constant_ranges_within_budget() {
        assert!(validate_push_constant_ranges(&[], PUSH_CONSTANT_BUDGET).is_ok());
        assert!(validate_push_constant_ranges(&[range(0, 32)], PUSH_CONSTANT_BUDGET).is_ok());
        assert!(validate_push_constant_ranges(&[range(0, 128)], PUSH_CONSTANT_BUDGET).is_ok());
        assert!(
            validate_push_constant_ranges(&[range(0, 64), range(64, 64)], PUSH_CONSTANT_BUDGET)
                .is_ok()
        );
    }

    #[test]
    fn test_push_constant_ranges_over_budget() {
        let err = validate_push_constant_ranges(&[range(0, 132)], PUSH_CONSTANT_BUDGET).unwrap_err();
        assert!(matches!(
            err,
            RhiError::PushConstantBudget {
                offset: 0,
                size: 132,
                limit: 128
            }
        ));
        assert!(validate_push_constant_ranges(&[range(96, 64)], PUSH_CONSTANT_BUDGET).is_err());
        assert!(validate_push_constant_ranges(&[range(u32::MAX - 3, 8)], PUSH_CONSTANT_BUDGET).is_err());
    }

    #[test]
    fn test_push_constant_ranges_misaligned_or_empty() {
        assert!(validate_push_constant_ranges(&[range(0, 30)], PUSH_CONSTANT_BUDGET).is_err());
        assert!(validate_push_constant_ranges(&[range(2, 16)], PUSH_CONSTANT_BUDGET).is_err());
        assert!(validate_push_constant_ranges(&[range(0, 0)], PUSH_CONSTANT_BUDGET).is_err());
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.topology, vk::PrimitiveTopology::TRIANGLE_LIST);
        assert_eq!(config.polygon_mode, vk::PolygonMode::FILL);
        assert_eq!(config.cull_mode, vk::CullModeFlags::NONE);
        assert_eq!(config.samples, vk::SampleCountFlags::TYPE_1);
        assert!(config.depth_test_enable);
        assert!(config.depth_write_enable);
        assert_eq!(config.depth_compare_op, vk::CompareOp::LESS);
        assert_eq!(config.subpass, 0);
    }

    #[test]
    fn test_viewport_and_scissor_are_dynamic() {
        assert_eq!(
            PipelineConfig::DYNAMIC_STATES,
            [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR]
        );
    }

    #[test]
    fn test_opaque_blend_attachment() {
        let attachment = PipelineConfig::default().color_blend_attachment();
        assert_eq!(attachment.blend_enable, vk::FALSE);
        assert_eq!(attachment.color_write_mask, vk::ColorComponentFlags::RGBA);
    }
}
