//! Graphics pipeline built from two SPIR-V files.

use std::path::PathBuf;
use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use swapframe_core::RendererConfig;
use swapframe_rhi::RhiResult;
use swapframe_rhi::device::Device;
use swapframe_rhi::pipeline::{GraphicsPipelineBuilder, Pipeline, PipelineConfig, PipelineLayout};
use swapframe_rhi::shader::{ShaderModule, ShaderStage, read_spirv};
use swapframe_rhi::vertex::Vertex;

use crate::backend::{BoundPipeline, CommandRecorder};

/// Locations of the compiled vertex and fragment shaders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl From<&RendererConfig> for ShaderPaths {
    fn from(config: &RendererConfig) -> Self {
        Self {
            vertex: config.vertex_shader.clone(),
            fragment: config.fragment_shader.clone(),
        }
    }
}

/// Pipeline drawing [`Vertex`] triangle lists into one render pass.
///
/// The layout is shared across rebuilds; only the pipeline object is
/// replaced when the swap chain changes.
pub struct GraphicsPipeline {
    pipeline: Pipeline,
    layout: Arc<PipelineLayout>,
}

impl GraphicsPipeline {
    /// Reads both shaders and builds a pipeline bound to `render_pass`.
    ///
    /// The shader modules only live for the duration of this call.
    ///
    /// # Errors
    ///
    /// `ShaderError` if either file cannot be read or is not SPIR-V,
    /// `ResourceCreation` if the driver rejects a module or the pipeline.
    pub fn build(
        device: Arc<Device>,
        shaders: &ShaderPaths,
        layout: Arc<PipelineLayout>,
        render_pass: vk::RenderPass,
    ) -> RhiResult<Self> {
        let vert_code = read_spirv(&shaders.vertex)?;
        let frag_code = read_spirv(&shaders.fragment)?;

        debug!("Vertex shader code size: {}", vert_code.len());
        debug!("Fragment shader code size: {}", frag_code.len());

        let vert = ShaderModule::from_bytes(device.clone(), &vert_code, ShaderStage::Vertex)?;
        let frag = ShaderModule::from_bytes(device.clone(), &frag_code, ShaderStage::Fragment)?;

        let pipeline = GraphicsPipelineBuilder::new(render_pass)
            .vertex_shader(&vert)
            .fragment_shader(&frag)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&Vertex::attribute_descriptions())
            .config(PipelineConfig::default())
            .subpass(0)
            .build(device, &layout)?;

        info!("Graphics pipeline built for render pass {:?}", render_pass);

        Ok(Self { pipeline, layout })
    }
}

impl BoundPipeline for GraphicsPipeline {
    fn render_pass(&self) -> vk::RenderPass {
        self.pipeline.render_pass()
    }

    fn layout(&self) -> vk::PipelineLayout {
        self.layout.handle()
    }

    fn bind<C: CommandRecorder>(&self, commands: &C) {
        commands.bind_pipeline(self.pipeline.handle());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_paths_from_config() {
        let config = RendererConfig::default();
        let paths = ShaderPaths::from(&config);
        assert_eq!(paths.vertex, PathBuf::from("shaders/simple_shader.vert.spv"));
        assert_eq!(paths.fragment, PathBuf::from("shaders/simple_shader.frag.spv"));
    }
}
