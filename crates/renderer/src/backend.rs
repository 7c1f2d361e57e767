//! Seams between the frame loop and the GPU.
//!
//! [`FrameOrchestrator`](crate::FrameOrchestrator) only talks to these
//! traits. [`VulkanBackend`](crate::VulkanBackend) implements them over the
//! `swapframe_rhi` wrappers; tests substitute recording fakes.

use ash::vk;
use swapframe_rhi::RhiResult;
use swapframe_rhi::swapchain::{AcquireStatus, PresentStatus};

/// Creates and replaces the per-generation GPU objects.
pub trait RenderBackend {
    type SwapChain: PresentTarget;
    type Pipeline: BoundPipeline;
    type Commands: CommandRecorder;

    /// Builds a swap chain for `extent`, chained from `previous` when given.
    ///
    /// `previous` is consumed and released once the new chain is complete.
    fn create_swap_chain(
        &mut self,
        extent: vk::Extent2D,
        previous: Option<Self::SwapChain>,
    ) -> RhiResult<Self::SwapChain>;

    /// Builds the graphics pipeline against `render_pass`.
    fn create_pipeline(&mut self, render_pass: vk::RenderPass) -> RhiResult<Self::Pipeline>;

    fn allocate_command_buffers(&mut self, count: usize) -> RhiResult<Vec<Self::Commands>>;

    /// Returns buffers to the pool. None of them may be pending.
    fn free_command_buffers(&mut self, buffers: Vec<Self::Commands>);

    /// Blocks until the device has finished all submitted work.
    fn wait_idle(&self) -> RhiResult<()>;
}

/// A swap chain as seen by the frame loop.
pub trait PresentTarget {
    fn extent(&self) -> vk::Extent2D;
    fn image_count(&self) -> usize;
    fn render_pass(&self) -> vk::RenderPass;
    fn framebuffer(&self, image_index: u32) -> vk::Framebuffer;

    fn acquire_next_image(&mut self) -> RhiResult<AcquireStatus>;
    fn submit(&mut self, image_index: u32, commands: vk::CommandBuffer) -> RhiResult<()>;
    fn present(&mut self, image_index: u32) -> RhiResult<PresentStatus>;
}

/// A pipeline bound to one render pass.
pub trait BoundPipeline {
    /// Render pass the pipeline was built against.
    fn render_pass(&self) -> vk::RenderPass;
    fn layout(&self) -> vk::PipelineLayout;
    fn bind<C: CommandRecorder>(&self, commands: &C);
}

/// Command recording used by the frame loop, the pipeline and models.
pub trait CommandRecorder {
    fn handle(&self) -> vk::CommandBuffer;

    fn begin(&self) -> RhiResult<()>;
    fn end(&self) -> RhiResult<()>;

    fn begin_render_pass(
        &self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    );
    fn end_render_pass(&self);

    fn set_viewport(&self, viewport: &vk::Viewport);
    fn set_scissor(&self, scissor: &vk::Rect2D);

    fn bind_pipeline(&self, pipeline: vk::Pipeline);
    fn bind_vertex_buffers(&self, first_binding: u32, buffers: &[vk::Buffer], offsets: &[vk::DeviceSize]);

    fn push_constants(
        &self,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    );

    fn draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
}
