//! Vulkan implementation of the backend seams.

use std::sync::Arc;

use ash::vk;
use tracing::info;

use swapframe_core::RendererConfig;
use swapframe_platform::{Surface, Window};
use swapframe_rhi::command::{CommandBuffer, CommandPool};
use swapframe_rhi::device::Device;
use swapframe_rhi::instance::Instance;
use swapframe_rhi::physical_device::select_physical_device;
use swapframe_rhi::pipeline::PipelineLayout;
use swapframe_rhi::swapchain::{AcquireStatus, PresentStatus, Swapchain};
use swapframe_rhi::{RhiError, RhiResult};

use crate::backend::{CommandRecorder, PresentTarget, RenderBackend};
use crate::error::RendererResult;
use crate::pipeline::{GraphicsPipeline, ShaderPaths};
use crate::push_constants::PushConstantBlock;

/// Instance, surface, device and the objects that outlive swap chains.
///
/// Fields drop in declaration order: pool and layout before the device,
/// the surface before the instance.
pub struct VulkanBackend {
    command_pool: CommandPool,
    layout: Arc<PipelineLayout>,
    device: Arc<Device>,
    surface: Surface,
    instance: Instance,
    shaders: ShaderPaths,
}

impl VulkanBackend {
    /// Brings up Vulkan for `window`.
    pub fn new(window: &Window, config: &RendererConfig) -> RendererResult<Self> {
        let extensions = window.required_extensions()?;
        let instance = Instance::new(config.enable_validation, &extensions)?;
        let surface = window.create_surface(instance.entry(), instance.handle())?;

        let physical_device =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;
        let device = Device::new(&instance, &physical_device)?;

        let graphics_family = device.queue_families().graphics_family.ok_or_else(|| {
            RhiError::InvalidHandle("Device has no graphics queue family".to_string())
        })?;
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;

        let layout = Arc::new(PipelineLayout::new(
            device.clone(),
            &[PushConstantBlock::range()],
        )?);

        info!(
            "Vulkan backend ready on '{}' (max push constants {} bytes, validation {})",
            physical_device.device_name(),
            device.max_push_constants_size(),
            if instance.has_validation() { "on" } else { "off" }
        );

        Ok(Self {
            command_pool,
            layout,
            device,
            surface,
            instance,
            shaders: ShaderPaths::from(config),
        })
    }

    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl RenderBackend for VulkanBackend {
    type SwapChain = Swapchain;
    type Pipeline = GraphicsPipeline;
    type Commands = CommandBuffer;

    fn create_swap_chain(
        &mut self,
        extent: vk::Extent2D,
        previous: Option<Swapchain>,
    ) -> RhiResult<Swapchain> {
        Swapchain::new(
            &self.instance,
            self.device.clone(),
            self.surface.handle(),
            extent,
            previous,
        )
    }

    fn create_pipeline(&mut self, render_pass: vk::RenderPass) -> RhiResult<GraphicsPipeline> {
        GraphicsPipeline::build(
            self.device.clone(),
            &self.shaders,
            self.layout.clone(),
            render_pass,
        )
    }

    fn allocate_command_buffers(&mut self, count: usize) -> RhiResult<Vec<CommandBuffer>> {
        self.command_pool.allocate_command_buffers(count)
    }

    fn free_command_buffers(&mut self, buffers: Vec<CommandBuffer>) {
        self.command_pool.free_command_buffers(buffers);
    }

    fn wait_idle(&self) -> RhiResult<()> {
        self.device.wait_idle()
    }
}

impl PresentTarget for Swapchain {
    fn extent(&self) -> vk::Extent2D {
        Swapchain::extent(self)
    }

    fn image_count(&self) -> usize {
        Swapchain::image_count(self)
    }

    fn render_pass(&self) -> vk::RenderPass {
        Swapchain::render_pass(self)
    }

    fn framebuffer(&self, image_index: u32) -> vk::Framebuffer {
        Swapchain::framebuffer(self, image_index as usize)
    }

    fn acquire_next_image(&mut self) -> RhiResult<AcquireStatus> {
        Swapchain::acquire_next_image(self)
    }

    fn submit(&mut self, image_index: u32, commands: vk::CommandBuffer) -> RhiResult<()> {
        Swapchain::submit(self, image_index, commands)
    }

    fn present(&mut self, image_index: u32) -> RhiResult<PresentStatus> {
        Swapchain::present(self, image_index)
    }
}

impl CommandRecorder for CommandBuffer {
    fn handle(&self) -> vk::CommandBuffer {
        CommandBuffer::handle(self)
    }

    fn begin(&self) -> RhiResult<()> {
        CommandBuffer::begin(self)
    }

    fn end(&self) -> RhiResult<()> {
        CommandBuffer::end(self)
    }

    fn begin_render_pass(
        &self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    ) {
        CommandBuffer::begin_render_pass(self, render_pass, framebuffer, extent, clear_values);
    }

    fn end_render_pass(&self) {
        CommandBuffer::end_render_pass(self);
    }

    fn set_viewport(&self, viewport: &vk::Viewport) {
        CommandBuffer::set_viewport(self, viewport);
    }

    fn set_scissor(&self, scissor: &vk::Rect2D) {
        CommandBuffer::set_scissor(self, scissor);
    }

    fn bind_pipeline(&self, pipeline: vk::Pipeline) {
        self.bind_graphics_pipeline(pipeline);
    }

    fn bind_vertex_buffers(&self, first_binding: u32, buffers: &[vk::Buffer], offsets: &[vk::DeviceSize]) {
        CommandBuffer::bind_vertex_buffers(self, first_binding, buffers, offsets);
    }

    fn push_constants(
        &self,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        self.push_constants_bytes(layout, stages, offset, data);
    }

    fn draw(&self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        CommandBuffer::draw(self, vertex_count, instance_count, first_vertex, first_instance);
    }
}
