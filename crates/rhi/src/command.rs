//! Command pool and command buffer management.
//!
//! - [`CommandPool`] owns a `VkCommandPool` for the graphics family and
//!   allocates/frees primary command buffers
//! - [`CommandBuffer`] records render-pass based drawing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swapframe_rhi::device::Device;
//! use swapframe_rhi::command::CommandPool;
//!
//! # fn example(device: Arc<Device>, family: u32) -> Result<(), swapframe_rhi::RhiError> {
//! let pool = CommandPool::new(device, family)?;
//! let buffers = pool.allocate_command_buffers(3)?;
//! buffers[0].begin()?;
//! // ... record ...
//! buffers[0].end()?;
//! pool.free_command_buffers(buffers);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan command pool wrapper.
///
/// Created with `RESET_COMMAND_BUFFER` so each buffer is implicitly reset
/// when recording begins again.
pub struct CommandPool {
    device: Arc<Device>,
    pool: vk::CommandPool,
    queue_family_index: u32,
}

impl CommandPool {
    /// Creates a resettable command pool for `queue_family_index`.
    pub fn new(device: Arc<Device>, queue_family_index: u32) -> RhiResult<Self> {
        let create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family_index)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe {
            device
                .handle()
                .create_command_pool(&create_info, None)
                .map_err(RhiError::creating("command pool"))?
        };

        info!(
            "Command pool created for queue family {}",
            queue_family_index
        );

        Ok(Self {
            device,
            pool,
            queue_family_index,
        })
    }

    /// Allocates `count` primary command buffers.
    pub fn allocate_command_buffers(&self, count: usize) -> RhiResult<Vec<CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count as u32);

        let handles = unsafe {
            self.device
                .handle()
                .allocate_command_buffers(&alloc_info)
                .map_err(RhiError::creating("command buffers"))?
        };

        debug!("Allocated {} command buffer(s)", handles.len());

        Ok(handles
            .into_iter()
            .map(|buffer| CommandBuffer::from_handle(self.device.clone(), buffer))
            .collect())
    }

    /// Returns command buffers to the pool.
    ///
    /// None of them may be pending execution.
    pub fn free_command_buffers(&self, buffers: Vec<CommandBuffer>) {
        if buffers.is_empty() {
            return;
        }

        let handles: Vec<vk::CommandBuffer> = buffers.iter().map(CommandBuffer::handle).collect();
        unsafe {
            self.device
                .handle()
                .free_command_buffers(self.pool, &handles);
        }
        debug!("Freed {} command buffer(s)", handles.len());
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_command_pool(self.pool, None);
        }
        info!(
            "Command pool destroyed for queue family {}",
            self.queue_family_index
        );
    }
}

/// Primary command buffer.
///
/// Does not own the handle: it is released by
/// [`CommandPool::free_command_buffers`] or with the pool itself.
pub struct CommandBuffer {
    device: Arc<Device>,
    buffer: vk::CommandBuffer,
}

impl CommandBuffer {
    /// Wraps a handle allocated from a pool on `device`.
    #[inline]
    pub fn from_handle(device: Arc<Device>, buffer: vk::CommandBuffer) -> Self {
        Self { device, buffer }
    }

    #[inline]
    pub fn handle(&self) -> vk::CommandBuffer {
        self.buffer
    }

    // ===== Recording control =====

    /// Begins a one-time-submit recording, implicitly resetting the buffer.
    pub fn begin(&self) -> RhiResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

        unsafe {
            self.device
                .handle()
                .begin_command_buffer(self.buffer, &begin_info)?;
        }

        Ok(())
    }

    pub fn end(&self) -> RhiResult<()> {
        unsafe {
            self.device.handle().end_command_buffer(self.buffer)?;
        }

        Ok(())
    }

    // ===== Render pass =====

    /// Begins `render_pass` on `framebuffer`, covering the full `extent`.
    pub fn begin_render_pass(
        &self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    ) {
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(full_scissor(extent))
            .clear_values(clear_values);

        unsafe {
            self.device.handle().cmd_begin_render_pass(
                self.buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    pub fn end_render_pass(&self) {
        unsafe {
            self.device.handle().cmd_end_render_pass(self.buffer);
        }
    }

    // ===== Binding =====

    pub fn bind_graphics_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe {
            self.device.handle().cmd_bind_pipeline(
                self.buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline,
            );
        }
    }

    pub fn bind_vertex_buffers(
        &self,
        first_binding: u32,
        buffers: &[vk::Buffer],
        offsets: &[vk::DeviceSize],
    ) {
        unsafe {
            self.device.handle().cmd_bind_vertex_buffers(
                self.buffer,
                first_binding,
                buffers,
                offsets,
            );
        }
    }

    // ===== Dynamic state =====

    pub fn set_viewport(&self, viewport: &vk::Viewport) {
        unsafe {
            self.device
                .handle()
                .cmd_set_viewport(self.buffer, 0, std::slice::from_ref(viewport));
        }
    }

    pub fn set_scissor(&self, scissor: &vk::Rect2D) {
        unsafe {
            self.device
                .handle()
                .cmd_set_scissor(self.buffer, 0, std::slice::from_ref(scissor));
        }
    }

    // ===== Push constants =====

    pub fn push_constants_bytes(
        &self,
        layout: vk::PipelineLayout,
        stages: vk::ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) {
        unsafe {
            self.device
                .handle()
                .cmd_push_constants(self.buffer, layout, stages, offset, data);
        }
    }

    // ===== Drawing =====

    pub fn draw(
        &self,
        vertex_count: u32,
        instance_count: u32,
        first_vertex: u32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.handle().cmd_draw(
                self.buffer,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            );
        }
    }
}

/// Viewport covering the whole of `extent` with the standard depth range.
pub fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

/// Scissor rectangle covering the whole of `extent`.
pub fn full_scissor(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_viewport() {
        let viewport = full_viewport(vk::Extent2D {
            width: 640,
            height: 480,
        });
        assert_eq!(viewport.x, 0.0);
        assert_eq!(viewport.y, 0.0);
        assert_eq!(viewport.width, 640.0);
        assert_eq!(viewport.height, 480.0);
        assert_eq!(viewport.min_depth, 0.0);
        assert_eq!(viewport.max_depth, 1.0);
    }

    #[test]
    fn test_full_scissor() {
        let extent = vk::Extent2D {
            width: 800,
            height: 600,
        };
        let scissor = full_scissor(extent);
        assert_eq!(scissor.offset.x, 0);
        assert_eq!(scissor.offset.y, 0);
        assert_eq!(scissor.extent, extent);
    }

    #[test]
    fn test_command_buffer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CommandBuffer>();
        assert_send_sync::<CommandPool>();
    }
}
