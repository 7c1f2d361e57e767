//! Host-visible vertex buffers.
//!
//! Memory comes from gpu-allocator in `CpuToGpu` so the data can be written
//! through the persistent mapping without a staging copy.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swapframe_rhi::device::Device;
//! use swapframe_rhi::buffer::VertexBuffer;
//!
//! # fn example(device: Arc<Device>) -> Result<(), swapframe_rhi::RhiError> {
//! let positions: [[f32; 2]; 3] = [[0.0, -0.5], [0.5, 0.5], [-0.5, 0.5]];
//! let buffer = VertexBuffer::new(device, &positions)?;
//! assert_eq!(buffer.vertex_count(), 3);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, error};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Fewest vertices a triangle-list draw can use.
pub const MIN_VERTEX_COUNT: usize = 3;

/// Vertex buffer filled once at creation.
pub struct VertexBuffer {
    device: Arc<Device>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: vk::DeviceSize,
    vertex_count: u32,
}

impl VertexBuffer {
    /// Creates a buffer holding `vertices`.
    ///
    /// # Errors
    ///
    /// [`RhiError::InvalidHandle`] for fewer than [`MIN_VERTEX_COUNT`]
    /// vertices; creation or allocation errors otherwise.
    pub fn new<T: bytemuck::Pod>(device: Arc<Device>, vertices: &[T]) -> RhiResult<Self> {
        if vertices.len() < MIN_VERTEX_COUNT {
            return Err(RhiError::InvalidHandle(format!(
                "Vertex count must be at least {}, got {}",
                MIN_VERTEX_COUNT,
                vertices.len()
            )));
        }

        let data: &[u8] = bytemuck::cast_slice(vertices);
        let size = data.len() as vk::DeviceSize;

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(vk::BufferUsageFlags::VERTEX_BUFFER)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            device
                .handle()
                .create_buffer(&buffer_info, None)
                .map_err(RhiError::creating("vertex buffer"))?
        };

        let mut vertex_buffer = Self {
            device,
            buffer,
            allocation: None,
            size,
            vertex_count: vertices.len() as u32,
        };

        let requirements = unsafe {
            vertex_buffer
                .device
                .handle()
                .get_buffer_memory_requirements(buffer)
        };

        let allocation = vertex_buffer.device.allocator()?.allocate(&AllocationCreateDesc {
            name: "vertex_buffer",
            requirements,
            location: MemoryLocation::CpuToGpu,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;

        let (memory, offset) = unsafe { (allocation.memory(), allocation.offset()) };
        vertex_buffer.allocation = Some(allocation);

        unsafe {
            vertex_buffer
                .device
                .handle()
                .bind_buffer_memory(buffer, memory, offset)?;
        }

        vertex_buffer.write(data)?;

        debug!(
            "Created vertex buffer: {} vertices, {} bytes",
            vertex_buffer.vertex_count, size
        );

        Ok(vertex_buffer)
    }

    fn write(&self, data: &[u8]) -> RhiResult<()> {
        if data.len() as vk::DeviceSize > self.size {
            return Err(RhiError::InvalidHandle(format!(
                "Write of {} bytes exceeds buffer size {}",
                data.len(),
                self.size
            )));
        }

        let mapped_ptr = self
            .allocation
            .as_ref()
            .and_then(Allocation::mapped_ptr)
            .ok_or_else(|| RhiError::InvalidHandle("Buffer memory is not mapped".to_string()))?;

        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                mapped_ptr.as_ptr() as *mut u8,
                data.len(),
            );
        }

        Ok(())
    }

    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }
}

impl Drop for VertexBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }

        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        error!("Failed to free vertex buffer allocation: {:?}", e);
                    }
                }
                Err(e) => error!("Leaking vertex buffer allocation: {}", e),
            }
        }

        debug!("Destroyed vertex buffer ({} vertices)", self.vertex_count);
    }
}
