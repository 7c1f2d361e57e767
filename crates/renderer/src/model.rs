//! Vertex data providers.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use swapframe_rhi::RhiResult;
use swapframe_rhi::buffer::VertexBuffer;
use swapframe_rhi::device::Device;
use swapframe_rhi::vertex::Vertex;

use crate::backend::CommandRecorder;

/// Geometry the frame loop draws once per instance.
pub trait Model {
    /// Binds the vertex data.
    fn bind<C: CommandRecorder>(&self, commands: &C);
    /// Issues one draw of every vertex.
    fn draw<C: CommandRecorder>(&self, commands: &C);
}

/// Model backed by a single host-visible vertex buffer.
pub struct VertexModel {
    buffer: VertexBuffer,
}

impl VertexModel {
    pub fn new(device: Arc<Device>, vertices: &[Vertex]) -> RhiResult<Self> {
        Ok(Self {
            buffer: VertexBuffer::new(device, vertices)?,
        })
    }

    /// Small red/green/blue triangle centered on the origin.
    pub fn triangle(device: Arc<Device>) -> RhiResult<Self> {
        Self::new(device, &triangle_vertices())
    }
}

impl Model for VertexModel {
    fn bind<C: CommandRecorder>(&self, commands: &C) {
        commands.bind_vertex_buffers(0, &[self.buffer.handle()], &[0]);
    }

    fn draw<C: CommandRecorder>(&self, commands: &C) {
        commands.draw(self.buffer.vertex_count(), 1, 0, 0);
    }
}

/// Vertices of the default triangle, clockwise in clip space.
pub fn triangle_vertices() -> [Vertex; 3] {
    [
        Vertex::new(Vec2::new(0.0, -0.5), Vec3::new(1.0, 0.0, 0.0)),
        Vertex::new(Vec2::new(0.5, 0.5), Vec3::new(0.0, 1.0, 0.0)),
        Vertex::new(Vec2::new(-0.5, 0.5), Vec3::new(0.0, 0.0, 1.0)),
    ]
}
