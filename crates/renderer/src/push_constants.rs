//! Per-draw push-constant data.

use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use swapframe_rhi::pipeline::PUSH_CONSTANT_BUDGET;

/// Frames in one horizontal sweep of the animation.
pub const ANIMATION_PERIOD: u32 = 1000;

/// Horizontal distance moved per frame.
const ANIMATION_STEP: f32 = 0.002;

/// Vertical distance between instances.
const INSTANCE_SPACING: f32 = 0.25;

/// Push-constant block shared by the vertex and fragment stages.
///
/// Matches this GLSL declaration:
///
/// ```glsl
/// layout(push_constant) uniform Push {
///     vec2 offset;
///     vec3 color;
/// } push;
/// ```
///
/// `color` is a `vec3`, which is 16-byte aligned, so it lives at offset 16.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PushConstantBlock {
    pub offset: Vec2,
    _pad0: [f32; 2],
    pub color: Vec3,
    _pad1: f32,
}

const _: () = assert!(std::mem::size_of::<PushConstantBlock>() <= PUSH_CONSTANT_BUDGET as usize);
const _: () = assert!(std::mem::offset_of!(PushConstantBlock, color) == 16);

impl PushConstantBlock {
    pub const SIZE: u32 = std::mem::size_of::<Self>() as u32;

    pub fn new(offset: Vec2, color: Vec3) -> Self {
        Self {
            offset,
            _pad0: [0.0; 2],
            color,
            _pad1: 0.0,
        }
    }

    /// Stages that read the block.
    pub fn stages() -> vk::ShaderStageFlags {
        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT
    }

    /// The one range the pipeline layout declares.
    pub fn range() -> vk::PushConstantRange {
        vk::PushConstantRange {
            stage_flags: Self::stages(),
            offset: 0,
            size: Self::SIZE,
        }
    }

    /// Payload for draw `instance` of animation frame `frame`.
    ///
    /// Instances are stacked vertically and drift right as `frame`
    /// advances; their blue channel brightens with the instance index.
    pub fn for_instance(frame: u32, instance: u32) -> Self {
        let frame = (frame % ANIMATION_PERIOD) as f32;
        let instance = instance as f32;

        Self::new(
            Vec2::new(
                -0.5 + frame * ANIMATION_STEP,
                -0.4 + instance * INSTANCE_SPACING,
            ),
            Vec3::new(0.0, 0.0, 0.2 + 0.2 * instance),
        )
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
