//! Swap-chain lifecycle and per-frame render loop.
//!
//! - [`FrameOrchestrator`] drives acquire, record, submit and present, and
//!   rebuilds the swap chain, pipeline and command buffers when the surface
//!   goes out of date or the window is resized
//! - [`RenderBackend`] and friends are the seams it drives;
//!   [`VulkanBackend`] implements them on top of `swapframe_rhi`
//! - [`GraphicsPipeline`] is built from two SPIR-V files and fed per-draw
//!   [`PushConstantBlock`]s

pub mod backend;
mod error;
pub mod model;
pub mod orchestrator;
pub mod pipeline;
pub mod push_constants;
mod vulkan;
pub mod window;

pub use backend::{BoundPipeline, CommandRecorder, PresentTarget, RenderBackend};
pub use error::{RendererError, RendererResult};
pub use model::{Model, VertexModel};
pub use orchestrator::{FrameOrchestrator, FrameOutcome};
pub use pipeline::{GraphicsPipeline, ShaderPaths};
pub use push_constants::PushConstantBlock;
pub use vulkan::VulkanBackend;
pub use window::WindowSurface;
