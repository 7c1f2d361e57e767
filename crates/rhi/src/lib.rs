//! Vulkan layer (Render Hardware Interface).
//!
//! Safe wrappers over `ash` for everything the swap-chain render loop needs:
//! - Instance, physical device selection and logical device
//! - Swap chain with depth buffer, render pass, framebuffers and frame sync
//! - Command pool and command buffer recording
//! - Shader modules, pipeline layout and graphics pipeline builder
//! - Vertex buffers

mod error;

pub mod buffer;
pub mod command;
pub mod depth;
pub mod device;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

// Re-export ash types that users might need
pub use ash::vk;
