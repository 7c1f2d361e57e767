//! Platform layer for swapframe.
//!
//! - Window creation and a pull-style event pump via winit
//! - Resize, minimize and close tracking
//! - Vulkan surface creation through raw window handles

mod window;

pub use window::{Surface, Window};
