//! Shared support code for swapframe.
//!
//! - Top-level error type and result alias
//! - Logging initialization
//! - Frame-rate accounting
//! - Application configuration

pub mod config;
mod error;
mod logging;
mod timer;

pub use config::{AppConfig, RendererConfig, WindowConfig};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use timer::{FrameStats, FrameTimer};
