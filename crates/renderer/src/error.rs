//! Renderer error type.

use thiserror::Error;

/// Errors raised while setting up the renderer.
///
/// The frame loop itself only fails with [`RhiError`](swapframe_rhi::RhiError).
#[derive(Error, Debug)]
pub enum RendererError {
    #[error(transparent)]
    Rhi(#[from] swapframe_rhi::RhiError),

    /// Window or surface setup failed
    #[error(transparent)]
    Platform(#[from] swapframe_core::Error),
}

pub type RendererResult<T> = std::result::Result<T, RendererError>;
