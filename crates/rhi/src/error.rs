//! RHI error types.

use ash::vk;
use thiserror::Error;

/// Errors raised by the Vulkan layer.
///
/// Everything here is fatal to the render loop. Recoverable surface
/// conditions (out-of-date, suboptimal) are reported through
/// [`AcquireStatus`](crate::swapchain::AcquireStatus) and
/// [`PresentStatus`](crate::swapchain::PresentStatus) instead.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] vk::Result),

    /// A named GPU object could not be created
    #[error("Failed to create {resource}: {result}")]
    ResourceCreation {
        resource: &'static str,
        #[source]
        result: vk::Result,
    },

    /// Acquire, submit or present returned a status outside the handled set
    #[error("Unexpected surface status: {0}")]
    UnexpectedStatus(vk::Result),

    /// Failed to load Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader bytecode could not be read or is malformed
    #[error("Shader error: {0}")]
    ShaderError(String),

    #[error("Surface error: {0}")]
    SurfaceError(String),

    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Push-constant ranges exceed the guaranteed budget
    #[error("Push constant range {offset}+{size} exceeds the {limit}-byte budget")]
    PushConstantBudget { offset: u32, size: u32, limit: u32 },

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RhiError {
    /// Builds a closure tagging a raw [`vk::Result`] with the resource name.
    ///
    /// ```
    /// use swapframe_rhi::{RhiError, vk};
    ///
    /// let err = Err::<(), _>(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
    ///     .map_err(RhiError::creating("render pass"))
    ///     .unwrap_err();
    /// assert_eq!(
    ///     err.to_string(),
    ///     format!("Failed to create render pass: {}", vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)
    /// );
    /// ```
    pub fn creating(resource: &'static str) -> impl FnOnce(vk::Result) -> Self {
        move |result| Self::ResourceCreation { resource, result }
    }
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
