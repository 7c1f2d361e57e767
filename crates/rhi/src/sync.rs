//! Synchronization primitives.
//!
//! - [`Semaphore`] orders work between queue operations on the GPU
//! - [`Fence`] lets the CPU wait for submitted GPU work
//! - [`FrameSync`] groups the three objects one frame-in-flight slot needs
//!
//! The swap chain keeps [`MAX_FRAMES_IN_FLIGHT`] slots and picks one with
//! [`frame_slot`]. A slot's fence bounds how far the CPU can run ahead of
//! the GPU; its semaphores order acquire → render → present on the GPU.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Vulkan semaphore wrapper, created unsignaled.
pub struct Semaphore {
    device: Arc<Device>,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates a new unsignaled binary semaphore.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe {
            device
                .handle()
                .create_semaphore(&create_info, None)
                .map_err(RhiError::creating("semaphore"))?
        };

        Ok(Self { device, semaphore })
    }

    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Vulkan fence wrapper.
///
/// Fences signal the host when a queue submission completes. Waiting and
/// resetting are only valid while no pending submission references the
/// fence in a way that conflicts with the call.
pub struct Fence {
    device: Arc<Device>,
    fence: vk::Fence,
}

impl Fence {
    /// Creates a new fence.
    ///
    /// With `signaled` set, the first wait returns immediately, which is what
    /// a frame slot needs before any work has ever been submitted on it.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe {
            device
                .handle()
                .create_fence(&create_info, None)
                .map_err(RhiError::creating("fence"))?
        };

        Ok(Self { device, fence })
    }

    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Blocks until the fence is signaled or `timeout` nanoseconds pass.
    pub fn wait(&self, timeout: u64) -> RhiResult<()> {
        wait_for_fence(&self.device, self.fence, timeout)
    }

    /// Returns the fence to the unsignaled state.
    pub fn reset(&self) -> RhiResult<()> {
        unsafe { self.device.handle().reset_fences(&[self.fence])? };
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
    }
}

/// Waits on a raw fence handle owned elsewhere.
///
/// Used for the per-image in-flight tracker, which only borrows the handle
/// of a frame slot's fence.
pub fn wait_for_fence(device: &Device, fence: vk::Fence, timeout: u64) -> RhiResult<()> {
    unsafe { device.handle().wait_for_fences(&[fence], true, timeout)? };
    Ok(())
}

/// Maximum number of frames the CPU may record ahead of the GPU.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Frame-in-flight slot used for the given frame counter.
#[inline]
pub fn frame_slot(frame_counter: u64) -> usize {
    (frame_counter % MAX_FRAMES_IN_FLIGHT as u64) as usize
}

/// Synchronization objects for one frame-in-flight slot.
///
/// ```text
/// wait in_flight_fence
/// acquire            -> signals image_available
/// reset in_flight_fence, submit
///   waits image_available, signals render_finished + in_flight_fence
/// present            -> waits render_finished
/// ```
pub struct FrameSync {
    image_available_semaphore: Semaphore,
    render_finished_semaphore: Semaphore,
    in_flight_fence: Fence,
}

impl FrameSync {
    /// Creates a slot whose fence starts signaled.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let fence = Fence::new(device.clone(), true)?;
        Self::with_fence(device, fence)
    }

    /// Creates a slot around a fence taken over from a previous swap chain.
    ///
    /// Semaphores are always created fresh: after a failed or out-of-date
    /// present their pending state is unknown, while a fence is known to be
    /// signaled once the device has gone idle.
    pub fn with_fence(device: Arc<Device>, in_flight_fence: Fence) -> RhiResult<Self> {
        let image_available_semaphore = Semaphore::new(device.clone())?;
        let render_finished_semaphore = Semaphore::new(device)?;

        debug!("Created frame sync slot");

        Ok(Self {
            image_available_semaphore,
            render_finished_semaphore,
            in_flight_fence,
        })
    }

    /// Releases the semaphores and hands back the fence.
    pub fn into_fence(self) -> Fence {
        self.in_flight_fence
    }

    #[inline]
    pub fn image_available_semaphore(&self) -> &Semaphore {
        &self.image_available_semaphore
    }

    #[inline]
    pub fn render_finished_semaphore(&self) -> &Semaphore {
        &self.render_finished_semaphore
    }

    #[inline]
    pub fn in_flight_fence(&self) -> &Fence {
        &self.in_flight_fence
    }
}
