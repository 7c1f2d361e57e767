//! Swap chain management.
//!
//! A [`Swapchain`] owns everything needed to render into presentable images:
//! the `VkSwapchainKHR` with its image views, one shared depth buffer, the
//! render pass, one framebuffer per image, [`MAX_FRAMES_IN_FLIGHT`] sync
//! slots and a per-image in-flight fence tracker.
//!
//! Replacing a swap chain is an ownership transfer: [`Swapchain::new`] takes
//! the previous instance by value, retires its handle through
//! `old_swapchain`, takes over its slot fences and frame counter, and only
//! drops it once the new chain is fully built.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swapframe_rhi::device::Device;
//! use swapframe_rhi::instance::Instance;
//! use swapframe_rhi::swapchain::{AcquireStatus, Swapchain};
//! use swapframe_rhi::vk;
//!
//! # fn example(
//! #     instance: &Instance,
//! #     device: Arc<Device>,
//! #     surface: vk::SurfaceKHR,
//! #     commands: vk::CommandBuffer,
//! # ) -> Result<(), swapframe_rhi::RhiError> {
//! let extent = vk::Extent2D { width: 800, height: 600 };
//! let mut swapchain = Swapchain::new(instance, device.clone(), surface, extent, None)?;
//!
//! if let AcquireStatus::Ready(index) = swapchain.acquire_next_image()? {
//!     // ... record `commands` against swapchain.framebuffer(index) ...
//!     swapchain.submit(index, commands)?;
//!     let _status = swapchain.present(index)?;
//! }
//!
//! // After a resize: drain the GPU, then chain from the old instance.
//! device.wait_idle()?;
//! let resized = vk::Extent2D { width: 640, height: 480 };
//! let swapchain = Swapchain::new(instance, device, surface, resized, Some(swapchain))?;
//! # drop(swapchain);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, error, info, warn};

use crate::depth::{DepthBuffer, find_depth_format};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;
use crate::render_pass::{Framebuffer, RenderPass};
use crate::sync::{FrameSync, MAX_FRAMES_IN_FLIGHT, frame_slot, wait_for_fence};

/// Outcome of [`Swapchain::acquire_next_image`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquireStatus {
    /// Image acquired and matching the surface.
    Ready(u32),
    /// Image acquired and usable, but the surface no longer matches exactly.
    Suboptimal(u32),
    /// No image was acquired; the swap chain must be recreated.
    OutOfDate,
}

impl AcquireStatus {
    /// Index of the acquired image, if any.
    pub fn image_index(self) -> Option<u32> {
        match self {
            AcquireStatus::Ready(index) | AcquireStatus::Suboptimal(index) => Some(index),
            AcquireStatus::OutOfDate => None,
        }
    }
}

/// Outcome of [`Swapchain::present`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentStatus {
    Optimal,
    Suboptimal,
    OutOfDate,
}

impl PresentStatus {
    /// The swap chain should be rebuilt before the next frame.
    #[inline]
    pub fn needs_recreation(self) -> bool {
        !matches!(self, PresentStatus::Optimal)
    }
}

/// Maps the raw result of `vkAcquireNextImageKHR`.
///
/// Anything other than success, suboptimal or out-of-date is fatal.
pub fn classify_acquire(result: Result<(u32, bool), vk::Result>) -> RhiResult<AcquireStatus> {
    match result {
        Ok((index, false)) => Ok(AcquireStatus::Ready(index)),
        Ok((index, true)) => Ok(AcquireStatus::Suboptimal(index)),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireStatus::OutOfDate),
        Err(other) => Err(RhiError::UnexpectedStatus(other)),
    }
}

/// Maps the raw result of `vkQueuePresentKHR`.
pub fn classify_present(result: Result<bool, vk::Result>) -> RhiResult<PresentStatus> {
    match result {
        Ok(false) => Ok(PresentStatus::Optimal),
        Ok(true) => Ok(PresentStatus::Suboptimal),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentStatus::OutOfDate),
        Err(other) => Err(RhiError::UnexpectedStatus(other)),
    }
}

/// Swapchain surface support details.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    /// Surface capabilities (min/max image count, extents, transforms, etc.)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// Queries swapchain support details for a physical device and surface.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Swapchain support: {} formats, {} present modes, image count: {}-{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            max_image_count_label(&capabilities)
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// At least one format and one present mode are available.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// `VkSwapchainKHR` plus the views of its images.
///
/// Views are destroyed before the swap chain that owns the images.
struct PresentableImages {
    device: Arc<Device>,
    loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
}

impl PresentableImages {
    fn create_views(&mut self, format: vk::Format) -> RhiResult<()> {
        for &image in &self.images {
            let create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(
                    vk::ImageSubresourceRange::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .base_mip_level(0)
                        .level_count(1)
                        .base_array_layer(0)
                        .layer_count(1),
                );

            let view = unsafe {
                self.device
                    .handle()
                    .create_image_view(&create_info, None)
                    .map_err(RhiError::creating("swap chain image view"))?
            };
            self.views.push(view);
        }

        debug!("Created {} image views", self.views.len());
        Ok(())
    }
}

impl Drop for PresentableImages {
    fn drop(&mut self) {
        for &view in &self.views {
            unsafe {
                self.device.handle().destroy_image_view(view, None);
            }
        }
        unsafe {
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Vulkan swap chain with its render targets and frame synchronization.
///
/// Not thread-safe; one thread drives acquire, submit and present.
pub struct Swapchain {
    // Field order is drop order, the reverse of creation in `new`: sync,
    // framebuffers, depth, render pass, views, swap chain.
    frame_sync: Vec<FrameSync>,
    framebuffers: Vec<Framebuffer>,
    depth: DepthBuffer,
    render_pass: RenderPass,
    images: PresentableImages,

    device: Arc<Device>,
    /// Fence of the slot that last submitted work for each image; null if none.
    images_in_flight: Vec<vk::Fence>,
    extent: vk::Extent2D,
    frame_counter: u64,
}

impl Swapchain {
    /// Creates a swap chain for `surface` sized to `window_extent`.
    ///
    /// `window_extent` must be non-zero; callers wait out minimization
    /// before getting here. When `previous` is given its handle is passed
    /// as `old_swapchain`, its slot fences and frame counter carry over,
    /// and it is destroyed after the new chain is complete. The device
    /// must be idle in that case.
    ///
    /// # Errors
    ///
    /// [`RhiError::ResourceCreation`] if any object cannot be created;
    /// [`RhiError::SwapchainError`] if the surface offers no usable format.
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        window_extent: vk::Extent2D,
        mut previous: Option<Swapchain>,
    ) -> RhiResult<Self> {
        ensure_drawable(window_extent, "window")?;

        let loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let surface_loader = instance.surface_loader();

        let support =
            SwapchainSupportDetails::query(device.physical_device(), surface, &surface_loader)?;

        if !support.is_adequate() {
            return Err(RhiError::SwapchainError(
                "Inadequate swapchain support (no formats or present modes)".to_string(),
            ));
        }

        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes);
        // The surface may already report 0x0 while the window size is stale.
        let extent = choose_extent(&support.capabilities, window_extent);
        ensure_drawable(extent, "surface")?;
        let image_count = determine_image_count(&support.capabilities);

        info!(
            "Creating swapchain: {}x{}, format {:?}, color space {:?}, present mode {:?}, {} images requested",
            extent.width,
            extent.height,
            surface_format.format,
            surface_format.color_space,
            present_mode,
            image_count
        );

        let queue_families = device.queue_families();
        let (Some(graphics_family), Some(present_family)) =
            (queue_families.graphics_family, queue_families.present_family)
        else {
            return Err(RhiError::SwapchainError(
                "Device has no graphics/present queue pair".to_string(),
            ));
        };
        let queue_family_indices = [graphics_family, present_family];

        let (sharing_mode, queue_family_indices_slice) = if graphics_family != present_family {
            debug!(
                "Using CONCURRENT sharing mode between graphics ({}) and present ({}) queues",
                graphics_family, present_family
            );
            (vk::SharingMode::CONCURRENT, queue_family_indices.as_slice())
        } else {
            (vk::SharingMode::EXCLUSIVE, &[][..])
        };

        let old_swapchain = previous
            .as_ref()
            .map_or(vk::SwapchainKHR::null(), |old| old.images.swapchain);

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(queue_family_indices_slice)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe {
            loader
                .create_swapchain(&create_info, None)
                .map_err(RhiError::creating("swap chain"))?
        };

        let mut images = PresentableImages {
            device: device.clone(),
            loader,
            swapchain,
            images: Vec::new(),
            views: Vec::new(),
        };
        images.images = unsafe { images.loader.get_swapchain_images(swapchain)? };
        images.create_views(surface_format.format)?;

        let depth_format = find_depth_format(instance.handle(), device.physical_device())?;
        let render_pass = RenderPass::new(device.clone(), surface_format.format, depth_format)?;
        let depth = DepthBuffer::new(device.clone(), extent, depth_format)?;

        let framebuffers = images
            .views
            .iter()
            .map(|&view| {
                Framebuffer::new(
                    device.clone(),
                    &render_pass,
                    &[view, depth.image_view()],
                    extent,
                )
            })
            .collect::<RhiResult<Vec<_>>>()?;

        // Slot fences are signaled once the device is idle, so they can be
        // reused as-is. Semaphores are rebuilt.
        let (mut carried_fences, frame_counter) = match previous.as_mut() {
            Some(old) => (
                std::mem::take(&mut old.frame_sync)
                    .into_iter()
                    .map(FrameSync::into_fence)
                    .collect::<Vec<_>>(),
                old.frame_counter,
            ),
            None => (Vec::new(), 0),
        };
        carried_fences.truncate(MAX_FRAMES_IN_FLIGHT);

        let mut frame_sync = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
        let mut carried_fences = carried_fences.into_iter();
        for _ in 0..MAX_FRAMES_IN_FLIGHT {
            let slot = match carried_fences.next() {
                Some(fence) => FrameSync::with_fence(device.clone(), fence)?,
                None => FrameSync::new(device.clone())?,
            };
            frame_sync.push(slot);
        }

        let images_in_flight = vec![vk::Fence::null(); images.images.len()];

        info!(
            "Swapchain created with {} images{}",
            images.images.len(),
            if previous.is_some() {
                " (chained from previous)"
            } else {
                ""
            }
        );

        let swapchain = Self {
            frame_sync,
            framebuffers,
            depth,
            render_pass,
            images,
            device,
            images_in_flight,
            extent,
            frame_counter,
        };

        // The new chain is complete; only now release the old one.
        drop(previous);

        Ok(swapchain)
    }

    /// Waits for the current slot, then acquires the next image.
    ///
    /// The slot's image-available semaphore is signaled when the image is
    /// ready. For an acquired image this also waits until the GPU is done
    /// with the previous frame that used it, so its command buffer may be
    /// re-recorded. On [`AcquireStatus::OutOfDate`] nothing was acquired.
    pub fn acquire_next_image(&mut self) -> RhiResult<AcquireStatus> {
        let sync = &self.frame_sync[self.current_slot()];
        sync.in_flight_fence().wait(u64::MAX)?;

        let result = unsafe {
            self.images.loader.acquire_next_image(
                self.images.swapchain,
                u64::MAX,
                sync.image_available_semaphore().handle(),
                vk::Fence::null(),
            )
        };

        let status = classify_acquire(result)?;
        if let Some(index) = status.image_index() {
            self.wait_image_in_flight(index)?;
        }

        Ok(status)
    }

    /// Submits `command_buffer` rendering into image `image_index`.
    ///
    /// Waits for image-available at color attachment output, signals the
    /// slot's render-finished semaphore and fence.
    pub fn submit(&mut self, image_index: u32, command_buffer: vk::CommandBuffer) -> RhiResult<()> {
        self.check_image_index(image_index)?;
        self.wait_image_in_flight(image_index)?;

        let sync = &self.frame_sync[self.current_slot()];
        let fence = sync.in_flight_fence();
        self.images_in_flight[image_index as usize] = fence.handle();

        let wait_semaphores = [sync.image_available_semaphore().handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [sync.render_finished_semaphore().handle()];
        let command_buffers = [command_buffer];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        fence.reset()?;
        unsafe {
            self.device
                .submit_graphics(std::slice::from_ref(&submit_info), fence.handle())
                .map_err(|e| match e {
                    RhiError::VulkanError(result) => RhiError::UnexpectedStatus(result),
                    other => other,
                })?;
        }

        Ok(())
    }

    /// Presents `image_index` once rendering has finished and advances the
    /// frame counter.
    pub fn present(&mut self, image_index: u32) -> RhiResult<PresentStatus> {
        self.check_image_index(image_index)?;

        let wait_semaphores = [self.frame_sync[self.current_slot()]
            .render_finished_semaphore()
            .handle()];
        let swapchains = [self.images.swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe {
            self.images
                .loader
                .queue_present(self.device.present_queue(), &present_info)
        };
        self.frame_counter = self.frame_counter.wrapping_add(1);

        classify_present(result)
    }

    fn current_slot(&self) -> usize {
        frame_slot(self.frame_counter)
    }

    fn check_image_index(&self, image_index: u32) -> RhiResult<()> {
        if (image_index as usize) < self.images_in_flight.len() {
            Ok(())
        } else {
            Err(RhiError::InvalidHandle(format!(
                "Image index {} out of range ({} images)",
                image_index,
                self.images_in_flight.len()
            )))
        }
    }

    fn wait_image_in_flight(&self, image_index: u32) -> RhiResult<()> {
        let fence = self.images_in_flight[image_index as usize];
        if fence != vk::Fence::null() {
            wait_for_fence(&self.device, fence, u64::MAX)?;
        }
        Ok(())
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    #[inline]
    pub fn image_count(&self) -> usize {
        self.images.images.len()
    }

    #[inline]
    pub fn render_pass(&self) -> vk::RenderPass {
        self.render_pass.handle()
    }

    /// Framebuffer for image `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    pub fn framebuffer(&self, index: usize) -> vk::Framebuffer {
        self.framebuffers[index].handle()
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle before destroying swapchain: {}", e);
        }

        info!(
            "Swapchain destroyed (was {}x{}, {} images)",
            self.extent.width,
            self.extent.height,
            self.images.images.len()
        );
    }
}

/// Chooses the best surface format from the available formats.
///
/// Prefers B8G8R8A8_SRGB with SRGB_NONLINEAR, then B8G8R8A8_UNORM, then
/// whatever comes first. `formats` must not be empty.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    if let Some(&format) = preferred {
        debug!("Selected preferred surface format: B8G8R8A8_SRGB with SRGB_NONLINEAR");
        return format;
    }

    let alternative = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_UNORM && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });

    if let Some(&format) = alternative {
        warn!("Using fallback surface format: B8G8R8A8_UNORM with SRGB_NONLINEAR");
        return format;
    }

    warn!(
        "Using first available surface format: {:?}",
        formats[0].format
    );
    formats[0]
}

/// Prefers MAILBOX, falling back to FIFO which is always available.
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    if present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        debug!("Selected MAILBOX present mode");
        return vk::PresentModeKHR::MAILBOX;
    }

    debug!("Selected FIFO present mode (vsync)");
    vk::PresentModeKHR::FIFO
}

/// Chooses the swap chain extent.
///
/// Uses the surface's current extent when defined, otherwise clamps the
/// window size to the surface limits.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    window_extent: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        debug!(
            "Using current surface extent: {}x{}",
            capabilities.current_extent.width, capabilities.current_extent.height
        );
        return capabilities.current_extent;
    }

    let extent = vk::Extent2D {
        width: window_extent.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: window_extent.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    };

    debug!(
        "Calculated extent: {}x{} (requested: {}x{})",
        extent.width, extent.height, window_extent.width, window_extent.height
    );

    extent
}

/// Rejects extents with zero area; `source` names where it came from.
fn ensure_drawable(extent: vk::Extent2D, source: &str) -> RhiResult<()> {
    if extent.width == 0 || extent.height == 0 {
        return Err(RhiError::SwapchainError(format!(
            "Cannot create a swap chain for a {}x{} {}",
            extent.width, extent.height, source
        )));
    }
    Ok(())
}

/// One more image than the minimum, capped by the maximum when there is one.
pub fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;

    // A max of 0 means no limit
    let image_count = if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    };

    debug!(
        "Image count: {} (min: {}, max: {})",
        image_count,
        capabilities.min_image_count,
        max_image_count_label(capabilities)
    );

    image_count
}

fn max_image_count_label(capabilities: &vk::SurfaceCapabilitiesKHR) -> String {
    if capabilities.max_image_count == 0 {
        "unlimited".to_string()
    } else {
        capabilities.max_image_count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn test_choose_surface_format_prefers_srgb() {
        let formats = vec![
            surface_format(vk::Format::R8G8B8A8_UNORM),
            surface_format(vk::Format::B8G8R8A8_SRGB),
            surface_format(vk::Format::B8G8R8A8_UNORM),
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(selected.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn test_choose_surface_format_fallbacks() {
        let formats = vec![
            surface_format(vk::Format::R8G8B8A8_UNORM),
            surface_format(vk::Format::B8G8R8A8_UNORM),
        ];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::B8G8R8A8_UNORM
        );

        let formats = vec![surface_format(vk::Format::R8G8B8A8_UNORM)];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::R8G8B8A8_UNORM
        );
    }

    #[test]
    fn test_choose_present_mode() {
        let modes = vec![
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);

        let modes = vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_extent_uses_current() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            ..Default::default()
        };

        let extent = choose_extent(
            &capabilities,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        );
        assert_eq!(extent.width, 1920);
        assert_eq!(extent.height, 1080);
    }

    #[test]
    fn test_zero_surface_extent_is_rejected() {
        // Minimized surface while the window still reports its old size.
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 0,
                height: 0,
            },
            ..Default::default()
        };
        let window = vk::Extent2D {
            width: 800,
            height: 600,
        };
        assert!(ensure_drawable(window, "window").is_ok());

        let extent = choose_extent(&capabilities, window);
        assert!(matches!(
            ensure_drawable(extent, "surface"),
            Err(RhiError::SwapchainError(_))
        ));
        assert!(ensure_drawable(vk::Extent2D { width: 640, height: 0 }, "surface").is_err());
    }

    #[test]
    fn test_choose_extent_clamps_to_limits() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 100,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 2000,
            },
            ..Default::default()
        };
        let request = |width, height| choose_extent(&capabilities, vk::Extent2D { width, height });

        assert_eq!(request(3000, 3000), vk::Extent2D { width: 2000, height: 2000 });
        assert_eq!(request(50, 50), vk::Extent2D { width: 100, height: 100 });
        assert_eq!(request(640, 480), vk::Extent2D { width: 640, height: 480 });
    }

    #[test]
    fn test_determine_image_count() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);

        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 3,
            max_image_count: 3,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);

        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capabilities), 3);
    }

    #[test]
    fn test_classify_acquire() {
        assert_eq!(classify_acquire(Ok((2, false))).unwrap(), AcquireStatus::Ready(2));
        assert_eq!(
            classify_acquire(Ok((1, true))).unwrap(),
            AcquireStatus::Suboptimal(1)
        );
        assert_eq!(
            classify_acquire(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            AcquireStatus::OutOfDate
        );
        assert!(matches!(
            classify_acquire(Err(vk::Result::ERROR_DEVICE_LOST)),
            Err(RhiError::UnexpectedStatus(vk::Result::ERROR_DEVICE_LOST))
        ));
    }

    #[test]
    fn test_classify_present() {
        assert_eq!(classify_present(Ok(false)).unwrap(), PresentStatus::Optimal);
        assert_eq!(classify_present(Ok(true)).unwrap(), PresentStatus::Suboptimal);
        assert_eq!(
            classify_present(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            PresentStatus::OutOfDate
        );
        assert!(matches!(
            classify_present(Err(vk::Result::ERROR_SURFACE_LOST_KHR)),
            Err(RhiError::UnexpectedStatus(_))
        ));
    }

    #[test]
    fn test_status_helpers() {
        assert_eq!(AcquireStatus::Ready(0).image_index(), Some(0));
        assert_eq!(AcquireStatus::Suboptimal(2).image_index(), Some(2));
        assert_eq!(AcquireStatus::OutOfDate.image_index(), None);

        assert!(!PresentStatus::Optimal.needs_recreation());
        assert!(PresentStatus::Suboptimal.needs_recreation());
        assert!(PresentStatus::OutOfDate.needs_recreation());
    }

    #[test]
    fn test_swapchain_support_details_is_adequate() {
        let adequate = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_modes = SwapchainSupportDetails {
            present_modes: vec![],
            ..adequate.clone()
        };
        assert!(!no_modes.is_adequate());

        let no_formats = SwapchainSupportDetails {
            formats: vec![],
            ..adequate
        };
        assert!(!no_formats.is_adequate());
    }
}
