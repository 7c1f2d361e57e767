//! Depth attachment shared by every framebuffer of a swap chain.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, error};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Depth formats in order of preference.
pub const DEPTH_FORMAT_CANDIDATES: [vk::Format; 3] = [
    vk::Format::D32_SFLOAT,
    vk::Format::D32_SFLOAT_S8_UINT,
    vk::Format::D24_UNORM_S8_UINT,
];

/// First candidate for which `supports` holds.
pub fn pick_depth_format(
    candidates: &[vk::Format],
    supports: impl Fn(vk::Format) -> bool,
) -> Option<vk::Format> {
    candidates.iter().copied().find(|&format| supports(format))
}

/// Picks a depth format usable as an optimally tiled attachment.
pub fn find_depth_format(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> RhiResult<vk::Format> {
    pick_depth_format(&DEPTH_FORMAT_CANDIDATES, |format| {
        let properties =
            unsafe { instance.get_physical_device_format_properties(physical_device, format) };
        properties
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    })
    .ok_or_else(|| RhiError::SwapchainError("No supported depth format".to_string()))
}

/// Aspect flags for a view of a depth image in `format`.
pub fn depth_aspect(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D16_UNORM_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        _ => vk::ImageAspectFlags::DEPTH,
    }
}

/// GPU-only depth image with its view.
pub struct DepthBuffer {
    device: Arc<Device>,
    image: vk::Image,
    image_view: vk::ImageView,
    allocation: Option<Allocation>,
    extent: vk::Extent2D,
}

impl DepthBuffer {
    /// Creates a depth image of `extent` in `format`.
    ///
    /// Partially created objects are released again when a later step fails.
    pub fn new(device: Arc<Device>, extent: vk::Extent2D, format: vk::Format) -> RhiResult<Self> {
        if extent.width == 0 || extent.height == 0 {
            return Err(RhiError::InvalidHandle(
                "Depth buffer dimensions must be greater than 0".to_string(),
            ));
        }

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: extent.width,
                height: extent.height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe {
            device
                .handle()
                .create_image(&image_info, None)
                .map_err(RhiError::creating("depth image"))?
        };

        // From here on the struct owns what exists so far; Drop cleans up.
        let mut depth = Self {
            device,
            image,
            image_view: vk::ImageView::null(),
            allocation: None,
            extent,
        };

        let requirements = unsafe { depth.device.handle().get_image_memory_requirements(image) };
        let allocation = depth.device.allocator()?.allocate(&AllocationCreateDesc {
            name: "depth_buffer",
            requirements,
            location: MemoryLocation::GpuOnly,
            linear: false,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;

        let (memory, offset) = unsafe { (allocation.memory(), allocation.offset()) };
        depth.allocation = Some(allocation);

        unsafe {
            depth
                .device
                .handle()
                .bind_image_memory(image, memory, offset)?;
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(depth_aspect(format))
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        depth.image_view = unsafe {
            depth
                .device
                .handle()
                .create_image_view(&view_info, None)
                .map_err(RhiError::creating("depth image view"))?
        };

        debug!(
            "Created depth buffer: {}x{} ({:?})",
            extent.width, extent.height, format
        );

        Ok(depth)
    }

    #[inline]
    pub fn image_view(&self) -> vk::ImageView {
        self.image_view
    }

}

impl Drop for DepthBuffer {
    fn drop(&mut self) {
        unsafe {
            if self.image_view != vk::ImageView::null() {
                self.device
                    .handle()
                    .destroy_image_view(self.image_view, None);
            }
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        error!("Failed to free depth buffer allocation: {:?}", e);
                    }
                }
                Err(e) => error!("Leaking depth buffer allocation: {}", e),
            }
        }

        debug!(
            "Destroyed depth buffer: {}x{}",
            self.extent.width, self.extent.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_depth_format_prefers_first_supported() {
        let picked = pick_depth_format(&DEPTH_FORMAT_CANDIDATES, |_| true);
        assert_eq!(picked, Some(vk::Format::D32_SFLOAT));

        let picked = pick_depth_format(&DEPTH_FORMAT_CANDIDATES, |f| {
            f == vk::Format::D24_UNORM_S8_UINT
        });
        assert_eq!(picked, Some(vk::Format::D24_UNORM_S8_UINT));
    }

    #[test]
    fn test_pick_depth_format_none_supported() {
        assert_eq!(pick_depth_format(&DEPTH_FORMAT_CANDIDATES, |_| false), None);
    }

    #[test]
    fn test_depth_aspect() {
        assert_eq!(
            depth_aspect(vk::Format::D32_SFLOAT),
            vk::ImageAspectFlags::DEPTH
        );
        assert_eq!(
            depth_aspect(vk::Format::D24_UNORM_S8_UINT),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
    }
}
