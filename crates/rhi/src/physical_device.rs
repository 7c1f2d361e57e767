//! Physical device (GPU) selection.
//!
//! A device qualifies when it has a graphics queue family, a family that can
//! present to the target surface, the swap chain extension, and at least one
//! surface format and present mode. Qualifying devices are ranked by
//! [`score_device`] and the best one wins.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::{RhiError, RhiResult};

/// Queue family indices for the graphics/present queue pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics_family: Option<u32>,
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Both graphics and present families were found.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Distinct family indices, graphics first.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(2);

        if let Some(graphics) = self.graphics_family {
            families.push(graphics);
        }
        if let Some(present) = self.present_family
            && !families.contains(&present)
        {
            families.push(present);
        }

        families
    }

    /// Whether the swap chain images must be shared between two families.
    #[inline]
    pub fn is_split(&self) -> bool {
        self.graphics_family != self.present_family
    }
}

/// Everything needed about the chosen GPU to build a logical device.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    pub device: vk::PhysicalDevice,
    pub properties: vk::PhysicalDeviceProperties,
    pub queue_families: QueueFamilyIndices,
}

impl PhysicalDeviceInfo {
    pub fn device_name(&self) -> &str {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown Device")
        }
    }

    pub fn device_type_name(&self) -> &'static str {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "Other",
        }
    }

    /// Guaranteed push-constant budget of this device.
    pub fn max_push_constants_size(&self) -> u32 {
        self.properties.limits.max_push_constants_size
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

/// Picks the highest scoring GPU able to present to `surface`.
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] when nothing qualifies.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> RhiResult<PhysicalDeviceInfo> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }

    info!("Found {} GPU(s)", devices.len());

    let best = devices
        .into_iter()
        .filter_map(|device| check_device_suitability(instance, device, surface, surface_loader))
        .map(|info| {
            let score = score_device(
                info.properties.device_type,
                info.properties.limits.max_image_dimension2_d,
                !info.queue_families.is_split(),
            );
            debug!(
                "GPU '{}' ({}) - Score: {}",
                info.device_name(),
                info.device_type_name(),
                score
            );
            (info, score)
        })
        .max_by_key(|(_, score)| *score);

    let Some((selected, score)) = best else {
        warn!("No GPU supports the required queues, extensions and surface");
        return Err(RhiError::NoSuitableGpu);
    };

    info!(
        "Selected GPU: '{}' ({}) - Score: {}",
        selected.device_name(),
        selected.device_type_name(),
        score
    );

    Ok(selected)
}

/// Ranks a device; higher is better.
///
/// Device type dominates. A single family serving graphics and present
/// avoids concurrent image sharing, so it earns a small bonus.
pub fn score_device(
    device_type: vk::PhysicalDeviceType,
    max_image_dimension_2d: u32,
    unified_queue: bool,
) -> u32 {
    let type_score = match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 100_000,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 10_000,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 1_000,
        vk::PhysicalDeviceType::CPU => 100,
        _ => 10,
    };

    let unified_bonus = if unified_queue { 50 } else { 0 };

    type_score + max_image_dimension_2d.min(32_768) / 16 + unified_bonus
}

fn check_device_suitability(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Option<PhysicalDeviceInfo> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let info = PhysicalDeviceInfo {
        device,
        properties,
        queue_families: find_queue_families(instance, device, surface, surface_loader),
    };

    if !info.queue_families.is_complete() {
        debug!(
            "GPU '{}' skipped: missing graphics or present queue family",
            info.device_name()
        );
        return None;
    }

    if !supports_swapchain_extension(instance, device) {
        debug!("GPU '{}' skipped: no VK_KHR_swapchain", info.device_name());
        return None;
    }

    let formats =
        unsafe { surface_loader.get_physical_device_surface_formats(device, surface) };
    let present_modes =
        unsafe { surface_loader.get_physical_device_surface_present_modes(device, surface) };
    let adequate = matches!((formats, present_modes), (Ok(f), Ok(p)) if !f.is_empty() && !p.is_empty());
    if !adequate {
        debug!(
            "GPU '{}' skipped: surface has no formats or present modes",
            info.device_name()
        );
        return None;
    }

    Some(info)
}

fn supports_swapchain_extension(instance: &ash::Instance, device: vk::PhysicalDevice) -> bool {
    let Ok(extensions) = (unsafe { instance.enumerate_device_extension_properties(device) }) else {
        return false;
    };

    extensions.iter().any(|ext| {
        let name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
        name == ash::khr::swapchain::NAME
    })
}

fn find_queue_families(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> QueueFamilyIndices {
    let families = unsafe { instance.get_physical_device_queue_family_properties(device) };

    let mut indices = QueueFamilyIndices::default();

    for (i, family) in families.iter().enumerate() {
        let i = i as u32;

        if family.queue_count == 0 {
            continue;
        }

        let has_graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
        let present_support = unsafe {
            surface_loader
                .get_physical_device_surface_support(device, i, surface)
                .unwrap_or(false)
        };

        // A family that does both is preferred over any split pair.
        if has_graphics && present_support {
            indices.graphics_family = Some(i);
            indices.present_family = Some(i);
            break;
        }

        if has_graphics && indices.graphics_family.is_none() {
            indices.graphics_family = Some(i);
        }
        if present_support && indices.present_family.is_none() {
            indices.present_family = Some(i);
        }
    }

    indices
}
