//! Shader bytecode loading and shader modules.
//!
//! [`read_spirv`] is the byte-level loader; [`spirv_words`] validates a blob
//! and turns it into the `u32` words Vulkan consumes. [`ShaderModule`] wraps
//! `VkShaderModule` and is meant to live only as long as pipeline creation.

use std::ffi::CStr;
use std::path::Path;
use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// First word of every SPIR-V module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Entry point used by both stages.
const ENTRY_POINT: &CStr = c"main";

/// Programmable stages used by the graphics pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn to_vk_stage(self) -> vk::ShaderStageFlags {
        match self {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reads a compiled shader binary.
///
/// # Errors
///
/// [`RhiError::ShaderError`] naming the path when the file cannot be opened
/// or read.
pub fn read_spirv(path: &Path) -> RhiResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        RhiError::ShaderError(format!("Failed to open file: {} ({})", path.display(), e))
    })
}

/// Converts little-endian SPIR-V bytes into code words.
///
/// Rejects empty blobs, lengths that are not a multiple of four, and data
/// that does not start with [`SPIRV_MAGIC`].
pub fn spirv_words(bytes: &[u8]) -> RhiResult<Vec<u32>> {
    if bytes.is_empty() || !bytes.len().is_multiple_of(4) {
        return Err(RhiError::ShaderError(format!(
            "SPIR-V code must be a non-empty multiple of 4 bytes, got {} bytes",
            bytes.len()
        )));
    }

    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    if words[0] != SPIRV_MAGIC {
        return Err(RhiError::ShaderError(format!(
            "Bad SPIR-V magic number {:#010x}",
            words[0]
        )));
    }

    Ok(words)
}

/// A compiled shader stage.
///
/// Destroyed on drop; a pipeline keeps no reference to it once created.
pub struct ShaderModule {
    device: Arc<Device>,
    module: vk::ShaderModule,
    stage: ShaderStage,
}

impl ShaderModule {
    /// Creates a module from raw SPIR-V bytes.
    pub fn from_bytes(device: Arc<Device>, bytes: &[u8], stage: ShaderStage) -> RhiResult<Self> {
        let code = spirv_words(bytes)?;
        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);

        let module = unsafe {
            device
                .handle()
                .create_shader_module(&create_info, None)
                .map_err(RhiError::creating("shader module"))?
        };

        debug!("Created {} shader module ({} bytes)", stage, bytes.len());

        Ok(Self {
            device,
            module,
            stage,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    pub fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'static> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage.to_vk_stage())
            .module(self.module)
            .name(ENTRY_POINT)
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_shader_module(self.module, None);
        }
        debug!("Destroyed {} shader module", self.stage);
    }
}
