/// ShaderModule - SPIR-V loading, reflection checks and the Vulkan module wrapper
///
/// The default pipeline binds exactly one descriptor: the view uniform at
/// set 0, binding 0. Shaders are reflected with spirq before use so a
/// mismatching binary fails with `ShaderLoadFailed` instead of at draw time.

use stellar_2d_engine::stellar2d::{Error, Result};
use stellar_2d_engine::{engine_debug, engine_error};
use ash::vk;
use std::io::Cursor;
use std::path::Path;

use crate::vulkan_context::Device;

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Entry point every default shader must export
pub const ENTRY_POINT: &std::ffi::CStr = c"main";

fn shader_error(message: String) -> Error {
    engine_error!("stellar2d::vulkan", "{}", message);
    Error::ShaderLoadFailed(message)
}

/// Decode SPIR-V bytes into words
///
/// # Errors
///
/// `ShaderLoadFailed` if `bytes` is empty, not a multiple of 4 bytes long or
/// does not start with the SPIR-V magic number.
pub fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.is_empty() {
        return Err(shader_error("SPIR-V binary is empty".to_string()));
    }
    if bytes.len() % 4 != 0 {
        return Err(shader_error(format!(
            "SPIR-V binary not 4-byte aligned (size: {} bytes)",
            bytes.len()
        )));
    }

    // read_spv also accepts byte-swapped modules
    let words = ash::util::read_spv(&mut Cursor::new(bytes))
        .map_err(|e| shader_error(format!("Failed to read SPIR-V: {}", e)))?;

    if words.first() != Some(&SPIRV_MAGIC) {
        return Err(shader_error(format!(
            "Not a SPIR-V binary (first word {:#010x})",
            words.first().copied().unwrap_or_default()
        )));
    }
    Ok(words)
}

/// Read and decode the SPIR-V file at `path`
pub fn load_spirv(path: &Path) -> Result<Vec<u32>> {
    let bytes = std::fs::read(path)
        .map_err(|e| shader_error(format!("Failed to read {}: {}", path.display(), e)))?;
    let words = spirv_words(&bytes)?;
    engine_debug!("stellar2d::vulkan", "Loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(words)
}

/// Check that `words` exports `main` and only uses the view uniform binding
pub fn validate_reflection(words: &[u32]) -> Result<()> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(words)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| shader_error(format!("SPIR-V reflection failed: {:?}", e)))?;

    let entry_point = entry_points
        .iter()
        .find(|entry_point| entry_point.name == "main")
        .ok_or_else(|| shader_error("SPIR-V module has no 'main' entry point".to_string()))?;

    for var in entry_point.vars.iter() {
        if let spirq::var::Variable::Descriptor { desc_bind, desc_ty, .. } = var {
            let (set, binding) = (desc_bind.set(), desc_bind.bind());
            if set != 0 || binding != 0 {
                return Err(shader_error(format!(
                    "Unexpected descriptor at set {} binding {}",
                    set, binding
                )));
            }
            if !matches!(desc_ty, spirq::ty::DescriptorType::UniformBuffer()) {
                return Err(shader_error(format!(
                    "Descriptor at set 0 binding 0 is {:?}, expected a uniform buffer",
                    desc_ty
                )));
            }
        }
    }
    Ok(())
}

/// Vulkan shader module
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
    stage: vk::ShaderStageFlags,
}

impl ShaderModule {
    /// Load, reflect and create the module at `path`
    pub fn from_file(device: &Device, path: &Path, stage: vk::ShaderStageFlags) -> Result<Self> {
        let words = load_spirv(path)?;
        validate_reflection(&words)?;
        Self::new(device, &words, stage)
    }

    /// Create a module from already validated words
    pub fn new(device: &Device, words: &[u32], stage: vk::ShaderStageFlags) -> Result<Self> {
        let create_info = vk::ShaderModuleCreateInfo::default().code(words);
        let module = unsafe {
            device.raw().create_shader_module(&create_info, None)
                .map_err(|e| shader_error(format!("Failed to create shader module: {:?}", e)))?
        };
        Ok(Self { device: device.clone(), module, stage })
    }

    pub fn raw(&self) -> vk::ShaderModule {
        self.module
    }

    pub fn stage(&self) -> vk::ShaderStageFlags {
        self.stage
    }

    /// Stage description for pipeline creation
    pub fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo<'static> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage)
            .module(self.module)
            .name(ENTRY_POINT)
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_shader_module(self.module, None);
        }
    }
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
