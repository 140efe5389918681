/// Shader loading
///
/// Shaders are looked up by name relative to a root directory, e.g.
/// `hbao/fullscreen.vert.spv`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::graphics_device::{GraphicsDevice, Shader, ShaderDesc, ShaderStage};

/// First word of every SPIR-V module
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

pub trait ShaderLoader {
    /// Load `name` (without the `.spv` suffix) and create a shader module
    fn load(&self, device: &dyn GraphicsDevice, name: &str, stage: ShaderStage) -> Result<Arc<dyn Shader>>;
}

/// Loads compiled SPIR-V files from a directory
#[derive(Debug, Clone)]
pub struct SpirvFileLoader {
    root: PathBuf,
}

impl SpirvFileLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Loader rooted at `config.shader_root`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.shader_root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for shader `name`
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.spv", name))
    }
}

/// Check word alignment and the magic number
pub fn validate_spirv(name: &str, code: &[u8]) -> Result<()> {
    if code.len() < 4 || code.len() % 4 != 0 {
        return Err(Error::InvalidResource(format!(
            "'{}' is {} bytes, not a whole number of SPIR-V words", name, code.len()
        )));
    }
    let magic = u32::from_le_bytes([code[0], code[1], code[2], code[3]]);
    if magic != SPIRV_MAGIC {
        return Err(Error::InvalidResource(format!("'{}' is not SPIR-V (magic {:#010x})", name, magic)));
    }
    Ok(())
}

impl ShaderLoader for SpirvFileLoader {
    fn load(&self, device: &dyn GraphicsDevice, name: &str, stage: ShaderStage) -> Result<Arc<dyn Shader>> {
        let path = self.path_of(name);
        let code = std::fs::read(&path).map_err(|e| {
            crate::engine_error!("ssao::ShaderLoader", "Cannot read '{}': {}", path.display(), e);
            Error::InitializationFailed(format!("shader '{}': {}", path.display(), e))
        })?;
        validate_spirv(name, &code)?;

        crate::engine_debug!("ssao::ShaderLoader", "Loaded '{}' ({} bytes)", path.display(), code.len());

        device.create_shader(ShaderDesc {
            label: name.to_string(),
            code: &code,
            stage,
            entry_point: "main".to_string(),
        })
    }
}

#[cfg(test)]
#[path = "shader_loader_tests.rs"]
mod tests;
