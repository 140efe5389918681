/// Shader trait and shader descriptor

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

/// Descriptor for creating a shader
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    /// Name the shader was loaded under (e.g. "hbao/hbao.frag.spv")
    pub label: String,
    /// Compiled SPIR-V bytecode
    pub code: &'a [u8],
    /// Shader stage
    pub stage: ShaderStage,
    /// Entry point function name
    pub entry_point: String,
}

/// A descriptor binding a shader reads, as found by reflection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderBinding {
    pub set: u32,
    pub binding: u32,
}

/// Shader resource trait
///
/// Implemented by backend-specific shader types (e.g., VulkanShader).
/// The module is destroyed when dropped.
pub trait Shader: Send + Sync {
    fn stage(&self) -> ShaderStage;

    fn label(&self) -> &str;

    /// Descriptor bindings the module declares, if the backend reflects them
    fn bindings(&self) -> &[ShaderBinding] {
        &[]
    }
}
