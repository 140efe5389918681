/// VulkanShader - Vulkan implementation of the Shader trait

use ssao_engine::ssao::device::{Shader, ShaderBinding, ShaderStage};
use ash::vk;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub struct VulkanShader {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
    pub(crate) stage: ShaderStage,
    pub(crate) entry_point: CString,
    label: String,
    /// Descriptor bindings found by SPIR-V reflection
    bindings: Vec<ShaderBinding>,
}

impl VulkanShader {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        module: vk::ShaderModule,
        stage: ShaderStage,
        entry_point: CString,
        label: String,
        bindings: Vec<ShaderBinding>,
    ) -> Self {
        Self { ctx, module, stage, entry_point, label, bindings }
    }
}

impl Shader for VulkanShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn bindings(&self) -> &[ShaderBinding] {
        &self.bindings
    }
}

impl Drop for VulkanShader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
