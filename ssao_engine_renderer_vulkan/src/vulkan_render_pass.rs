/// RenderPass - Vulkan implementation of the RenderPass trait

use ssao_engine::ssao::device::RenderPass;
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub struct VulkanRenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
    label: String,
    color_attachment_count: usize,
    has_depth_stencil: bool,
}

impl VulkanRenderPass {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        render_pass: vk::RenderPass,
        label: String,
        color_attachment_count: usize,
        has_depth_stencil: bool,
    ) -> Self {
        Self { ctx, render_pass, label, color_attachment_count, has_depth_stencil }
    }

    /// Attachments a compatible framebuffer must provide
    pub(crate) fn attachment_count(&self) -> usize {
        self.color_attachment_count + usize::from(self.has_depth_stencil)
    }
}

impl RenderPass for VulkanRenderPass {
    fn label(&self) -> &str {
        &self.label
    }

    fn color_attachment_count(&self) -> usize {
        self.color_attachment_count
    }

    fn has_depth_stencil(&self) -> bool {
        self.has_depth_stencil
    }
}

impl Drop for VulkanRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
