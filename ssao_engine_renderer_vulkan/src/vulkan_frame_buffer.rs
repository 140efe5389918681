/// Framebuffer - Vulkan implementation of the Framebuffer trait
///
/// Wraps a VkFramebuffer binding image views to a render pass. Offscreen
/// framebuffers keep their attachments alive; swapchain framebuffers are
/// destroyed by the presenter before its image views.

use ssao_engine::ssao::device::{Framebuffer, Texture};
use ash::vk;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub struct VulkanFramebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
    width: u32,
    height: u32,
    attachment_count: usize,
    label: String,
    /// Views referenced by the framebuffer must outlive it
    _attachments: Vec<Arc<dyn Texture>>,
}

impl VulkanFramebuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        framebuffer: vk::Framebuffer,
        label: String,
        width: u32,
        height: u32,
        attachment_count: usize,
        attachments: Vec<Arc<dyn Texture>>,
    ) -> Self {
        Self {
            ctx,
            framebuffer,
            width,
            height,
            attachment_count,
            label,
            _attachments: attachments,
        }
    }
}

impl Framebuffer for VulkanFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn attachment_count(&self) -> usize {
        self.attachment_count
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for VulkanFramebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
