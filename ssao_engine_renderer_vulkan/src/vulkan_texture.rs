/// Texture - Vulkan implementation of the Texture trait
///
/// Owns image, views and memory. Fields are filled in as creation
/// progresses, so an early `?` still releases whatever was created.

use ssao_engine::ssao::device::{Texture, TextureInfo};
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub struct VulkanTexture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    /// Attachment view over every aspect; null until created
    pub(crate) view: vk::ImageView,
    /// View bound for sampling; the same handle as `view` unless the
    /// format has a stencil aspect
    pub(crate) sampled_view: vk::ImageView,
    allocation: Option<Allocation>,
    info: TextureInfo,
}

impl VulkanTexture {
    pub(crate) fn new(ctx: Arc<GpuContext>, image: vk::Image, info: TextureInfo) -> Self {
        Self {
            ctx,
            image,
            view: vk::ImageView::null(),
            sampled_view: vk::ImageView::null(),
            allocation: None,
            info,
        }
    }

    pub(crate) fn set_allocation(&mut self, allocation: Allocation) {
        self.allocation = Some(allocation);
    }
}

impl Texture for VulkanTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        unsafe {
            if self.sampled_view != vk::ImageView::null() && self.sampled_view != self.view {
                self.ctx.device.destroy_image_view(self.sampled_view, None);
            }
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }

            if let Some(allocation) = self.allocation.take() {
                self.ctx.free(allocation);
            }

            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
