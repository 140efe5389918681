/// Sampler - Vulkan implementation of the Sampler trait
///
/// Samplers are created once per renderer and shared by every binding
/// group that reads an attachment.

use ssao_engine::ssao::Result;
use ssao_engine::ssao::device::{Sampler, SamplerDesc};
use ssao_engine::engine_err;
use ash::vk;
use std::sync::Arc;

use crate::vulkan::{address_mode_to_vk, border_color_to_vk, filter_to_vk, mipmap_mode_to_vk};
use crate::vulkan_context::GpuContext;

pub struct VulkanSampler {
    ctx: Arc<GpuContext>,
    pub(crate) sampler: vk::Sampler,
    desc: SamplerDesc,
}

impl VulkanSampler {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &SamplerDesc) -> Result<Self> {
        let anisotropy = desc.max_anisotropy > 1.0;

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter_to_vk(desc.mag_filter))
            .min_filter(filter_to_vk(desc.min_filter))
            .mipmap_mode(mipmap_mode_to_vk(desc.mipmap_mode))
            .address_mode_u(address_mode_to_vk(desc.address_mode_u))
            .address_mode_v(address_mode_to_vk(desc.address_mode_v))
            .address_mode_w(address_mode_to_vk(desc.address_mode_w))
            .mip_lod_bias(desc.mip_lod_bias)
            .anisotropy_enable(anisotropy)
            .max_anisotropy(if anisotropy { desc.max_anisotropy } else { 1.0 })
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .min_lod(desc.min_lod)
            .max_lod(desc.max_lod)
            .border_color(border_color_to_vk(desc.border_color))
            .unnormalized_coordinates(false);

        let sampler = unsafe { ctx.device.create_sampler(&create_info, None) }
            .map_err(|e| engine_err!("ssao::vulkan", "Failed to create sampler: {:?}", e))?;

        Ok(Self { ctx, sampler, desc: *desc })
    }
}

impl Sampler for VulkanSampler {
    fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
}

impl Drop for VulkanSampler {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}
