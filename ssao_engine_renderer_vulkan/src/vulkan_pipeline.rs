/// Pipeline - Vulkan implementation of the Pipeline trait
///
/// Descriptor set layouts are deduplicated in a `LayoutCache` shared by the
/// device and every pipeline, so two pipelines declaring the same binding
/// layout use the same `VkDescriptorSetLayout` and their binding groups are
/// interchangeable.

use ssao_engine::ssao::{Error, Result};
use ssao_engine::ssao::device::{BindingGroupLayoutDesc, Pipeline};
use ssao_engine::{engine_err, engine_trace};
use ash::vk;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex};

use crate::vulkan::{binding_type_to_vk, stage_flags_to_vk};
use crate::vulkan_context::GpuContext;

/// Descriptor set layouts keyed by their abstract description
pub(crate) struct LayoutCache {
    ctx: Arc<GpuContext>,
    layouts: Mutex<FxHashMap<BindingGroupLayoutDesc, vk::DescriptorSetLayout>>,
}

impl LayoutCache {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Self {
        Self {
            ctx,
            layouts: Mutex::new(FxHashMap::default()),
        }
    }

    /// Get or create the layout for `desc`
    pub(crate) fn get_or_create(&self, desc: &BindingGroupLayoutDesc) -> Result<vk::DescriptorSetLayout> {
        let mut layouts = self
            .layouts
            .lock()
            .map_err(|_| Error::BackendError("layout cache mutex poisoned".to_string()))?;

        if let Some(&layout) = layouts.get(desc) {
            return Ok(layout);
        }

        let bindings: Vec<vk::DescriptorSetLayoutBinding> = desc
            .entries
            .iter()
            .map(|entry| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(entry.binding)
                    .descriptor_type(binding_type_to_vk(entry.binding_type))
                    .descriptor_count(entry.count)
                    .stage_flags(stage_flags_to_vk(entry.stage_flags))
            })
            .collect();

        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let layout = unsafe { self.ctx.device.create_descriptor_set_layout(&create_info, None) }
            .map_err(|e| engine_err!("ssao::vulkan", "Failed to create descriptor set layout: {:?}", e))?;

        engine_trace!("ssao::vulkan", "Created descriptor set layout with {} bindings ({} cached)",
            bindings.len(), layouts.len() + 1);

        layouts.insert(desc.clone(), layout);
        Ok(layout)
    }
}

impl Drop for LayoutCache {
    fn drop(&mut self) {
        if let Ok(mut layouts) = self.layouts.lock() {
            for (_, layout) in layouts.drain() {
                unsafe {
                    self.ctx.device.destroy_descriptor_set_layout(layout, None);
                }
            }
        }
    }
}

pub struct VulkanPipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    /// Null until the layout is created
    pub(crate) pipeline_layout: vk::PipelineLayout,
    /// One layout per set index, owned by the cache
    pub(crate) set_layouts: Vec<vk::DescriptorSetLayout>,
    /// Abstract layouts, used to validate binding groups
    pub(crate) layout_descs: Vec<BindingGroupLayoutDesc>,
    /// Keeps the set layouts alive while the pipeline exists
    _layout_cache: Arc<LayoutCache>,
    label: String,
}

impl VulkanPipeline {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        layout_cache: Arc<LayoutCache>,
        set_layouts: Vec<vk::DescriptorSetLayout>,
        layout_descs: Vec<BindingGroupLayoutDesc>,
        label: String,
    ) -> Self {
        Self {
            ctx,
            pipeline: vk::Pipeline::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            set_layouts,
            layout_descs,
            _layout_cache: layout_cache,
            label,
        }
    }
}

impl Pipeline for VulkanPipeline {
    fn label(&self) -> &str {
        &self.label
    }

    fn binding_group_layout_count(&self) -> u32 {
        self.set_layouts.len() as u32
    }
}

impl Drop for VulkanPipeline {
    fn drop(&mut self) {
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                self.ctx.device.destroy_pipeline(self.pipeline, None);
            }
            if self.pipeline_layout != vk::PipelineLayout::null() {
                self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
            }
        }
    }
}
