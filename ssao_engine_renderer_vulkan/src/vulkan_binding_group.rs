/// BindingGroup - Vulkan implementation of the BindingGroup trait
///
/// Descriptor sets come from a `DescriptorAllocator` whose pools are sized
/// by a `BindingGroupBudget`. When the newest pool runs out, one more pool
/// of the same size is created and the allocation retried once.

use ssao_engine::ssao::{Error, Result};
use ssao_engine::ssao::device::{BindingGroup, BindingGroupBudget};
use ssao_engine::{engine_err, engine_error, engine_info};
use ash::vk;
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;

pub(crate) struct DescriptorAllocator {
    ctx: Arc<GpuContext>,
    /// Newest pool last; allocation always targets it
    pools: Mutex<Vec<vk::DescriptorPool>>,
    budget: Mutex<BindingGroupBudget>,
}

impl DescriptorAllocator {
    pub(crate) fn new(ctx: Arc<GpuContext>, budget: BindingGroupBudget) -> Result<Self> {
        let pool = Self::create_pool(&ctx, budget)?;
        Ok(Self {
            ctx,
            pools: Mutex::new(vec![pool]),
            budget: Mutex::new(budget),
        })
    }

    fn create_pool(ctx: &GpuContext, budget: BindingGroupBudget) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: budget.uniform_buffers.max(1),
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: budget.combined_image_samplers.max(1),
            },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .pool_sizes(&pool_sizes)
            .max_sets(budget.max_sets.max(1));

        unsafe { ctx.device.create_descriptor_pool(&info, None) }.map_err(|e| match e {
            vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
                engine_error!("ssao::vulkan", "Out of memory creating descriptor pool: {:?}", e);
                Error::ResourceExhausted(format!("descriptor pool: {:?}", e))
            }
            other => engine_err!("ssao::vulkan", "Failed to create descriptor pool: {:?}", other),
        })
    }

    fn lock_pools(&self) -> Result<std::sync::MutexGuard<'_, Vec<vk::DescriptorPool>>> {
        self.pools
            .lock()
            .map_err(|_| Error::BackendError("descriptor pool mutex poisoned".to_string()))
    }

    fn current_budget(&self) -> Result<BindingGroupBudget> {
        self.budget
            .lock()
            .map(|budget| *budget)
            .map_err(|_| Error::BackendError("descriptor budget mutex poisoned".to_string()))
    }

    /// Add a pool sized for `budget`; later growth uses the same size
    pub(crate) fn reserve(&self, budget: BindingGroupBudget) -> Result<()> {
        let pool = Self::create_pool(&self.ctx, budget)?;
        self.lock_pools()?.push(pool);
        if let Ok(mut current) = self.budget.lock() {
            *current = budget;
        }
        engine_info!("ssao::vulkan", "Reserved descriptor pool: {} sets, {} uniform buffers, {} samplers",
            budget.max_sets, budget.uniform_buffers, budget.combined_image_samplers);
        Ok(())
    }

    /// Allocate one set of `layout`, growing the pool list once if needed
    pub(crate) fn allocate(&self, layout: vk::DescriptorSetLayout) -> Result<(vk::DescriptorPool, vk::DescriptorSet)> {
        let layouts = [layout];
        let mut pools = self.lock_pools()?;
        let current = *pools
            .last()
            .ok_or_else(|| Error::InvalidState("descriptor allocator has no pool".to_string()))?;

        let allocate_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(current)
            .set_layouts(&layouts);

        match unsafe { self.ctx.device.allocate_descriptor_sets(&allocate_info) } {
            Ok(sets) => first_set(current, sets),
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                let new_pool = Self::create_pool(&self.ctx, self.current_budget()?)?;
                pools.push(new_pool);
                engine_info!("ssao::vulkan", "Descriptor pool exhausted, created new pool (total: {})", pools.len());

                let retry_info = vk::DescriptorSetAllocateInfo::default()
                    .descriptor_pool(new_pool)
                    .set_layouts(&layouts);
                let sets = unsafe { self.ctx.device.allocate_descriptor_sets(&retry_info) }.map_err(|e| {
                    engine_error!("ssao::vulkan", "Descriptor allocation failed after pool growth: {:?}", e);
                    Error::ResourceExhausted(format!("descriptor sets: {:?}", e))
                })?;
                first_set(new_pool, sets)
            }
            Err(e) => Err(engine_err!("ssao::vulkan", "Failed to allocate descriptor set: {:?}", e)),
        }
    }

    /// Return a set to its pool
    pub(crate) fn free(&self, pool: vk::DescriptorPool, set: vk::DescriptorSet) {
        unsafe {
            if let Err(e) = self.ctx.device.free_descriptor_sets(pool, &[set]) {
                engine_error!("ssao::vulkan", "Failed to free descriptor set: {:?}", e);
            }
        }
    }

    pub(crate) fn pool_count(&self) -> usize {
        self.pools.lock().map(|pools| pools.len()).unwrap_or(0)
    }
}

fn first_set(pool: vk::DescriptorPool, sets: Vec<vk::DescriptorSet>) -> Result<(vk::DescriptorPool, vk::DescriptorSet)> {
    sets.into_iter()
        .next()
        .map(|set| (pool, set))
        .ok_or_else(|| Error::BackendError("driver returned no descriptor set".to_string()))
}

impl Drop for DescriptorAllocator {
    fn drop(&mut self) {
        if let Ok(mut pools) = self.pools.lock() {
            for pool in pools.drain(..) {
                unsafe {
                    self.ctx.device.destroy_descriptor_pool(pool, None);
                }
            }
        }
    }
}

/// Vulkan binding group
///
/// Immutable after creation; create a new group to change resources.
pub struct VulkanBindingGroup {
    pub(crate) descriptor_set: vk::DescriptorSet,
    pool: vk::DescriptorPool,
    set_index: u32,
    resource_labels: Vec<String>,
    allocator: Arc<DescriptorAllocator>,
}

impl VulkanBindingGroup {
    pub(crate) fn new(
        allocator: Arc<DescriptorAllocator>,
        pool: vk::DescriptorPool,
        descriptor_set: vk::DescriptorSet,
        set_index: u32,
        resource_labels: Vec<String>,
    ) -> Self {
        Self { descriptor_set, pool, set_index, resource_labels, allocator }
    }
}

impl BindingGroup for VulkanBindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }

    fn resource_labels(&self) -> &[String] {
        &self.resource_labels
    }
}

impl Drop for VulkanBindingGroup {
    fn drop(&mut self) {
        self.allocator.free(self.pool, self.descriptor_set);
    }
}
