/// Buffer - Vulkan implementation of the Buffer trait
///
/// Buffers live in host-visible, coherent memory and stay mapped for their
/// whole lifetime; `update()` is a plain memcpy.

use ssao_engine::ssao::{Error, Result};
use ssao_engine::ssao::device::Buffer;
use ssao_engine::engine_error;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub struct VulkanBuffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
    label: String,
}

impl VulkanBuffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, buffer: vk::Buffer, size: u64, label: String) -> Self {
        Self {
            ctx,
            buffer,
            allocation: None,
            size,
            label,
        }
    }

    pub(crate) fn set_allocation(&mut self, allocation: Allocation) {
        self.allocation = Some(allocation);
    }
}

impl Buffer for VulkanBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            engine_error!("ssao::vulkan", "Write of {} bytes at {} overflows '{}' ({} bytes)",
                data.len(), offset, self.label, self.size);
            return Err(Error::InvalidResource(format!(
                "write of {} bytes at offset {} exceeds buffer '{}' of {} bytes",
                data.len(), offset, self.label, self.size
            )));
        }

        let allocation = self.allocation.as_ref().ok_or_else(|| {
            engine_error!("ssao::vulkan", "Buffer '{}' has no GPU allocation", self.label);
            Error::BackendError(format!("buffer '{}' has no allocation", self.label))
        })?;

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| Error::BackendError(format!("buffer '{}' is not CPU-accessible", self.label)))?
            .as_ptr() as *mut u8;

        // Bounds checked above; memory is coherent so no flush is needed
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }

        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                self.ctx.free(allocation);
            }

            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
