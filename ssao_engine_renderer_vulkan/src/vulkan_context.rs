/// GpuContext - Shared GPU state for all Vulkan objects
///
/// Contains everything resources need after creation:
/// - Instance and device for Vulkan API calls
/// - Allocator for memory management
/// - Graphics and present queues
///
/// Every wrapper (texture, buffer, pipeline, presenter, ...) holds an
/// `Arc<GpuContext>`, so the device is destroyed only after the last
/// resource created from it.

use ssao_engine::ssao::{Error, Result};
use ssao_engine::engine_error;
use ash::vk;
use gpu_allocator::AllocationError;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, Allocator};
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

pub struct GpuContext {
    /// Vulkan entry (kept for surface creation)
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    /// Vulkan logical device
    pub(crate) device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,

    pub(crate) graphics_queue: vk::Queue,
    pub(crate) graphics_queue_family: u32,
    /// Present queue (may be the same as graphics)
    pub(crate) present_queue: vk::Queue,

    /// Debug utils loader and messenger (None unless built with `vulkan-validation`)
    pub(crate) debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        present_queue: vk::Queue,
        debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    ) -> Self {
        Self {
            entry,
            instance,
            physical_device,
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            graphics_queue_family,
            present_queue,
            debug_messenger,
        }
    }

    fn lock_allocator(&self) -> Result<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| Error::BackendError("GPU allocator mutex poisoned".to_string()))
    }

    /// Allocate memory; running out maps to `ResourceExhausted`
    pub(crate) fn allocate(&self, desc: &AllocationCreateDesc) -> Result<Allocation> {
        let size = desc.requirements.size;
        self.lock_allocator()?.allocate(desc).map_err(|e| {
            let size_mb = size as f64 / (1024.0 * 1024.0);
            engine_error!("ssao::vulkan", "Allocation of '{}' failed ({:.2} MB): {}", desc.name, size_mb, e);
            match e {
                AllocationError::OutOfMemory => {
                    Error::ResourceExhausted(format!("out of GPU memory for '{}' ({:.2} MB)", desc.name, size_mb))
                }
                other => Error::BackendError(format!("allocation of '{}' failed: {}", desc.name, other)),
            }
        })
    }

    /// Return an allocation to the allocator. Never fails loudly: this runs in Drop.
    pub(crate) fn free(&self, allocation: Allocation) {
        if let Ok(mut allocator) = self.allocator.lock() {
            if let Err(e) = allocator.free(allocation) {
                engine_error!("ssao::vulkan", "Failed to free GPU allocation: {}", e);
            }
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // 1. Free VkDeviceMemory pages while the device is alive
            ManuallyDrop::drop(&mut self.allocator);

            // 2. Silence the validation callback, then destroy the messenger
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                #[cfg(feature = "vulkan-validation")]
                crate::debug::cleanup_debug_config();
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 3. Device, then instance
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
