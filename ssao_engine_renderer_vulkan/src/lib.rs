/*!
# SSAO Engine - Vulkan Backend

Vulkan implementation of the `ssao_engine` device and presentation traits.

This crate provides `VulkanGraphicsDevice` (resource creation, using Ash
for the Vulkan bindings and gpu-allocator for memory) and `VulkanPresenter`
(surface, swapchain, frame fences and presentation).

```no_run
use std::sync::Arc;
use ssao_engine::ssao::Config;
use ssao_engine_renderer_vulkan::ssao::{VulkanGraphicsDevice, VulkanPresenter};
# fn run(window: &winit::window::Window) -> ssao_engine::ssao::Result<()> {
let config = Config::default();
let device = Arc::new(VulkanGraphicsDevice::new(window, &config)?);
let presenter = VulkanPresenter::new(Arc::clone(&device), window, &config)?;
# Ok(())
# }
```
*/

mod vulkan;
mod vulkan_context;
mod vulkan_texture;
mod vulkan_buffer;
mod vulkan_shader;
mod vulkan_sampler;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_pipeline;
mod vulkan_binding_group;
mod vulkan_command_list;
mod vulkan_swapchain;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub mod ssao {
    pub use crate::vulkan::VulkanGraphicsDevice;
    pub use crate::vulkan_swapchain::{VulkanFence, VulkanPresenter};
    pub use crate::vulkan_command_list::VulkanCommandList;
    pub use crate::vulkan_texture::VulkanTexture;
    pub use crate::vulkan_buffer::VulkanBuffer;
    pub use crate::vulkan_pipeline::VulkanPipeline;
    pub use crate::vulkan_binding_group::VulkanBindingGroup;

    // Validation layer reporting
    #[cfg(feature = "vulkan-validation")]
    pub use crate::debug::{ValidationStats, get_validation_stats, print_validation_stats_report};
}
