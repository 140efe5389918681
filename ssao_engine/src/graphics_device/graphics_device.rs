/// GraphicsDevice trait - factory for GPU resources
///
/// Every component that creates GPU objects receives the device explicitly;
/// there is no process-wide "current device".

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    Texture, TextureDesc, TextureFormat, TextureUsage,
    Buffer, BufferDesc,
    Shader, ShaderDesc,
    Sampler, SamplerDesc,
    RenderPass, RenderPassDesc,
    Framebuffer, FramebufferDesc,
    Pipeline, PipelineDesc,
    BindingGroup, BindingGroupBudget, BindingResource,
    CommandList,
};

/// Graphics device trait
///
/// Created resources are reference counted and free their GPU memory when
/// the last `Arc` is dropped.
pub trait GraphicsDevice: Send + Sync {
    /// Create an image with its view and backing memory
    ///
    /// Fails with `ResourceExhausted` when memory cannot be allocated.
    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a buffer. Uniform buffers are persistently mapped.
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a shader module from SPIR-V
    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Create an immutable sampler
    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Arc<dyn Sampler>>;

    /// Create a render pass with its attachment descriptions and dependencies
    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    /// Create a framebuffer binding attachments to a render pass
    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// Create a graphics pipeline and its layout
    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>>;

    /// Create a binding group for `set_index` of `pipeline`'s layout
    ///
    /// `resources` are written to bindings 0..n in order.
    fn create_binding_group(
        &self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>>;

    /// Size the binding group pool for the frames in flight
    fn reserve_binding_groups(&self, _budget: BindingGroupBudget) -> Result<()> {
        Ok(())
    }

    /// Allocate a primary command list
    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Whether `format` supports `usage` with optimal tiling
    fn supports_format(&self, format: TextureFormat, usage: TextureUsage) -> bool;

    /// Block until the device is idle
    fn wait_idle(&self) -> Result<()>;
}
