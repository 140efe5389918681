/// Framebuffer trait - binds attachments to a render pass
///
/// Framebuffers are sized: they are recreated whenever the output
/// resolution changes, while the render pass they target is kept.

use std::sync::Arc;
use crate::graphics_device::{RenderPass, Texture};

/// Framebuffer trait
pub trait Framebuffer: Send + Sync {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Number of attachments (colors and depth)
    fn attachment_count(&self) -> usize;

    /// Debug label
    fn label(&self) -> &str;
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc<'a> {
    /// Debug label
    pub label: String,
    /// The render pass this framebuffer is compatible with
    pub render_pass: &'a Arc<dyn RenderPass>,
    /// Attachments in render pass order (colors first, then depth)
    pub attachments: &'a [Arc<dyn Texture>],
    pub width: u32,
    pub height: u32,
}
