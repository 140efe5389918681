/// Render target: one render pass, its framebuffer and the attachments
/// behind it.
///
/// The render pass is size-independent and survives a resize; the
/// framebuffer and attachments are replaced.

use std::sync::Arc;
use crate::attachment::Attachment;
use crate::graphics_device::{ClearValue, Framebuffer, RenderPass};

/// The offscreen targets of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetId {
    /// Position, normal, albedo and depth
    GBuffer,
    /// Raw occlusion term
    Occlusion,
    /// Blurred occlusion term
    OcclusionBlur,
}

impl TargetId {
    pub const ALL: [TargetId; 3] = [TargetId::GBuffer, TargetId::Occlusion, TargetId::OcclusionBlur];

    pub fn label(&self) -> &'static str {
        match self {
            TargetId::GBuffer => "gbuffer",
            TargetId::Occlusion => "occlusion",
            TargetId::OcclusionBlur => "occlusion_blur",
        }
    }
}

/// Resolution of the occlusion target relative to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcclusionScale {
    #[default]
    Full,
    Half,
}

impl OcclusionScale {
    pub fn divisor(&self) -> u32 {
        match self {
            OcclusionScale::Full => 1,
            OcclusionScale::Half => 2,
        }
    }

    /// Scaled extent, never below one pixel
    pub fn apply(&self, width: u32, height: u32) -> (u32, u32) {
        let divisor = self.divisor();
        ((width / divisor).max(1), (height / divisor).max(1))
    }
}

pub struct RenderTarget {
    id: TargetId,
    width: u32,
    height: u32,
    render_pass: Arc<dyn RenderPass>,
    framebuffer: Arc<dyn Framebuffer>,
    /// Colors first, then depth
    attachments: Vec<Attachment>,
    clear_values: Vec<ClearValue>,
}

impl RenderTarget {
    pub(crate) fn new(
        id: TargetId,
        width: u32,
        height: u32,
        render_pass: Arc<dyn RenderPass>,
        framebuffer: Arc<dyn Framebuffer>,
        attachments: Vec<Attachment>,
        clear_values: Vec<ClearValue>,
    ) -> Self {
        Self { id, width, height, render_pass, framebuffer, attachments, clear_values }
    }

    pub fn id(&self) -> TargetId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn render_pass(&self) -> &Arc<dyn RenderPass> {
        &self.render_pass
    }

    pub fn framebuffer(&self) -> &Arc<dyn Framebuffer> {
        &self.framebuffer
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Attachment at `index`, in framebuffer order
    pub fn attachment(&self, index: usize) -> Option<&Attachment> {
        self.attachments.get(index)
    }

    /// One clear value per attachment, in framebuffer order
    pub fn clear_values(&self) -> &[ClearValue] {
        &self.clear_values
    }
}
