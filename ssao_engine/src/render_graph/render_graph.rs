/// Render-target graph: the G-buffer, occlusion and blur targets of a frame.
///
/// Built once per device. `resize()` swaps attachments and framebuffers but
/// keeps the render passes, so pipelines created against them stay valid.

use std::sync::Arc;
use crate::attachment::{self, Attachment, AttachmentKind};
use crate::error::{Error, Result};
use crate::graphics_device::{
    ClearValue, FramebufferDesc, GraphicsDevice, RenderPass, Texture, TextureFormat,
};
use super::dependencies::{gbuffer_pass_desc, single_attachment_pass_desc, GBUFFER_CLEAR_COLOR};
use super::render_target::{OcclusionScale, RenderTarget, TargetId};

/// G-buffer color attachments, in framebuffer order
pub const GBUFFER_COLOR_FORMATS: [(&str, TextureFormat); 3] = [
    ("position", TextureFormat::R32G32B32A32_SFLOAT),
    ("normal", TextureFormat::R8G8B8A8_UNORM),
    ("albedo", TextureFormat::R8G8B8A8_UNORM),
];

/// Format of the raw and blurred occlusion terms
pub const OCCLUSION_FORMAT: TextureFormat = TextureFormat::R8_UNORM;

pub struct RenderTargetGraph {
    gbuffer: RenderTarget,
    occlusion: RenderTarget,
    blur: RenderTarget,
    depth_format: TextureFormat,
    scale: OcclusionScale,
    width: u32,
    height: u32,
}

impl RenderTargetGraph {
    /// Build the G-buffer, occlusion and blur targets, in that order
    ///
    /// # Errors
    ///
    /// * `UnsupportedFormat` - no usable depth format, or a color format is
    ///   not renderable
    /// * `ResourceExhausted` - attachment memory could not be allocated
    pub fn new(device: &dyn GraphicsDevice, width: u32, height: u32, scale: OcclusionScale) -> Result<Self> {
        check_extent(width, height)?;
        let depth_format = attachment::select_depth_format(device)?;

        let gbuffer_pass = device.create_render_pass(&gbuffer_pass_desc(depth_format))?;
        let occlusion_pass = device.create_render_pass(&single_attachment_pass_desc(TargetId::Occlusion))?;
        let blur_pass = device.create_render_pass(&single_attachment_pass_desc(TargetId::OcclusionBlur))?;

        let gbuffer = build_target(device, TargetId::GBuffer, gbuffer_pass, depth_format, scale, width, height)?;
        let occlusion = build_target(device, TargetId::Occlusion, occlusion_pass, depth_format, scale, width, height)?;
        let blur = build_target(device, TargetId::OcclusionBlur, blur_pass, depth_format, scale, width, height)?;

        crate::engine_info!("ssao::RenderTargetGraph",
            "Created targets {}x{} (occlusion {}x{}, depth {:?})",
            width, height, occlusion.width(), occlusion.height(), depth_format);

        Ok(Self { gbuffer, occlusion, blur, depth_format, scale, width, height })
    }

    /// Recreate every size-dependent attachment and framebuffer
    ///
    /// The caller must ensure the GPU no longer uses the old targets.
    pub fn resize(&mut self, device: &dyn GraphicsDevice, width: u32, height: u32) -> Result<()> {
        check_extent(width, height)?;

        let gbuffer = build_target(
            device, TargetId::GBuffer, self.gbuffer.render_pass().clone(),
            self.depth_format, self.scale, width, height,
        )?;
        let occlusion = build_target(
            device, TargetId::Occlusion, self.occlusion.render_pass().clone(),
            self.depth_format, self.scale, width, height,
        )?;
        let blur = build_target(
            device, TargetId::OcclusionBlur, self.blur.render_pass().clone(),
            self.depth_format, self.scale, width, height,
        )?;

        self.gbuffer = gbuffer;
        self.occlusion = occlusion;
        self.blur = blur;
        self.width = width;
        self.height = height;

        crate::engine_debug!("ssao::RenderTargetGraph", "Resized targets to {}x{}", width, height);
        Ok(())
    }

    pub fn target(&self, id: TargetId) -> &RenderTarget {
        match id {
            TargetId::GBuffer => &self.gbuffer,
            TargetId::Occlusion => &self.occlusion,
            TargetId::OcclusionBlur => &self.blur,
        }
    }

    pub fn render_pass(&self, id: TargetId) -> &Arc<dyn RenderPass> {
        self.target(id).render_pass()
    }

    pub fn clear_values(&self, id: TargetId) -> &[ClearValue] {
        self.target(id).clear_values()
    }

    /// G-buffer color attachment by name ("position", "normal", "albedo")
    pub fn gbuffer_attachment(&self, name: &str) -> Option<&Attachment> {
        GBUFFER_COLOR_FORMATS
            .iter()
            .position(|(label, _)| *label == name)
            .and_then(|index| self.gbuffer.attachment(index))
    }

    pub fn depth_format(&self) -> TextureFormat {
        self.depth_format
    }

    pub fn scale(&self) -> OcclusionScale {
        self.scale
    }

    /// Output extent (G-buffer and blur size)
    pub fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

fn check_extent(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidState(format!("cannot build render targets of size {}x{}", width, height)));
    }
    Ok(())
}

/// Extent of `id` for an output of `width` x `height`
pub(crate) fn target_extent(id: TargetId, scale: OcclusionScale, width: u32, height: u32) -> (u32, u32) {
    match id {
        TargetId::Occlusion => scale.apply(width, height),
        TargetId::GBuffer | TargetId::OcclusionBlur => (width, height),
    }
}

fn attachment_layout(id: TargetId, depth_format: TextureFormat) -> Vec<(String, TextureFormat, AttachmentKind)> {
    match id {
        TargetId::GBuffer => {
            let mut layout: Vec<_> = GBUFFER_COLOR_FORMATS
                .iter()
                .map(|(label, format)| (label.to_string(), *format, AttachmentKind::Color))
                .collect();
            layout.push(("depth".to_string(), depth_format, AttachmentKind::DepthStencil));
            layout
        }
        TargetId::Occlusion | TargetId::OcclusionBlur => {
            vec![(id.label().to_string(), OCCLUSION_FORMAT, AttachmentKind::Color)]
        }
    }
}

fn clear_values_for(attachments: &[Attachment]) -> Vec<ClearValue> {
    attachments
        .iter()
        .map(|attachment| match attachment.kind() {
            AttachmentKind::Color => ClearValue::Color(GBUFFER_CLEAR_COLOR),
            AttachmentKind::DepthStencil => ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        })
        .collect()
}

fn build_target(
    device: &dyn GraphicsDevice,
    id: TargetId,
    render_pass: Arc<dyn RenderPass>,
    depth_format: TextureFormat,
    scale: OcclusionScale,
    width: u32,
    height: u32,
) -> Result<RenderTarget> {
    let (target_width, target_height) = target_extent(id, scale, width, height);

    let attachments = attachment_layout(id, depth_format)
        .into_iter()
        .map(|(label, format, kind)| {
            attachment::create_attachment(device, &label, format, kind, target_width, target_height)
        })
        .collect::<Result<Vec<_>>>()?;

    let textures: Vec<Arc<dyn Texture>> = attachments.iter().map(|a| a.texture().clone()).collect();
    let framebuffer = device.create_framebuffer(&FramebufferDesc {
        label: id.label().to_string(),
        render_pass: &render_pass,
        attachments: &textures,
        width: target_width,
        height: target_height,
    })?;

    let clear_values = clear_values_for(&attachments);
    Ok(RenderTarget::new(id, target_width, target_height, render_pass, framebuffer, attachments, clear_values))
}

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;
