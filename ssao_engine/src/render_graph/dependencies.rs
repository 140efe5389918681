/// Render pass descriptions and their external dependencies.
///
/// Each pass of the frame is a single subpass. Ordering between passes is
/// expressed only through these dependencies; the frame loop never records
/// explicit barriers.

use crate::graphics_device::{
    AccessFlags, AttachmentDesc, DependencyFlags, ImageLayout, LoadOp, PipelineStages,
    RenderPassDesc, StoreOp, SubpassDependency, SubpassRef, TextureFormat,
};
use super::render_graph::{GBUFFER_COLOR_FORMATS, OCCLUSION_FORMAT};
use super::render_target::TargetId;

/// Clear color of every offscreen color attachment
pub const GBUFFER_CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Clear color of the swapchain image
pub const PRESENTATION_CLEAR_COLOR: [f32; 4] = [0.025, 0.025, 0.025, 1.0];

/// Dependencies of the G-buffer pass
///
/// Depth writes of the previous frame finish before this frame's depth
/// test; shader reads of the previous frame's colors finish before they are
/// overwritten; color writes are visible to later fragment-shader reads.
pub fn gbuffer_dependencies() -> Vec<SubpassDependency> {
    let fragment_tests = PipelineStages::EARLY_FRAGMENT_TESTS | PipelineStages::LATE_FRAGMENT_TESTS;
    vec![
        SubpassDependency {
            src_subpass: SubpassRef::External,
            dst_subpass: SubpassRef::Index(0),
            src_stages: fragment_tests,
            dst_stages: fragment_tests,
            src_access: AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            dst_access: AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE | AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
            flags: DependencyFlags::empty(),
        },
        SubpassDependency {
            src_subpass: SubpassRef::External,
            dst_subpass: SubpassRef::Index(0),
            src_stages: PipelineStages::FRAGMENT_SHADER,
            dst_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            src_access: AccessFlags::SHADER_READ,
            dst_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
            flags: DependencyFlags::BY_REGION,
        },
        SubpassDependency {
            src_subpass: SubpassRef::Index(0),
            dst_subpass: SubpassRef::External,
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            dst_stages: PipelineStages::FRAGMENT_SHADER,
            src_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_access: AccessFlags::SHADER_READ,
            flags: DependencyFlags::BY_REGION,
        },
    ]
}

/// Dependencies of the occlusion and blur passes
pub fn single_attachment_dependencies() -> Vec<SubpassDependency> {
    let color_access = AccessFlags::COLOR_ATTACHMENT_READ | AccessFlags::COLOR_ATTACHMENT_WRITE;
    vec![
        SubpassDependency {
            src_subpass: SubpassRef::External,
            dst_subpass: SubpassRef::Index(0),
            src_stages: PipelineStages::BOTTOM_OF_PIPE,
            dst_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            src_access: AccessFlags::MEMORY_READ,
            dst_access: color_access,
            flags: DependencyFlags::BY_REGION,
        },
        SubpassDependency {
            src_subpass: SubpassRef::Index(0),
            dst_subpass: SubpassRef::External,
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            dst_stages: PipelineStages::BOTTOM_OF_PIPE,
            src_access: color_access,
            dst_access: AccessFlags::MEMORY_READ,
            flags: DependencyFlags::BY_REGION,
        },
    ]
}

/// Dependencies of the swapchain pass the composition renders into
pub fn presentation_dependencies() -> Vec<SubpassDependency> {
    let fragment_tests = PipelineStages::EARLY_FRAGMENT_TESTS | PipelineStages::LATE_FRAGMENT_TESTS;
    vec![
        SubpassDependency {
            src_subpass: SubpassRef::External,
            dst_subpass: SubpassRef::Index(0),
            src_stages: fragment_tests,
            dst_stages: fragment_tests,
            src_access: AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            dst_access: AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE | AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ,
            flags: DependencyFlags::empty(),
        },
        SubpassDependency {
            src_subpass: SubpassRef::External,
            dst_subpass: SubpassRef::Index(0),
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            dst_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            src_access: AccessFlags::empty(),
            dst_access: AccessFlags::COLOR_ATTACHMENT_WRITE | AccessFlags::COLOR_ATTACHMENT_READ,
            flags: DependencyFlags::empty(),
        },
    ]
}

/// G-buffer render pass: three sampled colors plus a read-only depth
pub fn gbuffer_pass_desc(depth_format: TextureFormat) -> RenderPassDesc {
    RenderPassDesc {
        label: TargetId::GBuffer.label().to_string(),
        color_attachments: GBUFFER_COLOR_FORMATS
            .iter()
            .map(|(_, format)| AttachmentDesc::cleared(*format, ImageLayout::ShaderReadOnly))
            .collect(),
        depth_stencil_attachment: Some(AttachmentDesc::cleared(depth_format, ImageLayout::DepthStencilReadOnly)),
        dependencies: gbuffer_dependencies(),
    }
}

/// Occlusion or blur render pass: one sampled color
pub fn single_attachment_pass_desc(id: TargetId) -> RenderPassDesc {
    RenderPassDesc {
        label: id.label().to_string(),
        color_attachments: vec![AttachmentDesc::cleared(OCCLUSION_FORMAT, ImageLayout::ShaderReadOnly)],
        depth_stencil_attachment: None,
        dependencies: single_attachment_dependencies(),
    }
}

/// Swapchain render pass used by backends for the composition
pub fn presentation_pass_desc(color_format: TextureFormat, depth_format: TextureFormat) -> RenderPassDesc {
    RenderPassDesc {
        label: "presentation".to_string(),
        color_attachments: vec![AttachmentDesc::cleared(color_format, ImageLayout::PresentSrc)],
        depth_stencil_attachment: Some(AttachmentDesc {
            store_op: StoreOp::DontCare,
            stencil_load_op: LoadOp::DontCare,
            ..AttachmentDesc::cleared(depth_format, ImageLayout::DepthStencilAttachment)
        }),
        dependencies: presentation_dependencies(),
    }
}

#[cfg(test)]
#[path = "dependencies_tests.rs"]
mod tests;
