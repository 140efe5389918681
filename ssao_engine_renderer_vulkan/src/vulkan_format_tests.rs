//! Unit tests for the Vulkan conversion and validation helpers
//!
//! Pure functions only; nothing here touches a GPU.

use super::*;
use ssao_engine::ssao::device::{
    derive_aspect, BindingGroupLayoutDesc, BindingSlotDesc, ColorBlendState, DepthStencilState, RasterizationState,
    RenderPass, Shader, ShaderBinding, ShaderStage, ShaderStageFlags, TextureFormat, VertexLayout,
};
use std::sync::Arc;

// ============================================================================
// HELPERS
// ============================================================================

struct TestShader {
    label: String,
    stage: ShaderStage,
    bindings: Vec<ShaderBinding>,
}

impl Shader for TestShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn bindings(&self) -> &[ShaderBinding] {
        &self.bindings
    }
}

struct TestRenderPass;

impl RenderPass for TestRenderPass {
    fn label(&self) -> &str {
        "test pass"
    }

    fn color_attachment_count(&self) -> usize {
        1
    }

    fn has_depth_stencil(&self) -> bool {
        false
    }
}

fn shader(label: &str, stage: ShaderStage, bindings: &[(u32, u32)]) -> Arc<dyn Shader> {
    Arc::new(TestShader {
        label: label.to_string(),
        stage,
        bindings: bindings.iter().map(|&(set, binding)| ShaderBinding { set, binding }).collect(),
    })
}

fn pipeline_desc(
    fragment_bindings: &[(u32, u32)],
    layouts: Vec<BindingGroupLayoutDesc>,
) -> PipelineDesc {
    PipelineDesc {
        label: "test pipeline".to_string(),
        render_pass: Arc::new(TestRenderPass),
        vertex_shader: shader("fullscreen.vert", ShaderStage::Vertex, &[]),
        fragment_shader: shader("occlusion.frag", ShaderStage::Fragment, fragment_bindings),
        specialization: Vec::new(),
        vertex_layout: VertexLayout::default(),
        topology: PrimitiveTopology::TriangleList,
        rasterization: RasterizationState::default(),
        depth_stencil: DepthStencilState::default(),
        color_blend_attachments: vec![ColorBlendState::default()],
        binding_group_layouts: layouts,
    }
}

// ============================================================================
// TEXTURE FORMAT TESTS
// ============================================================================

#[test]
fn test_format_to_vk_color_formats() {
    assert_eq!(format_to_vk(TextureFormat::R8_UNORM), vk::Format::R8_UNORM);
    assert_eq!(format_to_vk(TextureFormat::R8G8B8A8_UNORM), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(format_to_vk(TextureFormat::B8G8R8A8_SRGB), vk::Format::B8G8R8A8_SRGB);
    assert_eq!(format_to_vk(TextureFormat::R32G32B32A32_SFLOAT), vk::Format::R32G32B32A32_SFLOAT);
}

#[test]
fn test_format_to_vk_depth_formats() {
    assert_eq!(format_to_vk(TextureFormat::D16_UNORM), vk::Format::D16_UNORM);
    assert_eq!(format_to_vk(TextureFormat::D32_FLOAT), vk::Format::D32_SFLOAT);
    assert_eq!(format_to_vk(TextureFormat::D24_UNORM_S8_UINT), vk::Format::D24_UNORM_S8_UINT);
    assert_eq!(format_to_vk(TextureFormat::D32_FLOAT_S8_UINT), vk::Format::D32_SFLOAT_S8_UINT);
}

#[test]
fn test_format_from_vk_inverts_format_to_vk() {
    let formats = [
        TextureFormat::R8_UNORM,
        TextureFormat::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB,
        TextureFormat::R32G32B32A32_SFLOAT,
        TextureFormat::D16_UNORM,
        TextureFormat::D32_FLOAT,
        TextureFormat::D16_UNORM_S8_UINT,
        TextureFormat::D24_UNORM_S8_UINT,
        TextureFormat::D32_FLOAT_S8_UINT,
    ];
    for format in formats {
        assert_eq!(format_from_vk(format_to_vk(format)), Some(format));
    }
}

#[test]
fn test_format_from_vk_unknown_surface_format() {
    assert_eq!(format_from_vk(vk::Format::A2B10G10R10_UNORM_PACK32), None);
    assert_eq!(format_from_vk(vk::Format::UNDEFINED), None);
}

// ============================================================================
// USAGE AND ASPECT TESTS
// ============================================================================

#[test]
fn test_texture_usage_to_vk_sampled_attachment() {
    let flags = texture_usage_to_vk(TextureUsage::SAMPLED | TextureUsage::COLOR_ATTACHMENT);
    assert_eq!(flags, vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::COLOR_ATTACHMENT);
}

#[test]
fn test_format_features_for_depth_attachment() {
    assert_eq!(
        format_features_for(TextureUsage::DEPTH_STENCIL_ATTACHMENT),
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
    );
}

#[test]
fn test_aspect_to_vk_depth_stencil() {
    let flags = aspect_to_vk(AspectMask::DEPTH | AspectMask::STENCIL);
    assert_eq!(flags, vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL);
}

#[test]
fn test_combined_depth_attachment_keeps_stencil_aspect() {
    for format in [TextureFormat::D16_UNORM_S8_UINT, TextureFormat::D24_UNORM_S8_UINT, TextureFormat::D32_FLOAT_S8_UINT] {
        let aspect = derive_aspect(format);
        assert_eq!(aspect_to_vk(aspect), vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL);
        assert_eq!(view_aspect_to_vk(aspect), vk::ImageAspectFlags::DEPTH);
    }
    assert_eq!(aspect_to_vk(derive_aspect(TextureFormat::D32_FLOAT)), vk::ImageAspectFlags::DEPTH);
}

#[test]
fn test_view_aspect_to_vk_reads_depth_only() {
    assert_eq!(view_aspect_to_vk(AspectMask::DEPTH | AspectMask::STENCIL), vk::ImageAspectFlags::DEPTH);
    assert_eq!(view_aspect_to_vk(AspectMask::COLOR), vk::ImageAspectFlags::COLOR);
}

// ============================================================================
// PIPELINE STATE TESTS
// ============================================================================

#[test]
fn test_color_write_mask_all() {
    let expected = vk::ColorComponentFlags::R
        | vk::ColorComponentFlags::G
        | vk::ColorComponentFlags::B
        | vk::ColorComponentFlags::A;
    assert_eq!(color_write_mask_to_vk(ColorWriteMask::all()), expected);
}

#[test]
fn test_color_write_mask_single_channel() {
    assert_eq!(color_write_mask_to_vk(ColorWriteMask::R), vk::ColorComponentFlags::R);
}

#[test]
fn test_attachments_are_single_sampled() {
    let desc = attachment_desc_to_vk(&AttachmentDesc::cleared(TextureFormat::R8_UNORM, ImageLayout::ShaderReadOnly));
    assert_eq!(desc.samples, vk::SampleCountFlags::TYPE_1);
    assert_eq!(desc.load_op, vk::AttachmentLoadOp::CLEAR);
}

#[test]
fn test_compare_op_less_or_equal() {
    assert_eq!(compare_op_to_vk(CompareOp::LessOrEqual), vk::CompareOp::LESS_OR_EQUAL);
}

#[test]
fn test_stage_flags_to_vk_both_stages() {
    let flags = stage_flags_to_vk(ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT);
    assert_eq!(flags, vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT);
}

// ============================================================================
// RENDER PASS TESTS
// ============================================================================

#[test]
fn test_image_layout_to_vk_sampled_depth() {
    assert_eq!(
        image_layout_to_vk(ImageLayout::DepthStencilReadOnly),
        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
    );
    assert_eq!(image_layout_to_vk(ImageLayout::PresentSrc), vk::ImageLayout::PRESENT_SRC_KHR);
}

#[test]
fn test_subpass_external() {
    assert_eq!(subpass_to_vk(SubpassRef::External), vk::SUBPASS_EXTERNAL);
    assert_eq!(subpass_to_vk(SubpassRef::Index(0)), 0);
}

#[test]
fn test_pipeline_stages_combined() {
    let stages = pipeline_stages_to_vk(PipelineStages::COLOR_ATTACHMENT_OUTPUT | PipelineStages::FRAGMENT_SHADER);
    assert_eq!(
        stages,
        vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::FRAGMENT_SHADER
    );
}

#[test]
fn test_access_flags_empty() {
    assert_eq!(access_flags_to_vk(AccessFlags::empty()), vk::AccessFlags::empty());
}

#[test]
fn test_access_flags_write_then_read() {
    let access = access_flags_to_vk(AccessFlags::COLOR_ATTACHMENT_WRITE | AccessFlags::SHADER_READ);
    assert_eq!(access, vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::SHADER_READ);
}

// ============================================================================
// ACQUIRE ERROR TESTS
// ============================================================================

#[test]
fn test_acquire_error_timeout_is_frame_timeout() {
    assert!(matches!(acquire_error(vk::Result::TIMEOUT), Error::FrameTimeout));
    assert!(matches!(acquire_error(vk::Result::NOT_READY), Error::FrameTimeout));
    assert!(acquire_error(vk::Result::TIMEOUT).is_recoverable());
}

#[test]
fn test_acquire_error_out_of_date() {
    assert!(matches!(acquire_error(vk::Result::ERROR_OUT_OF_DATE_KHR), Error::SurfaceOutOfDate));
}

#[test]
fn test_acquire_error_device_lost_is_fatal() {
    let error = acquire_error(vk::Result::ERROR_DEVICE_LOST);
    assert!(matches!(error, Error::DeviceLost));
    assert!(error.is_fatal());
}

// ============================================================================
// SPIR-V TESTS
// ============================================================================

#[test]
fn test_spirv_words_little_endian() {
    let bytes = [0x03, 0x02, 0x23, 0x07, 0x00, 0x00, 0x01, 0x00];
    let words = spirv_words(&bytes).unwrap();
    assert_eq!(words, vec![0x0723_0203, 0x0001_0000]);
}

#[test]
fn test_spirv_words_rejects_empty() {
    assert!(matches!(spirv_words(&[]), Err(Error::InvalidResource(_))));
}

#[test]
fn test_spirv_words_rejects_misaligned_length() {
    assert!(matches!(spirv_words(&[0x03, 0x02, 0x23, 0x07, 0x00]), Err(Error::InvalidResource(_))));
}

// ============================================================================
// SHADER BINDING VALIDATION TESTS
// ============================================================================

#[test]
fn test_validate_shader_bindings_declared() {
    let layouts = vec![BindingGroupLayoutDesc {
        entries: vec![
            BindingSlotDesc::uniform(0, ShaderStageFlags::FRAGMENT),
            BindingSlotDesc::sampled(1, ShaderStageFlags::FRAGMENT),
        ],
    }];
    let desc = pipeline_desc(&[(0, 0), (0, 1)], layouts);
    assert!(validate_shader_bindings(&desc).is_ok());
}

#[test]
fn test_validate_shader_bindings_missing_binding() {
    let layouts = vec![BindingGroupLayoutDesc {
        entries: vec![BindingSlotDesc::uniform(0, ShaderStageFlags::FRAGMENT)],
    }];
    let desc = pipeline_desc(&[(0, 0), (0, 2)], layouts);
    assert!(matches!(validate_shader_bindings(&desc), Err(Error::InvalidResource(_))));
}

#[test]
fn test_validate_shader_bindings_missing_set() {
    let layouts = vec![BindingGroupLayoutDesc {
        entries: vec![BindingSlotDesc::uniform(0, ShaderStageFlags::FRAGMENT)],
    }];
    let desc = pipeline_desc(&[(1, 0)], layouts);
    assert!(matches!(validate_shader_bindings(&desc), Err(Error::InvalidResource(_))));
}

#[test]
fn test_validate_shader_bindings_unreflected_shader() {
    // Shaders without reflection data declare nothing and always pass
    let desc = pipeline_desc(&[], Vec::new());
    assert!(validate_shader_bindings(&desc).is_ok());
}
