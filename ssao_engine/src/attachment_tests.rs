/// Tests for the attachment manager
///
/// These tests run against the mock device, which can be told to reject
/// formats or fail allocations.

use super::*;
use std::sync::atomic::Ordering;
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;

// ============================================================================
// Tests: Aspect derivation
// ============================================================================

#[test]
fn test_color_formats_derive_color_aspect() {
    assert_eq!(derive_aspect(TextureFormat::R8_UNORM), AspectMask::COLOR);
    assert_eq!(derive_aspect(TextureFormat::R8G8B8A8_UNORM), AspectMask::COLOR);
    assert_eq!(derive_aspect(TextureFormat::R32G32B32A32_SFLOAT), AspectMask::COLOR);
}

#[test]
fn test_depth_only_formats_derive_depth_aspect() {
    assert_eq!(derive_aspect(TextureFormat::D16_UNORM), AspectMask::DEPTH);
    assert_eq!(derive_aspect(TextureFormat::D32_FLOAT), AspectMask::DEPTH);
}

#[test]
fn test_stencil_formats_derive_depth_and_stencil_aspect() {
    for format in [
        TextureFormat::D16_UNORM_S8_UINT,
        TextureFormat::D24_UNORM_S8_UINT,
        TextureFormat::D32_FLOAT_S8_UINT,
    ] {
        assert_eq!(derive_aspect(format), AspectMask::DEPTH | AspectMask::STENCIL);
    }
}

// ============================================================================
// Tests: Depth format selection
// ============================================================================

#[test]
fn test_select_depth_format_prefers_first_candidate() {
    let device = MockGraphicsDevice::new();
    assert_eq!(select_depth_format(&device).unwrap(), TextureFormat::D32_FLOAT_S8_UINT);
}

#[test]
fn test_select_depth_format_skips_unsupported() {
    let device = MockGraphicsDevice::new();
    device.set_unsupported(&[TextureFormat::D32_FLOAT_S8_UINT, TextureFormat::D32_FLOAT]);
    assert_eq!(select_depth_format(&device).unwrap(), TextureFormat::D24_UNORM_S8_UINT);
}

#[test]
fn test_select_depth_format_is_idempotent() {
    let device = MockGraphicsDevice::new();
    device.set_unsupported(&[TextureFormat::D32_FLOAT_S8_UINT]);
    let first = select_depth_format(&device).unwrap();
    let second = select_depth_format(&device).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, TextureFormat::D32_FLOAT);
}

#[test]
fn test_select_depth_format_last_resort() {
    let device = MockGraphicsDevice::new();
    device.set_unsupported(&DEPTH_FORMAT_CANDIDATES[..4]);
    assert_eq!(select_depth_format(&device).unwrap(), TextureFormat::D16_UNORM);
}

#[test]
fn test_select_depth_format_none_supported() {
    let device = MockGraphicsDevice::new();
    device.set_unsupported(&DEPTH_FORMAT_CANDIDATES);
    match select_depth_format(&device) {
        Err(Error::UnsupportedFormat(_)) => {}
        other => panic!("expected UnsupportedFormat, got {:?}", other.map(|_| ())),
    }
}

// ============================================================================
// Tests: Attachment creation
// ============================================================================

#[test]
fn test_create_color_attachment() {
    let device = MockGraphicsDevice::new();
    let attachment = create_attachment(
        &device, "position", TextureFormat::R32G32B32A32_SFLOAT, AttachmentKind::Color, 1920, 1080,
    ).unwrap();

    assert_eq!(attachment.label(), "position");
    assert_eq!(attachment.width(), 1920);
    assert_eq!(attachment.height(), 1080);
    assert_eq!(attachment.format(), TextureFormat::R32G32B32A32_SFLOAT);
    assert_eq!(attachment.kind(), AttachmentKind::Color);
    assert_eq!(attachment.aspect(), AspectMask::COLOR);
    let usage = attachment.texture().info().usage;
    assert!(usage.contains(TextureUsage::COLOR_ATTACHMENT));
    assert!(usage.contains(TextureUsage::SAMPLED));
}

#[test]
fn test_create_depth_attachment() {
    let device = MockGraphicsDevice::new();
    let attachment = create_attachment(
        &device, "depth", TextureFormat::D24_UNORM_S8_UINT, AttachmentKind::DepthStencil, 640, 480,
    ).unwrap();

    assert_eq!(attachment.aspect(), AspectMask::DEPTH | AspectMask::STENCIL);
    let usage = attachment.texture().info().usage;
    assert!(usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT));
    assert!(usage.contains(TextureUsage::SAMPLED));
}

#[test]
fn test_attachments_use_dedicated_allocations() {
    let device = MockGraphicsDevice::new();
    let _attachment = create_attachment(
        &device, "albedo", TextureFormat::R8G8B8A8_UNORM, AttachmentKind::Color, 64, 64,
    ).unwrap();

    assert_eq!(device.entries_with_prefix("create_texture:albedo").len(), 1);
    assert_eq!(device.live_texture_count(), 1);
}

#[test]
fn test_create_attachment_rejects_unsupported_format() {
    let device = MockGraphicsDevice::new();
    device.set_unsupported(&[TextureFormat::R8_UNORM]);
    let result = create_attachment(&device, "ao", TextureFormat::R8_UNORM, AttachmentKind::Color, 64, 64);
    assert!(matches!(result, Err(Error::UnsupportedFormat(_))));
    assert_eq!(device.live_texture_count(), 0);
}

#[test]
fn test_create_attachment_propagates_allocation_failure() {
    let device = MockGraphicsDevice::new();
    device.fail_texture_allocation.store(true, Ordering::SeqCst);
    let result = create_attachment(&device, "normal", TextureFormat::R8G8B8A8_UNORM, AttachmentKind::Color, 64, 64);
    assert!(matches!(result, Err(Error::ResourceExhausted(_))));
}

#[test]
fn test_dropping_attachment_releases_texture() {
    let device = MockGraphicsDevice::new();
    let attachment = create_attachment(
        &device, "blur", TextureFormat::R8_UNORM, AttachmentKind::Color, 32, 32,
    ).unwrap();
    let copy = attachment.clone();
    drop(attachment);
    assert_eq!(device.live_texture_count(), 1);
    drop(copy);
    assert_eq!(device.live_texture_count(), 0);
}
