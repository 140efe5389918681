//! Integration tests for the Vulkan device and presenter
//!
//! All tests require a GPU and a display, and are marked with #[ignore].
//! Each test creates its own device, so they run one at a time.
//!
//! Run with: cargo test --test vulkan_renderer_tests -- --ignored

use std::sync::Arc;

use ssao_engine::ssao::{Config, Error};
use ssao_engine::ssao::device::{
    AttachmentKind, BindingGroupBudget, BufferDesc, BufferUsage, ClearValue, FramebufferDesc,
    GraphicsContext, GraphicsDevice, SamplerDesc, ShaderDesc, ShaderStage, TextureDesc,
    TextureFormat, TextureUsage, AspectMask, create_attachment, select_depth_format,
};
use ssao_engine::ssao::render::{
    TargetId, presentation_pass_desc, single_attachment_pass_desc, PRESENTATION_CLEAR_COLOR,
};
use ssao_engine_renderer_vulkan::ssao::{VulkanGraphicsDevice, VulkanPresenter};
use serial_test::serial;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Hidden window for Vulkan surface creation
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("SSAO Vulkan Test")
        .with_inner_size(winit::dpi::PhysicalSize::new(320, 240))
        .with_visible(false);
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

fn create_device(window: &Window) -> Arc<VulkanGraphicsDevice> {
    Arc::new(VulkanGraphicsDevice::new(window, &Config::default()).unwrap())
}

// ============================================================================
// TEXTURE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_color_attachment_texture() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let texture = device
        .create_texture(TextureDesc {
            label: "albedo".to_string(),
            width: 256,
            height: 128,
            format: TextureFormat::R8G8B8A8_UNORM,
            usage: TextureUsage::SAMPLED | TextureUsage::COLOR_ATTACHMENT,
            aspect: AspectMask::COLOR,
            dedicated: true,
        })
        .unwrap();

    let info = texture.info();
    assert_eq!(info.width, 256);
    assert_eq!(info.height, 128);
    assert_eq!(info.format, TextureFormat::R8G8B8A8_UNORM);
    assert_eq!(info.label, "albedo");
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_texture_zero_extent_fails() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let result = device.create_texture(TextureDesc {
        label: "empty".to_string(),
        width: 0,
        height: 64,
        format: TextureFormat::R8_UNORM,
        usage: TextureUsage::SAMPLED | TextureUsage::COLOR_ATTACHMENT,
        aspect: AspectMask::COLOR,
        dedicated: false,
    });
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_depth_format_is_supported() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let depth_format = select_depth_format(device.as_ref()).unwrap();
    assert!(depth_format.is_depth());
    assert!(device.supports_format(depth_format, TextureUsage::DEPTH_STENCIL_ATTACHMENT));

    let depth = create_attachment(device.as_ref(), "depth", depth_format, AttachmentKind::DepthStencil, 64, 64)
        .unwrap();
    assert!(depth.aspect().contains(AspectMask::DEPTH));
    assert_eq!(depth.aspect().contains(AspectMask::STENCIL), depth_format.has_stencil());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_combined_depth_stencil_attachment() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let format = TextureFormat::D24_UNORM_S8_UINT;
    if !device.supports_format(format, TextureUsage::DEPTH_STENCIL_ATTACHMENT) {
        return;
    }
    let depth = create_attachment(device.as_ref(), "depth", format, AttachmentKind::DepthStencil, 64, 64).unwrap();
    assert_eq!(depth.aspect(), AspectMask::DEPTH | AspectMask::STENCIL);

    // The framebuffer binds the view carrying both aspects
    let pass = device.create_render_pass(&presentation_pass_desc(TextureFormat::B8G8R8A8_UNORM, format)).unwrap();
    let color = create_attachment(
        device.as_ref(), "color", TextureFormat::B8G8R8A8_UNORM, AttachmentKind::Color, 64, 64,
    )
    .unwrap();
    let framebuffer = device.create_framebuffer(&FramebufferDesc {
        label: "depth_stencil".to_string(),
        render_pass: &pass,
        attachments: &[color.texture().clone(), depth.texture().clone()],
        width: 64,
        height: 64,
    });
    assert!(framebuffer.is_ok());
}

// ============================================================================
// BUFFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_uniform_buffer_update() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let buffer = device
        .create_buffer(BufferDesc { label: "uniforms".to_string(), size: 256, usage: BufferUsage::Uniform })
        .unwrap();

    assert_eq!(buffer.size(), 256);
    assert!(buffer.update(0, &[1u8; 64]).is_ok());
    assert!(buffer.update(192, &[2u8; 64]).is_ok());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_buffer_update_out_of_bounds() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let buffer = device
        .create_buffer(BufferDesc { label: "small".to_string(), size: 16, usage: BufferUsage::Uniform })
        .unwrap();

    assert!(buffer.update(8, &[0u8; 16]).is_err());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_buffer_zero_size_fails() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let result = device.create_buffer(BufferDesc { label: "empty".to_string(), size: 0, usage: BufferUsage::Vertex });
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// SHADER / SAMPLER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_shader_invalid_spirv() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let result = device.create_shader(ShaderDesc {
        label: "broken.frag".to_string(),
        code: &[0x01, 0x02, 0x03],
        stage: ShaderStage::Fragment,
        entry_point: "main".to_string(),
    });
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_sampler() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let sampler = device.create_sampler(&SamplerDesc::attachment_reader()).unwrap();
    assert_eq!(*sampler.desc(), SamplerDesc::attachment_reader());
}

// ============================================================================
// RENDER PASS / FRAMEBUFFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_framebuffer_attachment_count_mismatch() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let pass = device.create_render_pass(&single_attachment_pass_desc(TargetId::Occlusion)).unwrap();
    assert_eq!(pass.color_attachment_count(), 1);
    assert!(!pass.has_depth_stencil());

    let result = device.create_framebuffer(&FramebufferDesc {
        label: "occlusion".to_string(),
        render_pass: &pass,
        attachments: &[],
        width: 64,
        height: 64,
    });
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// COMMAND LIST TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_command_list_end_without_begin() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let mut cmd = device.create_command_list().unwrap();
    assert!(matches!(cmd.end(), Err(Error::InvalidState(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_command_list_draw_outside_render_pass() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let mut cmd = device.create_command_list().unwrap();
    cmd.begin().unwrap();
    assert!(matches!(cmd.draw(3, 1, 0, 0), Err(Error::InvalidState(_))));
    // begin resets an abandoned recording
    cmd.begin().unwrap();
    cmd.end().unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_reserve_binding_groups_adds_pool() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let before = device.descriptor_pool_count();
    device.reserve_binding_groups(BindingGroupBudget::for_frames(3)).unwrap();
    assert_eq!(device.descriptor_pool_count(), before + 1);
}

// ============================================================================
// PRESENTER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_presenter_clear_frame() {
    let (window, _event_loop) = create_test_window();
    let config = Config::default();
    let device = create_device(&window);
    let mut presenter = VulkanPresenter::new(Arc::clone(&device), &window, &config).unwrap();

    assert_eq!(presenter.frames_in_flight(), config.frames_in_flight);
    let (width, height) = presenter.extent();
    assert!(width > 0 && height > 0);

    let mut cmd = device.create_command_list().unwrap();
    for _ in 0..(config.frames_in_flight + 1) {
        let frame = presenter.acquire_frame().unwrap();
        frame.fence.wait(config.fence_timeout_ns).unwrap();

        let framebuffer = presenter.presentation_framebuffer(frame.image_index).unwrap();
        let pass = presenter.presentation_pass();

        cmd.begin().unwrap();
        cmd.begin_render_pass(
            &pass,
            &framebuffer,
            &[ClearValue::Color(PRESENTATION_CLEAR_COLOR), ClearValue::DepthStencil { depth: 1.0, stencil: 0 }],
        )
        .unwrap();
        cmd.end_render_pass().unwrap();
        cmd.end().unwrap();

        presenter.submit(cmd.as_ref(), &frame).unwrap();
        match presenter.present(&frame) {
            Ok(()) | Err(Error::SurfaceOutOfDate) => {}
            Err(e) => panic!("present failed: {:?}", e),
        }
        // One command list is reused across frames here
        device.wait_idle().unwrap();
    }
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_presenter_reacquire_returns_pending_image() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);
    let mut presenter = VulkanPresenter::new(Arc::clone(&device), &window, &Config::default()).unwrap();

    let first = presenter.acquire_frame().unwrap();
    let second = presenter.acquire_frame().unwrap();
    assert_eq!(first.image_index, second.image_index);
    assert_eq!(first.slot, second.slot);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_presenter_recreate() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);
    let mut presenter = VulkanPresenter::new(Arc::clone(&device), &window, &Config::default()).unwrap();

    let pass_before = presenter.presentation_pass();
    presenter.recreate(320, 240).unwrap();

    assert!(Arc::ptr_eq(&pass_before, &presenter.presentation_pass()));
    assert!(presenter.presentation_framebuffer(0).is_ok());
    assert!(presenter.presentation_framebuffer(presenter.image_count() as u32).is_err());
}
