/// Tests for the frame orchestrator
///
/// The device and the context share one journal, so the order of fence
/// waits, uniform writes, recorded commands, submits and presents can be
/// checked directly.

use super::*;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use crate::camera::FirstPersonCamera;
use crate::graphics_device::{GraphicsDevice, SamplerDesc, Sampler};
use crate::graphics_device::mock_graphics_device::{
    MockDrawable, MockGraphicsContext, MockGraphicsDevice, MockOverlay, MockShaderLoader,
};
use crate::occlusion::{create_strategy, OcclusionAlgorithm, SamplePattern};
use crate::render_graph::OcclusionScale;

struct Rig {
    device: MockGraphicsDevice,
    context: MockGraphicsContext,
    graph: RenderTargetGraph,
    pipelines: PipelineSet,
    resources: FrameResources,
    strategy: Box<dyn OcclusionStrategy>,
    overlay: MockOverlay,
    camera: FirstPersonCamera,
    controls: OcclusionControls,
    orchestrator: FrameOrchestrator,
}

impl Rig {
    fn new(frames: usize, width: u32, height: u32) -> Self {
        let device = MockGraphicsDevice::new();
        let context = MockGraphicsContext::new(device.journal.clone(), frames, 3, width, height);
        let graph = RenderTargetGraph::new(&device, width, height, OcclusionScale::Full).unwrap();
        let strategy = create_strategy(OcclusionAlgorithm::Hbao, SamplePattern::default());
        let pipelines = PipelineSet::new(
            &device, &MockShaderLoader::default(), strategy.as_ref(), &graph,
            context.presentation_pass(), &MockDrawable,
        ).unwrap();
        let sampler: Arc<dyn Sampler> = device.create_sampler(&SamplerDesc::attachment_reader()).unwrap();
        let resources = FrameResources::allocate(
            &device, frames, &pipelines, &graph, &sampler, strategy.as_ref(),
        ).unwrap();
        let overlay = MockOverlay::new(device.journal.clone());
        let controls = OcclusionControls::new(strategy.default_settings());
        device.clear_journal();

        Self {
            device,
            context,
            graph,
            pipelines,
            resources,
            strategy,
            overlay,
            camera: FirstPersonCamera::with_viewport(width, height, 0.1, 64.0),
            controls,
            orchestrator: FrameOrchestrator::new(1_000_000_000),
        }
    }

    fn render(&mut self) -> Result<FrameOutcome> {
        self.orchestrator.render_frame(FrameInputs {
            context: &mut self.context,
            graph: &self.graph,
            pipelines: &self.pipelines,
            resources: &mut self.resources,
            strategy: self.strategy.as_ref(),
            drawable: &MockDrawable,
            overlay: &mut self.overlay,
            camera: &self.camera,
            controls: &self.controls,
            near_plane: 0.1,
            far_plane: 64.0,
        })
    }

    fn commands(&self) -> Vec<String> {
        self.device.entries_with_prefix("cmd:")
    }
}

/// Every uniform write to slot k must follow a fence wait on k issued after
/// the last submit of k.
fn assert_fence_discipline(journal: &[String], frames: usize) {
    let mut waited = vec![false; frames];
    for entry in journal {
        if let Some(slot) = entry.strip_prefix("fence_wait:") {
            waited[slot.parse::<usize>().unwrap()] = true;
        } else if let Some(slot) = entry.strip_prefix("submit:slot") {
            waited[slot.parse::<usize>().unwrap()] = false;
        } else if entry.starts_with("write:") {
            let slot: usize = entry
                .rsplit_once('[').unwrap().1
                .trim_end_matches(']')
                .parse().unwrap();
            assert!(waited[slot], "'{}' issued before waiting on slot {}", entry, slot);
        }
    }
}

// ============================================================================
// Tests: State machine
// ============================================================================

#[test]
fn test_state_cycle_returns_to_idle() {
    let mut state = FrameState::Idle;
    let mut visited = Vec::new();
    for _ in 0..7 {
        state = state.next();
        visited.push(state);
    }
    assert_eq!(visited, vec![
        FrameState::FrameAcquired,
        FrameState::GeometryRecorded,
        FrameState::OcclusionRecorded,
        FrameState::BlurRecorded,
        FrameState::CompositionRecorded,
        FrameState::Submitted,
        FrameState::Idle,
    ]);
}

#[test]
fn test_illegal_transition_is_rejected() {
    let mut orchestrator = FrameOrchestrator::new(0);
    assert!(matches!(orchestrator.advance(FrameState::BlurRecorded), Err(Error::InvalidState(_))));
    assert_eq!(orchestrator.state(), FrameState::Idle);
    orchestrator.advance(FrameState::FrameAcquired).unwrap();
    assert!(orchestrator.advance(FrameState::Submitted).is_err());
    assert_eq!(orchestrator.state(), FrameState::FrameAcquired);
}

// ============================================================================
// Tests: Frame recording
// ============================================================================

#[test]
fn test_single_frame_command_stream() {
    let mut rig = Rig::new(2, 1920, 1080);
    let outcome = rig.render().unwrap();
    assert_eq!(outcome, FrameOutcome::Rendered { slot: 0, image_index: 0 });
    assert_eq!(rig.orchestrator.state(), FrameState::Idle);

    let expected = vec![
        "cmd:begin",
        "cmd:begin_render_pass:gbuffer:gbuffer:attachments=4:clears=4",
        "cmd:set_viewport:1920x1080",
        "cmd:set_scissor:1920x1080",
        "cmd:bind_pipeline:geometry",
        "cmd:bind_binding_group:geometry:set0:scene_params[0]",
        "cmd:draw_indexed:36",
        "cmd:end_render_pass",
        "cmd:begin_render_pass:occlusion:occlusion:attachments=1:clears=1",
        "cmd:set_viewport:1920x1080",
        "cmd:set_scissor:1920x1080",
        "cmd:bind_pipeline:occlusion",
        "cmd:bind_binding_group:occlusion:set0:position,normal,occlusion_settings[0],occlusion_params[0]",
        "cmd:draw:3x1",
        "cmd:end_render_pass",
        "cmd:begin_render_pass:occlusion_blur:occlusion_blur:attachments=1:clears=1",
        "cmd:set_viewport:1920x1080",
        "cmd:set_scissor:1920x1080",
        "cmd:bind_pipeline:occlusion_blur",
        "cmd:bind_binding_group:occlusion_blur:set0:occlusion",
        "cmd:draw:3x1",
        "cmd:end_render_pass",
        "cmd:begin_render_pass:presentation:swapchain[0]:attachments=2:clears=2",
        "cmd:set_viewport:1920x1080",
        "cmd:set_scissor:1920x1080",
        "cmd:bind_pipeline:composition",
        "cmd:bind_binding_group:composition:set0:position,normal,albedo,occlusion,occlusion_blur,occlusion_params[0]",
        "cmd:draw:3x1",
        "cmd:end_render_pass",
        "cmd:end",
    ];
    assert_eq!(rig.commands(), expected);
}

#[test]
fn test_frame_event_order() {
    let mut rig = Rig::new(2, 640, 480);
    rig.render().unwrap();

    let journal = rig.device.entries();
    let position = |needle: &str| journal.iter().position(|e| e == needle)
        .unwrap_or_else(|| panic!("'{}' missing from {:?}", needle, journal));

    let order = [
        position("acquire:image0:slot0"),
        position("fence_wait:0"),
        position("write:scene_params[0]"),
        position("write:occlusion_params[0]"),
        position("write:occlusion_settings[0]"),
        position("cmd:begin"),
        position("overlay_render"),
        position("cmd:end"),
        position("submit:slot0"),
        position("present:image0"),
    ];
    assert!(order.windows(2).all(|w| w[0] < w[1]), "{:?}", journal);
}

#[test]
fn test_overlay_renders_inside_composition_pass() {
    let mut rig = Rig::new(1, 64, 64);
    rig.render().unwrap();

    let journal = rig.device.entries();
    let overlay = journal.iter().position(|e| e == "overlay_render").unwrap();
    let composition_draw = journal.iter().rposition(|e| e == "cmd:draw:3x1").unwrap();
    let last_end_pass = journal.iter().rposition(|e| e == "cmd:end_render_pass").unwrap();
    assert!(composition_draw < overlay && overlay < last_end_pass);
}

#[test]
fn test_no_barriers_between_passes() {
    let mut rig = Rig::new(1, 64, 64);
    rig.render().unwrap();
    assert!(rig.commands().iter().all(|c| !c.contains("barrier")));
}

#[test]
fn test_uniforms_follow_camera_and_controls() {
    let mut rig = Rig::new(1, 800, 600);
    rig.controls.blur = false;
    rig.render().unwrap();

    let params: OcclusionParams =
        bytemuck::pod_read_unaligned(&rig.device.buffer_contents("occlusion_params[0]"));
    assert_eq!(params.blur, 0);
    assert_eq!(params.enabled, 1);
    assert_eq!(params.projection, rig.camera.projection());

    let scene: SceneUniforms = bytemuck::pod_read_unaligned(&rig.device.buffer_contents("scene_params[0]"));
    assert_eq!(scene.view, rig.camera.view());
    assert_eq!(scene.far_plane, 64.0);
}

// ============================================================================
// Tests: Fence discipline
// ============================================================================

#[test]
fn test_fence_wait_precedes_slot_writes() {
    for frames in 1..=3 {
        let mut rig = Rig::new(frames, 320, 240);
        for _ in 0..(2 * frames + 1) {
            assert!(matches!(rig.render().unwrap(), FrameOutcome::Rendered { .. }));
        }
        let journal = rig.device.entries();
        assert_fence_discipline(&journal, frames);
        assert_eq!(
            journal.iter().filter(|e| e.starts_with("fence_wait:")).count(),
            2 * frames + 1
        );
    }
}

#[test]
fn test_slots_rotate() {
    let mut rig = Rig::new(2, 1920, 1080);
    let slots: Vec<usize> = (0..3)
        .map(|_| match rig.render().unwrap() {
            FrameOutcome::Rendered { slot, .. } => slot,
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert_eq!(slots, vec![0, 1, 0]);
    assert_eq!(rig.orchestrator.frames_rendered(), 3);
}

#[test]
fn test_submitted_slot_stays_in_flight_until_next_wait() {
    let mut rig = Rig::new(2, 64, 64);
    rig.render().unwrap();
    assert!(rig.resources.slot(0).unwrap().is_in_flight());
    assert!(!rig.resources.slot(1).unwrap().is_in_flight());
}

// ============================================================================
// Tests: Show-only toggle
// ============================================================================

#[test]
fn test_show_only_leaves_occlusion_work_unchanged() {
    let mut plain = Rig::new(1, 1280, 720);
    let mut show_only = Rig::new(1, 1280, 720);
    show_only.controls.show_only = true;

    plain.render().unwrap();
    show_only.render().unwrap();

    assert_eq!(plain.commands(), show_only.commands());
    assert_eq!(
        plain.device.buffer_contents("occlusion_settings[0]"),
        show_only.device.buffer_contents("occlusion_settings[0]")
    );
    assert_eq!(
        plain.device.buffer_contents("scene_params[0]"),
        show_only.device.buffer_contents("scene_params[0]")
    );

    let a: OcclusionParams = bytemuck::pod_read_unaligned(&plain.device.buffer_contents("occlusion_params[0]"));
    let b: OcclusionParams = bytemuck::pod_read_unaligned(&show_only.device.buffer_contents("occlusion_params[0]"));
    assert_eq!((a.show_only, b.show_only), (0, 1));
    assert_eq!(OcclusionParams { show_only: 0, ..b }, a);
}

// ============================================================================
// Tests: Errors
// ============================================================================

#[test]
fn test_fence_timeout_skips_frame() {
    let mut rig = Rig::new(2, 64, 64);
    rig.context.fences[0].time_out_next.store(true, Ordering::SeqCst);

    assert_eq!(rig.render().unwrap(), FrameOutcome::Skipped);
    assert_eq!(rig.orchestrator.state(), FrameState::Idle);
    assert!(rig.device.entries_with_prefix("write:").is_empty());
    assert!(rig.device.entries_with_prefix("submit:").is_empty());
    assert!(rig.commands().is_empty());

    assert!(matches!(rig.render().unwrap(), FrameOutcome::Rendered { .. }));
}

#[test]
fn test_out_of_date_acquire_resets_to_idle() {
    let mut rig = Rig::new(2, 64, 64);
    rig.context.failures.fail_next_acquire(Error::SurfaceOutOfDate);

    assert!(matches!(rig.render(), Err(Error::SurfaceOutOfDate)));
    assert_eq!(rig.orchestrator.state(), FrameState::Idle);
    assert!(rig.render().is_ok());
}

#[test]
fn test_submit_failure_is_propagated() {
    let mut rig = Rig::new(2, 64, 64);
    rig.context.failures.fail_next_submit(Error::SubmitFailed("queue".to_string()));

    let err = rig.render().unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(rig.orchestrator.state(), FrameState::Idle);
    assert!(!rig.resources.slot(0).unwrap().is_in_flight());
}

#[test]
fn test_present_failure_after_submit_keeps_slot_in_flight() {
    let mut rig = Rig::new(1, 64, 64);
    rig.context.failures.fail_next_present(Error::SurfaceOutOfDate);

    assert!(matches!(rig.render(), Err(Error::SurfaceOutOfDate)));
    assert!(rig.resources.slot(0).unwrap().is_in_flight());

    // The next frame waits on the fence, retires the slot and proceeds.
    assert!(rig.render().is_ok());
    assert_fence_discipline(&rig.device.entries(), 1);
}
