/// Frame orchestrator
///
/// Drives one frame through a fixed sequence: acquire an image, wait on the
/// slot's fence, fill the slot's uniforms, record geometry, occlusion, blur
/// and composition, then submit and present. Every step is a checked state
/// transition; any failure returns the machine to `Idle`.

use crate::camera::Camera;
use crate::error::{Error, Result};
use crate::graphics_context::GraphicsContext;
use crate::graphics_device::ClearValue;
use crate::occlusion::{OcclusionControls, OcclusionStrategy};
use crate::overlay::DebugOverlay;
use crate::pipelines::{PassKind, PipelineSet};
use crate::render_graph::{
    record_fullscreen_pass, record_pass, CustomAction, FullscreenAction, GeometryAction,
    RenderTargetGraph, TargetId, PRESENTATION_CLEAR_COLOR,
};
use crate::frame_resources::FrameResources;
use crate::scene::Drawable;
use crate::uniforms::{OcclusionParams, SceneUniforms};

/// Progress of the frame being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    FrameAcquired,
    GeometryRecorded,
    OcclusionRecorded,
    BlurRecorded,
    CompositionRecorded,
    Submitted,
}

impl FrameState {
    /// The only state reachable from `self`
    pub fn next(&self) -> FrameState {
        match self {
            FrameState::Idle => FrameState::FrameAcquired,
            FrameState::FrameAcquired => FrameState::GeometryRecorded,
            FrameState::GeometryRecorded => FrameState::OcclusionRecorded,
            FrameState::OcclusionRecorded => FrameState::BlurRecorded,
            FrameState::BlurRecorded => FrameState::CompositionRecorded,
            FrameState::CompositionRecorded => FrameState::Submitted,
            FrameState::Submitted => FrameState::Idle,
        }
    }
}

/// Result of `render_frame`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Recorded, submitted and presented
    Rendered { slot: usize, image_index: u32 },
    /// The slot's fence timed out; nothing was recorded
    Skipped,
    /// The swapchain was out of date and has been rebuilt
    Recreated,
}

/// Everything one frame reads or writes
pub struct FrameInputs<'a> {
    pub context: &'a mut dyn GraphicsContext,
    pub graph: &'a RenderTargetGraph,
    pub pipelines: &'a PipelineSet,
    pub resources: &'a mut FrameResources,
    pub strategy: &'a dyn OcclusionStrategy,
    pub drawable: &'a dyn Drawable,
    pub overlay: &'a mut dyn DebugOverlay,
    pub camera: &'a dyn Camera,
    pub controls: &'a OcclusionControls,
    pub near_plane: f32,
    pub far_plane: f32,
}

pub struct FrameOrchestrator {
    state: FrameState,
    fence_timeout_ns: u64,
    frames_rendered: u64,
}

impl FrameOrchestrator {
    pub fn new(fence_timeout_ns: u64) -> Self {
        Self {
            state: FrameState::Idle,
            fence_timeout_ns,
            frames_rendered: 0,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Move to `to`, which must be the successor of the current state
    pub fn advance(&mut self, to: FrameState) -> Result<()> {
        if self.state.next() != to {
            return Err(Error::InvalidState(format!(
                "illegal frame transition {:?} -> {:?}", self.state, to
            )));
        }
        crate::engine_trace!("ssao::FrameOrchestrator", "{:?} -> {:?}", self.state, to);
        self.state = to;
        Ok(())
    }

    /// Record, submit and present one frame
    ///
    /// A fence timeout yields `FrameOutcome::Skipped`. Every other error is
    /// returned after the state machine is reset to `Idle`.
    pub fn render_frame(&mut self, inputs: FrameInputs) -> Result<FrameOutcome> {
        if self.state != FrameState::Idle {
            return Err(Error::InvalidState(format!("frame already in progress ({:?})", self.state)));
        }

        match self.run(inputs) {
            Ok(outcome) => {
                self.frames_rendered += 1;
                Ok(outcome)
            }
            Err(Error::FrameTimeout) => {
                crate::engine_warn!("ssao::FrameOrchestrator", "Frame fence timed out, skipping frame");
                self.state = FrameState::Idle;
                Ok(FrameOutcome::Skipped)
            }
            Err(err) => {
                crate::engine_trace!("ssao::FrameOrchestrator", "{:?} -> Idle ({})", self.state, err);
                self.state = FrameState::Idle;
                Err(err)
            }
        }
    }

    fn run(&mut self, inputs: FrameInputs) -> Result<FrameOutcome> {
        let FrameInputs {
            context, graph, pipelines, resources, strategy, drawable, overlay, camera, controls,
            near_plane, far_plane,
        } = inputs;

        let frame = context.acquire_frame()?;
        self.advance(FrameState::FrameAcquired)?;

        // The previous submission of this slot must be complete before its
        // buffers or command list are touched.
        frame.fence.wait(self.fence_timeout_ns)?;
        resources.retire(frame.slot)?;

        let projection = camera.projection();
        let scene = SceneUniforms::new(projection, camera.view(), near_plane, far_plane);
        let params = OcclusionParams::new(projection, controls.enabled, controls.show_only, controls.blur);
        let settings = strategy.encode_settings(&controls.settings);
        resources.update(frame.slot, &scene, &params, &settings)?;

        let slot = resources.slot_mut(frame.slot)?;
        let geometry_group = slot.binding_group(PassKind::GeometryFill).clone();
        let occlusion_group = slot.binding_group(PassKind::OcclusionGenerate).clone();
        let blur_group = slot.binding_group(PassKind::OcclusionBlur).clone();
        let composition_group = slot.binding_group(PassKind::Composition).clone();
        let cmd = slot.command_list_mut();
        cmd.begin()?;

        let gbuffer = graph.target(TargetId::GBuffer);
        let geometry_pipeline = pipelines.get(PassKind::GeometryFill);
        record_pass(
            cmd,
            gbuffer.render_pass(),
            gbuffer.framebuffer(),
            gbuffer.clear_values(),
            gbuffer.width(),
            gbuffer.height(),
            &mut GeometryAction::new(geometry_pipeline, &geometry_group, drawable),
        )?;
        self.advance(FrameState::GeometryRecorded)?;

        strategy.generate(
            cmd,
            graph.target(TargetId::Occlusion),
            pipelines.get(PassKind::OcclusionGenerate),
            &occlusion_group,
        )?;
        self.advance(FrameState::OcclusionRecorded)?;

        record_fullscreen_pass(
            cmd,
            graph.target(TargetId::OcclusionBlur),
            pipelines.get(PassKind::OcclusionBlur),
            &blur_group,
        )?;
        self.advance(FrameState::BlurRecorded)?;

        let framebuffer = context.presentation_framebuffer(frame.image_index)?;
        let (width, height) = context.extent();
        let clear_values = [
            ClearValue::Color(PRESENTATION_CLEAR_COLOR),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ];
        let composition = FullscreenAction::new(pipelines.get(PassKind::Composition).clone(), composition_group);
        record_pass(
            cmd,
            &context.presentation_pass(),
            &framebuffer,
            &clear_values,
            width,
            height,
            &mut CustomAction::with_overlay(composition, overlay),
        )?;
        self.advance(FrameState::CompositionRecorded)?;

        cmd.end()?;
        context.submit(&*cmd, &frame)?;
        resources.mark_in_flight(frame.slot)?;
        self.advance(FrameState::Submitted)?;

        context.present(&frame)?;
        self.advance(FrameState::Idle)?;

        Ok(FrameOutcome::Rendered { slot: frame.slot, image_index: frame.image_index })
    }
}

#[cfg(test)]
#[path = "frame_orchestrator_tests.rs"]
mod tests;
