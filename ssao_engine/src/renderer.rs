/// SSAO renderer
///
/// Owns the render-target graph, the pipelines, the per-frame resources and
/// the occlusion strategy for one graphics context. `render_frame()` runs
/// the frame orchestrator and turns an out-of-date swapchain into a
/// recreation of everything that depends on the output size.

use std::sync::Arc;
use crate::camera::Camera;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::frame_orchestrator::{FrameInputs, FrameOrchestrator, FrameOutcome};
use crate::frame_resources::FrameResources;
use crate::graphics_context::GraphicsContext;
use crate::graphics_device::{GraphicsDevice, Sampler, SamplerDesc};
use crate::occlusion::{create_strategy, OcclusionControls, OcclusionStrategy, SamplePattern};
use crate::overlay::DebugOverlay;
use crate::pipelines::PipelineSet;
use crate::render_graph::RenderTargetGraph;
use crate::scene::Drawable;
use crate::shader_loader::ShaderLoader;

pub struct SsaoRenderer {
    device: Arc<dyn GraphicsDevice>,
    context: Box<dyn GraphicsContext>,
    strategy: Box<dyn OcclusionStrategy>,
    graph: RenderTargetGraph,
    pipelines: PipelineSet,
    sampler: Arc<dyn Sampler>,
    resources: FrameResources,
    drawable: Box<dyn Drawable>,
    controls: OcclusionControls,
    orchestrator: FrameOrchestrator,
    near_plane: f32,
    far_plane: f32,
    /// Latest window size reported by the caller
    requested_extent: (u32, u32),
}

impl SsaoRenderer {
    /// Build targets, pipelines and frame slots for `context`
    ///
    /// The context decides the frame count. A context whose extent differs
    /// from the configured output size is recreated at that size first; the
    /// surface may still clamp it.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        mut context: Box<dyn GraphicsContext>,
        shaders: &dyn ShaderLoader,
        drawable: Box<dyn Drawable>,
        config: &Config,
    ) -> Result<Self> {
        config.validate()?;

        let strategy = create_strategy(config.algorithm, SamplePattern::default());
        if context.extent() != (config.width, config.height) {
            context.recreate(config.width, config.height)?;
        }
        let (width, height) = context.extent();

        let graph = RenderTargetGraph::new(device.as_ref(), width, height, config.occlusion_scale)?;
        let pipelines = PipelineSet::new(
            device.as_ref(),
            shaders,
            strategy.as_ref(),
            &graph,
            context.presentation_pass(),
            drawable.as_ref(),
        )?;
        let sampler = device.create_sampler(&SamplerDesc::attachment_reader())?;
        let resources = FrameResources::allocate(
            device.as_ref(),
            context.frames_in_flight(),
            &pipelines,
            &graph,
            &sampler,
            strategy.as_ref(),
        )?;
        let controls = OcclusionControls::new(strategy.default_settings());

        crate::engine_info!("ssao::Renderer", "{}: {}x{}, {} frames in flight",
            strategy.title(), width, height, context.frames_in_flight());

        Ok(Self {
            device,
            context,
            strategy,
            graph,
            pipelines,
            sampler,
            resources,
            drawable,
            controls,
            orchestrator: FrameOrchestrator::new(config.fence_timeout_ns),
            near_plane: config.near_plane,
            far_plane: config.far_plane,
            requested_extent: (width, height),
        })
    }

    /// Render one frame
    ///
    /// The overlay may edit the controls first; edited values are clamped
    /// to the strategy's ranges. A minimized window yields `Skipped`.
    pub fn render_frame(&mut self, camera: &dyn Camera, overlay: &mut dyn DebugOverlay) -> Result<FrameOutcome> {
        let (width, height) = self.requested_extent;
        if width == 0 || height == 0 {
            return Ok(FrameOutcome::Skipped);
        }

        let ranges = self.strategy.ranges();
        if overlay.edit(&mut self.controls, &ranges) {
            self.controls.clamp(&ranges);
        }

        let result = self.orchestrator.render_frame(FrameInputs {
            context: self.context.as_mut(),
            graph: &self.graph,
            pipelines: &self.pipelines,
            resources: &mut self.resources,
            strategy: self.strategy.as_ref(),
            drawable: self.drawable.as_ref(),
            overlay,
            camera,
            controls: &self.controls,
            near_plane: self.near_plane,
            far_plane: self.far_plane,
        });

        match result {
            Err(Error::SurfaceOutOfDate) => {
                crate::engine_debug!("ssao::Renderer", "Surface out of date, recreating");
                self.recreate()?;
                Ok(FrameOutcome::Recreated)
            }
            other => other,
        }
    }

    /// Record a new window size; recreation happens on the next frame
    /// that finds the swapchain out of date, or on `recreate()`
    pub fn request_resize(&mut self, width: u32, height: u32) {
        self.requested_extent = (width, height);
    }

    /// Rebuild swapchain, targets and binding groups for the requested size
    pub fn recreate(&mut self) -> Result<()> {
        let (width, height) = self.requested_extent;
        if width == 0 || height == 0 {
            return Ok(());
        }

        self.device.wait_idle()?;
        self.context.recreate(width, height)?;
        let (width, height) = self.context.extent();
        self.graph.resize(self.device.as_ref(), width, height)?;
        self.resources.rebind(self.device.as_ref(), &self.pipelines, &self.graph, &self.sampler)?;

        crate::engine_info!("ssao::Renderer", "Recreated for {}x{}", width, height);
        Ok(())
    }

    pub fn controls(&self) -> &OcclusionControls {
        &self.controls
    }

    /// Replace the controls, clamped to the strategy's ranges
    pub fn set_controls(&mut self, mut controls: OcclusionControls) {
        controls.clamp(&self.strategy.ranges());
        self.controls = controls;
    }

    pub fn strategy(&self) -> &dyn OcclusionStrategy {
        self.strategy.as_ref()
    }

    /// Window title for the active algorithm
    pub fn title(&self) -> &'static str {
        self.strategy.title()
    }

    pub fn graph(&self) -> &RenderTargetGraph {
        &self.graph
    }

    pub fn pipelines(&self) -> &PipelineSet {
        &self.pipelines
    }

    pub fn resources(&self) -> &FrameResources {
        &self.resources
    }

    pub fn frames_rendered(&self) -> u64 {
        self.orchestrator.frames_rendered()
    }
}

impl Drop for SsaoRenderer {
    fn drop(&mut self) {
        // GPU work may still reference the slots and attachments
        if let Err(err) = self.device.wait_idle() {
            crate::engine_warn!("ssao::Renderer", "wait_idle failed on drop: {}", err);
        }
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
