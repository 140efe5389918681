/// Ambient-occlusion strategies
///
/// The frame loop and the render-target graph only see `OcclusionStrategy`.
/// Each variant brings its fragment shader, its loop-unrolling constants and
/// the layout of its settings block.

pub mod settings;
pub mod hbao;
pub mod gtao;
pub mod reference;

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{CommandList, Pipeline, BindingGroup, SpecializationConstant};
use crate::render_graph::{RenderTarget, record_fullscreen_pass};

pub use settings::{OcclusionSettings, OcclusionControls, ParameterRanges};
pub use hbao::Hbao;
pub use gtao::Gtao;
pub use reference::GBufferView;

/// Specialization constant id of the direction count
pub const DIRECTIONS_CONSTANT_ID: u32 = 0;
/// Specialization constant id of the step count
pub const STEPS_CONSTANT_ID: u32 = 1;

/// Which occlusion algorithm to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OcclusionAlgorithm {
    /// Horizon-based
    Hbao,
    /// Ground-truth
    Gtao,
}

/// Sample directions and steps per direction, both at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplePattern {
    directions: u32,
    steps: u32,
}

impl SamplePattern {
    pub fn new(directions: u32, steps: u32) -> Result<Self> {
        if directions == 0 || steps == 0 {
            return Err(Error::InitializationFailed(format!(
                "sample pattern needs at least one direction and step, got {}x{}", directions, steps
            )));
        }
        Ok(Self { directions, steps })
    }

    pub fn directions(&self) -> u32 {
        self.directions
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }
}

impl Default for SamplePattern {
    fn default() -> Self {
        Self { directions: 8, steps: 6 }
    }
}

/// Capability set of an occlusion algorithm
pub trait OcclusionStrategy: Send + Sync {
    fn algorithm(&self) -> OcclusionAlgorithm;

    /// Window title
    fn title(&self) -> &'static str;

    /// Directory the strategy's shaders are loaded from
    fn shader_dir(&self) -> &'static str;

    /// Fragment shader of the occlusion pass
    fn fragment_shader(&self) -> &'static str;

    fn pattern(&self) -> SamplePattern;

    /// Direction and step counts as specialization constants 0 and 1
    fn specialization(&self) -> Vec<SpecializationConstant> {
        let pattern = self.pattern();
        vec![
            SpecializationConstant { id: DIRECTIONS_CONSTANT_ID, value: pattern.directions },
            SpecializationConstant { id: STEPS_CONSTANT_ID, value: pattern.steps },
        ]
    }

    fn default_settings(&self) -> OcclusionSettings;

    fn ranges(&self) -> ParameterRanges;

    /// Encode `settings` into the strategy's uniform block layout
    fn encode_settings(&self, settings: &OcclusionSettings) -> Vec<u8>;

    /// Size in bytes of the settings uniform block
    fn settings_size(&self) -> u64;

    /// Record the occlusion pass into `target`, reading the G-buffer
    /// through `group`
    fn generate(
        &self,
        cmd: &mut dyn CommandList,
        target: &RenderTarget,
        pipeline: &Arc<dyn Pipeline>,
        group: &Arc<dyn BindingGroup>,
    ) -> Result<()> {
        record_fullscreen_pass(cmd, target, pipeline, group)
    }

    /// Host-side occlusion factor of one texel, given the radius already
    /// projected to pixels
    fn occlusion_at(
        &self,
        view: &GBufferView,
        x: u32,
        y: u32,
        settings: &OcclusionSettings,
        radius_px: f32,
    ) -> f32;
}

/// Build the strategy for `algorithm`
pub fn create_strategy(algorithm: OcclusionAlgorithm, pattern: SamplePattern) -> Box<dyn OcclusionStrategy> {
    match algorithm {
        OcclusionAlgorithm::Hbao => Box::new(Hbao::new(pattern)),
        OcclusionAlgorithm::Gtao => Box::new(Gtao::new(pattern)),
    }
}

#[cfg(test)]
#[path = "occlusion_tests.rs"]
mod tests;
