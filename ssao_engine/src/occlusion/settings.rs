/// UI-adjustable occlusion parameters
///
/// Lives only in memory. The debug overlay edits `OcclusionControls`; the
/// frame loop encodes them into the current slot's uniform buffers.

use std::ops::RangeInclusive;

/// Algorithm tunables shared by both strategies
///
/// `bias` is the angle bias for HBAO and the depth bias for GTAO.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionSettings {
    pub radius: f32,
    pub intensity: f32,
    pub bias: f32,
}

/// Slider ranges for the tunables
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRanges {
    pub radius: RangeInclusive<f32>,
    pub intensity: RangeInclusive<f32>,
    pub bias: RangeInclusive<f32>,
    /// Label shown next to the bias slider
    pub bias_label: &'static str,
}

fn clamp_to(value: f32, range: &RangeInclusive<f32>) -> f32 {
    value.clamp(*range.start(), *range.end())
}

/// Toggles plus tunables
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OcclusionControls {
    /// Apply the occlusion term in composition
    pub enabled: bool,
    /// Composition outputs the occlusion term alone
    pub show_only: bool,
    /// Composition reads the blurred occlusion target
    pub blur: bool,
    pub settings: OcclusionSettings,
}

impl OcclusionControls {
    pub fn new(settings: OcclusionSettings) -> Self {
        Self {
            enabled: true,
            show_only: false,
            blur: true,
            settings,
        }
    }

    /// Clamp every tunable into `ranges`
    ///
    /// Radius 0 is below every slider range; callers that want the neutral
    /// boundary case set it after clamping.
    pub fn clamp(&mut self, ranges: &ParameterRanges) {
        self.settings.radius = clamp_to(self.settings.radius, &ranges.radius);
        self.settings.intensity = clamp_to(self.settings.intensity, &ranges.intensity);
        self.settings.bias = clamp_to(self.settings.bias, &ranges.bias);
    }
}
