/// Horizon-based ambient occlusion
///
/// For every direction the shader marches `steps` samples out to the
/// projected radius and accumulates how far each sample rises above the
/// surface tangent plane, attenuated by distance.

use glam::{Vec2, Vec3};
use crate::occlusion::{
    OcclusionAlgorithm, OcclusionStrategy, SamplePattern,
    OcclusionSettings, ParameterRanges,
};
use crate::occlusion::reference::GBufferView;
use crate::uniforms::HbaoSettings;

#[derive(Debug, Clone, Copy, Default)]
pub struct Hbao {
    pattern: SamplePattern,
}

impl Hbao {
    pub fn new(pattern: SamplePattern) -> Self {
        Self { pattern }
    }
}

impl OcclusionStrategy for Hbao {
    fn algorithm(&self) -> OcclusionAlgorithm {
        OcclusionAlgorithm::Hbao
    }

    fn title(&self) -> &'static str {
        "Horizon-based ambient occlusion"
    }

    fn shader_dir(&self) -> &'static str {
        "hbao"
    }

    fn fragment_shader(&self) -> &'static str {
        "hbao.frag"
    }

    fn pattern(&self) -> SamplePattern {
        self.pattern
    }

    fn default_settings(&self) -> OcclusionSettings {
        OcclusionSettings { radius: 0.8, intensity: 0.4, bias: 0.3 }
    }

    fn ranges(&self) -> ParameterRanges {
        ParameterRanges {
            radius: 0.01..=20.0,
            intensity: 0.0..=2.0,
            bias: 0.0..=10.0,
            bias_label: "Angle bias",
        }
    }

    fn encode_settings(&self, settings: &OcclusionSettings) -> Vec<u8> {
        let block = HbaoSettings {
            radius: settings.radius,
            intensity: settings.intensity,
            angle_bias: settings.bias,
            _pad: 0.0,
        };
        bytemuck::bytes_of(&block).to_vec()
    }

    fn settings_size(&self) -> u64 {
        std::mem::size_of::<HbaoSettings>() as u64
    }

    fn occlusion_at(
        &self,
        view: &GBufferView,
        x: u32,
        y: u32,
        settings: &OcclusionSettings,
        radius_px: f32,
    ) -> f32 {
        let Some((position, normal)) = view.sample(x as i32, y as i32) else {
            return 1.0;
        };
        let radius_sq = settings.radius * settings.radius;
        let step_px = radius_px / (self.pattern.steps + 1) as f32;
        let origin = Vec2::new(x as f32, y as f32);

        let mut occlusion = 0.0;
        for d in 0..self.pattern.directions {
            let angle = std::f32::consts::TAU * d as f32 / self.pattern.directions as f32;
            let dir = Vec2::new(angle.cos(), angle.sin());
            for s in 1..=self.pattern.steps {
                let offset = origin + dir * step_px * s as f32;
                let Some((sample, _)) = view.sample(offset.x.round() as i32, offset.y.round() as i32) else {
                    continue;
                };
                let v: Vec3 = sample - position;
                let dist_sq = v.length_squared();
                if dist_sq <= f32::EPSILON {
                    continue;
                }
                let n_dot_v = normal.dot(v) / dist_sq.sqrt();
                let falloff = (1.0 - dist_sq / radius_sq).clamp(0.0, 1.0);
                occlusion += (n_dot_v - settings.bias).clamp(0.0, 1.0) * falloff;
            }
        }

        let samples = (self.pattern.directions * self.pattern.steps) as f32;
        (1.0 - settings.intensity * occlusion / samples).clamp(0.0, 1.0)
    }
}
