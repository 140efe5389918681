/// Ground-truth ambient occlusion
///
/// Each direction defines a slice through the view vector. The shader finds
/// the highest horizon on both sides of the slice and integrates the
/// cosine-weighted visible arc between them, relative to the normal
/// projected into the slice.

use std::f32::consts::{FRAC_PI_2, TAU};
use glam::{Vec2, Vec3};
use crate::occlusion::{
    OcclusionAlgorithm, OcclusionStrategy, SamplePattern,
    OcclusionSettings, ParameterRanges,
};
use crate::occlusion::reference::GBufferView;
use crate::uniforms::GtaoSettings;

#[derive(Debug, Clone, Copy, Default)]
pub struct Gtao {
    pattern: SamplePattern,
}

impl Gtao {
    pub fn new(pattern: SamplePattern) -> Self {
        Self { pattern }
    }

    /// Highest horizon cosine along one side of a slice
    #[allow(clippy::too_many_arguments)]
    fn horizon_cos(
        &self,
        view: &GBufferView,
        origin: Vec2,
        screen_dir: Vec2,
        step_px: f32,
        position: Vec3,
        view_dir: Vec3,
        settings: &OcclusionSettings,
    ) -> f32 {
        let radius_sq = settings.radius * settings.radius;
        let mut horizon = -1.0f32;
        for s in 1..=self.pattern.steps {
            let offset = origin + screen_dir * step_px * s as f32;
            let Some((sample, _)) = view.sample(offset.x.round() as i32, offset.y.round() as i32) else {
                continue;
            };
            let delta = sample - position;
            let dist_sq = delta.length_squared();
            if dist_sq <= f32::EPSILON {
                continue;
            }
            let cos = delta.dot(view_dir) / dist_sq.sqrt() - settings.bias;
            let weight = (1.0 - dist_sq / radius_sq).clamp(0.0, 1.0);
            horizon = horizon.max(-1.0 + (cos + 1.0) * weight);
        }
        horizon
    }
}

impl OcclusionStrategy for Gtao {
    fn algorithm(&self) -> OcclusionAlgorithm {
        OcclusionAlgorithm::Gtao
    }

    fn title(&self) -> &'static str {
        "Ground truth ambient occlusion"
    }

    fn shader_dir(&self) -> &'static str {
        "gtao"
    }

    fn fragment_shader(&self) -> &'static str {
        "gtao.frag"
    }

    fn pattern(&self) -> SamplePattern {
        self.pattern
    }

    fn default_settings(&self) -> OcclusionSettings {
        OcclusionSettings { radius: 0.8, intensity: 0.4, bias: 0.005 }
    }

    fn ranges(&self) -> ParameterRanges {
        ParameterRanges {
            radius: 0.01..=10.0,
            intensity: 0.0..=2.0,
            bias: 0.001..=0.01,
            bias_label: "Bias",
        }
    }

    fn encode_settings(&self, settings: &OcclusionSettings) -> Vec<u8> {
        let block = GtaoSettings {
            radius: settings.radius,
            intensity: settings.intensity,
            bias: settings.bias,
            _pad: 0.0,
        };
        bytemuck::bytes_of(&block).to_vec()
    }

    fn settings_size(&self) -> u64 {
        std::mem::size_of::<GtaoSettings>() as u64
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
        let view_dir = (-position).normalize_or_zero();
        if view_dir == Vec3::ZERO {
            return 1.0;
        }
        let step_px = radius_px / (self.pattern.steps + 1) as f32;
        let origin = Vec2::new(x as f32, y as f32);

        let mut visibility = 0.0;
        for d in 0..self.pattern.directions {
            let angle = TAU * d as f32 / self.pattern.directions as f32;
            // View space is y-up, the G-buffer is addressed y-down.
            let direction = Vec3::new(angle.cos(), angle.sin(), 0.0);
            let screen_dir = Vec2::new(direction.x, -direction.y);

            let ortho_dir = direction - view_dir * direction.dot(view_dir);
            let axis = ortho_dir.cross(view_dir).normalize_or_zero();
            let projected_normal = normal - axis * normal.dot(axis);
            let projected_len = projected_normal.length();
            if projected_len <= f32::EPSILON {
                continue;
            }
            let sign = if ortho_dir.dot(projected_normal) < 0.0 { -1.0 } else { 1.0 };
            let cos_n = (projected_normal.dot(view_dir) / projected_len).clamp(-1.0, 1.0);
            let n = sign * cos_n.acos();

            let cos_pos = self.horizon_cos(view, origin, screen_dir, step_px, position, view_dir, settings);
            let cos_neg = self.horizon_cos(view, origin, -screen_dir, step_px, position, view_dir, settings);

            let h0 = n + (-cos_neg.acos() - n).clamp(-FRAC_PI_2, FRAC_PI_2);
            let h1 = n + (cos_pos.acos() - n).clamp(-FRAC_PI_2, FRAC_PI_2);
            let arc0 = (cos_n + 2.0 * h0 * n.sin() - (2.0 * h0 - n).cos()) * 0.25;
            let arc1 = (cos_n + 2.0 * h1 * n.sin() - (2.0 * h1 - n).cos()) * 0.25;
            visibility += projected_len * (arc0 + arc1);
        }

        let visibility = (visibility / self.pattern.directions as f32).clamp(0.0, 1.0);
        (1.0 - settings.intensity * (1.0 - visibility)).clamp(0.0, 1.0)
    }
}
