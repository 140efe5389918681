/// Host-side evaluation of the occlusion term
///
/// Runs a strategy's per-pixel math over a G-buffer held in host memory.
/// The shaders implement the same march; this path exists to check the
/// boundary behaviour of the settings without a device.

use glam::{Mat4, Vec3, Vec4};
use crate::error::{Error, Result};
use crate::occlusion::{OcclusionStrategy, OcclusionSettings};

/// Read-only view of a host-side G-buffer
///
/// Positions are view-space; `w == 0` marks a background texel. Reads
/// outside the image are clamped to the edge, like the attachment sampler.
pub struct GBufferView<'a> {
    width: u32,
    height: u32,
    positions: &'a [Vec4],
    normals: &'a [Vec3],
}

impl<'a> GBufferView<'a> {
    /// Both buffers must hold exactly `width * height` texels
    pub fn new(width: u32, height: u32, positions: &'a [Vec4], normals: &'a [Vec3]) -> Result<Self> {
        let texels = width as usize * height as usize;
        if positions.len() != texels || normals.len() != texels {
            return Err(Error::InvalidResource(format!(
                "G-buffer view {}x{} needs {} texels, got {} positions and {} normals",
                width, height, texels, positions.len(), normals.len()
            )));
        }
        Ok(Self { width, height, positions, normals })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position and unit normal at (x, y), or None for background
    pub fn sample(&self, x: i32, y: i32) -> Option<(Vec3, Vec3)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let x = x.clamp(0, self.width as i32 - 1) as u32;
        let y = y.clamp(0, self.height as i32 - 1) as u32;
        let index = (y * self.width + x) as usize;
        let position = self.positions[index];
        if position.w == 0.0 {
            return None;
        }
        Some((position.truncate(), self.normals[index].normalize_or_zero()))
    }
}

/// Pixels covered by one view-space unit at unit depth
pub fn projection_scale(projection: &Mat4, height: u32) -> f32 {
    projection.y_axis.y.abs() * height as f32 * 0.5
}

/// Occlusion factor for every texel, 1.0 meaning unoccluded
///
/// A texel whose radius projects to less than one pixel, or any texel when
/// the intensity is zero, evaluates to exactly 1.0.
pub fn evaluate(
    strategy: &dyn OcclusionStrategy,
    view: &GBufferView,
    settings: &OcclusionSettings,
    projection_scale: f32,
) -> Vec<f32> {
    let mut out = Vec::with_capacity((view.width * view.height) as usize);
    for y in 0..view.height {
        for x in 0..view.width {
            out.push(evaluate_texel(strategy, view, x, y, settings, projection_scale));
        }
    }
    out
}

/// One texel's occlusion
///
/// The sub-pixel radius check is what makes a zero radius neutral: the
/// strategies' falloff divides by the squared radius.
fn evaluate_texel(
    strategy: &dyn OcclusionStrategy,
    view: &GBufferView,
    x: u32,
    y: u32,
    settings: &OcclusionSettings,
    projection_scale: f32,
) -> f32 {
    if settings.intensity <= 0.0 {
        return 1.0;
    }
    let Some((position, _)) = view.sample(x as i32, y as i32) else {
        return 1.0;
    };
    let depth = -position.z;
    if depth <= 0.0 {
        return 1.0;
    }
    let radius_px = settings.radius * projection_scale / depth;
    // Sub-pixel radii, zero included, are unoccluded here; the march
    // itself does not guarantee 1.0 for them
    if radius_px < 1.0 {
        return 1.0;
    }
    strategy.occlusion_at(view, x, y, settings, radius_px)
}

#[cfg(test)]
#[path = "reference_tests.rs"]
mod tests;
