/// Host-side uniform block layouts
///
/// Every struct here is copied byte-for-byte into a persistently mapped
/// uniform buffer, so all of them are `#[repr(C)]` and `Pod` with explicit
/// padding to a 16-byte multiple.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Scene parameters read by the geometry pass (binding 0, set 0)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub projection: Mat4,
    pub model: Mat4,
    pub view: Mat4,
    pub near_plane: f32,
    pub far_plane: f32,
    pub _pad: [f32; 2],
}

impl SceneUniforms {
    pub fn new(projection: Mat4, view: Mat4, near_plane: f32, far_plane: f32) -> Self {
        Self {
            projection,
            model: Mat4::IDENTITY,
            view,
            near_plane,
            far_plane,
            _pad: [0.0; 2],
        }
    }
}

/// Toggles shared by the occlusion and composition passes
///
/// Booleans are stored as `i32` to match the shader-side `int` fields.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct OcclusionParams {
    pub projection: Mat4,
    pub enabled: i32,
    pub show_only: i32,
    pub blur: i32,
    pub _pad: i32,
}

impl OcclusionParams {
    pub fn new(projection: Mat4, enabled: bool, show_only: bool, blur: bool) -> Self {
        Self {
            projection,
            enabled: enabled as i32,
            show_only: show_only as i32,
            blur: blur as i32,
            _pad: 0,
        }
    }
}

impl Default for OcclusionParams {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, true, false, true)
    }
}

/// Tunables of the horizon-based strategy
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct HbaoSettings {
    pub radius: f32,
    pub intensity: f32,
    pub angle_bias: f32,
    pub _pad: f32,
}

/// Tunables of the ground-truth strategy
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GtaoSettings {
    pub radius: f32,
    pub intensity: f32,
    pub bias: f32,
    pub _pad: f32,
}

#[cfg(test)]
#[path = "uniforms_tests.rs"]
mod tests;
