/// Renderer configuration
///
/// A plain value handed to constructors. Nothing here is read from the
/// environment or from files.

use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::occlusion::OcclusionAlgorithm;
use crate::render_graph::OcclusionScale;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Initial output width
    pub width: u32,
    /// Initial output height
    pub height: u32,
    /// Number of frames the host may record ahead of the GPU
    pub frames_in_flight: usize,
    /// Occlusion target resolution
    pub occlusion_scale: OcclusionScale,
    pub algorithm: OcclusionAlgorithm,
    pub near_plane: f32,
    pub far_plane: f32,
    /// Upper bound on a frame fence wait
    pub fence_timeout_ns: u64,
    /// Directory holding `<algorithm>/<shader>.spv`
    pub shader_root: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "SSAO".to_string(),
            app_version: (1, 0, 0),
            enable_validation: false,
            width: 1280,
            height: 720,
            frames_in_flight: 2,
            occlusion_scale: OcclusionScale::Full,
            algorithm: OcclusionAlgorithm::Hbao,
            near_plane: 0.1,
            far_plane: 64.0,
            fence_timeout_ns: 1_000_000_000,
            shader_root: PathBuf::from("shaders"),
        }
    }
}

impl Config {
    /// Reject values no renderer can start with
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            return Err(Error::InitializationFailed("frames_in_flight must be at least 1".to_string()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InitializationFailed(format!(
                "output size {}x{} is empty", self.width, self.height
            )));
        }
        if !(self.near_plane > 0.0 && self.far_plane > self.near_plane) {
            return Err(Error::InitializationFailed(format!(
                "invalid depth range {}..{}", self.near_plane, self.far_plane
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
