//! Render-target graph
//!
//! Owns the three offscreen targets of a frame (G-buffer, raw occlusion,
//! blurred occlusion), their render passes and framebuffers, and the
//! helpers that record a pass into them. The edges between passes are
//! fixed: each target is sampled by later passes through the shared
//! sampler, and the render pass dependencies order those reads.

mod render_target;
mod dependencies;
mod render_graph;
mod pass_action;

pub use render_target::{RenderTarget, TargetId, OcclusionScale};
pub use dependencies::{
    gbuffer_dependencies, single_attachment_dependencies, presentation_dependencies,
    gbuffer_pass_desc, single_attachment_pass_desc, presentation_pass_desc,
    GBUFFER_CLEAR_COLOR, PRESENTATION_CLEAR_COLOR,
};
pub use render_graph::{RenderTargetGraph, GBUFFER_COLOR_FORMATS, OCCLUSION_FORMAT};
pub use pass_action::{PassAction, FullscreenAction, GeometryAction, CustomAction, record_pass, record_fullscreen_pass};
