/// Pass action trait and implementations.
///
/// Defines what a render pass records between begin_render_pass() and
/// end_render_pass(). `record_pass()` wraps an action with the pass begin,
/// the dynamic viewport/scissor and the pass end.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    BindingGroup, ClearValue, CommandList, Framebuffer, Pipeline, Rect2D, RenderPass, Viewport,
};
use crate::overlay::DebugOverlay;
use crate::scene::Drawable;
use super::render_target::RenderTarget;

/// Action executed inside a render pass
pub trait PassAction {
    /// Record draw commands into the command list
    fn execute(&mut self, cmd: &mut dyn CommandList) -> Result<()>;
}

/// Fullscreen pass action
///
/// Binds a pipeline and its set 0, then draws one full-screen triangle
/// generated in the vertex shader.
pub struct FullscreenAction {
    pipeline: Arc<dyn Pipeline>,
    binding_group: Arc<dyn BindingGroup>,
}

impl FullscreenAction {
    pub fn new(pipeline: Arc<dyn Pipeline>, binding_group: Arc<dyn BindingGroup>) -> Self {
        Self { pipeline, binding_group }
    }
}

impl PassAction for FullscreenAction {
    fn execute(&mut self, cmd: &mut dyn CommandList) -> Result<()> {
        cmd.bind_pipeline(&self.pipeline)?;
        cmd.bind_binding_group(&self.pipeline, 0, &self.binding_group)?;
        cmd.draw(3, 1, 0, 0)
    }
}

/// Geometry pass action
///
/// Binds the scene parameters at set 0 and lets the drawable bind its
/// material set and issue its draws.
pub struct GeometryAction<'a> {
    pipeline: &'a Arc<dyn Pipeline>,
    binding_group: &'a Arc<dyn BindingGroup>,
    drawable: &'a dyn Drawable,
}

impl<'a> GeometryAction<'a> {
    pub fn new(
        pipeline: &'a Arc<dyn Pipeline>,
        binding_group: &'a Arc<dyn BindingGroup>,
        drawable: &'a dyn Drawable,
    ) -> Self {
        Self { pipeline, binding_group, drawable }
    }
}

impl PassAction for GeometryAction<'_> {
    fn execute(&mut self, cmd: &mut dyn CommandList) -> Result<()> {
        cmd.bind_pipeline(self.pipeline)?;
        cmd.bind_binding_group(self.pipeline, 0, self.binding_group)?;
        self.drawable.draw(cmd, self.pipeline)
    }
}

/// Custom pass action (closure-based)
///
/// Runs a full-screen action, then hands the command list to a closure.
/// The composition uses it to draw the debug overlay on top.
pub struct CustomAction<'a> {
    fullscreen: FullscreenAction,
    callback: Box<dyn FnMut(&mut dyn CommandList) -> Result<()> + 'a>,
}

impl<'a> CustomAction<'a> {
    pub fn new<F>(fullscreen: FullscreenAction, callback: F) -> Self
    where
        F: FnMut(&mut dyn CommandList) -> Result<()> + 'a,
    {
        Self { fullscreen, callback: Box::new(callback) }
    }

    /// Full-screen draw followed by the overlay
    pub fn with_overlay(fullscreen: FullscreenAction, overlay: &'a mut dyn DebugOverlay) -> Self {
        Self::new(fullscreen, move |cmd| overlay.render(cmd))
    }
}

impl PassAction for CustomAction<'_> {
    fn execute(&mut self, cmd: &mut dyn CommandList) -> Result<()> {
        self.fullscreen.execute(cmd)?;
        (self.callback)(cmd)
    }
}

/// Record one render pass instance
///
/// Viewport and scissor cover `width` x `height`.
pub fn record_pass(
    cmd: &mut dyn CommandList,
    render_pass: &Arc<dyn RenderPass>,
    framebuffer: &Arc<dyn Framebuffer>,
    clear_values: &[ClearValue],
    width: u32,
    height: u32,
    action: &mut dyn PassAction,
) -> Result<()> {
    cmd.begin_render_pass(render_pass, framebuffer, clear_values)?;
    cmd.set_viewport(Viewport::full(width, height))?;
    cmd.set_scissor(Rect2D::full(width, height))?;
    action.execute(cmd)?;
    cmd.end_render_pass()
}

/// Record a full-screen pass into an offscreen target at the target's size
pub fn record_fullscreen_pass(
    cmd: &mut dyn CommandList,
    target: &RenderTarget,
    pipeline: &Arc<dyn Pipeline>,
    binding_group: &Arc<dyn BindingGroup>,
) -> Result<()> {
    let mut action = FullscreenAction::new(pipeline.clone(), binding_group.clone());
    record_pass(
        cmd,
        target.render_pass(),
        target.framebuffer(),
        target.clear_values(),
        target.width(),
        target.height(),
        &mut action,
    )
}

#[cfg(test)]
#[path = "pass_action_tests.rs"]
mod tests;
