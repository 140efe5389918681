/// Presentation context: swapchain images, frame fences and submission.
///
/// The renderer drives one `GraphicsContext` from a single thread. A slot
/// index selects the per-frame resources; the fence returned with the slot
/// signals when the GPU has finished the previous use of that slot.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{CommandList, Framebuffer, RenderPass};

/// Host-waitable signal of GPU completion
pub trait Fence: Send + Sync {
    /// Block until signaled
    ///
    /// Fails with `FrameTimeout` after `timeout_ns` nanoseconds.
    fn wait(&self, timeout_ns: u64) -> Result<()>;
}

/// A swapchain image acquired for one frame
#[derive(Clone)]
pub struct AcquiredFrame {
    /// Swapchain image to render the composition into
    pub image_index: u32,
    /// Per-frame resource slot, in `0..frames_in_flight()`
    pub slot: usize,
    /// Signaled when the last submission using `slot` completes
    pub fence: Arc<dyn Fence>,
}

pub trait GraphicsContext {
    /// Acquire the next swapchain image
    ///
    /// Fails with `SurfaceOutOfDate` when the swapchain must be recreated,
    /// and with `FrameTimeout` when no image becomes available in time.
    fn acquire_frame(&mut self) -> Result<AcquiredFrame>;

    /// Submit `commands`, waiting on image acquisition and signaling the
    /// frame's fence
    ///
    /// A failed submission leaves the slot's fence signaled, so the next
    /// frame can retry the slot.
    fn submit(&mut self, commands: &dyn CommandList, frame: &AcquiredFrame) -> Result<()>;

    /// Queue the image for presentation and advance to the next slot
    fn present(&mut self, frame: &AcquiredFrame) -> Result<()>;

    fn frames_in_flight(&self) -> usize;

    /// Current swapchain extent
    fn extent(&self) -> (u32, u32);

    /// Render pass the composition renders into
    fn presentation_pass(&self) -> Arc<dyn RenderPass>;

    fn presentation_framebuffer(&self, image_index: u32) -> Result<Arc<dyn Framebuffer>>;

    /// Rebuild the swapchain and its framebuffers for a new window size
    ///
    /// The presentation pass stays compatible.
    fn recreate(&mut self, width: u32, height: u32) -> Result<()>;
}
