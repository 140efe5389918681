/// Debug overlay hook
///
/// The composition pass hands its command list to the overlay after the
/// full-screen draw, inside the same render pass. An overlay with widgets
/// edits the occlusion controls and reports whether anything changed.

use crate::error::Result;
use crate::graphics_device::CommandList;
use crate::occlusion::{OcclusionControls, ParameterRanges};

pub trait DebugOverlay {
    /// Record overlay draws into the active composition pass
    fn render(&mut self, cmd: &mut dyn CommandList) -> Result<()>;

    /// Present the controls for editing; true if any value changed
    fn edit(&mut self, _controls: &mut OcclusionControls, _ranges: &ParameterRanges) -> bool {
        false
    }
}

/// Overlay that draws nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOverlay;

impl DebugOverlay for NullOverlay {
    fn render(&mut self, _cmd: &mut dyn CommandList) -> Result<()> {
        Ok(())
    }
}
