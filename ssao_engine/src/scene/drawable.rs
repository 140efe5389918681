/// Drawable and scene loader traits, plus the standard vertex layout.

use std::mem::{offset_of, size_of};
use std::path::Path;
use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use crate::error::Result;
use crate::graphics_device::{
    BindingGroupLayoutDesc, BufferFormat, CommandList, GraphicsDevice, Pipeline, VertexAttribute,
    VertexBinding, VertexInputRate, VertexLayout,
};

/// Set index the drawable's material binding group is bound at
pub const MATERIAL_SET_INDEX: u32 = 1;

/// Renderable geometry with its own material bindings
///
/// Called inside the geometry pass after the pipeline and the scene
/// parameters (set 0) are bound.
pub trait Drawable: Send + Sync {
    /// Vertex input of the geometry pipeline
    fn vertex_layout(&self) -> VertexLayout;

    /// Layout of the material set (set 1)
    fn material_layout(&self) -> BindingGroupLayoutDesc;

    /// Bind vertex/index buffers and materials, then issue draws
    fn draw(&self, cmd: &mut dyn CommandList, pipeline: &Arc<dyn Pipeline>) -> Result<()>;
}

/// Loads a model file into GPU buffers
pub trait SceneLoader {
    fn load(&self, device: &dyn GraphicsDevice, path: &Path) -> Result<Box<dyn Drawable>>;
}

/// Standard interleaved vertex: position, uv, color, normal
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
    pub normal: [f32; 3],
}

impl SceneVertex {
    /// Locations 0..3 = position, uv, color, normal on binding 0
    pub fn layout() -> VertexLayout {
        let attribute = |location, format, offset: usize| VertexAttribute {
            location,
            binding: 0,
            format,
            offset: offset as u32,
        };
        VertexLayout {
            bindings: vec![VertexBinding {
                binding: 0,
                stride: size_of::<SceneVertex>() as u32,
                input_rate: VertexInputRate::Vertex,
            }],
            attributes: vec![
                attribute(0, BufferFormat::R32G32B32_SFLOAT, offset_of!(SceneVertex, position)),
                attribute(1, BufferFormat::R32G32_SFLOAT, offset_of!(SceneVertex, uv)),
                attribute(2, BufferFormat::R32G32B32_SFLOAT, offset_of!(SceneVertex, color)),
                attribute(3, BufferFormat::R32G32B32_SFLOAT, offset_of!(SceneVertex, normal)),
            ],
        }
    }
}

#[cfg(test)]
#[path = "drawable_tests.rs"]
mod tests;
