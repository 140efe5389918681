/// Pipeline/shader binding layer
///
/// Declares, per pass, the set 0 binding layout, the shader pair and the
/// fixed-function state, and creates the four pipelines of a frame. The
/// descriptions are plain data so they can be compared and tested without
/// a device.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    BindingGroupLayoutDesc, BindingSlotDesc, ColorBlendState, CullMode, DepthStencilState,
    GraphicsDevice, Pipeline, PipelineDesc, PrimitiveTopology, RasterizationState, RenderPass,
    Shader, ShaderStage, ShaderStageFlags, SpecializationConstant, VertexLayout,
};
use crate::occlusion::OcclusionStrategy;
use crate::render_graph::{RenderTargetGraph, TargetId};
use crate::scene::Drawable;
use crate::shader_loader::ShaderLoader;

/// The four passes of a frame, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassKind {
    GeometryFill,
    OcclusionGenerate,
    OcclusionBlur,
    Composition,
}

impl PassKind {
    pub const ALL: [PassKind; 4] = [
        PassKind::GeometryFill,
        PassKind::OcclusionGenerate,
        PassKind::OcclusionBlur,
        PassKind::Composition,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PassKind::GeometryFill => "geometry",
            PassKind::OcclusionGenerate => "occlusion",
            PassKind::OcclusionBlur => "occlusion_blur",
            PassKind::Composition => "composition",
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Whether the pass draws a full-screen triangle without vertex input
    pub fn is_fullscreen(&self) -> bool {
        !matches!(self, PassKind::GeometryFill)
    }
}

// ===== BINDING LAYOUTS =====

/// Layout of set 0 for `pass`
pub fn binding_layout(pass: PassKind) -> BindingGroupLayoutDesc {
    let fs = ShaderStageFlags::FRAGMENT;
    let entries = match pass {
        PassKind::GeometryFill => vec![
            BindingSlotDesc::uniform(0, ShaderStageFlags::VERTEX | ShaderStageFlags::FRAGMENT),
        ],
        PassKind::OcclusionGenerate => vec![
            BindingSlotDesc::sampled(0, fs),
            BindingSlotDesc::sampled(1, fs),
            BindingSlotDesc::uniform(2, fs),
            BindingSlotDesc::uniform(3, fs),
        ],
        PassKind::OcclusionBlur => vec![
            BindingSlotDesc::sampled(0, fs),
        ],
        PassKind::Composition => vec![
            BindingSlotDesc::sampled(0, fs),
            BindingSlotDesc::sampled(1, fs),
            BindingSlotDesc::sampled(2, fs),
            BindingSlotDesc::sampled(3, fs),
            BindingSlotDesc::sampled(4, fs),
            BindingSlotDesc::uniform(5, fs),
        ],
    };
    BindingGroupLayoutDesc { entries }
}

// ===== SHADERS =====

/// Vertex and fragment shader names of `pass`
pub fn shader_names(pass: PassKind, strategy: &dyn OcclusionStrategy) -> (&'static str, &'static str) {
    match pass {
        PassKind::GeometryFill => ("gbuffer.vert", "gbuffer.frag"),
        PassKind::OcclusionGenerate => ("fullscreen.vert", strategy.fragment_shader()),
        PassKind::OcclusionBlur => ("fullscreen.vert", "blur.frag"),
        PassKind::Composition => ("fullscreen.vert", "composition.frag"),
    }
}

/// Loader-relative path of shader `name` for `strategy`
pub fn shader_path(strategy: &dyn OcclusionStrategy, name: &str) -> String {
    format!("{}/{}", strategy.shader_dir(), name)
}

// ===== PIPELINE DESCRIPTIONS =====

/// Full pipeline description of `pass`
///
/// `drawable` supplies the vertex input and the material set of the
/// geometry pass and is ignored for full-screen passes.
pub fn describe(
    pass: PassKind,
    strategy: &dyn OcclusionStrategy,
    render_pass: Arc<dyn RenderPass>,
    vertex_shader: Arc<dyn Shader>,
    fragment_shader: Arc<dyn Shader>,
    drawable: &dyn Drawable,
) -> PipelineDesc {
    let color_attachments = render_pass.color_attachment_count();
    let (vertex_layout, rasterization, depth_stencil, binding_group_layouts) = match pass {
        PassKind::GeometryFill => (
            drawable.vertex_layout(),
            RasterizationState::default(),
            DepthStencilState::default(),
            vec![binding_layout(pass), drawable.material_layout()],
        ),
        _ => (
            VertexLayout::default(),
            RasterizationState { cull_mode: CullMode::Front, ..RasterizationState::default() },
            DepthStencilState::disabled(),
            vec![binding_layout(pass)],
        ),
    };
    let specialization = match pass {
        PassKind::OcclusionGenerate => strategy.specialization(),
        _ => Vec::new(),
    };

    PipelineDesc {
        label: pass.label().to_string(),
        render_pass,
        vertex_shader,
        fragment_shader,
        specialization,
        vertex_layout,
        topology: PrimitiveTopology::TriangleList,
        rasterization,
        depth_stencil,
        color_blend_attachments: vec![ColorBlendState::default(); color_attachments],
        binding_group_layouts,
    }
}

/// Structural description of a pipeline
///
/// Two signatures compare equal when the pipelines were built from the same
/// shaders, layouts, constants and fixed-function state for the same render
/// pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSignature {
    pub label: String,
    pub render_pass: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub specialization: Vec<SpecializationConstant>,
    pub vertex_layout: VertexLayout,
    pub rasterization: RasterizationState,
    pub depth_stencil: DepthStencilState,
    pub color_blend_attachments: Vec<ColorBlendState>,
    pub binding_group_layouts: Vec<BindingGroupLayoutDesc>,
}

impl From<&PipelineDesc> for PipelineSignature {
    fn from(desc: &PipelineDesc) -> Self {
        Self {
            label: desc.label.clone(),
            render_pass: desc.render_pass.label().to_string(),
            vertex_shader: desc.vertex_shader.label().to_string(),
            fragment_shader: desc.fragment_shader.label().to_string(),
            specialization: desc.specialization.clone(),
            vertex_layout: desc.vertex_layout.clone(),
            rasterization: desc.rasterization,
            depth_stencil: desc.depth_stencil,
            color_blend_attachments: desc.color_blend_attachments.clone(),
            binding_group_layouts: desc.binding_group_layouts.clone(),
        }
    }
}

/// A created pipeline and what it was created from
pub struct PassPipeline {
    pipeline: Arc<dyn Pipeline>,
    signature: PipelineSignature,
}

impl PassPipeline {
    pub fn pipeline(&self) -> &Arc<dyn Pipeline> {
        &self.pipeline
    }

    pub fn signature(&self) -> &PipelineSignature {
        &self.signature
    }
}

// ===== PIPELINE SET =====

/// The four pipelines of a frame, immutable once created
pub struct PipelineSet {
    /// Indexed by `PassKind::index()`
    passes: Vec<PassPipeline>,
}

impl PipelineSet {
    /// Load the shaders and create one pipeline per pass
    ///
    /// Offscreen passes target the graph's render passes; the composition
    /// targets `presentation_pass`.
    pub fn new(
        device: &dyn GraphicsDevice,
        shaders: &dyn ShaderLoader,
        strategy: &dyn OcclusionStrategy,
        graph: &RenderTargetGraph,
        presentation_pass: Arc<dyn RenderPass>,
        drawable: &dyn Drawable,
    ) -> Result<Self> {
        let mut cache = ShaderCache::default();
        let mut passes = Vec::with_capacity(PassKind::ALL.len());

        for pass in PassKind::ALL {
            let render_pass = match pass {
                PassKind::GeometryFill => graph.render_pass(TargetId::GBuffer).clone(),
                PassKind::OcclusionGenerate => graph.render_pass(TargetId::Occlusion).clone(),
                PassKind::OcclusionBlur => graph.render_pass(TargetId::OcclusionBlur).clone(),
                PassKind::Composition => presentation_pass.clone(),
            };
            let (vs_name, fs_name) = shader_names(pass, strategy);
            let vertex_shader = cache.get(device, shaders, &shader_path(strategy, vs_name), ShaderStage::Vertex)?;
            let fragment_shader = cache.get(device, shaders, &shader_path(strategy, fs_name), ShaderStage::Fragment)?;

            let desc = describe(pass, strategy, render_pass, vertex_shader, fragment_shader, drawable);
            let signature = PipelineSignature::from(&desc);
            let pipeline = device.create_pipeline(desc)?;

            crate::engine_debug!("ssao::PipelineSet", "Created '{}' pipeline ({} + {})",
                pass.label(), signature.vertex_shader, signature.fragment_shader);

            passes.push(PassPipeline { pipeline, signature });
        }

        Ok(Self { passes })
    }

    pub fn get(&self, pass: PassKind) -> &Arc<dyn Pipeline> {
        self.passes[pass.index()].pipeline()
    }

    pub fn signature(&self, pass: PassKind) -> &PipelineSignature {
        self.passes[pass.index()].signature()
    }
}

/// Loads each shader once per `PipelineSet::new`
#[derive(Default)]
struct ShaderCache {
    loaded: Vec<(String, Arc<dyn Shader>)>,
}

impl ShaderCache {
    fn get(
        &mut self,
        device: &dyn GraphicsDevice,
        loader: &dyn ShaderLoader,
        name: &str,
        stage: ShaderStage,
    ) -> Result<Arc<dyn Shader>> {
        if let Some((_, shader)) = self.loaded.iter().find(|(loaded, _)| loaded == name) {
            return Ok(shader.clone());
        }
        let shader = loader.load(device, name, stage)?;
        self.loaded.push((name.to_string(), shader.clone()));
        Ok(shader)
    }
}

#[cfg(test)]
#[path = "pipelines_tests.rs"]
mod tests;
