/// RenderPass trait and render pass descriptor
///
/// A render pass declares its attachments (load/store behaviour, layout
/// transitions) and the subpass dependencies that order it against work
/// recorded before and after it. Those dependencies are the only
/// synchronization between the passes of a frame.

use crate::graphics_device::TextureFormat;

/// Render pass trait
pub trait RenderPass: Send + Sync {
    /// Debug label
    fn label(&self) -> &str;

    /// Number of color attachments
    fn color_attachment_count(&self) -> usize;

    /// Whether a depth/stencil attachment is declared
    fn has_depth_stencil(&self) -> bool;
}

/// Descriptor for creating a render pass
#[derive(Debug, Clone)]
pub struct RenderPassDesc {
    /// Debug label
    pub label: String,
    /// Color attachments, in framebuffer order
    pub color_attachments: Vec<AttachmentDesc>,
    /// Optional depth/stencil attachment (placed after the colors)
    pub depth_stencil_attachment: Option<AttachmentDesc>,
    /// Dependencies against work outside the single subpass
    pub dependencies: Vec<SubpassDependency>,
}

impl RenderPassDesc {
    /// Total number of attachments, depth included
    pub fn attachment_count(&self) -> usize {
        self.color_attachments.len() + usize::from(self.depth_stencil_attachment.is_some())
    }
}

/// Descriptor for a single attachment in a render pass. Always single-sampled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentDesc {
    /// Pixel format
    pub format: TextureFormat,
    /// Load operation for color/depth
    pub load_op: LoadOp,
    /// Store operation for color/depth
    pub store_op: StoreOp,
    /// Load operation for stencil
    pub stencil_load_op: LoadOp,
    /// Store operation for stencil
    pub stencil_store_op: StoreOp,
    /// Layout the image is in when the pass begins
    pub initial_layout: ImageLayout,
    /// Layout the image is transitioned to when the pass ends
    pub final_layout: ImageLayout,
}

impl AttachmentDesc {
    /// Clear on load, store on end, stencil discarded
    pub fn cleared(format: TextureFormat, final_layout: ImageLayout) -> Self {
        Self {
            format,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout,
        }
    }
}

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// Image layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Contents discarded
    Undefined,
    ColorAttachment,
    DepthStencilAttachment,
    /// Depth/stencil readable by shaders, not writable
    DepthStencilReadOnly,
    ShaderReadOnly,
    PresentSrc,
}

/// Subpass on one side of a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubpassRef {
    /// Commands recorded before or after the render pass instance
    External,
    /// A subpass of this render pass
    Index(u32),
}

bitflags::bitflags! {
    /// Pipeline stages a dependency waits on or blocks
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const VERTEX_SHADER = 1 << 1;
        const FRAGMENT_SHADER = 1 << 2;
        const EARLY_FRAGMENT_TESTS = 1 << 3;
        const LATE_FRAGMENT_TESTS = 1 << 4;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 5;
        const BOTTOM_OF_PIPE = 1 << 6;
    }
}

bitflags::bitflags! {
    /// Memory accesses made available or visible by a dependency
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const SHADER_READ = 1 << 0;
        const COLOR_ATTACHMENT_READ = 1 << 1;
        const COLOR_ATTACHMENT_WRITE = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 4;
        const MEMORY_READ = 1 << 5;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DependencyFlags: u32 {
        /// Dependency is framebuffer-local (per pixel region)
        const BY_REGION = 1 << 0;
    }
}

/// Execution and memory dependency between a subpass and outside work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src_subpass: SubpassRef,
    pub dst_subpass: SubpassRef,
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub flags: DependencyFlags,
}

impl SubpassDependency {
    /// True when the dependency orders outside work before subpass 0
    pub fn is_entry(&self) -> bool {
        self.src_subpass == SubpassRef::External && self.dst_subpass == SubpassRef::Index(0)
    }

    /// True when the dependency orders subpass 0 before outside work
    pub fn is_exit(&self) -> bool {
        self.src_subpass == SubpassRef::Index(0) && self.dst_subpass == SubpassRef::External
    }
}
