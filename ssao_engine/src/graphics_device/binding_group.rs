/// BindingGroup trait and binding layout descriptors
///
/// A binding group is an immutable set of resources (uniform buffers,
/// sampled attachments) bound to one descriptor-set index of a pipeline.

use crate::graphics_device::{Buffer, Texture, Sampler};

/// Type of resource at a binding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingType {
    UniformBuffer,
    CombinedImageSampler,
}

bitflags::bitflags! {
    /// Shader stages that may access a binding
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 1 << 0;
        const FRAGMENT = 1 << 1;
    }
}

/// One binding slot of a binding group layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingSlotDesc {
    pub binding: u32,
    pub binding_type: BindingType,
    pub count: u32,
    pub stage_flags: ShaderStageFlags,
}

impl BindingSlotDesc {
    pub fn uniform(binding: u32, stage_flags: ShaderStageFlags) -> Self {
        Self { binding, binding_type: BindingType::UniformBuffer, count: 1, stage_flags }
    }

    pub fn sampled(binding: u32, stage_flags: ShaderStageFlags) -> Self {
        Self { binding, binding_type: BindingType::CombinedImageSampler, count: 1, stage_flags }
    }
}

/// Layout of one binding group (descriptor set layout)
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BindingGroupLayoutDesc {
    pub entries: Vec<BindingSlotDesc>,
}

impl BindingGroupLayoutDesc {
    /// Number of slots of the given type
    pub fn count_of(&self, binding_type: BindingType) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.binding_type == binding_type)
            .map(|e| e.count)
            .sum()
    }

    pub fn find(&self, binding: u32) -> Option<&BindingSlotDesc> {
        self.entries.iter().find(|e| e.binding == binding)
    }
}

/// Pool capacity reserved up front for the per-frame binding groups
///
/// Each frame slot owns four groups: geometry, occlusion, blur and
/// composition. Backends grow the pool past this when it runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingGroupBudget {
    pub uniform_buffers: u32,
    pub combined_image_samplers: u32,
    pub max_sets: u32,
}

impl BindingGroupBudget {
    pub fn for_frames(frames_in_flight: u32) -> Self {
        Self {
            uniform_buffers: 4 * frames_in_flight,
            combined_image_samplers: 9 * frames_in_flight,
            max_sets: 4 * frames_in_flight,
        }
    }
}

/// A resource written into one slot, in layout order
pub enum BindingResource<'a> {
    UniformBuffer(&'a dyn Buffer),
    SampledTexture(&'a dyn Texture, &'a dyn Sampler),
}

impl BindingResource<'_> {
    pub fn binding_type(&self) -> BindingType {
        match self {
            BindingResource::UniformBuffer(_) => BindingType::UniformBuffer,
            BindingResource::SampledTexture(..) => BindingType::CombinedImageSampler,
        }
    }

    /// Label of the buffer or texture
    pub fn label(&self) -> &str {
        match self {
            BindingResource::UniformBuffer(buffer) => buffer.label(),
            BindingResource::SampledTexture(texture, _) => &texture.info().label,
        }
    }
}

/// Binding group trait
pub trait BindingGroup: Send + Sync {
    /// Set index this group was created for
    fn set_index(&self) -> u32;

    /// Labels of the bound resources, in binding order
    fn resource_labels(&self) -> &[String];
}
