/// Per-frame resource set
///
/// One slot per frame in flight. A slot owns its uniform buffers, its
/// binding groups and its command list, so the host can fill slot `k+1`
/// while the GPU still reads slot `k`. The attachments and the sampler
/// referenced by the binding groups are shared by every slot.

use std::mem::size_of;
use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{
    BindingGroup, BindingGroupBudget, BindingResource, Buffer, BufferDesc, BufferUsage,
    CommandList, GraphicsDevice, Sampler, Texture,
};
use crate::occlusion::OcclusionStrategy;
use crate::pipelines::{PassKind, PipelineSet};
use crate::render_graph::{RenderTarget, RenderTargetGraph, TargetId};
use crate::uniforms::{OcclusionParams, SceneUniforms};

pub struct FrameSlot {
    scene_params: Arc<dyn Buffer>,
    occlusion_params: Arc<dyn Buffer>,
    occlusion_settings: Arc<dyn Buffer>,
    /// Indexed by `PassKind::index()`
    binding_groups: Vec<Arc<dyn BindingGroup>>,
    command_list: Box<dyn CommandList>,
    in_flight: bool,
}

impl FrameSlot {
    pub fn scene_params(&self) -> &Arc<dyn Buffer> {
        &self.scene_params
    }

    pub fn occlusion_params(&self) -> &Arc<dyn Buffer> {
        &self.occlusion_params
    }

    pub fn occlusion_settings(&self) -> &Arc<dyn Buffer> {
        &self.occlusion_settings
    }

    /// Binding group for set 0 of `pass`
    pub fn binding_group(&self, pass: PassKind) -> &Arc<dyn BindingGroup> {
        &self.binding_groups[pass.index()]
    }

    pub fn command_list(&self) -> &dyn CommandList {
        self.command_list.as_ref()
    }

    pub fn command_list_mut(&mut self) -> &mut dyn CommandList {
        self.command_list.as_mut()
    }

    /// True between submit and the completion of the slot's fence wait
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }
}

pub struct FrameResources {
    slots: Vec<FrameSlot>,
}

impl FrameResources {
    /// Create `frames_in_flight` slots
    ///
    /// # Errors
    ///
    /// * `InvalidState` - zero slots requested
    /// * `ResourceExhausted` - buffer or binding group allocation failed
    pub fn allocate(
        device: &dyn GraphicsDevice,
        frames_in_flight: usize,
        pipelines: &PipelineSet,
        graph: &RenderTargetGraph,
        sampler: &Arc<dyn Sampler>,
        strategy: &dyn OcclusionStrategy,
    ) -> Result<Self> {
        if frames_in_flight == 0 {
            return Err(Error::InvalidState("at least one frame slot is required".to_string()));
        }
        device.reserve_binding_groups(BindingGroupBudget::for_frames(frames_in_flight as u32))?;

        let mut slots = Vec::with_capacity(frames_in_flight);
        for index in 0..frames_in_flight {
            let uniform = |name: &str, size: u64| {
                device.create_buffer(BufferDesc {
                    label: format!("{}[{}]", name, index),
                    size,
                    usage: BufferUsage::Uniform,
                })
            };
            let scene_params = uniform("scene_params", size_of::<SceneUniforms>() as u64)?;
            let occlusion_params = uniform("occlusion_params", size_of::<OcclusionParams>() as u64)?;
            let occlusion_settings = uniform("occlusion_settings", strategy.settings_size())?;

            let binding_groups = create_binding_groups(
                device, pipelines, graph, sampler, &scene_params, &occlusion_params, &occlusion_settings,
            )?;
            let command_list = device.create_command_list()?;

            slots.push(FrameSlot {
                scene_params,
                occlusion_params,
                occlusion_settings,
                binding_groups,
                command_list,
                in_flight: false,
            });
        }

        crate::engine_debug!("ssao::FrameResources", "Allocated {} frame slots", frames_in_flight);
        Ok(Self { slots })
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> Result<&FrameSlot> {
        self.slots.get(index).ok_or_else(|| out_of_range(index, self.slots.len()))
    }

    pub fn slot_mut(&mut self, index: usize) -> Result<&mut FrameSlot> {
        let count = self.slots.len();
        self.slots.get_mut(index).ok_or_else(|| out_of_range(index, count))
    }

    /// Copy this frame's parameters into the slot's mapped buffers
    ///
    /// Fails with `InvalidState` while the GPU may still read the slot.
    pub fn update(
        &mut self,
        index: usize,
        scene: &SceneUniforms,
        params: &OcclusionParams,
        settings: &[u8],
    ) -> Result<()> {
        let slot = self.slot(index)?;
        if slot.in_flight {
            return Err(Error::InvalidState(format!("frame slot {} is still in flight", index)));
        }
        slot.scene_params.update(0, bytemuck::bytes_of(scene))?;
        slot.occlusion_params.update(0, bytemuck::bytes_of(params))?;
        slot.occlusion_settings.update(0, settings)?;
        Ok(())
    }

    /// Record that the slot was submitted
    pub fn mark_in_flight(&mut self, index: usize) -> Result<()> {
        self.slot_mut(index)?.in_flight = true;
        Ok(())
    }

    /// Record that the slot's fence has been waited on
    pub fn retire(&mut self, index: usize) -> Result<()> {
        self.slot_mut(index)?.in_flight = false;
        Ok(())
    }

    /// Rebuild every slot's binding groups against the current attachments
    ///
    /// Called after `RenderTargetGraph::resize`, once the GPU is idle.
    pub fn rebind(
        &mut self,
        device: &dyn GraphicsDevice,
        pipelines: &PipelineSet,
        graph: &RenderTargetGraph,
        sampler: &Arc<dyn Sampler>,
    ) -> Result<()> {
        for slot in &mut self.slots {
            slot.binding_groups = create_binding_groups(
                device, pipelines, graph, sampler,
                &slot.scene_params, &slot.occlusion_params, &slot.occlusion_settings,
            )?;
            slot.in_flight = false;
        }
        crate::engine_debug!("ssao::FrameResources", "Rebound {} frame slots", self.slots.len());
        Ok(())
    }
}

fn out_of_range(index: usize, count: usize) -> Error {
    Error::InvalidResource(format!("frame slot {} out of range (0..{})", index, count))
}

fn create_binding_groups(
    device: &dyn GraphicsDevice,
    pipelines: &PipelineSet,
    graph: &RenderTargetGraph,
    sampler: &Arc<dyn Sampler>,
    scene_params: &Arc<dyn Buffer>,
    occlusion_params: &Arc<dyn Buffer>,
    occlusion_settings: &Arc<dyn Buffer>,
) -> Result<Vec<Arc<dyn BindingGroup>>> {
    let gbuffer = graph.target(TargetId::GBuffer);
    let occlusion = graph.target(TargetId::Occlusion);
    let blur = graph.target(TargetId::OcclusionBlur);

    let sampled = |target: &RenderTarget, index: usize| -> Result<Arc<dyn Texture>> {
        target
            .attachment(index)
            .map(|a| a.texture().clone())
            .ok_or_else(|| Error::InvalidResource(format!("'{}' has no attachment {}", target.id().label(), index)))
    };
    let position = sampled(gbuffer, 0)?;
    let normal = sampled(gbuffer, 1)?;
    let albedo = sampled(gbuffer, 2)?;
    let occlusion_term = sampled(occlusion, 0)?;
    let blurred_term = sampled(blur, 0)?;
    let sampler = sampler.as_ref();

    let mut groups = Vec::with_capacity(PassKind::ALL.len());
    for pass in PassKind::ALL {
        let resources: Vec<BindingResource> = match pass {
            PassKind::GeometryFill => vec![
                BindingResource::UniformBuffer(scene_params.as_ref()),
            ],
            PassKind::OcclusionGenerate => vec![
                BindingResource::SampledTexture(position.as_ref(), sampler),
                BindingResource::SampledTexture(normal.as_ref(), sampler),
                BindingResource::UniformBuffer(occlusion_settings.as_ref()),
                BindingResource::UniformBuffer(occlusion_params.as_ref()),
            ],
            PassKind::OcclusionBlur => vec![
                BindingResource::SampledTexture(occlusion_term.as_ref(), sampler),
            ],
            PassKind::Composition => vec![
                BindingResource::SampledTexture(position.as_ref(), sampler),
                BindingResource::SampledTexture(normal.as_ref(), sampler),
                BindingResource::SampledTexture(albedo.as_ref(), sampler),
                BindingResource::SampledTexture(occlusion_term.as_ref(), sampler),
                BindingResource::SampledTexture(blurred_term.as_ref(), sampler),
                BindingResource::UniformBuffer(occlusion_params.as_ref()),
            ],
        };
        groups.push(device.create_binding_group(pipelines.get(pass), 0, &resources)?);
    }
    Ok(groups)
}

#[cfg(test)]
#[path = "frame_resources_tests.rs"]
mod tests;
