/// CommandList - Vulkan implementation of the CommandList trait
///
/// Each list owns its pool and a single primary command buffer that is
/// reset by `begin()`. The owning frame slot guarantees the GPU is done
/// with the previous recording before `begin()` is called again.

use ssao_engine::ssao::{Error, Result};
use ssao_engine::ssao::device::{
    CommandList, RenderPass, Framebuffer, Pipeline, Buffer, BindingGroup,
    IndexType, Viewport, Rect2D, ClearValue,
};
use ash::vk;
use std::sync::Arc;

use crate::vulkan::{index_type_to_vk, vk_error};
use crate::vulkan_binding_group::VulkanBindingGroup;
use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_render_pass::VulkanRenderPass;

pub struct VulkanCommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
}

impl VulkanCommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let command_pool_create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(ctx.graphics_queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let command_pool = unsafe { ctx.device.create_command_pool(&command_pool_create_info, None) }
            .map_err(|e| vk_error("create command pool", e))?;

        let command_buffer_allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffer = match unsafe { ctx.device.allocate_command_buffers(&command_buffer_allocate_info) } {
            Ok(buffers) if !buffers.is_empty() => buffers[0],
            Ok(_) => {
                unsafe { ctx.device.destroy_command_pool(command_pool, None) };
                return Err(Error::BackendError("driver returned no command buffer".to_string()));
            }
            Err(e) => {
                unsafe { ctx.device.destroy_command_pool(command_pool, None) };
                return Err(vk_error("allocate command buffer", e));
            }
        };

        Ok(Self {
            ctx,
            command_pool,
            command_buffer,
            is_recording: false,
            in_render_pass: false,
        })
    }

    /// Get the underlying Vulkan command buffer
    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn ensure_recording(&self, operation: &str) -> Result<()> {
        if !self.is_recording {
            return Err(Error::InvalidState(format!("{}: command list is not recording", operation)));
        }
        Ok(())
    }

    fn ensure_in_render_pass(&self, operation: &str) -> Result<()> {
        self.ensure_recording(operation)?;
        if !self.in_render_pass {
            return Err(Error::InvalidState(format!("{}: no render pass is active", operation)));
        }
        Ok(())
    }
}

impl CommandList for VulkanCommandList {
    /// Resets the buffer, discarding a recording abandoned by an earlier error
    fn begin(&mut self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| vk_error("reset command buffer", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| vk_error("begin command buffer", e))?;
        }

        self.is_recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording("end")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("end: render pass still active".to_string()));
        }

        unsafe { self.ctx.device.end_command_buffer(self.command_buffer) }
            .map_err(|e| vk_error("end command buffer", e))?;

        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.ensure_recording("begin_render_pass")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("begin_render_pass: a render pass is already active".to_string()));
        }

        let vk_render_pass = unsafe { &*(render_pass.as_ref() as *const dyn RenderPass as *const VulkanRenderPass) };
        let vk_framebuffer = unsafe { &*(framebuffer.as_ref() as *const dyn Framebuffer as *const VulkanFramebuffer) };

        let vk_clear_values: Vec<vk::ClearValue> = clear_values
            .iter()
            .map(|clear| match clear {
                ClearValue::Color(color) => vk::ClearValue {
                    color: vk::ClearColorValue { float32: *color },
                },
                ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
                    depth_stencil: vk::ClearDepthStencilValue { depth: *depth, stencil: *stencil },
                },
            })
            .collect();

        let render_pass_begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: framebuffer.width(), height: framebuffer.height() },
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_begin_info,
                vk::SubpassContents::INLINE,
            );
        }

        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_in_render_pass("end_render_pass")?;

        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }

        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_recording("set_viewport")?;

        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };

        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.ensure_recording("set_scissor")?;

        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };

        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.ensure_in_render_pass("bind_pipeline")?;

        let vk_pipeline = unsafe { &*(pipeline.as_ref() as *const dyn Pipeline as *const VulkanPipeline) };
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }
        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        binding_group: &Arc<dyn BindingGroup>,
    ) -> Result<()> {
        self.ensure_recording("bind_binding_group")?;
        if binding_group.set_index() != set_index {
            return Err(Error::InvalidResource(format!(
                "binding group for set {} bound at set {}", binding_group.set_index(), set_index
            )));
        }

        let vk_pipeline = unsafe { &*(pipeline.as_ref() as *const dyn Pipeline as *const VulkanPipeline) };
        let vk_group = unsafe { &*(binding_group.as_ref() as *const dyn BindingGroup as *const VulkanBindingGroup) };

        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline_layout,
                set_index,
                &[vk_group.descriptor_set],
                &[],
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        self.ensure_recording("bind_vertex_buffer")?;

        let vk_buffer = unsafe { &*(buffer.as_ref() as *const dyn Buffer as *const VulkanBuffer) };
        unsafe {
            self.ctx
                .device
                .cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, index_type: IndexType) -> Result<()> {
        self.ensure_recording("bind_index_buffer")?;

        let vk_buffer = unsafe { &*(buffer.as_ref() as *const dyn Buffer as *const VulkanBuffer) };
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> Result<()> {
        self.ensure_in_render_pass("draw")?;

        unsafe {
            self.ctx
                .device
                .cmd_draw(self.command_buffer, vertex_count, instance_count, first_vertex, first_instance);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.ensure_in_render_pass("draw_indexed")?;

        unsafe {
            self.ctx
                .device
                .cmd_draw_indexed(self.command_buffer, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }
}

impl Drop for VulkanCommandList {
    fn drop(&mut self) {
        unsafe {
            // Freeing the pool frees its command buffer
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
