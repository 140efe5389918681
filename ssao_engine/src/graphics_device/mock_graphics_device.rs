/// Mock graphics device for unit tests (no GPU required)
///
/// Every mock writes what it does into one shared, ordered journal so tests
/// can assert on the interleaving of fence waits, uniform writes, recorded
/// commands and submissions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::graphics_context::{AcquiredFrame, Fence, GraphicsContext};
use crate::occlusion::{OcclusionControls, ParameterRanges};
use crate::overlay::DebugOverlay;
use crate::scene::{Drawable, SceneVertex};
use crate::shader_loader::ShaderLoader;
use crate::graphics_device::{
    GraphicsDevice, Buffer, BufferDesc, Texture, TextureDesc, TextureInfo, TextureFormat,
    TextureUsage, Shader, ShaderDesc, ShaderStage, ShaderBinding, Sampler, SamplerDesc,
    RenderPass, RenderPassDesc, Framebuffer, FramebufferDesc, Pipeline, PipelineDesc,
    BindingGroup, BindingGroupBudget, BindingResource, CommandList, ClearValue, Viewport, Rect2D, IndexType,
    BindingGroupLayoutDesc, BindingSlotDesc, ShaderStageFlags, VertexLayout,
};

/// Shared, ordered event log
pub type Journal = Arc<Mutex<Vec<String>>>;

fn push(journal: &Journal, entry: String) {
    journal.lock().unwrap().push(entry);
}

// ============================================================================
// Mock Buffer
// ============================================================================

pub struct MockBuffer {
    pub label: String,
    pub data: Mutex<Vec<u8>>,
    journal: Journal,
}

impl Buffer for MockBuffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut contents = self.data.lock().unwrap();
        let end = offset as usize + data.len();
        if end > contents.len() {
            return Err(Error::InvalidResource(format!("write past end of '{}'", self.label)));
        }
        contents[offset as usize..end].copy_from_slice(data);
        push(&self.journal, format!("write:{}", self.label));
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }

    fn label(&self) -> &str {
        &self.label
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

pub struct MockTexture {
    pub info: TextureInfo,
    pub dedicated: bool,
    live: Arc<AtomicUsize>,
}

impl Texture for MockTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for MockTexture {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Mock Shader / Sampler
// ============================================================================

pub struct MockShader {
    pub label: String,
    pub stage: ShaderStage,
    pub bindings: Vec<ShaderBinding>,
}

impl Shader for MockShader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn bindings(&self) -> &[ShaderBinding] {
        &self.bindings
    }
}

pub struct MockSampler {
    pub desc: SamplerDesc,
}

impl Sampler for MockSampler {
    fn desc(&self) -> &SamplerDesc {
        &self.desc
    }
}

// ============================================================================
// Mock RenderPass / Framebuffer
// ============================================================================

pub struct MockRenderPass {
    pub desc: RenderPassDesc,
}

impl RenderPass for MockRenderPass {
    fn label(&self) -> &str {
        &self.desc.label
    }

    fn color_attachment_count(&self) -> usize {
        self.desc.color_attachments.len()
    }

    fn has_depth_stencil(&self) -> bool {
        self.desc.depth_stencil_attachment.is_some()
    }
}

pub struct MockFramebuffer {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub attachment_labels: Vec<String>,
}

impl Framebuffer for MockFramebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn attachment_count(&self) -> usize {
        self.attachment_labels.len()
    }

    fn label(&self) -> &str {
        &self.label
    }
}

// ============================================================================
// Mock Pipeline / BindingGroup
// ============================================================================

pub struct MockPipeline {
    pub label: String,
    pub layout_count: u32,
}

impl Pipeline for MockPipeline {
    fn label(&self) -> &str {
        &self.label
    }

    fn binding_group_layout_count(&self) -> u32 {
        self.layout_count
    }
}

pub struct MockBindingGroup {
    pub set_index: u32,
    pub labels: Vec<String>,
}

impl BindingGroup for MockBindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }

    fn resource_labels(&self) -> &[String] {
        &self.labels
    }
}

// ============================================================================
// Mock CommandList
// ============================================================================

pub struct MockCommandList {
    pub commands: Vec<String>,
    journal: Journal,
    recording: bool,
}

impl MockCommandList {
    fn record(&mut self, command: String) {
        push(&self.journal, format!("cmd:{}", command));
        self.commands.push(command);
    }
}

impl CommandList for MockCommandList {
    fn begin(&mut self) -> Result<()> {
        self.commands.clear();
        self.recording = true;
        self.record("begin".to_string());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        if !self.recording {
            return Err(Error::InvalidState("end without begin".to_string()));
        }
        self.recording = false;
        self.record("end".to_string());
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.record(format!(
            "begin_render_pass:{}:{}:attachments={}:clears={}",
            render_pass.label(),
            framebuffer.label(),
            framebuffer.attachment_count(),
            clear_values.len()
        ));
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.record("end_render_pass".to_string());
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.record(format!("set_viewport:{}x{}", viewport.width, viewport.height));
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.record(format!("set_scissor:{}x{}", scissor.width, scissor.height));
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        self.record(format!("bind_pipeline:{}", pipeline.label()));
        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        binding_group: &Arc<dyn BindingGroup>,
    ) -> Result<()> {
        self.record(format!(
            "bind_binding_group:{}:set{}:{}",
            pipeline.label(),
            set_index,
            binding_group.resource_labels().join(",")
        ));
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()> {
        self.record(format!("bind_vertex_buffer:{}:{}", buffer.label(), offset));
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, index_type: IndexType) -> Result<()> {
        self.record(format!("bind_index_buffer:{}:{}:{:?}", buffer.label(), offset, index_type));
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, _first_vertex: u32, _first_instance: u32) -> Result<()> {
        self.record(format!("draw:{}x{}", vertex_count, instance_count));
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, _first_index: u32, _vertex_offset: i32) -> Result<()> {
        self.record(format!("draw_indexed:{}", index_count));
        Ok(())
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    pub journal: Journal,
    /// Formats reported as unsupported by `supports_format`
    pub unsupported_formats: Mutex<Vec<TextureFormat>>,
    /// When set, texture creation fails with ResourceExhausted
    pub fail_texture_allocation: AtomicBool,
    /// Number of textures currently alive
    pub live_textures: Arc<AtomicUsize>,
    /// Every pipeline descriptor received, in creation order
    pub pipelines: Mutex<Vec<PipelineDesc>>,
    /// Every render pass descriptor received, in creation order
    pub render_passes: Mutex<Vec<RenderPassDesc>>,
    /// Every buffer created, so tests can read back uniform contents
    pub buffers: Mutex<Vec<Arc<MockBuffer>>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::with_journal(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            unsupported_formats: Mutex::new(Vec::new()),
            fail_texture_allocation: AtomicBool::new(false),
            live_textures: Arc::new(AtomicUsize::new(0)),
            pipelines: Mutex::new(Vec::new()),
            render_passes: Mutex::new(Vec::new()),
            buffers: Mutex::new(Vec::new()),
        }
    }

    pub fn set_unsupported(&self, formats: &[TextureFormat]) {
        *self.unsupported_formats.lock().unwrap() = formats.to_vec();
    }

    /// Most recent buffer created with `label`
    pub fn buffer(&self, label: &str) -> Option<Arc<MockBuffer>> {
        self.buffers.lock().unwrap().iter().rev().find(|b| b.label == label).cloned()
    }

    /// Current contents of the buffer labeled `label`
    pub fn buffer_contents(&self, label: &str) -> Vec<u8> {
        self.buffer(label).map(|b| b.data.lock().unwrap().clone()).unwrap_or_default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn entries_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries().into_iter().filter(|e| e.starts_with(prefix)).collect()
    }

    pub fn clear_journal(&self) {
        self.journal.lock().unwrap().clear();
    }

    pub fn live_texture_count(&self) -> usize {
        self.live_textures.load(Ordering::SeqCst)
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        if self.fail_texture_allocation.load(Ordering::SeqCst) {
            return Err(Error::ResourceExhausted(format!("texture '{}'", desc.label)));
        }
        push(&self.journal, format!("create_texture:{}:{}x{}", desc.label, desc.width, desc.height));
        self.live_textures.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockTexture {
            info: TextureInfo::from(&desc),
            dedicated: desc.dedicated,
            live: self.live_textures.clone(),
        }))
    }

    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        push(&self.journal, format!("create_buffer:{}", desc.label));
        let buffer = Arc::new(MockBuffer {
            label: desc.label,
            data: Mutex::new(vec![0; desc.size as usize]),
            journal: self.journal.clone(),
        });
        self.buffers.lock().unwrap().push(buffer.clone());
        Ok(buffer as Arc<dyn Buffer>)
    }

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        push(&self.journal, format!("create_shader:{}", desc.label));
        Ok(Arc::new(MockShader { label: desc.label, stage: desc.stage, bindings: Vec::new() }))
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Arc<dyn Sampler>> {
        push(&self.journal, "create_sampler".to_string());
        Ok(Arc::new(MockSampler { desc: *desc }))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        push(&self.journal, format!("create_render_pass:{}", desc.label));
        self.render_passes.lock().unwrap().push(desc.clone());
        Ok(Arc::new(MockRenderPass { desc: desc.clone() }))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        let expected = desc.render_pass.color_attachment_count()
            + usize::from(desc.render_pass.has_depth_stencil());
        if desc.attachments.len() != expected {
            return Err(Error::InvalidResource(format!(
                "framebuffer '{}' has {} attachments, render pass expects {}",
                desc.label, desc.attachments.len(), expected
            )));
        }
        push(&self.journal, format!("create_framebuffer:{}:{}x{}", desc.label, desc.width, desc.height));
        Ok(Arc::new(MockFramebuffer {
            label: desc.label.clone(),
            width: desc.width,
            height: desc.height,
            attachment_labels: desc.attachments.iter().map(|t| t.info().label.clone()).collect(),
        }))
    }

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        push(&self.journal, format!("create_pipeline:{}", desc.label));
        let pipeline = MockPipeline {
            label: desc.label.clone(),
            layout_count: desc.binding_group_layouts.len() as u32,
        };
        self.pipelines.lock().unwrap().push(desc);
        Ok(Arc::new(pipeline))
    }

    fn create_binding_group(
        &self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>> {
        if set_index >= pipeline.binding_group_layout_count() {
            return Err(Error::InvalidResource(format!(
                "set {} out of range for '{}'", set_index, pipeline.label()
            )));
        }
        let labels: Vec<String> = resources.iter().map(|r| r.label().to_string()).collect();
        push(&self.journal, format!(
            "create_binding_group:{}:set{}:{}", pipeline.label(), set_index, labels.join(",")
        ));
        Ok(Arc::new(MockBindingGroup { set_index, labels }))
    }

    fn reserve_binding_groups(&self, budget: BindingGroupBudget) -> Result<()> {
        push(&self.journal, format!(
            "reserve_binding_groups:ubo={}:sampled={}:sets={}",
            budget.uniform_buffers, budget.combined_image_samplers, budget.max_sets
        ));
        Ok(())
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        push(&self.journal, "create_command_list".to_string());
        Ok(Box::new(MockCommandList {
            commands: Vec::new(),
            journal: self.journal.clone(),
            recording: false,
        }))
    }

    fn supports_format(&self, format: TextureFormat, _usage: TextureUsage) -> bool {
        !self.unsupported_formats.lock().unwrap().contains(&format)
    }

    fn wait_idle(&self) -> Result<()> {
        push(&self.journal, "wait_idle".to_string());
        Ok(())
    }
}

// ============================================================================
// Mock Fence / GraphicsContext
// ============================================================================

pub struct MockFence {
    pub slot: usize,
    /// When set, the next wait fails with FrameTimeout
    pub time_out_next: AtomicBool,
    /// Cleared by submit; a wait on an unsignaled fence times out
    pub signaled: AtomicBool,
    journal: Journal,
}

impl Fence for MockFence {
    fn wait(&self, _timeout_ns: u64) -> Result<()> {
        let expired = self.time_out_next.swap(false, Ordering::SeqCst);
        if expired || !self.signaled.load(Ordering::SeqCst) {
            push(&self.journal, format!("fence_timeout:{}", self.slot));
            return Err(Error::FrameTimeout);
        }
        push(&self.journal, format!("fence_wait:{}", self.slot));
        Ok(())
    }
}

/// Errors injected into upcoming context calls, shared with the test
#[derive(Default)]
pub struct MockFailures {
    pub acquire: Mutex<VecDeque<Error>>,
    pub submit: Mutex<VecDeque<Error>>,
    pub present: Mutex<VecDeque<Error>>,
}

impl MockFailures {
    pub fn fail_next_acquire(&self, error: Error) {
        self.acquire.lock().unwrap().push_back(error);
    }

    pub fn fail_next_submit(&self, error: Error) {
        self.submit.lock().unwrap().push_back(error);
    }

    pub fn fail_next_present(&self, error: Error) {
        self.present.lock().unwrap().push_back(error);
    }
}

pub struct MockGraphicsContext {
    pub journal: Journal,
    pub fences: Vec<Arc<MockFence>>,
    pub image_count: u32,
    pub width: u32,
    pub height: u32,
    pub failures: Arc<MockFailures>,
    presentation_pass: Arc<dyn RenderPass>,
    framebuffers: Vec<Arc<dyn Framebuffer>>,
    current_frame: usize,
    next_image: u32,
}

impl MockGraphicsContext {
    pub fn new(journal: Journal, frames_in_flight: usize, image_count: u32, width: u32, height: u32) -> Self {
        let fences = (0..frames_in_flight)
            .map(|slot| {
                Arc::new(MockFence {
                    slot,
                    time_out_next: AtomicBool::new(false),
                    signaled: AtomicBool::new(true),
                    journal: journal.clone(),
                })
            })
            .collect();
        let presentation_pass: Arc<dyn RenderPass> = Arc::new(MockRenderPass {
            desc: RenderPassDesc {
                label: "presentation".to_string(),
                color_attachments: vec![crate::graphics_device::AttachmentDesc::cleared(
                    TextureFormat::B8G8R8A8_SRGB,
                    crate::graphics_device::ImageLayout::PresentSrc,
                )],
                depth_stencil_attachment: Some(crate::graphics_device::AttachmentDesc::cleared(
                    TextureFormat::D32_FLOAT,
                    crate::graphics_device::ImageLayout::DepthStencilAttachment,
                )),
                dependencies: Vec::new(),
            },
        });
        let mut context = Self {
            journal,
            fences,
            image_count,
            width,
            height,
            failures: Arc::new(MockFailures::default()),
            presentation_pass,
            framebuffers: Vec::new(),
            current_frame: 0,
            next_image: 0,
        };
        context.build_framebuffers();
        context
    }

    fn build_framebuffers(&mut self) {
        self.framebuffers = (0..self.image_count)
            .map(|i| {
                Arc::new(MockFramebuffer {
                    label: format!("swapchain[{}]", i),
                    width: self.width,
                    height: self.height,
                    attachment_labels: vec![format!("swapchain[{}]", i), "swapchain.depth".to_string()],
                }) as Arc<dyn Framebuffer>
            })
            .collect();
    }
}

impl GraphicsContext for MockGraphicsContext {
    fn acquire_frame(&mut self) -> Result<AcquiredFrame> {
        if let Some(err) = self.failures.acquire.lock().unwrap().pop_front() {
            push(&self.journal, format!("acquire_failed:{}", err));
            return Err(err);
        }
        let image_index = self.next_image;
        self.next_image = (self.next_image + 1) % self.image_count;
        let slot = self.current_frame;
        push(&self.journal, format!("acquire:image{}:slot{}", image_index, slot));
        Ok(AcquiredFrame {
            image_index,
            slot,
            fence: self.fences[slot].clone(),
        })
    }

    fn submit(&mut self, _commands: &dyn CommandList, frame: &AcquiredFrame) -> Result<()> {
        let fence = &self.fences[frame.slot];
        fence.signaled.store(false, Ordering::SeqCst);
        if let Some(err) = self.failures.submit.lock().unwrap().pop_front() {
            // Nothing was queued, so nothing will signal the slot
            fence.signaled.store(true, Ordering::SeqCst);
            return Err(err);
        }
        push(&self.journal, format!("submit:slot{}", frame.slot));
        // The mock queue completes immediately
        fence.signaled.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn present(&mut self, frame: &AcquiredFrame) -> Result<()> {
        self.current_frame = (self.current_frame + 1) % self.fences.len();
        if let Some(err) = self.failures.present.lock().unwrap().pop_front() {
            return Err(err);
        }
        push(&self.journal, format!("present:image{}", frame.image_index));
        Ok(())
    }

    fn frames_in_flight(&self) -> usize {
        self.fences.len()
    }

    fn extent(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn presentation_pass(&self) -> Arc<dyn RenderPass> {
        self.presentation_pass.clone()
    }

    fn presentation_framebuffer(&self, image_index: u32) -> Result<Arc<dyn Framebuffer>> {
        self.framebuffers
            .get(image_index as usize)
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("no framebuffer for image {}", image_index)))
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        push(&self.journal, format!("recreate:{}x{}", width, height));
        self.width = width;
        self.height = height;
        self.next_image = 0;
        self.build_framebuffers();
        Ok(())
    }
}

// ============================================================================
// Mock ShaderLoader / Drawable / Overlay
// ============================================================================

/// Creates shader modules from names alone, without touching the filesystem
#[derive(Default)]
pub struct MockShaderLoader {
    pub loaded: Mutex<Vec<String>>,
}

impl ShaderLoader for MockShaderLoader {
    fn load(&self, device: &dyn GraphicsDevice, name: &str, stage: ShaderStage) -> Result<Arc<dyn Shader>> {
        self.loaded.lock().unwrap().push(name.to_string());
        device.create_shader(ShaderDesc {
            label: name.to_string(),
            code: &[],
            stage,
            entry_point: "main".to_string(),
        })
    }
}

/// A model with one material texture, drawn as 36 indices
pub struct MockDrawable;

impl Drawable for MockDrawable {
    fn vertex_layout(&self) -> VertexLayout {
        SceneVertex::layout()
    }

    fn material_layout(&self) -> BindingGroupLayoutDesc {
        BindingGroupLayoutDesc {
            entries: vec![BindingSlotDesc::sampled(0, ShaderStageFlags::FRAGMENT)],
        }
    }

    fn draw(&self, cmd: &mut dyn CommandList, _pipeline: &Arc<dyn Pipeline>) -> Result<()> {
        cmd.draw_indexed(36, 0, 0)
    }
}

/// Overlay that logs each render into the journal
pub struct MockOverlay {
    journal: Journal,
    /// Value returned by `edit`
    pub changed: bool,
}

impl MockOverlay {
    pub fn new(journal: Journal) -> Self {
        Self { journal, changed: false }
    }
}

impl DebugOverlay for MockOverlay {
    fn render(&mut self, _cmd: &mut dyn CommandList) -> Result<()> {
        push(&self.journal, "overlay_render".to_string());
        Ok(())
    }

    fn edit(&mut self, controls: &mut OcclusionControls, ranges: &ParameterRanges) -> bool {
        if self.changed {
            controls.clamp(ranges);
        }
        self.changed
    }
}
