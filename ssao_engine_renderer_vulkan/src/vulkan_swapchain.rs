/// VulkanPresenter - Vulkan implementation of the GraphicsContext trait
///
/// Owns the surface, the swapchain and everything sized by it: image views,
/// the presentation depth attachment and one framebuffer per image. Frame
/// slots rotate through `frames_in_flight` acquire semaphores and fences;
/// render-finished semaphores are per swapchain image.

use ssao_engine::ssao::{Config, Error, Result};
use ssao_engine::ssao::device::{
    AcquiredFrame, Attachment, AttachmentKind, CommandList, Fence, Framebuffer, GraphicsContext,
    GraphicsDevice, RenderPass, Texture, TextureFormat, create_attachment, select_depth_format,
};
use ssao_engine::ssao::render::presentation_pass_desc;
use ssao_engine::{engine_debug, engine_error, engine_info};
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;
use winit::window::Window;

use crate::vulkan::{acquire_error, format_from_vk, vk_error, VulkanGraphicsDevice};
use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_texture::VulkanTexture;

/// Host-waitable fence guarding one frame slot
pub struct VulkanFence {
    ctx: Arc<GpuContext>,
    pub(crate) fence: vk::Fence,
}

impl VulkanFence {
    /// Created signaled so the first use of a slot does not block
    fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let create_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        let fence = unsafe { ctx.device.create_fence(&create_info, None) }
            .map_err(|e| vk_error("create frame fence", e))?;
        Ok(Self { ctx, fence })
    }

    fn reset(&self) -> Result<()> {
        unsafe { self.ctx.device.reset_fences(&[self.fence]) }.map_err(|e| vk_error("reset frame fence", e))
    }
}

impl Fence for VulkanFence {
    fn wait(&self, timeout_ns: u64) -> Result<()> {
        match unsafe { self.ctx.device.wait_for_fences(&[self.fence], true, timeout_ns) } {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(Error::FrameTimeout),
            Err(e) => Err(vk_error("wait for frame fence", e)),
        }
    }
}

impl Drop for VulkanFence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}

pub struct VulkanPresenter {
    device: Arc<VulkanGraphicsDevice>,
    ctx: Arc<GpuContext>,

    surface_loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    surface_format: vk::SurfaceFormatKHR,
    depth_format: TextureFormat,
    extent: vk::Extent2D,

    image_views: Vec<vk::ImageView>,
    depth: Option<Attachment>,
    presentation_pass: Arc<dyn RenderPass>,
    framebuffers: Vec<Arc<dyn Framebuffer>>,

    /// One per frame slot, signaled by acquire
    image_available: Vec<vk::Semaphore>,
    /// One per swapchain image, signaled by submit and waited by present
    render_finished: Vec<vk::Semaphore>,
    fences: Vec<Arc<VulkanFence>>,

    current_frame: usize,
    frames_in_flight: usize,
    fence_timeout_ns: u64,
    /// Image acquired but not yet submitted; handed out again by the next acquire
    pending_image: Option<u32>,
}

impl VulkanPresenter {
    /// Create the surface and swapchain for `window`
    ///
    /// `config` supplies the frame count and the fence timeout used before
    /// a slot's acquire semaphore is reused.
    pub fn new(device: Arc<VulkanGraphicsDevice>, window: &Window, config: &Config) -> Result<Self> {
        if config.frames_in_flight == 0 {
            return Err(Error::InitializationFailed("frames_in_flight must be at least 1".to_string()));
        }

        let ctx = Arc::clone(device.context());
        let surface = Self::create_surface(&ctx, window)?;
        let surface_loader = ash::khr::surface::Instance::new(&ctx.entry, &ctx.instance);

        let surface_format = match Self::choose_surface_format(&ctx, &surface_loader, surface) {
            Ok(format) => format,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(e);
            }
        };

        let setup = format_from_vk(surface_format.format)
            .ok_or_else(|| Error::UnsupportedFormat(format!("surface format {:?}", surface_format.format)))
            .and_then(|color_format| {
                let depth_format = select_depth_format(device.as_ref())?;
                let pass = device.create_render_pass(&presentation_pass_desc(color_format, depth_format))?;
                Ok((depth_format, pass))
            });
        let (depth_format, presentation_pass) = match setup {
            Ok(setup) => setup,
            Err(e) => {
                unsafe { surface_loader.destroy_surface(surface, None) };
                return Err(e);
            }
        };

        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);

        // Owns the surface from here; Drop releases whatever was created
        let mut presenter = Self {
            device,
            ctx,
            surface_loader,
            surface,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            surface_format,
            depth_format,
            extent: vk::Extent2D { width: 0, height: 0 },
            image_views: Vec::new(),
            depth: None,
            presentation_pass,
            framebuffers: Vec::new(),
            image_available: Vec::new(),
            render_finished: Vec::new(),
            fences: Vec::new(),
            current_frame: 0,
            frames_in_flight: config.frames_in_flight,
            fence_timeout_ns: config.fence_timeout_ns,
            pending_image: None,
        };

        for _ in 0..presenter.frames_in_flight {
            let fence = VulkanFence::new(Arc::clone(&presenter.ctx))?;
            presenter.fences.push(Arc::new(fence));
        }

        let size = window.inner_size();
        presenter.build(size.width, size.height)?;

        engine_info!("ssao::vulkan", "Presenter ready: {}x{} {:?}, {} images, {} frames in flight, depth {:?}",
            presenter.extent.width, presenter.extent.height, presenter.surface_format.format,
            presenter.image_views.len(), presenter.frames_in_flight, presenter.depth_format);

        Ok(presenter)
    }

    fn create_surface<W: HasDisplayHandle + HasWindowHandle>(ctx: &GpuContext, window: &W) -> Result<vk::SurfaceKHR> {
        let display_handle = window
            .display_handle()
            .map_err(|e| Error::InitializationFailed(format!("failed to get display handle: {}", e)))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| Error::InitializationFailed(format!("failed to get window handle: {}", e)))?;

        unsafe {
            ash_window::create_surface(&ctx.entry, &ctx.instance, display_handle.as_raw(), window_handle.as_raw(), None)
        }
        .map_err(|e| {
            engine_error!("ssao::vulkan", "Failed to create surface: {:?}", e);
            Error::InitializationFailed(format!("failed to create surface: {:?}", e))
        })
    }

    /// sRGB BGRA or RGBA when available, else the first reported format
    fn choose_surface_format(
        ctx: &GpuContext,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<vk::SurfaceFormatKHR> {
        let formats = unsafe { surface_loader.get_physical_device_surface_formats(ctx.physical_device, surface) }
            .map_err(|e| vk_error("query surface formats", e))?;

        formats
            .iter()
            .find(|f| f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB)
            .or_else(|| formats.iter().find(|f| format_from_vk(f.format).is_some()))
            .copied()
            .ok_or_else(|| {
                engine_error!("ssao::vulkan", "No usable surface format among {} reported", formats.len());
                Error::UnsupportedFormat("no usable surface format".to_string())
            })
    }

    /// Create swapchain, views, depth, framebuffers and semaphores
    fn build(&mut self, width: u32, height: u32) -> Result<()> {
        let capabilities = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
        }
        .map_err(|e| vk_error("query surface capabilities", e))?;

        let extent = if capabilities.current_extent.width != u32::MAX {
            capabilities.current_extent
        } else {
            vk::Extent2D {
                width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
                height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
            }
        };
        if extent.width == 0 || extent.height == 0 {
            return Err(Error::SurfaceOutOfDate);
        }

        let mut image_count = capabilities.min_image_count + 1;
        if capabilities.max_image_count > 0 {
            image_count = image_count.min(capabilities.max_image_count);
        }

        let old_swapchain = self.swapchain;
        let swapchain_create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(image_count)
            .image_format(self.surface_format.format)
            .image_color_space(self.surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { self.swapchain_loader.create_swapchain(&swapchain_create_info, None) }
            .map_err(|e| vk_error("create swapchain", e))?;
        self.swapchain = swapchain;
        if old_swapchain != vk::SwapchainKHR::null() {
            unsafe { self.swapchain_loader.destroy_swapchain(old_swapchain, None) };
        }
        self.extent = extent;

        let images = unsafe { self.swapchain_loader.get_swapchain_images(swapchain) }
            .map_err(|e| vk_error("get swapchain images", e))?;

        for &image in &images {
            let view = self.create_color_view(image)?;
            self.image_views.push(view);
        }

        let depth = create_attachment(
            self.device.as_ref(),
            "presentation depth",
            self.depth_format,
            AttachmentKind::DepthStencil,
            extent.width,
            extent.height,
        )?;
        let depth_texture = Arc::clone(depth.texture());
        let depth_view = unsafe { (*(depth_texture.as_ref() as *const dyn Texture as *const VulkanTexture)).view };
        self.depth = Some(depth);

        let vk_render_pass = unsafe {
            &*(self.presentation_pass.as_ref() as *const dyn RenderPass as *const VulkanRenderPass)
        };
        for (i, &view) in self.image_views.iter().enumerate() {
            let attachments = [view, depth_view];
            let framebuffer_info = vk::FramebufferCreateInfo::default()
                .render_pass(vk_render_pass.render_pass)
                .attachments(&attachments)
                .width(extent.width)
                .height(extent.height)
                .layers(1);

            let framebuffer = unsafe { self.ctx.device.create_framebuffer(&framebuffer_info, None) }
                .map_err(|e| vk_error("create presentation framebuffer", e))?;

            self.framebuffers.push(Arc::new(VulkanFramebuffer::new(
                Arc::clone(&self.ctx),
                framebuffer,
                format!("presentation {}", i),
                extent.width,
                extent.height,
                attachments.len(),
                vec![Arc::clone(&depth_texture)],
            )));
        }

        for _ in 0..self.frames_in_flight {
            let semaphore = self.create_semaphore()?;
            self.image_available.push(semaphore);
        }
        for _ in 0..images.len() {
            let semaphore = self.create_semaphore()?;
            self.render_finished.push(semaphore);
        }

        engine_debug!("ssao::vulkan", "Swapchain built: {}x{}, {} images", extent.width, extent.height, images.len());
        Ok(())
    }

    fn create_color_view(&self, image: vk::Image) -> Result<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(self.surface_format.format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe { self.ctx.device.create_image_view(&create_info, None) }
            .map_err(|e| vk_error("create swapchain image view", e))
    }

    fn create_semaphore(&self) -> Result<vk::Semaphore> {
        unsafe { self.ctx.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None) }
            .map_err(|e| vk_error("create semaphore", e))
    }

    /// Release everything `build` creates except the swapchain handle,
    /// which is retired by the next `build` or by Drop
    fn release_sized_resources(&mut self) {
        // Framebuffers reference the views and the depth attachment
        self.framebuffers.clear();
        self.depth = None;
        unsafe {
            for view in self.image_views.drain(..) {
                self.ctx.device.destroy_image_view(view, None);
            }
            for semaphore in self.image_available.drain(..).chain(self.render_finished.drain(..)) {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
        }
        self.pending_image = None;
    }

    pub fn surface_format(&self) -> vk::Format {
        self.surface_format.format
    }

    pub fn depth_format(&self) -> TextureFormat {
        self.depth_format
    }

    pub fn image_count(&self) -> usize {
        self.image_views.len()
    }
}

impl GraphicsContext for VulkanPresenter {
    fn acquire_frame(&mut self) -> Result<AcquiredFrame> {
        let slot = self.current_frame;
        let fence = Arc::clone(&self.fences[slot]);

        let image_index = match self.pending_image {
            Some(image_index) => image_index,
            None => {
                // The slot's semaphore may still be waited on by its last submission
                fence.wait(self.fence_timeout_ns)?;

                let acquired = unsafe {
                    self.swapchain_loader.acquire_next_image(
                        self.swapchain,
                        self.fence_timeout_ns,
                        self.image_available[slot],
                        vk::Fence::null(),
                    )
                };
                match acquired {
                    // A suboptimal image is still presentable; present reports it
                    Ok((image_index, _suboptimal)) => image_index,
                    Err(e) => return Err(acquire_error(e)),
                }
            }
        };
        self.pending_image = Some(image_index);

        Ok(AcquiredFrame { image_index, slot, fence })
    }

    fn submit(&mut self, commands: &dyn CommandList, frame: &AcquiredFrame) -> Result<()> {
        let vk_cmd = unsafe { &*(commands as *const dyn CommandList as *const VulkanCommandList) };
        let fence = &self.fences[frame.slot];

        let render_finished = *self.render_finished.get(frame.image_index as usize).ok_or_else(|| {
            Error::InvalidState(format!("image index {} out of range", frame.image_index))
        })?;
        let wait_semaphores = [self.image_available[frame.slot]];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [vk_cmd.command_buffer()];
        let signal_semaphores = [render_finished];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        fence.reset()?;
        match unsafe { self.ctx.device.queue_submit(self.ctx.graphics_queue, &[submit_info], fence.fence) } {
            Ok(()) => {
                self.pending_image = None;
                Ok(())
            }
            Err(vk::Result::ERROR_DEVICE_LOST) => {
                engine_error!("ssao::vulkan", "Device lost during submit");
                Err(Error::DeviceLost)
            }
            Err(e) => {
                engine_error!("ssao::vulkan", "Queue submit failed: {:?}", e);
                // The reset fence would never signal; the retry of this slot needs a signaled one
                self.fences[frame.slot] = Arc::new(VulkanFence::new(Arc::clone(&self.ctx))?);
                Err(Error::SubmitFailed(format!("{:?}", e)))
            }
        }
    }

    fn present(&mut self, frame: &AcquiredFrame) -> Result<()> {
        let swapchains = [self.swapchain];
        let image_indices = [frame.image_index];
        let wait_semaphores = [self.render_finished[frame.image_index as usize]];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        // The submission is queued either way, so the slot advances first
        self.current_frame = (self.current_frame + 1) % self.frames_in_flight;

        match unsafe { self.swapchain_loader.queue_present(self.ctx.present_queue, &present_info) } {
            Ok(false) => Ok(()),
            Ok(true) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                engine_debug!("ssao::vulkan", "Swapchain suboptimal or out of date during present");
                Err(Error::SurfaceOutOfDate)
            }
            Err(e) => Err(vk_error("present swapchain image", e)),
        }
    }

    fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    fn extent(&self) -> (u32, u32) {
        (self.extent.width, self.extent.height)
    }

    fn presentation_pass(&self) -> Arc<dyn RenderPass> {
        Arc::clone(&self.presentation_pass)
    }

    fn presentation_framebuffer(&self, image_index: u32) -> Result<Arc<dyn Framebuffer>> {
        self.framebuffers
            .get(image_index as usize)
            .cloned()
            .ok_or_else(|| Error::InvalidState(format!(
                "no presentation framebuffer for image {} ({} images)", image_index, self.framebuffers.len()
            )))
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        unsafe { self.ctx.device.device_wait_idle() }.map_err(|e| vk_error("wait idle before recreate", e))?;

        self.release_sized_resources();
        self.build(width, height)?;

        engine_info!("ssao::vulkan", "Swapchain recreated at {}x{}", self.extent.width, self.extent.height);
        Ok(())
    }
}

impl Drop for VulkanPresenter {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
        }
        self.release_sized_resources();
        self.fences.clear();
        unsafe {
            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
