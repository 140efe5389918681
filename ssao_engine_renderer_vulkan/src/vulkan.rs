/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Central object for creating resources. Presentation (surface, swapchain,
/// frame fences) lives in `VulkanPresenter`, built from this device.

use ssao_engine::ssao::{Config, Error, Result};
use ssao_engine::ssao::device::{
    GraphicsDevice,
    Texture, TextureDesc, TextureFormat, TextureInfo, TextureUsage, AspectMask,
    Buffer, BufferDesc, BufferUsage, BufferFormat,
    Shader, ShaderDesc, ShaderStage, ShaderBinding,
    Sampler, SamplerDesc, Filter, MipmapMode, AddressMode, BorderColor,
    RenderPass, RenderPassDesc, AttachmentDesc, LoadOp, StoreOp, ImageLayout,
    SubpassRef, PipelineStages, AccessFlags, DependencyFlags, SubpassDependency,
    Framebuffer, FramebufferDesc,
    Pipeline, PipelineDesc, PrimitiveTopology, CullMode, FrontFace, PolygonMode,
    CompareOp, ColorWriteMask, VertexInputRate, IndexType,
    BindingGroup, BindingGroupBudget, BindingResource, BindingType, ShaderStageFlags,
    CommandList,
};
use ssao_engine::{engine_debug, engine_err, engine_error, engine_info, engine_warn};
use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_binding_group::{DescriptorAllocator, VulkanBindingGroup};
use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_command_list::VulkanCommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_pipeline::{LayoutCache, VulkanPipeline};
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_sampler::VulkanSampler;
use crate::vulkan_shader::VulkanShader;
use crate::vulkan_texture::VulkanTexture;

type DebugMessenger = Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>;

/// Queue families selected for a physical device
#[derive(Debug, Clone, Copy)]
struct QueueFamilies {
    graphics: u32,
    present: u32,
}

/// Vulkan device implementation
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    /// Descriptor set layouts shared by all pipelines
    layout_cache: Arc<LayoutCache>,
    /// Pools for binding groups (grows when exhausted)
    descriptors: Arc<DescriptorAllocator>,
}

impl VulkanGraphicsDevice {
    /// Create a Vulkan device able to present to `window`
    ///
    /// A temporary surface is created to pick a queue family that can
    /// present; the presenter creates its own surface later.
    ///
    /// # Errors
    ///
    /// `InitializationFailed` when the loader, instance, GPU or device
    /// cannot be set up.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| init_error("load Vulkan library", e))?;

        let validation = config.enable_validation && cfg!(feature = "vulkan-validation");
        if config.enable_validation && !validation {
            engine_warn!("ssao::vulkan", "Validation requested but the `vulkan-validation` feature is off");
        }

        let instance = Self::create_instance(&entry, window, config, validation)?;

        let debug_messenger = match Self::create_debug_messenger(&entry, &instance, validation) {
            Ok(messenger) => messenger,
            Err(e) => {
                unsafe { instance.destroy_instance(None) };
                return Err(e);
            }
        };

        let release_instance = |messenger: DebugMessenger| unsafe {
            if let Some((debug_utils, messenger)) = messenger {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            instance.destroy_instance(None);
        };

        let (physical_device, families) = match Self::pick_physical_device(&entry, &instance, window) {
            Ok(selection) => selection,
            Err(e) => {
                release_instance(debug_messenger);
                return Err(e);
            }
        };

        let device = match Self::create_logical_device(&instance, physical_device, families) {
            Ok(device) => device,
            Err(e) => {
                release_instance(debug_messenger);
                return Err(e);
            }
        };

        let allocator = match Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        }) {
            Ok(allocator) => allocator,
            Err(e) => {
                unsafe { device.destroy_device(None) };
                release_instance(debug_messenger);
                return Err(init_error("create GPU allocator", e));
            }
        };

        let (graphics_queue, present_queue) = unsafe {
            (
                device.get_device_queue(families.graphics, 0),
                device.get_device_queue(families.present, 0),
            )
        };

        // From here on GpuContext owns teardown
        let ctx = Arc::new(GpuContext::new(
            entry,
            instance,
            physical_device,
            device,
            allocator,
            graphics_queue,
            families.graphics,
            present_queue,
            debug_messenger,
        ));

        let descriptors = Arc::new(DescriptorAllocator::new(
            Arc::clone(&ctx),
            BindingGroupBudget::for_frames(config.frames_in_flight as u32),
        )?);
        let layout_cache = Arc::new(LayoutCache::new(Arc::clone(&ctx)));

        engine_info!("ssao::vulkan", "Vulkan device ready (graphics family {}, present family {}, validation {})",
            families.graphics, families.present, validation);

        Ok(Self { ctx, layout_cache, descriptors })
    }

    fn create_instance<W: HasDisplayHandle>(
        entry: &ash::Entry,
        window: &W,
        config: &Config,
        validation: bool,
    ) -> Result<ash::Instance> {
        let app_name = CString::new(config.app_name.as_str())
            .map_err(|e| Error::InitializationFailed(format!("invalid application name: {}", e)))?;
        let (major, minor, patch) = config.app_version;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(c"ssao_engine")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_2);

        let display_handle = window.display_handle().map_err(|e| init_error("get display handle", e))?;
        let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
            .map_err(|e| init_error("get required surface extensions", e))?
            .to_vec();

        let layer_names = if validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
        } else {
            vec![]
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        unsafe { entry.create_instance(&create_info, None) }.map_err(|e| init_error("create instance", e))
    }

    #[cfg(feature = "vulkan-validation")]
    fn create_debug_messenger(entry: &ash::Entry, instance: &ash::Instance, validation: bool) -> Result<DebugMessenger> {
        if !validation {
            return Ok(None);
        }

        let debug_config = crate::debug::DebugConfig::default();
        crate::debug::init_debug_config(debug_config);

        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(debug_config.severity.to_vk())
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&debug_info, None) }
            .map_err(|e| init_error("create debug messenger", e))?;

        Ok(Some((debug_utils, messenger)))
    }

    #[cfg(not(feature = "vulkan-validation"))]
    fn create_debug_messenger(_entry: &ash::Entry, _instance: &ash::Instance, _validation: bool) -> Result<DebugMessenger> {
        Ok(None)
    }

    /// Prefer a discrete GPU; any device with graphics and present queues qualifies
    fn pick_physical_device<W: HasDisplayHandle + HasWindowHandle>(
        entry: &ash::Entry,
        instance: &ash::Instance,
        window: &W,
    ) -> Result<(vk::PhysicalDevice, QueueFamilies)> {
        let display_handle = window.display_handle().map_err(|e| init_error("get display handle", e))?;
        let window_handle = window.window_handle().map_err(|e| init_error("get window handle", e))?;

        let surface = unsafe {
            ash_window::create_surface(entry, instance, display_handle.as_raw(), window_handle.as_raw(), None)
        }
        .map_err(|e| init_error("create surface", e))?;
        let surface_loader = ash::khr::surface::Instance::new(entry, instance);

        let selection = unsafe { Self::select_device(instance, &surface_loader, surface) };

        // Temporary surface only served queue selection
        unsafe { surface_loader.destroy_surface(surface, None) };

        selection
    }

    unsafe fn select_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<(vk::PhysicalDevice, QueueFamilies)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| init_error("enumerate physical devices", e))?;

        let mut candidates = Vec::new();
        for physical_device in physical_devices {
            let queue_families = instance.get_physical_device_queue_family_properties(physical_device);

            let graphics = queue_families
                .iter()
                .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|i| i as u32);

            let present = (0..queue_families.len() as u32).find(|&i| {
                surface_loader
                    .get_physical_device_surface_support(physical_device, i, surface)
                    .unwrap_or(false)
            });

            if let (Some(graphics), Some(present)) = (graphics, present) {
                let properties = instance.get_physical_device_properties(physical_device);
                let discrete = properties.device_type == vk::PhysicalDeviceType::DISCRETE_GPU;
                let name = properties
                    .device_name_as_c_str()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                candidates.push((discrete, name, physical_device, QueueFamilies { graphics, present }));
            }
        }

        candidates.sort_by_key(|(discrete, ..)| !*discrete);

        let (_, name, physical_device, families) = candidates.into_iter().next().ok_or_else(|| {
            engine_error!("ssao::vulkan", "No GPU with graphics and present support found");
            Error::InitializationFailed("no suitable Vulkan GPU found".to_string())
        })?;

        engine_info!("ssao::vulkan", "Selected GPU '{}'", name);
        Ok((physical_device, families))
    }

    fn create_logical_device(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        families: QueueFamilies,
    ) -> Result<ash::Device> {
        let queue_priorities = [1.0];
        let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
            .queue_family_index(families.graphics)
            .queue_priorities(&queue_priorities)];
        if families.present != families.graphics {
            queue_create_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(families.present)
                    .queue_priorities(&queue_priorities),
            );
        }

        let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];

        let supported = unsafe { instance.get_physical_device_features(physical_device) };
        let device_features = vk::PhysicalDeviceFeatures::default()
            .sampler_anisotropy(supported.sampler_anisotropy == vk::TRUE);

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names)
            .enabled_features(&device_features);

        unsafe { instance.create_device(physical_device, &device_create_info, None) }
            .map_err(|e| init_error("create logical device", e))
    }

    pub(crate) fn context(&self) -> &Arc<GpuContext> {
        &self.ctx
    }

    /// Number of descriptor pools created so far
    pub fn descriptor_pool_count(&self) -> usize {
        self.descriptors.pool_count()
    }

    fn create_image_view(&self, image: vk::Image, format: TextureFormat, aspect_mask: vk::ImageAspectFlags) -> Result<vk::ImageView> {
        let view_create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format_to_vk(format))
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe { self.ctx.device.create_image_view(&view_create_info, None) }
            .map_err(|e| vk_error("create image view", e))
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!(
                "texture '{}' has empty extent {}x{}", desc.label, desc.width, desc.height
            )));
        }

        let image_create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format_to_vk(desc.format))
            .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(texture_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { self.ctx.device.create_image(&image_create_info, None) }
            .map_err(|e| vk_error("create texture image", e))?;

        // Owns the image from here; an early return releases it
        let mut texture = VulkanTexture::new(Arc::clone(&self.ctx), image, TextureInfo::from(&desc));

        let requirements = unsafe { self.ctx.device.get_image_memory_requirements(image) };
        let allocation_scheme = if desc.dedicated {
            AllocationScheme::DedicatedImage(image)
        } else {
            AllocationScheme::GpuAllocatorManaged
        };
        let allocation = self.ctx.allocate(&AllocationCreateDesc {
            name: &desc.label,
            requirements,
            location: MemoryLocation::GpuOnly,
            linear: false,
            allocation_scheme,
        })?;
        let (memory, offset) = unsafe { (allocation.memory(), allocation.offset()) };
        texture.set_allocation(allocation);

        unsafe { self.ctx.device.bind_image_memory(image, memory, offset) }
            .map_err(|e| vk_error("bind texture memory", e))?;

        // Attachment views carry every aspect of a depth/stencil format; sampling reads depth alone
        let attachment_aspect = aspect_to_vk(desc.aspect);
        let sampled_aspect = view_aspect_to_vk(desc.aspect);
        texture.view = self.create_image_view(image, desc.format, attachment_aspect)?;
        texture.sampled_view = if sampled_aspect == attachment_aspect {
            texture.view
        } else {
            self.create_image_view(image, desc.format, sampled_aspect)?
        };

        engine_debug!("ssao::vulkan", "Created texture '{}' {}x{} {:?}{}",
            desc.label, desc.width, desc.height, desc.format,
            if desc.dedicated { " (dedicated)" } else { "" });

        Ok(Arc::new(texture))
    }

    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        if desc.size == 0 {
            return Err(Error::InvalidResource(format!("buffer '{}' has zero size", desc.label)));
        }

        let usage = match desc.usage {
            BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
            BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
            BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        };

        let buffer_create_info = vk::BufferCreateInfo::default()
            .size(desc.size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { self.ctx.device.create_buffer(&buffer_create_info, None) }
            .map_err(|e| vk_error("create buffer", e))?;
        let mut vk_buffer = VulkanBuffer::new(Arc::clone(&self.ctx), buffer, desc.size, desc.label.clone());

        let requirements = unsafe { self.ctx.device.get_buffer_memory_requirements(buffer) };
        let allocation = self.ctx.allocate(&AllocationCreateDesc {
            name: &desc.label,
            requirements,
            location: MemoryLocation::CpuToGpu,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;
        let (memory, offset) = unsafe { (allocation.memory(), allocation.offset()) };
        vk_buffer.set_allocation(allocation);

        unsafe { self.ctx.device.bind_buffer_memory(buffer, memory, offset) }
            .map_err(|e| vk_error("bind buffer memory", e))?;

        Ok(Arc::new(vk_buffer))
    }

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn Shader>> {
        let words = spirv_words(desc.code).map_err(|e| {
            engine_error!("ssao::vulkan", "Shader '{}': {}", desc.label, e);
            e
        })?;
        let bindings = reflect_shader(&words, &desc.label)?;
        let entry_point = CString::new(desc.entry_point.as_str())
            .map_err(|_| Error::InvalidResource(format!("shader '{}' has an invalid entry point", desc.label)))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
        let module = unsafe { self.ctx.device.create_shader_module(&create_info, None) }
            .map_err(|e| vk_error("create shader module", e))?;

        engine_debug!("ssao::vulkan", "Created shader '{}' ({:?}, {} bindings)",
            desc.label, desc.stage, bindings.len());

        Ok(Arc::new(VulkanShader::new(
            Arc::clone(&self.ctx),
            module,
            desc.stage,
            entry_point,
            desc.label,
            bindings,
        )))
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Arc<dyn Sampler>> {
        Ok(Arc::new(VulkanSampler::new(Arc::clone(&self.ctx), desc)?))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>> {
        let mut attachments = Vec::with_capacity(desc.attachment_count());
        let mut color_refs = Vec::with_capacity(desc.color_attachments.len());

        for (i, color) in desc.color_attachments.iter().enumerate() {
            attachments.push(attachment_desc_to_vk(color));
            color_refs.push(
                vk::AttachmentReference::default()
                    .attachment(i as u32)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL),
            );
        }

        let depth_ref = desc.depth_stencil_attachment.as_ref().map(|depth| {
            attachments.push(attachment_desc_to_vk(depth));
            vk::AttachmentReference::default()
                .attachment(desc.color_attachments.len() as u32)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
        });

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if let Some(ref depth_ref) = depth_ref {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        let dependencies: Vec<vk::SubpassDependency> = desc.dependencies.iter().map(dependency_to_vk).collect();

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(&dependencies);

        let render_pass = unsafe { self.ctx.device.create_render_pass(&render_pass_info, None) }
            .map_err(|e| vk_error("create render pass", e))?;

        engine_debug!("ssao::vulkan", "Created render pass '{}' ({} attachments, {} dependencies)",
            desc.label, attachments.len(), dependencies.len());

        Ok(Arc::new(VulkanRenderPass::new(
            Arc::clone(&self.ctx),
            render_pass,
            desc.label.clone(),
            desc.color_attachments.len(),
            desc.depth_stencil_attachment.is_some(),
        )))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>> {
        let vk_render_pass = unsafe { &*(desc.render_pass.as_ref() as *const dyn RenderPass as *const VulkanRenderPass) };

        if desc.attachments.len() != vk_render_pass.attachment_count() {
            return Err(Error::InvalidResource(format!(
                "framebuffer '{}' has {} attachments, render pass '{}' expects {}",
                desc.label, desc.attachments.len(), vk_render_pass.label(), vk_render_pass.attachment_count()
            )));
        }

        let mut views = Vec::with_capacity(desc.attachments.len());
        for attachment in desc.attachments {
            let info = attachment.info();
            if info.width < desc.width || info.height < desc.height {
                return Err(Error::InvalidResource(format!(
                    "attachment '{}' ({}x{}) is smaller than framebuffer '{}' ({}x{})",
                    info.label, info.width, info.height, desc.label, desc.width, desc.height
                )));
            }
            let vk_texture = unsafe { &*(attachment.as_ref() as *const dyn Texture as *const VulkanTexture) };
            views.push(vk_texture.view);
        }

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .attachments(&views)
            .width(desc.width)
            .height(desc.height)
            .layers(1);

        let framebuffer = unsafe { self.ctx.device.create_framebuffer(&framebuffer_info, None) }
            .map_err(|e| vk_error("create framebuffer", e))?;

        Ok(Arc::new(VulkanFramebuffer::new(
            Arc::clone(&self.ctx),
            framebuffer,
            desc.label.clone(),
            desc.width,
            desc.height,
            views.len(),
            desc.attachments.to_vec(),
        )))
    }

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>> {
        let (vk_render_pass, vs, fs) = unsafe {
            (
                &*(desc.render_pass.as_ref() as *const dyn RenderPass as *const VulkanRenderPass),
                &*(desc.vertex_shader.as_ref() as *const dyn Shader as *const VulkanShader),
                &*(desc.fragment_shader.as_ref() as *const dyn Shader as *const VulkanShader),
            )
        };

        if desc.color_blend_attachments.len() != vk_render_pass.color_attachment_count() {
            engine_error!("ssao::vulkan", "Pipeline '{}' declares {} blend states for {} color attachments",
                desc.label, desc.color_blend_attachments.len(), vk_render_pass.color_attachment_count());
            return Err(Error::InvalidResource(format!(
                "pipeline '{}' needs one blend state per color attachment", desc.label
            )));
        }

        validate_shader_bindings(&desc)?;

        let set_layouts = desc
            .binding_group_layouts
            .iter()
            .map(|layout| self.layout_cache.get_or_create(layout))
            .collect::<Result<Vec<_>>>()?;

        // Owns layout and pipeline handles as they are created
        let mut pipeline = VulkanPipeline::new(
            Arc::clone(&self.ctx),
            Arc::clone(&self.layout_cache),
            set_layouts,
            desc.binding_group_layouts.clone(),
            desc.label.clone(),
        );

        let layout_create_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&pipeline.set_layouts);
        pipeline.pipeline_layout = unsafe { self.ctx.device.create_pipeline_layout(&layout_create_info, None) }
            .map_err(|e| vk_error("create pipeline layout", e))?;

        // Specialization constants are 32-bit, packed in declaration order
        let map_entries: Vec<vk::SpecializationMapEntry> = desc
            .specialization
            .iter()
            .enumerate()
            .map(|(i, constant)| vk::SpecializationMapEntry {
                constant_id: constant.id,
                offset: (i * 4) as u32,
                size: 4,
            })
            .collect();
        let spec_data: Vec<u8> = desc
            .specialization
            .iter()
            .flat_map(|constant| constant.value.to_ne_bytes())
            .collect();
        let spec_info = vk::SpecializationInfo::default()
            .map_entries(&map_entries)
            .data(&spec_data);

        let mut fragment_stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::FRAGMENT)
            .module(fs.module)
            .name(fs.entry_point.as_c_str());
        if !map_entries.is_empty() {
            fragment_stage = fragment_stage.specialization_info(&spec_info);
        }
        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vs.module)
                .name(vs.entry_point.as_c_str()),
            fragment_stage,
        ];

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = desc
            .vertex_layout
            .bindings
            .iter()
            .map(|binding| vk::VertexInputBindingDescription {
                binding: binding.binding,
                stride: binding.stride,
                input_rate: vertex_input_rate_to_vk(binding.input_rate),
            })
            .collect();
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc
            .vertex_layout
            .attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: attribute.binding,
                format: buffer_format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic; only the counts matter here
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(polygon_mode_to_vk(desc.rasterization.polygon_mode))
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(desc.rasterization.cull_mode))
            .front_face(front_face_to_vk(desc.rasterization.front_face))
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth_stencil.depth_test_enable)
            .depth_write_enable(desc.depth_stencil.depth_write_enable)
            .depth_compare_op(compare_op_to_vk(desc.depth_stencil.depth_compare_op))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let blend_attachments: Vec<vk::PipelineColorBlendAttachmentState> = desc
            .color_blend_attachments
            .iter()
            .map(|state| {
                vk::PipelineColorBlendAttachmentState::default()
                    .color_write_mask(color_write_mask_to_vk(state.color_write_mask))
                    .blend_enable(false)
            })
            .collect();
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(pipeline.pipeline_layout)
            .render_pass(vk_render_pass.render_pass)
            .subpass(0);

        let pipelines = unsafe {
            self.ctx
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_create_info], None)
        }
        .map_err(|(_, e)| vk_error("create graphics pipeline", e))?;

        pipeline.pipeline = pipelines
            .into_iter()
            .next()
            .ok_or_else(|| Error::BackendError("driver returned no pipeline".to_string()))?;

        engine_debug!("ssao::vulkan", "Created pipeline '{}' ({} set layouts, {} specialization constants)",
            desc.label, desc.binding_group_layouts.len(), desc.specialization.len());

        Ok(Arc::new(pipeline))
    }

    fn create_binding_group(
        &self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>> {
        let vk_pipeline = unsafe { &*(pipeline.as_ref() as *const dyn Pipeline as *const VulkanPipeline) };

        let layout_desc = vk_pipeline.layout_descs.get(set_index as usize).ok_or_else(|| {
            engine_error!("ssao::vulkan", "Set index {} out of range for pipeline '{}' ({} layouts)",
                set_index, vk_pipeline.label(), vk_pipeline.layout_descs.len());
            Error::InvalidResource(format!("pipeline '{}' has no set {}", vk_pipeline.label(), set_index))
        })?;

        if resources.len() != layout_desc.entries.len() {
            return Err(Error::InvalidResource(format!(
                "set {} of '{}' has {} bindings, got {} resources",
                set_index, vk_pipeline.label(), layout_desc.entries.len(), resources.len()
            )));
        }
        for (binding, resource) in resources.iter().enumerate() {
            let expected = layout_desc.find(binding as u32).map(|slot| slot.binding_type);
            if expected != Some(resource.binding_type()) {
                engine_error!("ssao::vulkan", "Resource '{}' at binding {} of set {} is {:?}, layout expects {:?}",
                    resource.label(), binding, set_index, resource.binding_type(), expected);
                return Err(Error::InvalidResource(format!(
                    "resource '{}' does not match binding {} of set {}", resource.label(), binding, set_index
                )));
            }
        }

        let (pool, descriptor_set) = self.descriptors.allocate(vk_pipeline.set_layouts[set_index as usize])?;
        let group = VulkanBindingGroup::new(
            Arc::clone(&self.descriptors),
            pool,
            descriptor_set,
            set_index,
            resources.iter().map(|resource| resource.label().to_string()).collect(),
        );

        let infos: Vec<DescriptorInfo> = resources
            .iter()
            .map(|resource| match resource {
                BindingResource::UniformBuffer(buffer) => {
                    let vk_buffer = unsafe { &*(*buffer as *const dyn Buffer as *const VulkanBuffer) };
                    DescriptorInfo::Buffer(
                        vk::DescriptorBufferInfo::default()
                            .buffer(vk_buffer.buffer)
                            .offset(0)
                            .range(vk::WHOLE_SIZE),
                    )
                }
                BindingResource::SampledTexture(texture, sampler) => {
                    let vk_texture = unsafe { &*(*texture as *const dyn Texture as *const VulkanTexture) };
                    let vk_sampler = unsafe { &*(*sampler as *const dyn Sampler as *const VulkanSampler) };
                    let layout = if texture.info().format.is_depth() {
                        vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
                    } else {
                        vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
                    };
                    DescriptorInfo::Image(
                        vk::DescriptorImageInfo::default()
                            .image_layout(layout)
                            .image_view(vk_texture.sampled_view)
                            .sampler(vk_sampler.sampler),
                    )
                }
            })
            .collect();

        let writes: Vec<vk::WriteDescriptorSet> = infos
            .iter()
            .enumerate()
            .map(|(binding, info)| {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(descriptor_set)
                    .dst_binding(binding as u32)
                    .dst_array_element(0);
                match info {
                    DescriptorInfo::Buffer(buffer_info) => write
                        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                        .buffer_info(std::slice::from_ref(buffer_info)),
                    DescriptorInfo::Image(image_info) => write
                        .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                        .image_info(std::slice::from_ref(image_info)),
                }
            })
            .collect();

        unsafe { self.ctx.device.update_descriptor_sets(&writes, &[]) };

        Ok(Arc::new(group))
    }

    fn reserve_binding_groups(&self, budget: BindingGroupBudget) -> Result<()> {
        self.descriptors.reserve(budget)
    }

    fn create_command_list(&self) -> Result<Box<dyn CommandList>> {
        Ok(Box::new(VulkanCommandList::new(Arc::clone(&self.ctx))?))
    }

    fn supports_format(&self, format: TextureFormat, usage: TextureUsage) -> bool {
        let properties = unsafe {
            self.ctx
                .instance
                .get_physical_device_format_properties(self.ctx.physical_device, format_to_vk(format))
        };
        properties.optimal_tiling_features.contains(format_features_for(usage))
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe { self.ctx.device.device_wait_idle() }.map_err(|e| vk_error("wait for device idle", e))
    }
}

/// Descriptor payload for one binding, kept alive across the write
enum DescriptorInfo {
    Buffer(vk::DescriptorBufferInfo),
    Image(vk::DescriptorImageInfo),
}

// ===== ERROR MAPPING =====

fn init_error(what: &str, e: impl std::fmt::Debug) -> Error {
    engine_error!("ssao::vulkan", "Failed to {}: {:?}", what, e);
    Error::InitializationFailed(format!("failed to {}: {:?}", what, e))
}

/// Map a Vulkan result to the engine taxonomy and log it
pub(crate) fn vk_error(what: &str, e: vk::Result) -> Error {
    match e {
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => {
            engine_error!("ssao::vulkan", "Out of memory: {} ({:?})", what, e);
            Error::ResourceExhausted(format!("{}: {:?}", what, e))
        }
        vk::Result::ERROR_DEVICE_LOST => {
            engine_error!("ssao::vulkan", "Device lost: {}", what);
            Error::DeviceLost
        }
        vk::Result::ERROR_OUT_OF_DATE_KHR => {
            engine_debug!("ssao::vulkan", "Surface out of date: {}", what);
            Error::SurfaceOutOfDate
        }
        other => engine_err!("ssao::vulkan", "Failed to {}: {:?}", what, other),
    }
}

/// Swapchain acquisition result; an expired bounded wait is a skippable frame
pub(crate) fn acquire_error(e: vk::Result) -> Error {
    match e {
        vk::Result::TIMEOUT | vk::Result::NOT_READY => {
            engine_warn!("ssao::vulkan", "Swapchain image not available in time");
            Error::FrameTimeout
        }
        other => vk_error("acquire swapchain image", other),
    }
}

// ===== SPIR-V =====

/// Reinterpret SPIR-V bytes as little-endian words
pub(crate) fn spirv_words(code: &[u8]) -> Result<Vec<u32>> {
    if code.is_empty() || code.len() % 4 != 0 {
        return Err(Error::InvalidResource(format!(
            "SPIR-V size {} is not a non-zero multiple of 4", code.len()
        )));
    }
    Ok(code
        .chunks_exact(4)
        .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
        .collect())
}

/// Descriptor bindings declared by a module, deduplicated
fn reflect_shader(words: &[u32], label: &str) -> Result<Vec<ShaderBinding>> {
    let entry_points = spirq::ReflectConfig::new()
        .spv(words)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| {
            engine_error!("ssao::vulkan", "SPIR-V reflection of '{}' failed: {:?}", label, e);
            Error::InvalidResource(format!("shader '{}' is not valid SPIR-V", label))
        })?;

    let mut bindings: Vec<ShaderBinding> = Vec::new();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            if let spirq::var::Variable::Descriptor { desc_bind, .. } = var {
                let binding = ShaderBinding { set: desc_bind.set(), binding: desc_bind.bind() };
                if !bindings.contains(&binding) {
                    bindings.push(binding);
                }
            }
        }
    }
    Ok(bindings)
}

/// Every (set, binding) a shader reads must be declared by the layouts
pub(crate) fn validate_shader_bindings(desc: &PipelineDesc) -> Result<()> {
    for shader in [&desc.vertex_shader, &desc.fragment_shader] {
        for used in shader.bindings() {
            let declared = desc
                .binding_group_layouts
                .get(used.set as usize)
                .and_then(|layout| layout.find(used.binding))
                .is_some();
            if !declared {
                engine_error!("ssao::vulkan", "Pipeline '{}': shader '{}' uses set {} binding {} missing from its layouts",
                    desc.label, shader.label(), used.set, used.binding);
                return Err(Error::InvalidResource(format!(
                    "pipeline '{}' does not declare set {} binding {} used by '{}'",
                    desc.label, used.set, used.binding, shader.label()
                )));
            }
        }
    }
    Ok(())
}

// ===== CONVERSIONS =====

pub(crate) fn format_to_vk(format: TextureFormat) -> vk::Format {
    match format {
        TextureFormat::R8_UNORM => vk::Format::R8_UNORM,
        TextureFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
        TextureFormat::R8G8B8A8_SRGB => vk::Format::R8G8B8A8_SRGB,
        TextureFormat::B8G8R8A8_UNORM => vk::Format::B8G8R8A8_UNORM,
        TextureFormat::B8G8R8A8_SRGB => vk::Format::B8G8R8A8_SRGB,
        TextureFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        TextureFormat::D16_UNORM => vk::Format::D16_UNORM,
        TextureFormat::D32_FLOAT => vk::Format::D32_SFLOAT,
        TextureFormat::D16_UNORM_S8_UINT => vk::Format::D16_UNORM_S8_UINT,
        TextureFormat::D24_UNORM_S8_UINT => vk::Format::D24_UNORM_S8_UINT,
        TextureFormat::D32_FLOAT_S8_UINT => vk::Format::D32_SFLOAT_S8_UINT,
    }
}

/// Inverse of `format_to_vk`, for surface formats reported by the driver
pub(crate) fn format_from_vk(format: vk::Format) -> Option<TextureFormat> {
    match format {
        vk::Format::R8_UNORM => Some(TextureFormat::R8_UNORM),
        vk::Format::R8G8B8A8_UNORM => Some(TextureFormat::R8G8B8A8_UNORM),
        vk::Format::R8G8B8A8_SRGB => Some(TextureFormat::R8G8B8A8_SRGB),
        vk::Format::B8G8R8A8_UNORM => Some(TextureFormat::B8G8R8A8_UNORM),
        vk::Format::B8G8R8A8_SRGB => Some(TextureFormat::B8G8R8A8_SRGB),
        vk::Format::R32G32B32A32_SFLOAT => Some(TextureFormat::R32G32B32A32_SFLOAT),
        vk::Format::D16_UNORM => Some(TextureFormat::D16_UNORM),
        vk::Format::D32_SFLOAT => Some(TextureFormat::D32_FLOAT),
        vk::Format::D16_UNORM_S8_UINT => Some(TextureFormat::D16_UNORM_S8_UINT),
        vk::Format::D24_UNORM_S8_UINT => Some(TextureFormat::D24_UNORM_S8_UINT),
        vk::Format::D32_SFLOAT_S8_UINT => Some(TextureFormat::D32_FLOAT_S8_UINT),
        _ => None,
    }
}

pub(crate) fn buffer_format_to_vk(format: BufferFormat) -> vk::Format {
    match format {
        BufferFormat::R32_SFLOAT => vk::Format::R32_SFLOAT,
        BufferFormat::R32G32_SFLOAT => vk::Format::R32G32_SFLOAT,
        BufferFormat::R32G32B32_SFLOAT => vk::Format::R32G32B32_SFLOAT,
        BufferFormat::R32G32B32A32_SFLOAT => vk::Format::R32G32B32A32_SFLOAT,
        BufferFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
    }
}

pub(crate) fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(TextureUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsage::COLOR_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT) {
        flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    flags
}

/// Optimal-tiling features a format needs for `usage`
pub(crate) fn format_features_for(usage: TextureUsage) -> vk::FormatFeatureFlags {
    let mut flags = vk::FormatFeatureFlags::empty();
    if usage.contains(TextureUsage::SAMPLED) {
        flags |= vk::FormatFeatureFlags::SAMPLED_IMAGE;
    }
    if usage.contains(TextureUsage::COLOR_ATTACHMENT) {
        flags |= vk::FormatFeatureFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT) {
        flags |= vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    flags
}

pub(crate) fn aspect_to_vk(aspect: AspectMask) -> vk::ImageAspectFlags {
    let mut flags = vk::ImageAspectFlags::empty();
    if aspect.contains(AspectMask::COLOR) {
        flags |= vk::ImageAspectFlags::COLOR;
    }
    if aspect.contains(AspectMask::DEPTH) {
        flags |= vk::ImageAspectFlags::DEPTH;
    }
    if aspect.contains(AspectMask::STENCIL) {
        flags |= vk::ImageAspectFlags::STENCIL;
    }
    flags
}

/// Aspect of a sampled view: depth/stencil images are read through depth only
pub(crate) fn view_aspect_to_vk(aspect: AspectMask) -> vk::ImageAspectFlags {
    if aspect.contains(AspectMask::DEPTH) {
        vk::ImageAspectFlags::DEPTH
    } else {
        aspect_to_vk(aspect)
    }
}

pub(crate) fn shader_stage_to_vk(stage: ShaderStage) -> vk::ShaderStageFlags {
    match stage {
        ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
        ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
    }
}

pub(crate) fn stage_flags_to_vk(flags: ShaderStageFlags) -> vk::ShaderStageFlags {
    let mut vk_flags = vk::ShaderStageFlags::empty();
    if flags.contains(ShaderStageFlags::VERTEX) {
        vk_flags |= vk::ShaderStageFlags::VERTEX;
    }
    if flags.contains(ShaderStageFlags::FRAGMENT) {
        vk_flags |= vk::ShaderStageFlags::FRAGMENT;
    }
    vk_flags
}

pub(crate) fn binding_type_to_vk(binding_type: BindingType) -> vk::DescriptorType {
    match binding_type {
        BindingType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        BindingType::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

pub(crate) fn topology_to_vk(topology: PrimitiveTopology) -> vk::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
    }
}

pub(crate) fn cull_mode_to_vk(mode: CullMode) -> vk::CullModeFlags {
    match mode {
        CullMode::Front => vk::CullModeFlags::FRONT,
        CullMode::Back => vk::CullModeFlags::BACK,
    }
}

pub(crate) fn front_face_to_vk(face: FrontFace) -> vk::FrontFace {
    match face {
        FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
    }
}

pub(crate) fn polygon_mode_to_vk(mode: PolygonMode) -> vk::PolygonMode {
    match mode {
        PolygonMode::Fill => vk::PolygonMode::FILL,
    }
}

pub(crate) fn compare_op_to_vk(op: CompareOp) -> vk::CompareOp {
    match op {
        CompareOp::LessOrEqual => vk::CompareOp::LESS_OR_EQUAL,
        CompareOp::Always => vk::CompareOp::ALWAYS,
    }
}

pub(crate) fn color_write_mask_to_vk(mask: ColorWriteMask) -> vk::ColorComponentFlags {
    let mut flags = vk::ColorComponentFlags::empty();
    if mask.contains(ColorWriteMask::R) {
        flags |= vk::ColorComponentFlags::R;
    }
    if mask.contains(ColorWriteMask::G) {
        flags |= vk::ColorComponentFlags::G;
    }
    if mask.contains(ColorWriteMask::B) {
        flags |= vk::ColorComponentFlags::B;
    }
    if mask.contains(ColorWriteMask::A) {
        flags |= vk::ColorComponentFlags::A;
    }
    flags
}

pub(crate) fn vertex_input_rate_to_vk(rate: VertexInputRate) -> vk::VertexInputRate {
    match rate {
        VertexInputRate::Vertex => vk::VertexInputRate::VERTEX,
    }
}

pub(crate) fn index_type_to_vk(index_type: IndexType) -> vk::IndexType {
    match index_type {
        IndexType::U16 => vk::IndexType::UINT16,
        IndexType::U32 => vk::IndexType::UINT32,
    }
}

pub(crate) fn load_op_to_vk(load_op: LoadOp) -> vk::AttachmentLoadOp {
    match load_op {
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
    }
}

pub(crate) fn store_op_to_vk(store_op: StoreOp) -> vk::AttachmentStoreOp {
    match store_op {
        StoreOp::Store => vk::AttachmentStoreOp::STORE,
        StoreOp::DontCare => vk::AttachmentStoreOp::DONT_CARE,
    }
}

pub(crate) fn image_layout_to_vk(layout: ImageLayout) -> vk::ImageLayout {
    match layout {
        ImageLayout::Undefined => vk::ImageLayout::UNDEFINED,
        ImageLayout::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilAttachment => vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        ImageLayout::DepthStencilReadOnly => vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
        ImageLayout::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        ImageLayout::PresentSrc => vk::ImageLayout::PRESENT_SRC_KHR,
    }
}

pub(crate) fn attachment_desc_to_vk(desc: &AttachmentDesc) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(format_to_vk(desc.format))
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(load_op_to_vk(desc.load_op))
        .store_op(store_op_to_vk(desc.store_op))
        .stencil_load_op(load_op_to_vk(desc.stencil_load_op))
        .stencil_store_op(store_op_to_vk(desc.stencil_store_op))
        .initial_layout(image_layout_to_vk(desc.initial_layout))
        .final_layout(image_layout_to_vk(desc.final_layout))
}

pub(crate) fn subpass_to_vk(subpass: SubpassRef) -> u32 {
    match subpass {
        SubpassRef::External => vk::SUBPASS_EXTERNAL,
        SubpassRef::Index(index) => index,
    }
}

pub(crate) fn pipeline_stages_to_vk(stages: PipelineStages) -> vk::PipelineStageFlags {
    const MAPPING: [(PipelineStages, vk::PipelineStageFlags); 7] = [
        (PipelineStages::TOP_OF_PIPE, vk::PipelineStageFlags::TOP_OF_PIPE),
        (PipelineStages::VERTEX_SHADER, vk::PipelineStageFlags::VERTEX_SHADER),
        (PipelineStages::FRAGMENT_SHADER, vk::PipelineStageFlags::FRAGMENT_SHADER),
        (PipelineStages::EARLY_FRAGMENT_TESTS, vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS),
        (PipelineStages::LATE_FRAGMENT_TESTS, vk::PipelineStageFlags::LATE_FRAGMENT_TESTS),
        (PipelineStages::COLOR_ATTACHMENT_OUTPUT, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT),
        (PipelineStages::BOTTOM_OF_PIPE, vk::PipelineStageFlags::BOTTOM_OF_PIPE),
    ];
    MAPPING
        .iter()
        .filter(|(stage, _)| stages.contains(*stage))
        .fold(vk::PipelineStageFlags::empty(), |acc, (_, flag)| acc | *flag)
}

pub(crate) fn access_flags_to_vk(access: AccessFlags) -> vk::AccessFlags {
    const MAPPING: [(AccessFlags, vk::AccessFlags); 6] = [
        (AccessFlags::SHADER_READ, vk::AccessFlags::SHADER_READ),
        (AccessFlags::COLOR_ATTACHMENT_READ, vk::AccessFlags::COLOR_ATTACHMENT_READ),
        (AccessFlags::COLOR_ATTACHMENT_WRITE, vk::AccessFlags::COLOR_ATTACHMENT_WRITE),
        (AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ, vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ),
        (AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE, vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE),
        (AccessFlags::MEMORY_READ, vk::AccessFlags::MEMORY_READ),
    ];
    MAPPING
        .iter()
        .filter(|(flag, _)| access.contains(*flag))
        .fold(vk::AccessFlags::empty(), |acc, (_, vk_flag)| acc | *vk_flag)
}

pub(crate) fn dependency_to_vk(dependency: &SubpassDependency) -> vk::SubpassDependency {
    let flags = if dependency.flags.contains(DependencyFlags::BY_REGION) {
        vk::DependencyFlags::BY_REGION
    } else {
        vk::DependencyFlags::empty()
    };
    vk::SubpassDependency::default()
        .src_subpass(subpass_to_vk(dependency.src_subpass))
        .dst_subpass(subpass_to_vk(dependency.dst_subpass))
        .src_stage_mask(pipeline_stages_to_vk(dependency.src_stages))
        .dst_stage_mask(pipeline_stages_to_vk(dependency.dst_stages))
        .src_access_mask(access_flags_to_vk(dependency.src_access))
        .dst_access_mask(access_flags_to_vk(dependency.dst_access))
        .dependency_flags(flags)
}

pub(crate) fn filter_to_vk(filter: Filter) -> vk::Filter {
    match filter {
        Filter::Nearest => vk::Filter::NEAREST,
        Filter::Linear => vk::Filter::LINEAR,
    }
}

pub(crate) fn mipmap_mode_to_vk(mode: MipmapMode) -> vk::SamplerMipmapMode {
    match mode {
        MipmapMode::Nearest => vk::SamplerMipmapMode::NEAREST,
        MipmapMode::Linear => vk::SamplerMipmapMode::LINEAR,
    }
}

pub(crate) fn address_mode_to_vk(mode: AddressMode) -> vk::SamplerAddressMode {
    match mode {
        AddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        AddressMode::MirroredRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        AddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        AddressMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
    }
}

pub(crate) fn border_color_to_vk(color: BorderColor) -> vk::BorderColor {
    match color {
        BorderColor::FloatTransparentBlack => vk::BorderColor::FLOAT_TRANSPARENT_BLACK,
        BorderColor::FloatOpaqueBlack => vk::BorderColor::FLOAT_OPAQUE_BLACK,
        BorderColor::FloatOpaqueWhite => vk::BorderColor::FLOAT_OPAQUE_WHITE,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
