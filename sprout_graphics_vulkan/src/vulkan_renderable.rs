/// VulkanRenderable - GPU buffers, push-descriptor layout and pipelines
///
/// Vertex and index buffers live in device memory and are written through
/// the frame's staging buffer. Pipelines are built on first use for each
/// list of color attachment formats.

use ash::vk;
use gpu_allocator::MemoryLocation;
use sprout_graphics::sprout::render::{
    BlendMode, HandleCache, Renderable, RenderableInfo, Shader, Texture, UniformState, VertexAttribute,
    SAMPLER_BINDING_SHIFT,
};
use sprout_graphics::{sprout_debug, sprout_invariant, sprout_native_err, Error, Result};
use std::sync::{Arc, Mutex};

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{attribute_format, blend_attachment};
use crate::vulkan_recorder::{lock_frame, FrameState, Retained};
use crate::vulkan_shader::{BindingKind, ReflectedBinding, VulkanShader};
use crate::vulkan_texture::VulkanTexture;

/// Device-side half of a renderable, kept alive by in-flight frames
pub(crate) struct RenderableGpu {
    ctx: Arc<GpuContext>,
    shader: Arc<dyn Shader>,
    bindings: Vec<ReflectedBinding>,
    vertex_input: Vec<VertexAttribute>,
    vertex_size: u32,
    blend_mode: BlendMode,
    vertex_buffer: Option<Buffer>,
    index_buffer: Option<Buffer>,
    set_layout: vk::DescriptorSetLayout,
    pipeline_layout: vk::PipelineLayout,
    pipelines: Mutex<HandleCache<Vec<vk::Format>, vk::Pipeline>>,
}

impl RenderableGpu {
    fn new(ctx: Arc<GpuContext>, info: &RenderableInfo, shader: &VulkanShader) -> Result<Self> {
        // Drop releases whatever has been created from here on
        let mut gpu = Self {
            ctx: Arc::clone(&ctx),
            shader: Arc::clone(&info.shader),
            bindings: shader.bindings().to_vec(),
            vertex_input: info.vertex_input.clone(),
            vertex_size: info.vertex_size,
            blend_mode: info.blend_mode,
            vertex_buffer: None,
            index_buffer: None,
            set_layout: vk::DescriptorSetLayout::null(),
            pipeline_layout: vk::PipelineLayout::null(),
            pipelines: Mutex::new(HandleCache::new()),
        };

        if info.num_vertices > 0 {
            gpu.vertex_buffer = Some(Buffer::new(
                Arc::clone(&ctx),
                "vertex",
                info.vertex_buffer_size(),
                vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
                MemoryLocation::GpuOnly,
            )?);
        }
        if info.num_indices > 0 {
            gpu.index_buffer = Some(Buffer::new(
                Arc::clone(&ctx),
                "index",
                info.index_buffer_size(),
                vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
                MemoryLocation::GpuOnly,
            )?);
        }

        let layout_bindings: Vec<vk::DescriptorSetLayoutBinding> = gpu
            .bindings
            .iter()
            .map(|b| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(b.binding)
                    .descriptor_type(descriptor_type(b.kind))
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            })
            .collect();
        let set_layout_info = vk::DescriptorSetLayoutCreateInfo::default()
            .flags(vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR)
            .bindings(&layout_bindings);

        unsafe {
            gpu.set_layout = ctx
                .device
                .create_descriptor_set_layout(&set_layout_info, None)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateDescriptorSetLayout", e.as_raw()))?;

            let set_layouts = [gpu.set_layout];
            let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
            gpu.pipeline_layout = ctx
                .device
                .create_pipeline_layout(&layout_info, None)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreatePipelineLayout", e.as_raw()))?;
        }

        Ok(gpu)
    }

    /// Pipeline for the given color attachment formats, built on first use
    fn pipeline(&self, formats: &[vk::Format]) -> Result<vk::Pipeline> {
        let mut pipelines = self
            .pipelines
            .lock()
            .map_err(|_| Error::BackendError("Pipeline cache lock poisoned".to_string()))?;
        pipelines.get_or_create(&formats.to_vec(), |formats| self.create_pipeline(formats))
    }

    fn create_pipeline(&self, formats: &[vk::Format]) -> Result<vk::Pipeline> {
        let shader = VulkanShader::from_dyn(self.shader.as_ref())?;
        let stages = shader.stage_infos();

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = if self.vertex_size > 0 {
            vec![vk::VertexInputBindingDescription {
                binding: 0,
                stride: self.vertex_size,
                input_rate: vk::VertexInputRate::VERTEX,
            }]
        } else {
            Vec::new()
        };
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = self
            .vertex_input
            .iter()
            .map(|a| vk::VertexInputAttributeDescription {
                location: a.location,
                binding: 0,
                format: attribute_format(a.attribute_type),
                offset: a.offset,
            })
            .collect();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(vk::CullModeFlags::NONE)
            .front_face(vk::FrontFace::CLOCKWISE)
            .line_width(1.0);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let blend_attachments = vec![blend_attachment(&self.blend_mode); formats.len()];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let mut rendering_info = vk::PipelineRenderingCreateInfo::default().color_attachment_formats(formats);

        let create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(self.pipeline_layout)
            .push_next(&mut rendering_info);

        let pipelines = unsafe {
            self.ctx
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None)
        }
        .map_err(|(_, e)| sprout_native_err!("sprout::vulkan", "vkCreateGraphicsPipelines", e.as_raw()))?;

        sprout_debug!("sprout::vulkan", "Created pipeline for attachment formats {:?}", formats);
        pipelines
            .into_iter()
            .next()
            .ok_or_else(|| sprout_invariant!("sprout::vulkan", "Driver returned no pipeline"))
    }
}

impl Drop for RenderableGpu {
    fn drop(&mut self) {
        unsafe {
            if let Ok(mut pipelines) = self.pipelines.lock() {
                for (_, pipeline) in pipelines.drain() {
                    self.ctx.device.destroy_pipeline(pipeline, None);
                }
            }
            if self.pipeline_layout != vk::PipelineLayout::null() {
                self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
            }
            if self.set_layout != vk::DescriptorSetLayout::null() {
                self.ctx.device.destroy_descriptor_set_layout(self.set_layout, None);
            }
        }
    }
}

fn descriptor_type(kind: BindingKind) -> vk::DescriptorType {
    match kind {
        BindingKind::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        BindingKind::SampledImage => vk::DescriptorType::SAMPLED_IMAGE,
        BindingKind::Sampler => vk::DescriptorType::SAMPLER,
        BindingKind::CombinedImageSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

// ============================================================================
// Renderable
// ============================================================================

pub struct VulkanRenderable {
    info: RenderableInfo,
    uniforms: UniformState,
    gpu: Arc<RenderableGpu>,
    frame: Arc<Mutex<FrameState>>,
}

impl VulkanRenderable {
    /// Validate `info`, create the GPU half and zero its buffers
    pub(crate) fn new(ctx: Arc<GpuContext>, frame: Arc<Mutex<FrameState>>, info: &RenderableInfo) -> Result<Self> {
        info.validate()?;
        let shader = VulkanShader::from_dyn(info.shader.as_ref())?;
        crate::vulkan_shader::check_bindings(shader.bindings(), &info.uniforms)?;

        let gpu = Arc::new(RenderableGpu::new(ctx, info, shader)?);
        {
            let mut state = lock_frame(&frame)?;
            for buffer in [&gpu.vertex_buffer, &gpu.index_buffer].into_iter().flatten() {
                state.zero_buffer(buffer.handle(), &gpu)?;
            }
        }

        Ok(Self {
            info: info.clone(),
            uniforms: UniformState::new(&info.uniforms),
            gpu,
            frame,
        })
    }
}

impl Renderable for VulkanRenderable {
    fn info(&self) -> &RenderableInfo {
        &self.info
    }

    fn update_vertices(&mut self, offset_in_vertices: u32, data: &[u8]) -> Result<()> {
        let byte_offset = self.info.check_vertex_write(offset_in_vertices, data.len())?;
        let buffer = self
            .gpu
            .vertex_buffer
            .as_ref()
            .ok_or_else(|| sprout_invariant!("sprout::vulkan", "Renderable has no vertex buffer"))?;
        lock_frame(&self.frame)?.upload_buffer(buffer.handle(), byte_offset, data, &self.gpu)
    }

    fn update_indices(&mut self, offset_in_indices: u32, indices: &[u32]) -> Result<()> {
        let byte_offset = self.info.check_index_write(offset_in_indices, indices.len())?;
        let buffer = self
            .gpu
            .index_buffer
            .as_ref()
            .ok_or_else(|| sprout_invariant!("sprout::vulkan", "Renderable has no index buffer"))?;
        lock_frame(&self.frame)?.upload_buffer(buffer.handle(), byte_offset, bytemuck::cast_slice(indices), &self.gpu)
    }

    fn push_uniform_data(&mut self, slot: u32, byte_offset: u32, data: &[u8]) -> Result<()> {
        self.uniforms.write_constant(slot, byte_offset, data)
    }

    fn push_texture(&mut self, slot: u32, texture: &Arc<dyn Texture>) -> Result<()> {
        VulkanTexture::from_dyn(texture.as_ref())?;
        self.uniforms.bind_texture(slot, texture)
    }

    fn draw_count(&mut self, count: u32) -> Result<()> {
        let mut frame = lock_frame(&self.frame)?;
        self.uniforms.validate_for_draw(frame.targets())?;
        self.info.check_draw_count(count)?;
        if count == 0 {
            return Ok(());
        }

        let pipeline = self.gpu.pipeline(&frame.target_formats())?;

        // Everything fallible happens before the first command is recorded
        let mut constant_offsets = Vec::new();
        for (slot, data) in self.uniforms.constant_buffers() {
            constant_offsets.push((slot, frame.push_uniform(data)?, data.len() as u64));
        }
        let mut texture_handles = Vec::new();
        for (slot, _, texture) in self.uniforms.textures() {
            let view = VulkanTexture::from_dyn(texture.as_ref())?.view;
            let sampler = frame.samplers().get_sampler(&texture.sampler())?;
            texture_handles.push((slot, view, sampler));
        }

        let uniform_buffer = frame.uniform_buffer();
        let mut buffer_infos = Vec::new();
        let mut image_infos = Vec::new();
        for binding in &self.gpu.bindings {
            match binding.kind {
                BindingKind::UniformBuffer => {
                    let (_, offset, range) = constant_offsets
                        .iter()
                        .copied()
                        .find(|(slot, _, _)| *slot == binding.binding)
                        .ok_or_else(|| missing(binding))?;
                    buffer_infos.push((
                        binding.binding,
                        vk::DescriptorBufferInfo {
                            buffer: uniform_buffer,
                            offset,
                            range,
                        },
                    ));
                }
                kind => {
                    let texture_slot = match kind {
                        BindingKind::Sampler => binding.binding - SAMPLER_BINDING_SHIFT,
                        _ => binding.binding,
                    };
                    let (_, view, sampler) = texture_handles
                        .iter()
                        .copied()
                        .find(|(slot, _, _)| *slot == texture_slot)
                        .ok_or_else(|| missing(binding))?;
                    let info = match kind {
                        BindingKind::Sampler => vk::DescriptorImageInfo::default().sampler(sampler),
                        BindingKind::SampledImage => vk::DescriptorImageInfo::default()
                            .image_view(view)
                            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
                        _ => vk::DescriptorImageInfo::default()
                            .sampler(sampler)
                            .image_view(view)
                            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
                    };
                    image_infos.push((binding.binding, kind, info));
                }
            }
        }

        let writes: Vec<vk::WriteDescriptorSet> = buffer_infos
            .iter()
            .map(|(binding, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_binding(*binding)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(std::slice::from_ref(info))
            })
            .chain(image_infos.iter().map(|(binding, kind, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_binding(*binding)
                    .descriptor_type(descriptor_type(*kind))
                    .image_info(std::slice::from_ref(info))
            }))
            .collect();

        if !frame.ensure_rendering()? {
            return Ok(());
        }
        let command_buffer = frame.command_buffer();
        let device = &self.gpu.ctx.device;
        unsafe {
            device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
            if !writes.is_empty() {
                self.gpu.ctx.push_descriptor.cmd_push_descriptor_set(
                    command_buffer,
                    vk::PipelineBindPoint::GRAPHICS,
                    self.gpu.pipeline_layout,
                    0,
                    &writes,
                );
            }
            if let Some(vertex_buffer) = &self.gpu.vertex_buffer {
                device.cmd_bind_vertex_buffers(command_buffer, 0, &[vertex_buffer.handle()], &[0]);
            }
            match &self.gpu.index_buffer {
                Some(index_buffer) => {
                    device.cmd_bind_index_buffer(command_buffer, index_buffer.handle(), 0, vk::IndexType::UINT32);
                    device.cmd_draw_indexed(command_buffer, count, 1, 0, 0, 0);
                }
                None => device.cmd_draw(command_buffer, count, 1, 0, 0),
            }
        }

        frame.retain(Retained::Renderable(Arc::clone(&self.gpu)));
        for (_, _, texture) in self.uniforms.textures() {
            frame.retain(Retained::Texture(Arc::clone(texture)));
        }
        self.uniforms.mark_clean();
        Ok(())
    }
}

fn missing(binding: &ReflectedBinding) -> Error {
    sprout_invariant!(
        "sprout::vulkan",
        "No resource for shader binding {} ('{}')",
        binding.binding,
        binding.name
    )
}
