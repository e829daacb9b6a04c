/// FrameState - lazily begun frames, command recording and presentation
///
/// A frame begins at the first operation that needs a command buffer
/// (upload, clear, draw, render-target change, present) and ends at
/// `present`. The swapchain image is acquired only when something renders
/// to it or presents. Per slot it owns a command buffer, a staging buffer,
/// a uniform upload buffer and the resources kept alive until its fence.
///
/// While the surface has no area, swapchain passes and presentation are
/// skipped; uploads and off-screen passes are still submitted.

use ash::vk;
use sprout_graphics::sprout::render::{same_texture, Color, Texture, TextureUsage, Viewport};
use sprout_graphics::sprout::Config;
use sprout_graphics::{sprout_debug, sprout_invariant, sprout_native_err, sprout_trace, sprout_warn, Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{flipped_viewport, pixel_format_to_vk};
use crate::vulkan_frame::{FrameScheduler, SemaphorePool, VulkanFences};
use crate::vulkan_layout::{record_transition, ImageState};
use crate::vulkan_renderable::RenderableGpu;
use crate::vulkan_sampler::VulkanSamplers;
use crate::vulkan_staging::TransientBuffer;
use crate::vulkan_swapchain::{Acquire, Swapchain};
use crate::vulkan_texture::{record_mip_chain, VulkanTexture};

/// Resource referenced by recorded commands, released after the slot's fence
pub(crate) enum Retained {
    Texture(Arc<dyn Texture>),
    Renderable(Arc<RenderableGpu>),
}

/// How color targets start when rendering begins
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LoadOp {
    Clear(Color),
    Load,
}

struct SlotResources {
    command_buffer: vk::CommandBuffer,
    staging: TransientBuffer,
    uniforms: TransientBuffer,
    retained: Vec<Retained>,
}

pub(crate) struct FrameState {
    ctx: Arc<GpuContext>,
    swapchain: Swapchain,
    scheduler: FrameScheduler<VulkanFences>,
    semaphores: SemaphorePool,
    command_pool: vk::CommandPool,
    slots: Vec<SlotResources>,
    samplers: VulkanSamplers,
    /// Swapchain image and acquire semaphore of the open frame
    acquired: Option<(u32, vk::Semaphore)>,
    targets: Vec<Arc<dyn Texture>>,
    rendering: bool,
    viewport: Viewport,
    requested_size: (u32, u32),
    /// Recreation was deferred (zero-sized surface)
    stale: bool,
}

impl FrameState {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        surface: vk::SurfaceKHR,
        config: &Config,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let swapchain = Swapchain::new(Arc::clone(&ctx), surface, width, height, config.vsync)?;
        let frames_in_flight = config.frames_in_flight.max(1);
        let fences = VulkanFences::new(&ctx.device, frames_in_flight)?;
        let semaphores = SemaphorePool::new(&ctx.device, frames_in_flight);
        let samplers = VulkanSamplers::new(Arc::clone(&ctx));

        let pool_info = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(ctx.queue_family);
        let command_pool = unsafe { ctx.device.create_command_pool(&pool_info, None) }
            .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateCommandPool", e.as_raw()))?;

        let extent = swapchain.extent();
        // Drop releases the pool and anything allocated below
        let mut this = Self {
            ctx: Arc::clone(&ctx),
            swapchain,
            scheduler: FrameScheduler::new(fences, frames_in_flight),
            semaphores,
            command_pool,
            slots: Vec::with_capacity(frames_in_flight),
            samplers,
            acquired: None,
            targets: Vec::new(),
            rendering: false,
            viewport: Viewport::full(extent.width, extent.height),
            requested_size: (width, height),
            stale: false,
        };

        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(frames_in_flight as u32);
        let command_buffers = unsafe { ctx.device.allocate_command_buffers(&alloc_info) }
            .map_err(|e| sprout_native_err!("sprout::vulkan", "vkAllocateCommandBuffers", e.as_raw()))?;

        for command_buffer in command_buffers {
            let staging = TransientBuffer::new(
                Arc::clone(&ctx),
                "staging",
                config.staging_buffer_size,
                vk::BufferUsageFlags::TRANSFER_SRC,
            )?;
            let uniforms = TransientBuffer::new(
                Arc::clone(&ctx),
                "uniform",
                config.uniform_buffer_size,
                vk::BufferUsageFlags::UNIFORM_BUFFER,
            )?;
            this.slots.push(SlotResources {
                command_buffer,
                staging,
                uniforms,
                retained: Vec::new(),
            });
        }

        sprout_debug!(
            "sprout::vulkan",
            "{} frame slot(s), {} KiB staging, {} KiB uniform each",
            frames_in_flight,
            config.staging_buffer_size / 1024,
            config.uniform_buffer_size / 1024
        );
        Ok(this)
    }

    // ===== ACCESSORS =====

    pub(crate) fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub(crate) fn swapchain_size(&self) -> (u32, u32) {
        let extent = self.swapchain.extent();
        (extent.width, extent.height)
    }

    pub(crate) fn targets(&self) -> &[Arc<dyn Texture>] {
        &self.targets
    }

    pub(crate) fn samplers(&mut self) -> &mut VulkanSamplers {
        &mut self.samplers
    }

    /// Color attachment formats of the current targets, in binding order
    pub(crate) fn target_formats(&self) -> Vec<vk::Format> {
        if self.targets.is_empty() {
            vec![self.swapchain.format()]
        } else {
            self.targets
                .iter()
                .map(|t| pixel_format_to_vk(t.desc().format))
                .collect()
        }
    }

    fn target_extent(&self) -> vk::Extent2D {
        match self.targets.first() {
            Some(texture) => vk::Extent2D {
                width: texture.width(),
                height: texture.height(),
            },
            None => self.swapchain.extent(),
        }
    }

    pub(crate) fn command_buffer(&self) -> vk::CommandBuffer {
        self.slots[self.scheduler.slot()].command_buffer
    }

    pub(crate) fn uniform_buffer(&self) -> vk::Buffer {
        self.slots[self.scheduler.slot()].uniforms.handle()
    }

    pub(crate) fn retain(&mut self, resource: Retained) {
        let slot = self.scheduler.slot();
        self.slots[slot].retained.push(resource);
    }

    // ===== FRAME BEGIN =====

    /// Begin a frame unless one is already open
    pub(crate) fn ensure_frame(&mut self) -> Result<()> {
        if self.scheduler.in_frame() {
            return Ok(());
        }

        self.scheduler.begin()?;
        let slot = self.scheduler.slot();
        let resources = &mut self.slots[slot];
        resources.retained.clear();
        resources.staging.reset();
        resources.uniforms.reset();

        let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(resources.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkResetCommandBuffer", e.as_raw()))?;
            self.ctx
                .device
                .begin_command_buffer(resources.command_buffer, &begin_info)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkBeginCommandBuffer", e.as_raw()))?;
        }

        sprout_trace!("sprout::vulkan", "Frame begun: slot {}", slot);
        Ok(())
    }

    /// Swapchain image of the open frame, acquiring it on first use
    ///
    /// `None` when the surface has no area; the swapchain stays stale and
    /// the caller skips its swapchain work.
    fn acquire_swapchain_image(&mut self) -> Result<Option<u32>> {
        if let Some((index, _)) = self.acquired {
            return Ok(Some(index));
        }
        self.ensure_frame()?;
        if self.stale && !self.recreate_or_defer()? {
            return Ok(None);
        }

        let semaphore = self.semaphores.take()?;
        match self.acquire_image(semaphore) {
            Ok(Some(index)) => {
                self.semaphores.assign(self.scheduler.slot(), semaphore);
                self.acquired = Some((index, semaphore));
                sprout_trace!("sprout::vulkan", "Acquired swapchain image {}", index);
                Ok(Some(index))
            }
            Ok(None) => {
                self.semaphores.give_back(semaphore);
                Ok(None)
            }
            Err(e) => {
                self.semaphores.give_back(semaphore);
                Err(e)
            }
        }
    }

    /// Acquire, recreating and retrying once on a stale surface
    fn acquire_image(&mut self, semaphore: vk::Semaphore) -> Result<Option<u32>> {
        if let Acquire::Image(index) = self.swapchain.acquire(semaphore)? {
            return Ok(Some(index));
        }
        if !self.recreate_or_defer()? {
            return Ok(None);
        }
        match self.swapchain.acquire(semaphore)? {
            Acquire::Image(index) => Ok(Some(index)),
            Acquire::OutOfDate => {
                sprout_warn!("sprout::vulkan", "Swapchain still out of date after recreation, skipping frame");
                self.stale = true;
                Ok(None)
            }
        }
    }

    fn recreate_swapchain(&mut self) -> Result<()> {
        let (width, height) = self.requested_size;
        self.swapchain.recreate(width, height)?;
        self.stale = false;
        if self.targets.is_empty() {
            let extent = self.swapchain.extent();
            self.viewport = Viewport::full(extent.width, extent.height);
        }
        Ok(())
    }

    /// Recreate now, or on a later frame when the surface has no area
    ///
    /// Returns false when recreation was deferred.
    fn recreate_or_defer(&mut self) -> Result<bool> {
        match self.recreate_swapchain() {
            Ok(()) => Ok(true),
            Err(Error::SurfaceLost(reason)) => {
                sprout_debug!("sprout::vulkan", "Deferring swapchain recreation: {}", reason);
                self.stale = true;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    // ===== DYNAMIC RENDERING =====

    /// Begin dynamic rendering into the current targets
    ///
    /// An active rendering scope is ended first, so a clear always starts a
    /// fresh scope. Returns false when the target is a swapchain without
    /// area and nothing was begun.
    pub(crate) fn begin_rendering(&mut self, load: LoadOp) -> Result<bool> {
        self.ensure_frame()?;
        self.end_rendering();

        let ctx = Arc::clone(&self.ctx);
        let command_buffer = self.command_buffer();
        let (load_op, clear_value) = match load {
            LoadOp::Clear(color) => (
                vk::AttachmentLoadOp::CLEAR,
                vk::ClearValue {
                    color: vk::ClearColorValue {
                        float32: color.to_array(),
                    },
                },
            ),
            LoadOp::Load => (vk::AttachmentLoadOp::LOAD, vk::ClearValue::default()),
        };
        let attachment = |view: vk::ImageView| {
            vk::RenderingAttachmentInfo::default()
                .image_view(view)
                .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .load_op(load_op)
                .store_op(vk::AttachmentStoreOp::STORE)
                .clear_value(clear_value)
        };

        let mut attachments = Vec::with_capacity(self.targets.len().max(1));
        if self.targets.is_empty() {
            let Some(index) = self.acquire_swapchain_image()? else {
                sprout_trace!("sprout::vulkan", "Surface has no area, swapchain pass skipped");
                return Ok(false);
            };
            let image = self.swapchain.image(index);
            record_transition(
                &ctx.device,
                command_buffer,
                image,
                1,
                self.swapchain.state_mut(index),
                ImageState::ColorAttachment,
            )?;
            attachments.push(attachment(self.swapchain.view(index)));
        } else {
            let slot = self.scheduler.slot();
            for target in &self.targets {
                let texture = VulkanTexture::from_dyn(target.as_ref())?;
                let mut state = texture.state()?;
                record_transition(
                    &ctx.device,
                    command_buffer,
                    texture.image,
                    texture.mip_levels(),
                    &mut state,
                    ImageState::ColorAttachment,
                )?;
                attachments.push(attachment(texture.attachment_view()));
                self.slots[slot].retained.push(Retained::Texture(Arc::clone(target)));
            }
        }

        let rendering_info = vk::RenderingInfo::default()
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: self.target_extent(),
            })
            .layer_count(1)
            .color_attachments(&attachments);
        unsafe { ctx.device.cmd_begin_rendering(command_buffer, &rendering_info) };
        self.rendering = true;
        self.apply_viewport();
        Ok(true)
    }

    /// Make sure a rendering scope is open, resuming with `LOAD`
    ///
    /// False when there is nothing to render into this frame.
    pub(crate) fn ensure_rendering(&mut self) -> Result<bool> {
        if self.rendering {
            return Ok(true);
        }
        self.begin_rendering(LoadOp::Load)
    }

    pub(crate) fn end_rendering(&mut self) {
        if self.rendering {
            unsafe { self.ctx.device.cmd_end_rendering(self.command_buffer()) };
            self.rendering = false;
        }
    }

    pub(crate) fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if self.rendering {
            self.apply_viewport();
        }
    }

    fn apply_viewport(&self) {
        let vp = self.viewport;
        let scissor = vk::Rect2D {
            offset: vk::Offset2D {
                x: vp.x.max(0),
                y: vp.y.max(0),
            },
            extent: vk::Extent2D {
                width: vp.width,
                height: vp.height,
            },
        };
        let command_buffer = self.command_buffer();
        unsafe {
            self.ctx
                .device
                .cmd_set_viewport(command_buffer, 0, &[flipped_viewport(vp.x, vp.y, vp.width, vp.height)]);
            self.ctx.device.cmd_set_scissor(command_buffer, 0, &[scissor]);
        }
    }

    // ===== RENDER TARGETS =====

    /// Bind new color targets (already validated); empty means the swapchain
    pub(crate) fn set_render_targets(&mut self, textures: &[Arc<dyn Texture>]) -> Result<()> {
        for texture in textures {
            VulkanTexture::from_dyn(texture.as_ref())?;
        }

        // Targets leaving the list go back to sampling if they can be sampled
        let mut released = Vec::new();
        for old in &self.targets {
            if !old.usage().contains(TextureUsage::SHADER) || textures.iter().any(|t| same_texture(t, old)) {
                continue;
            }
            if *VulkanTexture::from_dyn(old.as_ref())?.state()? == ImageState::ColorAttachment {
                released.push(Arc::clone(old));
            }
        }

        if !released.is_empty() {
            self.ensure_frame()?;
        }
        self.end_rendering();

        if !released.is_empty() {
            let command_buffer = self.command_buffer();
            for old in released {
                let texture = VulkanTexture::from_dyn(old.as_ref())?;
                let mut state = texture.state()?;
                record_transition(
                    &self.ctx.device,
                    command_buffer,
                    texture.image,
                    texture.mip_levels(),
                    &mut state,
                    ImageState::ShaderReadOnly,
                )?;
                drop(state);
                self.retain(Retained::Texture(old));
            }
        }

        self.targets = textures.to_vec();
        let extent = self.target_extent();
        self.viewport = Viewport::full(extent.width, extent.height);
        Ok(())
    }

    // ===== UPLOADS =====

    /// Copy `bytes` into `dst` at `dst_offset` through the staging buffer
    ///
    /// Rendering is suspended around the copy; the next draw resumes with
    /// `LOAD`, so GPU order matches call order.
    pub(crate) fn upload_buffer(
        &mut self,
        dst: vk::Buffer,
        dst_offset: u64,
        bytes: &[u8],
        owner: &Arc<RenderableGpu>,
    ) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.ensure_frame()?;
        let slot = self.scheduler.slot();
        let src_offset = self.slots[slot].staging.push(bytes, 4)?;
        self.end_rendering();

        let command_buffer = self.command_buffer();
        let size = bytes.len() as u64;
        let device = &self.ctx.device;
        buffer_barrier(
            device,
            command_buffer,
            dst,
            dst_offset,
            size,
            (vk::PipelineStageFlags::VERTEX_INPUT, vertex_read_access()),
            (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_WRITE),
        );
        let region = vk::BufferCopy {
            src_offset,
            dst_offset,
            size,
        };
        unsafe {
            device.cmd_copy_buffer(command_buffer, self.slots[slot].staging.handle(), dst, &[region]);
        }
        buffer_barrier(
            device,
            command_buffer,
            dst,
            dst_offset,
            size,
            (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_WRITE),
            (vk::PipelineStageFlags::VERTEX_INPUT, vertex_read_access()),
        );

        self.retain(Retained::Renderable(Arc::clone(owner)));
        Ok(())
    }

    /// Zero a freshly created buffer
    pub(crate) fn zero_buffer(&mut self, dst: vk::Buffer, owner: &Arc<RenderableGpu>) -> Result<()> {
        self.ensure_frame()?;
        self.end_rendering();
        let command_buffer = self.command_buffer();
        let device = &self.ctx.device;
        unsafe { device.cmd_fill_buffer(command_buffer, dst, 0, vk::WHOLE_SIZE, 0) };
        buffer_barrier(
            device,
            command_buffer,
            dst,
            0,
            vk::WHOLE_SIZE,
            (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_WRITE),
            (
                vk::PipelineStageFlags::VERTEX_INPUT | vk::PipelineStageFlags::TRANSFER,
                vertex_read_access() | vk::AccessFlags::TRANSFER_WRITE,
            ),
        );
        self.retain(Retained::Renderable(Arc::clone(owner)));
        Ok(())
    }

    /// Upload level 0 of `texture`, then build its mip chain if it has one
    pub(crate) fn upload_texture(&mut self, texture: &Arc<dyn Texture>, data: &[u8]) -> Result<()> {
        let vk_texture = VulkanTexture::from_dyn(texture.as_ref())?;
        self.ensure_frame()?;
        let slot = self.scheduler.slot();
        let src_offset = self.slots[slot].staging.push(data, 16)?;
        self.end_rendering();

        let command_buffer = self.command_buffer();
        let device = &self.ctx.device;
        let mut state = vk_texture.state()?;
        record_transition(
            device,
            command_buffer,
            vk_texture.image,
            vk_texture.mip_levels(),
            &mut state,
            ImageState::TransferDst,
        )?;

        let region = vk::BufferImageCopy::default()
            .buffer_offset(src_offset)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            })
            .image_extent(vk::Extent3D {
                width: texture.width(),
                height: texture.height(),
                depth: 1,
            });
        unsafe {
            device.cmd_copy_buffer_to_image(
                command_buffer,
                self.slots[slot].staging.handle(),
                vk_texture.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );
        }

        if vk_texture.mip_levels() > 1 {
            record_mip_chain(device, command_buffer, vk_texture, &mut state)?;
        } else {
            record_transition(device, command_buffer, vk_texture.image, 1, &mut state, ImageState::ShaderReadOnly)?;
        }
        drop(state);

        self.retain(Retained::Texture(Arc::clone(texture)));
        Ok(())
    }

    /// Move a texture created without data into a sampleable layout
    pub(crate) fn prepare_sampled(&mut self, texture: &Arc<dyn Texture>) -> Result<()> {
        let vk_texture = VulkanTexture::from_dyn(texture.as_ref())?;
        self.ensure_frame()?;
        self.end_rendering();
        let command_buffer = self.command_buffer();
        let mut state = vk_texture.state()?;
        record_transition(
            &self.ctx.device,
            command_buffer,
            vk_texture.image,
            vk_texture.mip_levels(),
            &mut state,
            ImageState::ShaderReadOnly,
        )?;
        drop(state);
        self.retain(Retained::Texture(Arc::clone(texture)));
        Ok(())
    }

    /// Snapshot constant data for one draw, returning its offset
    pub(crate) fn push_uniform(&mut self, bytes: &[u8]) -> Result<u64> {
        self.ensure_frame()?;
        let alignment = self.ctx.min_uniform_alignment;
        let slot = self.scheduler.slot();
        self.slots[slot].uniforms.push(bytes, alignment)
    }

    // ===== FRAME END =====

    /// Submit the open frame and present its swapchain image
    ///
    /// With no presentable image the frame is still submitted, so uploads
    /// and off-screen passes are not lost.
    pub(crate) fn present(&mut self) -> Result<()> {
        self.ensure_frame()?;
        self.end_rendering();

        if self.acquire_swapchain_image()?.is_none() {
            self.submit(None, None)?;
            self.finish_frame();
            sprout_trace!("sprout::vulkan", "Surface has no area, frame submitted without present");
            return Ok(());
        }
        let (index, acquire_semaphore) = self.acquired.ok_or_else(|| {
            sprout_invariant!("sprout::vulkan", "Presenting without an acquired image")
        })?;
        let command_buffer = self.command_buffer();
        let image = self.swapchain.image(index);
        record_transition(
            &self.ctx.device,
            command_buffer,
            image,
            1,
            self.swapchain.state_mut(index),
            ImageState::PresentSource,
        )?;

        let render_finished = self.swapchain.render_finished(index);
        self.submit(Some(acquire_semaphore), Some(render_finished))?;
        let presented = self.swapchain.present(index);
        self.finish_frame();

        if presented? {
            self.recreate_or_defer()?;
        }
        Ok(())
    }

    /// Submit without presenting (resize in the middle of a frame)
    fn flush(&mut self) -> Result<()> {
        if !self.scheduler.in_frame() {
            return Ok(());
        }
        self.end_rendering();
        let acquire_semaphore = self.acquired.map(|(_, semaphore)| semaphore);
        self.submit(acquire_semaphore, None)?;
        self.finish_frame();
        self.ctx.wait_idle()
    }

    fn submit(&mut self, wait: Option<vk::Semaphore>, signal: Option<vk::Semaphore>) -> Result<()> {
        let command_buffer = self.command_buffer();
        let fence = self.scheduler.fences().fence(self.scheduler.slot());
        unsafe {
            self.ctx
                .device
                .end_command_buffer(command_buffer)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkEndCommandBuffer", e.as_raw()))?;

            let wait_semaphores: Vec<vk::Semaphore> = wait.into_iter().collect();
            let wait_stages = vec![vk::PipelineStageFlags::ALL_COMMANDS; wait_semaphores.len()];
            let command_buffers = [command_buffer];
            let signal_semaphores: Vec<vk::Semaphore> = signal.into_iter().collect();
            let submit_info = vk::SubmitInfo::default()
                .wait_semaphores(&wait_semaphores)
                .wait_dst_stage_mask(&wait_stages)
                .command_buffers(&command_buffers)
                .signal_semaphores(&signal_semaphores);

            self.ctx
                .device
                .queue_submit(self.ctx.queue, &[submit_info], fence)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkQueueSubmit", e.as_raw()))?;
        }
        Ok(())
    }

    fn finish_frame(&mut self) {
        self.acquired = None;
        self.rendering = false;
        self.scheduler.finish();
    }

    /// Resize the swapchain, flushing an open frame first
    pub(crate) fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.requested_size = (width, height);
        self.flush()?;
        if width == 0 || height == 0 {
            sprout_debug!("sprout::vulkan", "Zero-sized resize, recreation deferred");
            self.stale = true;
            return Ok(());
        }
        self.recreate_or_defer().map(|_| ())
    }

    pub(crate) fn wait_idle(&self) -> Result<()> {
        self.ctx.wait_idle()
    }
}

impl Drop for FrameState {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            for resources in &mut self.slots {
                resources.retained.clear();
            }
            // Destroying the pool frees its command buffers
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}

/// Lock the shared frame state
pub(crate) fn lock_frame(frame: &Mutex<FrameState>) -> Result<MutexGuard<'_, FrameState>> {
    frame
        .lock()
        .map_err(|_| Error::BackendError("Frame state lock poisoned".to_string()))
}

fn vertex_read_access() -> vk::AccessFlags {
    vk::AccessFlags::VERTEX_ATTRIBUTE_READ | vk::AccessFlags::INDEX_READ
}

fn buffer_barrier(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    buffer: vk::Buffer,
    offset: u64,
    size: u64,
    src: (vk::PipelineStageFlags, vk::AccessFlags),
    dst: (vk::PipelineStageFlags, vk::AccessFlags),
) {
    let barrier = vk::BufferMemoryBarrier::default()
        .src_access_mask(src.1)
        .dst_access_mask(dst.1)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .buffer(buffer)
        .offset(offset)
        .size(size);
    unsafe {
        device.cmd_pipeline_barrier(
            command_buffer,
            src.0,
            dst.0,
            vk::DependencyFlags::empty(),
            &[],
            &[barrier],
            &[],
        );
    }
}
