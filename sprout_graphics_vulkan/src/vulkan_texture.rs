/// VulkanTexture - image, view and allocation behind a `Texture`
///
/// Uploads and layout transitions are recorded by the frame recorder; the
/// texture only tracks its current `ImageState`.

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use sprout_graphics::sprout::render::{Sampler, Texture, TextureDesc, TextureUsage};
use sprout_graphics::{sprout_error, sprout_invariant, sprout_native_err, Error, Result};
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::pixel_format_to_vk;
use crate::vulkan_layout::{color_range, transition_masks, ImageState};

pub struct VulkanTexture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    /// Level-0 view for color attachment use when the image has mips
    attachment_view: vk::ImageView,
    allocation: Option<Allocation>,
    desc: TextureDesc,
    mip_levels: u32,
    sampler: Mutex<Sampler>,
    state: Mutex<ImageState>,
}

impl VulkanTexture {
    pub(crate) fn new(ctx: Arc<GpuContext>, desc: &TextureDesc) -> Result<Self> {
        let mip_levels = desc.mip_levels();
        let format = pixel_format_to_vk(desc.format);

        let mut usage = vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST;
        if desc.usage.contains(TextureUsage::RENDER_TEXTURE) {
            usage |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
        }
        if mip_levels > 1 {
            usage |= vk::ImageUsageFlags::TRANSFER_SRC;
        }

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width: desc.width,
                height: desc.height,
                depth: 1,
            })
            .mip_levels(mip_levels)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        unsafe {
            let image = ctx
                .device
                .create_image(&image_info, None)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateImage", e.as_raw()))?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocated = ctx.allocator().and_then(|mut allocator| {
                allocator
                    .allocate(&AllocationCreateDesc {
                        name: "texture",
                        requirements,
                        location: gpu_allocator::MemoryLocation::GpuOnly,
                        linear: false,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        sprout_error!(
                            "sprout::vulkan",
                            "Out of GPU memory for texture ({}x{}, {} mips, {:.2} MB)",
                            desc.width,
                            desc.height,
                            mip_levels,
                            size_mb
                        );
                        Error::OutOfMemory
                    })
            });
            let allocation = match allocated {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_image(image, None);
                    return Err(e);
                }
            };

            // Drop releases whatever has been created from here on
            let mut texture = Self {
                ctx,
                image,
                view: vk::ImageView::null(),
                attachment_view: vk::ImageView::null(),
                allocation: Some(allocation),
                desc: *desc,
                mip_levels,
                sampler: Mutex::new(Sampler::default()),
                state: Mutex::new(ImageState::Undefined),
            };

            if let Some(allocation) = &texture.allocation {
                texture
                    .ctx
                    .device
                    .bind_image_memory(image, allocation.memory(), allocation.offset())
                    .map_err(|e| sprout_native_err!("sprout::vulkan", "vkBindImageMemory", e.as_raw()))?;
            }

            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .subresource_range(color_range(0, mip_levels));
            texture.view = texture
                .ctx
                .device
                .create_image_view(&view_info, None)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateImageView", e.as_raw()))?;

            if desc.usage.contains(TextureUsage::RENDER_TEXTURE) && mip_levels > 1 {
                let attachment_info = view_info.subresource_range(color_range(0, 1));
                texture.attachment_view = texture
                    .ctx
                    .device
                    .create_image_view(&attachment_info, None)
                    .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateImageView", e.as_raw()))?;
            }

            Ok(texture)
        }
    }

    pub(crate) fn attachment_view(&self) -> vk::ImageView {
        if self.attachment_view != vk::ImageView::null() {
            self.attachment_view
        } else {
            self.view
        }
    }

    pub(crate) fn mip_levels(&self) -> u32 {
        self.mip_levels
    }

    pub(crate) fn state(&self) -> Result<MutexGuard<'_, ImageState>> {
        self.state
            .lock()
            .map_err(|_| Error::BackendError("Texture state lock poisoned".to_string()))
    }

    /// Downcast a contract texture created by this backend
    pub(crate) fn from_dyn(texture: &dyn Texture) -> Result<&VulkanTexture> {
        texture
            .as_any()
            .downcast_ref::<VulkanTexture>()
            .ok_or_else(|| sprout_invariant!("sprout::vulkan", "Texture was not created by the Vulkan backend"))
    }
}

impl Texture for VulkanTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn sampler(&self) -> Sampler {
        self.sampler.lock().map(|s| *s).unwrap_or_default()
    }

    fn set_sampler(&self, sampler: Sampler) -> Result<()> {
        let mut current = self
            .sampler
            .lock()
            .map_err(|_| Error::BackendError("Texture sampler lock poisoned".to_string()))?;
        *current = sampler;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanTexture {
    fn drop(&mut self) {
        unsafe {
            if self.attachment_view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.attachment_view, None);
            }
            if self.view != vk::ImageView::null() {
                self.ctx.device.destroy_image_view(self.view, None);
            }
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}

/// Record the blit chain building every mip level from level 0
///
/// Expects the whole image in `TransferDst` with level 0 filled and leaves
/// it in `ShaderReadOnly`, the same edge as a plain upload.
pub(crate) fn record_mip_chain(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    texture: &VulkanTexture,
    state: &mut ImageState,
) -> Result<()> {
    transition_masks(*state, ImageState::ShaderReadOnly)?;
    if *state != ImageState::TransferDst {
        return Err(sprout_invariant!(
            "sprout::vulkan",
            "Mip generation needs the image in TransferDst, found {:?}",
            state
        ));
    }

    let image = texture.image;
    let mut src_width = texture.desc.width;
    let mut src_height = texture.desc.height;

    unsafe {
        for mip in 1..texture.mip_levels {
            let src_mip = mip - 1;
            let dst_width = (src_width / 2).max(1);
            let dst_height = (src_height / 2).max(1);

            // Source level: written by the previous copy or blit, now read
            let to_src = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(color_range(src_mip, 1))
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::TRANSFER_READ);
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_src],
            );

            let blit = vk::ImageBlit::default()
                .src_subresource(mip_layers(src_mip))
                .src_offsets([
                    vk::Offset3D { x: 0, y: 0, z: 0 },
                    vk::Offset3D {
                        x: src_width as i32,
                        y: src_height as i32,
                        z: 1,
                    },
                ])
                .dst_subresource(mip_layers(mip))
                .dst_offsets([
                    vk::Offset3D { x: 0, y: 0, z: 0 },
                    vk::Offset3D {
                        x: dst_width as i32,
                        y: dst_height as i32,
                        z: 1,
                    },
                ]);
            device.cmd_blit_image(
                command_buffer,
                image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                vk::Filter::LINEAR,
            );

            let src_done = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(image)
                .subresource_range(color_range(src_mip, 1))
                .src_access_mask(vk::AccessFlags::TRANSFER_READ)
                .dst_access_mask(vk::AccessFlags::SHADER_READ);
            device.cmd_pipeline_barrier(
                command_buffer,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[src_done],
            );

            src_width = dst_width;
            src_height = dst_height;
        }

        let last_done = vk::ImageMemoryBarrier::default()
            .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(color_range(texture.mip_levels - 1, 1))
            .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
            .dst_access_mask(vk::AccessFlags::SHADER_READ);
        device.cmd_pipeline_barrier(
            command_buffer,
            vk::PipelineStageFlags::TRANSFER,
            vk::PipelineStageFlags::FRAGMENT_SHADER,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[last_done],
        );
    }

    *state = ImageState::ShaderReadOnly;
    Ok(())
}

fn mip_layers(mip_level: u32) -> vk::ImageSubresourceLayers {
    vk::ImageSubresourceLayers {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        mip_level,
        base_array_layer: 0,
        layer_count: 1,
    }
}
