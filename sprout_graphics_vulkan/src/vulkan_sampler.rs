/// VkSampler objects realized lazily from `Sampler` values
///
/// Structurally equal descriptions share one native sampler for the
/// lifetime of the device.

use ash::vk;
use sprout_graphics::sprout::render::{Sampler, SamplerCache};
use sprout_graphics::{sprout_native_err, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_convert::{address_to_vk, filter_to_vk, mip_filter_to_vk};

pub(crate) struct VulkanSamplers {
    ctx: Arc<GpuContext>,
    cache: SamplerCache<vk::Sampler>,
}

impl VulkanSamplers {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Self {
        Self {
            ctx,
            cache: SamplerCache::new(),
        }
    }

    pub(crate) fn get_sampler(&mut self, sampler: &Sampler) -> Result<vk::Sampler> {
        let ctx = &self.ctx;
        self.cache.get_or_create(sampler, |desc| create_vk_sampler(ctx, desc))
    }
}

fn create_vk_sampler(ctx: &GpuContext, desc: &Sampler) -> Result<vk::Sampler> {
    let create_info = vk::SamplerCreateInfo::default()
        .mag_filter(filter_to_vk(desc.mag_filter))
        .min_filter(filter_to_vk(desc.min_filter))
        .mipmap_mode(mip_filter_to_vk(desc.mip_filter))
        .address_mode_u(address_to_vk(desc.address_u))
        .address_mode_v(address_to_vk(desc.address_v))
        .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
        .mip_lod_bias(0.0)
        .min_lod(0.0)
        .max_lod(vk::LOD_CLAMP_NONE)
        .border_color(vk::BorderColor::FLOAT_TRANSPARENT_BLACK)
        .anisotropy_enable(false)
        .max_anisotropy(1.0)
        .compare_enable(false)
        .compare_op(vk::CompareOp::ALWAYS)
        .unnormalized_coordinates(false);

    unsafe { ctx.device.create_sampler(&create_info, None) }
        .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateSampler", e.as_raw()))
}

impl Drop for VulkanSamplers {
    fn drop(&mut self) {
        for (_, sampler) in self.cache.drain() {
            unsafe { self.ctx.device.destroy_sampler(sampler, None) };
        }
    }
}
