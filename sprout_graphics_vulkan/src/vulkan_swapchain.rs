/// Swapchain - window surface, presentable images and their layout state
///
/// Owns the surface handed over by `GpuContext::new`. Recreation replaces
/// the images and views; per-image `ImageState`s restart at `Undefined`.

use ash::vk;
use sprout_graphics::{sprout_debug, sprout_error, sprout_native_err, Error, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_layout::ImageState;

/// Result of an image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acquire {
    Image(u32),
    /// The surface changed; recreate and retry
    OutOfDate,
}

pub(crate) struct Swapchain {
    ctx: Arc<GpuContext>,
    surface: vk::SurfaceKHR,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
    states: Vec<ImageState>,
    /// One per image, signalled by the submit and waited on by present
    render_finished: Vec<vk::Semaphore>,
    format: vk::SurfaceFormatKHR,
    extent: vk::Extent2D,
    vsync: bool,
}

impl Swapchain {
    pub(crate) fn new(ctx: Arc<GpuContext>, surface: vk::SurfaceKHR, width: u32, height: u32, vsync: bool) -> Result<Self> {
        let formats = unsafe {
            ctx.surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, surface)
        };
        let formats = match formats {
            Ok(formats) => formats,
            Err(e) => {
                unsafe { ctx.surface_loader.destroy_surface(surface, None) };
                sprout_error!("sprout::vulkan", "Failed to query surface formats: {:?}", e);
                return Err(Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e)));
            }
        };
        let Some(format) = choose_surface_format(&formats) else {
            unsafe { ctx.surface_loader.destroy_surface(surface, None) };
            sprout_error!("sprout::vulkan", "Surface reports no formats");
            return Err(Error::InitializationFailed("Surface reports no formats".to_string()));
        };

        // Drop destroys the surface from here on
        let mut this = Self {
            ctx,
            surface,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            views: Vec::new(),
            states: Vec::new(),
            render_finished: Vec::new(),
            format,
            extent: vk::Extent2D { width, height },
            vsync,
        };
        this.build(width, height)?;
        Ok(this)
    }

    pub(crate) fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub(crate) fn format(&self) -> vk::Format {
        self.format.format
    }

    pub(crate) fn image(&self, index: u32) -> vk::Image {
        self.images[index as usize]
    }

    pub(crate) fn view(&self, index: u32) -> vk::ImageView {
        self.views[index as usize]
    }

    pub(crate) fn state_mut(&mut self, index: u32) -> &mut ImageState {
        &mut self.states[index as usize]
    }

    pub(crate) fn render_finished(&self, index: u32) -> vk::Semaphore {
        self.render_finished[index as usize]
    }

    /// Acquire the next image, signalling `semaphore` when it is ready
    pub(crate) fn acquire(&self, semaphore: vk::Semaphore) -> Result<Acquire> {
        let result = unsafe {
            self.ctx
                .swapchain_loader
                .acquire_next_image(self.swapchain, u64::MAX, semaphore, vk::Fence::null())
        };
        match result {
            // A suboptimal image is still usable; present reports it again
            Ok((index, _suboptimal)) => Ok(Acquire::Image(index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                sprout_debug!("sprout::vulkan", "Swapchain out of date during acquire");
                Ok(Acquire::OutOfDate)
            }
            Err(e) => Err(sprout_native_err!("sprout::vulkan", "vkAcquireNextImageKHR", e.as_raw())),
        }
    }

    /// Present `index`; returns true when the swapchain must be recreated
    pub(crate) fn present(&self, index: u32) -> Result<bool> {
        let swapchains = [self.swapchain];
        let image_indices = [index];
        let wait_semaphores = [self.render_finished[index as usize]];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.ctx.swapchain_loader.queue_present(self.ctx.queue, &present_info) } {
            Ok(false) => Ok(false),
            Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) | Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                sprout_debug!("sprout::vulkan", "Swapchain stale after present, recreating");
                Ok(true)
            }
            Err(e) => Err(sprout_native_err!("sprout::vulkan", "vkQueuePresentKHR", e.as_raw())),
        }
    }

    /// Rebuild at the surface's current size, falling back to `width` x `height`
    pub(crate) fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        self.ctx.wait_idle()?;
        self.build(width, height)
    }

    fn build(&mut self, width: u32, height: u32) -> Result<()> {
        let ctx = Arc::clone(&self.ctx);
        unsafe {
            let capabilities = ctx
                .surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, self.surface)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e.as_raw()))?;

            // Minimized windows report a zero extent; the caller defers
            let Some(extent) = usable_extent(&capabilities, width, height) else {
                return Err(Error::SurfaceLost("Surface has a zero extent".to_string()));
            };

            let present_modes = ctx
                .surface_loader
                .get_physical_device_surface_present_modes(ctx.physical_device, self.surface)
                .unwrap_or_default();
            let present_mode = choose_present_mode(&present_modes, self.vsync);

            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(choose_image_count(&capabilities))
                .image_format(self.format.format)
                .image_color_space(self.format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .clipped(true)
                .old_swapchain(self.swapchain);

            let swapchain = ctx
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateSwapchainKHR", e.as_raw()))?;

            self.destroy_images();
            if self.swapchain != vk::SwapchainKHR::null() {
                ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.swapchain = swapchain;
            self.extent = extent;

            self.images = ctx
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkGetSwapchainImagesKHR", e.as_raw()))?;

            for &image in &self.images {
                let view_info = vk::ImageViewCreateInfo::default()
                    .image(image)
                    .view_type(vk::ImageViewType::TYPE_2D)
                    .format(self.format.format)
                    .subresource_range(crate::vulkan_layout::color_range(0, 1));
                let view = ctx
                    .device
                    .create_image_view(&view_info, None)
                    .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateImageView", e.as_raw()))?;
                self.views.push(view);

                let semaphore = ctx
                    .device
                    .create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                    .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateSemaphore", e.as_raw()))?;
                self.render_finished.push(semaphore);
            }
            self.states = vec![ImageState::Undefined; self.images.len()];

            sprout_debug!(
                "sprout::vulkan",
                "Swapchain {}x{}, {} images, {:?}",
                extent.width,
                extent.height,
                self.images.len(),
                present_mode
            );
        }
        Ok(())
    }

    fn destroy_images(&mut self) {
        unsafe {
            for view in self.views.drain(..) {
                self.ctx.device.destroy_image_view(view, None);
            }
            for semaphore in self.render_finished.drain(..) {
                self.ctx.device.destroy_semaphore(semaphore, None);
            }
        }
        self.images.clear();
        self.states.clear();
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            self.destroy_images();
            if self.swapchain != vk::SwapchainKHR::null() {
                self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.ctx.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

// ============================================================================
// Surface property choices
// ============================================================================

/// Prefer an 8-bit UNORM format so render textures and the swapchain agree
pub(crate) fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .find(|f| f.format == vk::Format::B8G8R8A8_UNORM)
        .or_else(|| formats.iter().find(|f| f.format == vk::Format::R8G8B8A8_UNORM))
        .or_else(|| formats.first())
        .copied()
}

/// The surface's current extent, or the requested size clamped to its limits
pub(crate) fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    }
}

/// `choose_extent`, or `None` when the surface currently has no area
pub(crate) fn usable_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> Option<vk::Extent2D> {
    let extent = choose_extent(capabilities, width, height);
    (extent.width > 0 && extent.height > 0).then_some(extent)
}

/// FIFO with vsync; otherwise MAILBOX, then IMMEDIATE, then FIFO
pub(crate) fn choose_present_mode(available: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE]
        .into_iter()
        .find(|mode| available.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

pub(crate) fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

#[cfg(test)]
#[path = "vulkan_swapchain_tests.rs"]
mod tests;
