/*!
# Sprout Graphics - Vulkan Backend

Vulkan 1.3 implementation of the Sprout device contract, built on `ash`
and `gpu-allocator`.

Frames begin lazily, record into one command buffer per frame slot and
use dynamic rendering with push descriptors. Call [`register`] once at
startup to make the backend available to `create_device`.
*/

mod debug;
mod vulkan_buffer;
mod vulkan_context;
mod vulkan_convert;
mod vulkan_device;
mod vulkan_frame;
mod vulkan_layout;
mod vulkan_recorder;
mod vulkan_renderable;
mod vulkan_sampler;
mod vulkan_shader;
mod vulkan_staging;
mod vulkan_swapchain;
mod vulkan_texture;

pub use vulkan_device::VulkanGraphicsDevice;
pub use vulkan_layout::{transition_masks, ImageState, TransitionMasks};
pub use vulkan_renderable::VulkanRenderable;
pub use vulkan_shader::VulkanShader;
pub use vulkan_staging::TransientCursor;
pub use vulkan_texture::VulkanTexture;

// Re-export debug utilities
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};

use sprout_graphics::sprout::render::{register_backend, GraphicsDevice};
use sprout_graphics::sprout::Backend;

/// Register the Vulkan backend with the device factory
///
/// # Example
///
/// ```no_run
/// use sprout_graphics::sprout::render::create_device;
/// use sprout_graphics::sprout::{Backend, Config};
/// # fn run(window: &winit::window::Window) -> sprout_graphics::Result<()> {
/// sprout_graphics_vulkan::register();
/// let device = create_device(window, Backend::Vulkan, &Config::default())?;
/// # Ok(())
/// # }
/// ```
pub fn register() {
    register_backend(Backend::Vulkan, |window, config| {
        let device = VulkanGraphicsDevice::new(window, config)?;
        Ok(Box::new(device) as Box<dyn GraphicsDevice>)
    });
}
