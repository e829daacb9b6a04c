/// VulkanGraphicsDevice - `GraphicsDevice` over Vulkan 1.3
///
/// Resources share the `GpuContext`; recording goes through the shared
/// `FrameState`, locked for the duration of one call.

use sprout_graphics::sprout::render::{
    validate_render_targets, Color, GraphicsDevice, NativeWindow, Renderable, RenderableInfo, Shader,
    ShaderAttachment, Texture, TextureDesc, TextureUsage, Viewport,
};
use sprout_graphics::sprout::{Backend, Config};
use sprout_graphics::{sprout_info, sprout_invariant, Result};
use std::sync::{Arc, Mutex};

use crate::vulkan_context::GpuContext;
use crate::vulkan_recorder::{lock_frame, FrameState, LoadOp};
use crate::vulkan_renderable::VulkanRenderable;
use crate::vulkan_shader::VulkanShader;
use crate::vulkan_texture::VulkanTexture;

pub struct VulkanGraphicsDevice {
    frame: Arc<Mutex<FrameState>>,
    ctx: Arc<GpuContext>,
}

impl VulkanGraphicsDevice {
    pub fn new(window: &dyn NativeWindow, config: &Config) -> Result<Self> {
        let (ctx, surface) = GpuContext::new(window, config)?;
        let ctx = Arc::new(ctx);
        let (width, height) = window.size_in_pixels();
        let frame = FrameState::new(Arc::clone(&ctx), surface, config, width, height)?;

        let (w, h) = frame.swapchain_size();
        sprout_info!(
            "sprout::vulkan",
            "Vulkan device ready on '{}' ({}x{}, vsync {})",
            ctx.device_name(),
            w,
            h,
            config.vsync
        );

        Ok(Self {
            frame: Arc::new(Mutex::new(frame)),
            ctx,
        })
    }

    /// Name of the physical device in use
    pub fn device_name(&self) -> &str {
        self.ctx.device_name()
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn backend(&self) -> Backend {
        Backend::Vulkan
    }

    fn create_shader(&mut self, attachments: &[ShaderAttachment]) -> Result<Arc<dyn Shader>> {
        let shader = VulkanShader::new(Arc::clone(&self.ctx), attachments)?;
        Ok(Arc::new(shader))
    }

    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> Result<Arc<dyn Texture>> {
        desc.validate(data)?;
        let texture: Arc<dyn Texture> = Arc::new(VulkanTexture::new(Arc::clone(&self.ctx), desc)?);

        let mut frame = lock_frame(&self.frame)?;
        match data {
            Some(bytes) => frame.upload_texture(&texture, bytes)?,
            None if desc.usage.contains(TextureUsage::SHADER) => frame.prepare_sampled(&texture)?,
            None => {}
        }
        Ok(texture)
    }

    fn create_renderable(&mut self, info: &RenderableInfo) -> Result<Box<dyn Renderable>> {
        let renderable = VulkanRenderable::new(Arc::clone(&self.ctx), Arc::clone(&self.frame), info)?;
        Ok(Box::new(renderable))
    }

    fn set_render_textures(&mut self, textures: &[Arc<dyn Texture>]) -> Result<()> {
        validate_render_targets(textures)?;
        lock_frame(&self.frame)?.set_render_targets(textures)
    }

    fn viewport(&self) -> Viewport {
        lock_frame(&self.frame).map(|f| f.viewport()).unwrap_or_default()
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(sprout_invariant!(
                "sprout::vulkan",
                "Viewport {}x{} must have a non-zero size",
                viewport.width,
                viewport.height
            ));
        }
        lock_frame(&self.frame)?.set_viewport(viewport);
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        // Nothing to clear while the surface has no area
        lock_frame(&self.frame)?.begin_rendering(LoadOp::Clear(color)).map(|_| ())
    }

    fn present(&mut self) -> Result<()> {
        lock_frame(&self.frame)?.present()
    }

    fn resize_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        lock_frame(&self.frame)?.resize(width, height)
    }

    fn swapchain_size(&self) -> (u32, u32) {
        lock_frame(&self.frame).map(|f| f.swapchain_size()).unwrap_or((0, 0))
    }

    fn wait_idle(&self) -> Result<()> {
        lock_frame(&self.frame)?.wait_idle()
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        self.ctx.wait_idle().ok();
    }
}
