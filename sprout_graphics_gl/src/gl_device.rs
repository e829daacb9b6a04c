/// GlGraphicsDevice - `GraphicsDevice` over an OpenGL 3.3 core context
///
/// Commands execute immediately on the window's context. Off-screen
/// targets share one framebuffer object that is re-attached on every
/// `set_render_textures`.

use glow::HasContext;
use sprout_graphics::sprout::render::{
    validate_render_targets, Color, GraphicsDevice, NativeWindow, Renderable, RenderableInfo, Shader,
    ShaderAttachment, Texture, TextureDesc, Viewport,
};
use sprout_graphics::sprout::{Backend, Config};
use sprout_graphics::{sprout_debug, sprout_err, sprout_info, sprout_invariant, sprout_native_err, sprout_warn};
use sprout_graphics::{Error, Result};
use std::rc::Rc;
use std::sync::Arc;

use crate::gl_context::GlShared;
use crate::gl_renderable::GlRenderable;
use crate::gl_shader::GlShader;
use crate::gl_texture::{GlStorage, GlTexture};

pub struct GlGraphicsDevice {
    shared: Rc<GlShared>,
    framebuffer: glow::Framebuffer,
    /// Color attachments currently set on `framebuffer`
    attached: u32,
}

impl GlGraphicsDevice {
    /// Create a device on the window's GL context, which must be current
    pub fn new(window: &dyn NativeWindow, config: &Config) -> Result<Self> {
        let context = window
            .gl_context()
            .ok_or_else(|| Error::InitializationFailed("Window does not provide an OpenGL context".to_string()))?;

        if let Err(e) = context.set_swap_interval(config.vsync) {
            sprout_warn!("sprout::gl", "Could not set swap interval (vsync {}): {}", config.vsync, e);
        }
        if config.enable_validation {
            sprout_debug!("sprout::gl", "GL errors are checked after every call that can fail");
        }

        let shared = Rc::new(GlShared::load(context, window.size_in_pixels())?);
        let framebuffer = unsafe { shared.gl.create_framebuffer() }
            .map_err(|e| Error::InitializationFailed(format!("glGenFramebuffers failed: {}", e)))?;

        unsafe {
            shared.gl.disable(glow::DEPTH_TEST);
            shared.gl.disable(glow::CULL_FACE);
            shared.gl.disable(glow::SCISSOR_TEST);
            shared.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 4);
        }
        shared.apply_viewport();

        let (width, height) = shared.state().window_size;
        sprout_info!(
            "sprout::gl",
            "OpenGL device ready ({}x{}, vsync {})",
            width,
            height,
            config.vsync
        );

        Ok(Self {
            shared,
            framebuffer,
            attached: 0,
        })
    }

    fn attach_targets(&mut self, textures: &[Arc<dyn Texture>]) -> Result<()> {
        let gl = &self.shared.gl;
        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(self.framebuffer));

            let mut draw_buffers = Vec::with_capacity(textures.len());
            for (index, texture) in textures.iter().enumerate() {
                let attachment = glow::COLOR_ATTACHMENT0 + index as u32;
                match GlTexture::from_dyn(texture.as_ref())?.storage() {
                    GlStorage::Texture(native) => {
                        gl.framebuffer_texture_2d(glow::FRAMEBUFFER, attachment, glow::TEXTURE_2D, Some(native), 0)
                    }
                    GlStorage::Renderbuffer(native) => {
                        gl.framebuffer_renderbuffer(glow::FRAMEBUFFER, attachment, glow::RENDERBUFFER, Some(native))
                    }
                }
                draw_buffers.push(attachment);
            }
            for index in textures.len() as u32..self.attached {
                gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    glow::COLOR_ATTACHMENT0 + index,
                    glow::TEXTURE_2D,
                    None,
                    0,
                );
            }
            self.attached = textures.len() as u32;
            gl.draw_buffers(&draw_buffers);

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                return Err(sprout_native_err!("sprout::gl", "glCheckFramebufferStatus", status as i32));
            }
        }
        Ok(())
    }
}

impl GraphicsDevice for GlGraphicsDevice {
    fn backend(&self) -> Backend {
        Backend::OpenGL
    }

    fn create_shader(&mut self, attachments: &[ShaderAttachment]) -> Result<Arc<dyn Shader>> {
        let shader = GlShader::new(Rc::clone(&self.shared), attachments)?;
        Ok(Arc::new(shader))
    }

    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> Result<Arc<dyn Texture>> {
        let texture = GlTexture::new(Rc::clone(&self.shared), desc, data)?;
        Ok(Arc::new(texture))
    }

    fn create_renderable(&mut self, info: &RenderableInfo) -> Result<Box<dyn Renderable>> {
        let renderable = GlRenderable::new(Rc::clone(&self.shared), info)?;
        Ok(Box::new(renderable))
    }

    fn set_render_textures(&mut self, textures: &[Arc<dyn Texture>]) -> Result<()> {
        let size = validate_render_targets(textures)?;
        let target_size = match size {
            Some(size) => {
                self.attach_targets(textures)?;
                size
            }
            None => {
                unsafe { self.shared.gl.bind_framebuffer(glow::FRAMEBUFFER, None) };
                self.shared.state().window_size
            }
        };

        {
            let mut state = self.shared.state_mut();
            state.targets = textures.to_vec();
            state.target_size = target_size;
            state.viewport = Viewport::full(target_size.0, target_size.1);
        }
        self.shared.apply_viewport();
        self.shared.check_error("glBindFramebuffer")
    }

    fn viewport(&self) -> Viewport {
        self.shared.state().viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(sprout_invariant!(
                "sprout::gl",
                "Viewport {}x{} must have a non-zero size",
                viewport.width,
                viewport.height
            ));
        }
        self.shared.state_mut().viewport = viewport;
        self.shared.apply_viewport();
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        let gl = &self.shared.gl;
        unsafe {
            gl.color_mask(true, true, true, true);
            gl.clear_color(color.r, color.g, color.b, color.a);
            gl.clear(glow::COLOR_BUFFER_BIT);
        }
        self.shared.check_error("glClear")
    }

    fn present(&mut self) -> Result<()> {
        self.shared
            .window_context()
            .swap_buffers()
            .map_err(|e| sprout_err!("sprout::gl", "swap_buffers failed: {}", e))
    }

    fn resize_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        let onscreen = {
            let mut state = self.shared.state_mut();
            state.window_size = (width, height);
            if !state.offscreen() {
                state.target_size = (width, height);
                state.viewport = Viewport::full(width, height);
            }
            !state.offscreen()
        };
        if onscreen {
            self.shared.apply_viewport();
        }
        sprout_debug!("sprout::gl", "Default framebuffer resized to {}x{}", width, height);
        Ok(())
    }

    fn swapchain_size(&self) -> (u32, u32) {
        self.shared.state().window_size
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe { self.shared.gl.finish() };
        Ok(())
    }
}

impl Drop for GlGraphicsDevice {
    fn drop(&mut self) {
        unsafe {
            self.shared.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            self.shared.gl.delete_framebuffer(self.framebuffer);
        }
        self.shared.state_mut().targets.clear();
    }
}
