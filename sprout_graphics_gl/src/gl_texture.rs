/// GlTexture - `TEXTURE_2D` or, for render-only textures, a renderbuffer

use glow::HasContext;
use sprout_graphics::sprout::render::{Sampler, Texture, TextureDesc};
use sprout_graphics::{sprout_err, sprout_invariant, sprout_trace, Result};
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;

use crate::gl_context::GlShared;
use crate::gl_convert::sampler_parameters;

#[derive(Debug, Clone, Copy)]
pub(crate) enum GlStorage {
    Texture(glow::Texture),
    Renderbuffer(glow::Renderbuffer),
}

pub struct GlTexture {
    shared: Rc<GlShared>,
    storage: GlStorage,
    desc: TextureDesc,
    sampler: Cell<Sampler>,
}

impl GlTexture {
    pub(crate) fn new(shared: Rc<GlShared>, desc: &TextureDesc, data: Option<&[u8]>) -> Result<Self> {
        desc.validate(data)?;
        let (width, height) = (desc.width as i32, desc.height as i32);

        let storage = if desc.is_render_only() {
            let renderbuffer = unsafe { shared.gl.create_renderbuffer() }
                .map_err(|e| sprout_err!("sprout::gl", "glGenRenderbuffers failed: {}", e))?;
            unsafe {
                shared.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
                shared
                    .gl
                    .renderbuffer_storage(glow::RENDERBUFFER, glow::RGBA8, width, height);
                shared.gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            }
            GlStorage::Renderbuffer(renderbuffer)
        } else {
            let texture = unsafe { shared.gl.create_texture() }
                .map_err(|e| sprout_err!("sprout::gl", "glGenTextures failed: {}", e))?;
            unsafe {
                shared.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
                shared.gl.tex_image_2d(
                    glow::TEXTURE_2D,
                    0,
                    glow::RGBA8 as i32,
                    width,
                    height,
                    0,
                    glow::RGBA,
                    glow::UNSIGNED_BYTE,
                    data,
                );
                let mip_levels = desc.mip_levels();
                shared
                    .gl
                    .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAX_LEVEL, mip_levels as i32 - 1);
                // Without data this only allocates the chain
                if mip_levels > 1 {
                    shared.gl.generate_mipmap(glow::TEXTURE_2D);
                }
            }
            GlStorage::Texture(texture)
        };

        let texture = Self {
            shared,
            storage,
            desc: *desc,
            sampler: Cell::new(Sampler::default()),
        };
        texture.write_sampler(&Sampler::default());
        if let GlStorage::Texture(_) = storage {
            unsafe { texture.shared.gl.bind_texture(glow::TEXTURE_2D, None) };
        }
        texture.shared.check_error("glTexImage2D")?;

        sprout_trace!(
            "sprout::gl",
            "Created {}x{} {} ({} mip level(s))",
            desc.width,
            desc.height,
            if desc.is_render_only() { "renderbuffer" } else { "texture" },
            desc.mip_levels()
        );
        Ok(texture)
    }

    pub(crate) fn storage(&self) -> GlStorage {
        self.storage
    }

    /// Write the sampler into the texture parameters; leaves the texture bound
    fn write_sampler(&self, sampler: &Sampler) {
        let GlStorage::Texture(texture) = self.storage else {
            return;
        };
        let gl = &self.shared.gl;
        unsafe {
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            for (parameter, value) in sampler_parameters(sampler, self.desc.mip_levels() > 1) {
                gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value);
            }
        }
    }

    pub(crate) fn from_dyn(texture: &dyn Texture) -> Result<&GlTexture> {
        texture
            .as_any()
            .downcast_ref::<GlTexture>()
            .ok_or_else(|| sprout_invariant!("sprout::gl", "Texture was not created by the OpenGL backend"))
    }
}

impl Texture for GlTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn sampler(&self) -> Sampler {
        self.sampler.get()
    }

    fn set_sampler(&self, sampler: Sampler) -> Result<()> {
        if self.sampler.get() == sampler {
            return Ok(());
        }
        self.write_sampler(&sampler);
        self.sampler.set(sampler);
        self.shared.check_error("glTexParameteri")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlTexture {
    fn drop(&mut self) {
        unsafe {
            match self.storage {
                GlStorage::Texture(texture) => self.shared.gl.delete_texture(texture),
                GlStorage::Renderbuffer(renderbuffer) => self.shared.gl.delete_renderbuffer(renderbuffer),
            }
        }
    }
}
