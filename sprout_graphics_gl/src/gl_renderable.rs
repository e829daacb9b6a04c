/// GlRenderable - vertex array, buffers and uniform blocks of one renderable
///
/// Constant buffers live in a CPU shadow (`UniformState`) and reach their
/// uniform buffer objects at draw time when dirty.

use glow::HasContext;
use sprout_graphics::sprout::render::{BlendMode, Renderable, RenderableInfo, Texture, UniformState};
use sprout_graphics::{sprout_err, sprout_trace, Result};
use std::rc::Rc;
use std::sync::Arc;

use crate::gl_context::GlShared;
use crate::gl_convert::{attribute_size, blend_factor_to_gl, blend_op_to_gl};
use crate::gl_shader::{check_uniforms, GlShader};
use crate::gl_texture::{GlStorage, GlTexture};

pub struct GlRenderable {
    shared: Rc<GlShared>,
    info: RenderableInfo,
    uniforms: UniformState,
    vertex_array: glow::VertexArray,
    vertex_buffer: Option<glow::Buffer>,
    index_buffer: Option<glow::Buffer>,
    uniform_buffers: Vec<(u32, glow::Buffer)>,
}

impl GlRenderable {
    pub(crate) fn new(shared: Rc<GlShared>, info: &RenderableInfo) -> Result<Self> {
        info.validate()?;
        let shader = GlShader::from_dyn(info.shader.as_ref())?;
        check_uniforms(shader.blocks(), &shader.texture_slots(), &info.uniforms)?;

        let vertex_array = unsafe { shared.gl.create_vertex_array() }
            .map_err(|e| sprout_err!("sprout::gl", "glGenVertexArrays failed: {}", e))?;

        // Drop releases whatever has been created from here on
        let mut renderable = Self {
            shared,
            info: info.clone(),
            uniforms: UniformState::new(&info.uniforms),
            vertex_array,
            vertex_buffer: None,
            index_buffer: None,
            uniform_buffers: Vec::new(),
        };
        renderable.create_buffers()?;

        sprout_trace!(
            "sprout::gl",
            "Created renderable: {} vertices x {} bytes, {} indices, {} uniform(s)",
            info.num_vertices,
            info.vertex_size,
            info.num_indices,
            info.uniforms.len()
        );
        Ok(renderable)
    }

    fn create_buffers(&mut self) -> Result<()> {
        let usage = if self.info.dynamic {
            glow::DYNAMIC_DRAW
        } else {
            glow::STATIC_DRAW
        };
        let gl = &self.shared.gl;

        unsafe {
            gl.bind_vertex_array(Some(self.vertex_array));

            if self.info.num_vertices > 0 {
                let buffer = create_buffer(gl)?;
                self.vertex_buffer = Some(buffer);
                gl.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
                let zeros = vec![0u8; self.info.vertex_buffer_size() as usize];
                gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, &zeros, usage);

                let stride = self.info.vertex_size as i32;
                for attribute in &self.info.vertex_input {
                    gl.enable_vertex_attrib_array(attribute.location);
                    gl.vertex_attrib_pointer_f32(
                        attribute.location,
                        attribute_size(attribute.attribute_type),
                        glow::FLOAT,
                        false,
                        stride,
                        attribute.offset as i32,
                    );
                }
            }

            // The element binding is vertex array state
            if self.info.num_indices > 0 {
                let buffer = create_buffer(gl)?;
                self.index_buffer = Some(buffer);
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
                let zeros = vec![0u8; self.info.index_buffer_size() as usize];
                gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, &zeros, usage);
            }

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            for (slot, shadow) in self.uniforms.constant_buffers() {
                let buffer = create_buffer(gl)?;
                self.uniform_buffers.push((slot, buffer));
                gl.bind_buffer(glow::UNIFORM_BUFFER, Some(buffer));
                gl.buffer_data_u8_slice(glow::UNIFORM_BUFFER, shadow, glow::DYNAMIC_DRAW);
            }
            gl.bind_buffer(glow::UNIFORM_BUFFER, None);
        }
        self.uniforms.mark_clean();
        self.shared.check_error("glBufferData")
    }

    /// Write `bytes` at `byte_offset` through the copy-write target
    ///
    /// Binding `ELEMENT_ARRAY_BUFFER` here would change whichever vertex
    /// array is bound, so updates never use the draw targets.
    fn write_buffer(&self, buffer: glow::Buffer, byte_offset: u64, bytes: &[u8]) -> Result<()> {
        let gl = &self.shared.gl;
        unsafe {
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            gl.buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, byte_offset as i32, bytes);
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
        }
        self.shared.check_error("glBufferSubData")
    }

    fn apply_blend(&self, mode: &BlendMode) {
        let gl = &self.shared.gl;
        unsafe {
            if !mode.enabled {
                gl.disable(glow::BLEND);
                return;
            }
            gl.enable(glow::BLEND);
            gl.blend_func_separate(
                blend_factor_to_gl(mode.src),
                blend_factor_to_gl(mode.dest),
                blend_factor_to_gl(mode.src_alpha),
                blend_factor_to_gl(mode.dest_alpha),
            );
            gl.blend_equation_separate(blend_op_to_gl(mode.op), blend_op_to_gl(mode.op_alpha));
        }
    }
}

fn create_buffer(gl: &glow::Context) -> Result<glow::Buffer> {
    unsafe { gl.create_buffer() }.map_err(|e| sprout_err!("sprout::gl", "glGenBuffers failed: {}", e))
}

impl Renderable for GlRenderable {
    fn info(&self) -> &RenderableInfo {
        &self.info
    }

    fn update_vertices(&mut self, offset_in_vertices: u32, data: &[u8]) -> Result<()> {
        let byte_offset = self.info.check_vertex_write(offset_in_vertices, data.len())?;
        match self.vertex_buffer {
            Some(buffer) if !data.is_empty() => self.write_buffer(buffer, byte_offset, data),
            _ => Ok(()),
        }
    }

    fn update_indices(&mut self, offset_in_indices: u32, indices: &[u32]) -> Result<()> {
        let byte_offset = self.info.check_index_write(offset_in_indices, indices.len())?;
        match self.index_buffer {
            Some(buffer) if !indices.is_empty() => {
                self.write_buffer(buffer, byte_offset, bytemuck::cast_slice(indices))
            }
            _ => Ok(()),
        }
    }

    fn push_uniform_data(&mut self, slot: u32, byte_offset: u32, data: &[u8]) -> Result<()> {
        self.uniforms.write_constant(slot, byte_offset, data)
    }

    fn push_texture(&mut self, slot: u32, texture: &Arc<dyn Texture>) -> Result<()> {
        GlTexture::from_dyn(texture.as_ref())?;
        self.uniforms.bind_texture(slot, texture)
    }

    fn draw_count(&mut self, count: u32) -> Result<()> {
        let flip_y = {
            let state = self.shared.state();
            self.uniforms.validate_for_draw(&state.targets)?;
            state.flip_y()
        };
        self.info.check_draw_count(count)?;
        if count == 0 {
            return Ok(());
        }

        for (slot, shadow) in self.uniforms.dirty_constant_buffers() {
            if let Some((_, buffer)) = self.uniform_buffers.iter().find(|(s, _)| *s == slot) {
                self.write_buffer(*buffer, 0, shadow)?;
            }
        }

        let shader = GlShader::from_dyn(self.info.shader.as_ref())?;
        shader.bind(flip_y, self.uniforms.textures().map(|(slot, unit, _)| (slot, unit)));

        let gl = &self.shared.gl;
        unsafe {
            for (slot, buffer) in &self.uniform_buffers {
                gl.bind_buffer_base(glow::UNIFORM_BUFFER, *slot, Some(*buffer));
            }
            for (_, unit, texture) in self.uniforms.textures() {
                if let GlStorage::Texture(native) = GlTexture::from_dyn(texture.as_ref())?.storage() {
                    gl.active_texture(glow::TEXTURE0 + unit);
                    gl.bind_texture(glow::TEXTURE_2D, Some(native));
                }
            }
        }
        self.apply_blend(&self.info.blend_mode);

        unsafe {
            gl.bind_vertex_array(Some(self.vertex_array));
            if self.info.num_indices > 0 {
                gl.draw_elements(glow::TRIANGLES, count as i32, glow::UNSIGNED_INT, 0);
            } else {
                gl.draw_arrays(glow::TRIANGLES, 0, count as i32);
            }
            gl.bind_vertex_array(None);
        }

        self.uniforms.mark_clean();
        self.shared.check_error(if self.info.num_indices > 0 {
            "glDrawElements"
        } else {
            "glDrawArrays"
        })
    }
}

impl Drop for GlRenderable {
    fn drop(&mut self) {
        let gl = &self.shared.gl;
        unsafe {
            for (_, buffer) in self.uniform_buffers.drain(..) {
                gl.delete_buffer(buffer);
            }
            if let Some(buffer) = self.index_buffer.take() {
                gl.delete_buffer(buffer);
            }
            if let Some(buffer) = self.vertex_buffer.take() {
                gl.delete_buffer(buffer);
            }
            gl.delete_vertex_array(self.vertex_array);
        }
    }
}
