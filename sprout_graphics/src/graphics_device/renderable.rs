/// Renderable trait: vertex/index buffers, uniform slots, blend state, draw

use std::fmt;
use std::sync::Arc;

use bytemuck::Pod;

use crate::error::Result;
use crate::graphics_device::{BlendMode, Shader, Texture};

/// Highest slot number usable by a uniform
///
/// Texture slot N and its sampler share binding N and N + 16 in the SPIR-V
/// path, so slots stay below 16.
pub const MAX_UNIFORM_SLOTS: u32 = 16;

// ===== VERTEX INPUT =====

/// Vertex attribute component layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Float,
    Float2,
    Float3,
    Float4,
}

impl AttributeType {
    pub fn size(self) -> u32 {
        self.components() * 4
    }

    pub fn components(self) -> u32 {
        match self {
            AttributeType::Float => 1,
            AttributeType::Float2 => 2,
            AttributeType::Float3 => 3,
            AttributeType::Float4 => 4,
        }
    }
}

/// One attribute inside the interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input location
    pub location: u32,
    pub attribute_type: AttributeType,
    /// Byte offset inside the vertex
    pub offset: u32,
}

impl VertexAttribute {
    pub fn new(location: u32, attribute_type: AttributeType, offset: u32) -> Self {
        Self { location, attribute_type, offset }
    }
}

// ===== UNIFORMS =====

/// Kind of resource bound at a uniform slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// Constant buffer of `size` bytes (multiple of 16)
    ConstantBuffer { size: u32 },
    /// Texture plus its sampler
    Texture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Uniform {
    pub slot: u32,
    pub uniform_type: UniformType,
}

impl Uniform {
    pub fn constant_buffer(slot: u32, size: u32) -> Self {
        Self {
            slot,
            uniform_type: UniformType::ConstantBuffer { size },
        }
    }

    pub fn texture(slot: u32) -> Self {
        Self {
            slot,
            uniform_type: UniformType::Texture,
        }
    }
}

// ===== RENDERABLE INFO =====

/// Descriptor for creating a renderable
#[derive(Clone)]
pub struct RenderableInfo {
    pub num_vertices: u32,
    /// Stride of one vertex in bytes
    pub vertex_size: u32,
    pub num_indices: u32,
    pub vertex_input: Vec<VertexAttribute>,
    pub shader: Arc<dyn Shader>,
    pub uniforms: Vec<Uniform>,
    pub blend_mode: BlendMode,
    /// Buffers are rewritten often (every frame)
    pub dynamic: bool,
}

impl fmt::Debug for RenderableInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderableInfo")
            .field("num_vertices", &self.num_vertices)
            .field("vertex_size", &self.vertex_size)
            .field("num_indices", &self.num_indices)
            .field("vertex_input", &self.vertex_input)
            .field("uniforms", &self.uniforms)
            .field("blend_mode", &self.blend_mode)
            .field("dynamic", &self.dynamic)
            .finish_non_exhaustive()
    }
}

impl RenderableInfo {
    /// Empty renderable using `shader`; fill in the public fields
    pub fn new(shader: Arc<dyn Shader>) -> Self {
        Self {
            num_vertices: 0,
            vertex_size: 0,
            num_indices: 0,
            vertex_input: Vec::new(),
            shader,
            uniforms: Vec::new(),
            blend_mode: BlendMode::DISABLED,
            dynamic: false,
        }
    }

    pub fn vertex_buffer_size(&self) -> u64 {
        self.num_vertices as u64 * self.vertex_size as u64
    }

    pub fn index_buffer_size(&self) -> u64 {
        self.num_indices as u64 * 4
    }

    pub fn uniform(&self, slot: u32) -> Option<&Uniform> {
        self.uniforms.iter().find(|u| u.slot == slot)
    }

    /// Number of elements `draw()` issues
    pub fn default_draw_count(&self) -> u32 {
        if self.num_indices > 0 {
            self.num_indices
        } else {
            self.num_vertices
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_indices > 0 && self.num_vertices == 0 {
            return Err(crate::sprout_invariant!(
                "sprout::renderable",
                "{} indices declared without a vertex buffer",
                self.num_indices
            ));
        }

        if self.num_vertices > 0 && self.vertex_size == 0 {
            return Err(crate::sprout_invariant!(
                "sprout::renderable",
                "{} vertices declared with a zero vertex size",
                self.num_vertices
            ));
        }

        for (i, attribute) in self.vertex_input.iter().enumerate() {
            let end = attribute.offset as u64 + attribute.attribute_type.size() as u64;
            if end > self.vertex_size as u64 {
                return Err(crate::sprout_invariant!(
                    "sprout::renderable",
                    "Attribute at location {} ends at byte {}, past the {}-byte vertex",
                    attribute.location,
                    end,
                    self.vertex_size
                ));
            }
            if self.vertex_input[..i].iter().any(|a| a.location == attribute.location) {
                return Err(crate::sprout_invariant!(
                    "sprout::renderable",
                    "Attribute location {} is declared twice",
                    attribute.location
                ));
            }
        }

        for (i, uniform) in self.uniforms.iter().enumerate() {
            if uniform.slot >= MAX_UNIFORM_SLOTS {
                return Err(crate::sprout_invariant!(
                    "sprout::renderable",
                    "Uniform slot {} is out of range (max {})",
                    uniform.slot,
                    MAX_UNIFORM_SLOTS - 1
                ));
            }
            if self.uniforms[..i].iter().any(|u| u.slot == uniform.slot) {
                return Err(crate::sprout_invariant!(
                    "sprout::renderable",
                    "Uniform slot {} is declared twice",
                    uniform.slot
                ));
            }
            if let UniformType::ConstantBuffer { size } = uniform.uniform_type {
                if size == 0 || size % 16 != 0 {
                    return Err(crate::sprout_invariant!(
                        "sprout::renderable",
                        "Constant buffer at slot {} has size {}, expected a non-zero multiple of 16",
                        uniform.slot,
                        size
                    ));
                }
            }
        }

        Ok(())
    }

    /// Check an `update_vertices` call, returning the byte offset
    pub fn check_vertex_write(&self, offset_in_vertices: u32, byte_len: usize) -> Result<u64> {
        if self.num_vertices == 0 {
            return Err(crate::sprout_invariant!(
                "sprout::renderable",
                "Renderable has no vertex buffer"
            ));
        }
        if byte_len % self.vertex_size as usize != 0 {
            return Err(crate::sprout_invariant!(
                "sprout::renderable",
                "Vertex data of {} bytes is not a multiple of the {}-byte vertex",
                byte_len,
                self.vertex_size
            ));
        }
        let count = (byte_len / self.vertex_size as usize) as u64;
        if offset_in_vertices as u64 + count > self.num_vertices as u64 {
            return Err(crate::sprout_invariant!(
                "sprout::renderable",
                "Writing {} vertices at {} overflows the {}-vertex buffer",
                count,
                offset_in_vertices,
                self.num_vertices
            ));
        }
        Ok(offset_in_vertices as u64 * self.vertex_size as u64)
    }

    /// Check an `update_indices` call, returning the byte offset
    pub fn check_index_write(&self, offset_in_indices: u32, count: usize) -> Result<u64> {
        if self.num_indices == 0 {
            return Err(crate::sprout_invariant!(
                "sprout::renderable",
                "Renderable has no index buffer"
            ));
        }
        if offset_in_indices as u64 + count as u64 > self.num_indices as u64 {
            return Err(crate::sprout_invariant!(
                "sprout::renderable",
                "Writing {} indices at {} overflows the {}-index buffer",
                count,
                offset_in_indices,
                self.num_indices
            ));
        }
        Ok(offset_in_indices as u64 * 4)
    }

    /// Check a draw count against the bound buffers
    ///
    /// A renderable without buffers draws any count (vertex-id driven
    /// geometry such as a fullscreen triangle).
    pub fn check_draw_count(&self, count: u32) -> Result<()> {
        let limit = if self.num_indices > 0 {
            Some(("index", self.num_indices))
        } else if self.num_vertices > 0 {
            Some(("vertex", self.num_vertices))
        } else {
            None
        };

        match limit {
            Some((kind, available)) if count > available => Err(crate::sprout_invariant!(
                "sprout::renderable",
                "Draw of {} exceeds the {}-element {} buffer",
                count,
                available,
                kind
            )),
            _ => Ok(()),
        }
    }
}

// ===== RENDERABLE TRAIT =====

/// Drawable batch created by `GraphicsDevice::create_renderable`
///
/// Every operation may be called once per frame per renderable; writes are
/// visible to the next draw in call order.
pub trait Renderable {
    fn info(&self) -> &RenderableInfo;

    /// Overwrite vertices starting at `offset_in_vertices`
    fn update_vertices(&mut self, offset_in_vertices: u32, data: &[u8]) -> Result<()>;

    /// Overwrite indices starting at `offset_in_indices`
    fn update_indices(&mut self, offset_in_indices: u32, indices: &[u32]) -> Result<()>;

    /// Write `data` into the constant buffer at `slot`
    fn push_uniform_data(&mut self, slot: u32, byte_offset: u32, data: &[u8]) -> Result<()>;

    /// Bind `texture` at texture slot `slot`
    fn push_texture(&mut self, slot: u32, texture: &Arc<dyn Texture>) -> Result<()>;

    /// Draw every index, or every vertex when there is no index buffer
    fn draw(&mut self) -> Result<()> {
        let count = self.info().default_draw_count();
        self.draw_count(count)
    }

    fn draw_count(&mut self, count: u32) -> Result<()>;
}

impl dyn Renderable {
    /// Typed form of [`Renderable::update_vertices`]
    pub fn update_vertices_pod<T: Pod>(&mut self, offset_in_vertices: u32, vertices: &[T]) -> Result<()> {
        self.update_vertices(offset_in_vertices, bytemuck::cast_slice(vertices))
    }

    /// Typed form of [`Renderable::push_uniform_data`]
    pub fn push_uniform_pod<T: Pod>(&mut self, slot: u32, byte_offset: u32, value: &T) -> Result<()> {
        self.push_uniform_data(slot, byte_offset, bytemuck::bytes_of(value))
    }
}

#[cfg(test)]
#[path = "renderable_tests.rs"]
mod tests;
