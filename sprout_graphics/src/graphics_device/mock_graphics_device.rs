/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Enforces the same contract checks as the real backends and records the
/// commands it receives so tests can assert on call order.

use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::backend::Backend;
use crate::error::Result;
use crate::graphics_device::{
    validate_attachments, validate_render_targets, Color, GraphicsDevice, Renderable,
    RenderableInfo, Sampler, Shader, ShaderAttachment, ShaderStage, Texture, TextureDesc,
    UniformState, Viewport,
};

// ============================================================================
// Recorded commands
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    UploadTexture { width: u32, height: u32, mips: u32 },
    SetRenderTargets(usize),
    Clear(Color),
    UpdateVertices { offset: u64, len: usize },
    UpdateIndices { offset: u64, count: usize },
    Draw(u32),
    Present,
    Resize(u32, u32),
}

pub struct MockState {
    pub commands: Vec<MockCommand>,
    pub render_targets: Vec<Arc<dyn Texture>>,
    pub viewport: Viewport,
    pub swapchain_size: (u32, u32),
    pub frames_presented: u32,
}

// ============================================================================
// Mock Shader
// ============================================================================

pub struct MockShader {
    pub stages: Vec<ShaderStage>,
}

impl Shader for MockShader {
    fn has_stage(&self, stage: ShaderStage) -> bool {
        self.stages.contains(&stage)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

pub struct MockTexture {
    pub desc: TextureDesc,
    pub data: Option<Vec<u8>>,
    sampler: Mutex<Sampler>,
}

impl MockTexture {
    pub fn new(desc: TextureDesc, data: Option<Vec<u8>>) -> Self {
        Self {
            desc,
            data,
            sampler: Mutex::new(Sampler::default()),
        }
    }
}

impl Texture for MockTexture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn sampler(&self) -> Sampler {
        *self.sampler.lock().unwrap()
    }

    fn set_sampler(&self, sampler: Sampler) -> Result<()> {
        *self.sampler.lock().unwrap() = sampler;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Mock Renderable
// ============================================================================

pub struct MockRenderable {
    info: RenderableInfo,
    state: Arc<Mutex<MockState>>,
    pub vertices: Vec<u8>,
    pub indices: Vec<u32>,
    pub uniforms: UniformState,
}

impl Renderable for MockRenderable {
    fn info(&self) -> &RenderableInfo {
        &self.info
    }

    fn update_vertices(&mut self, offset_in_vertices: u32, data: &[u8]) -> Result<()> {
        let offset = self.info.check_vertex_write(offset_in_vertices, data.len())?;
        let start = offset as usize;
        self.vertices[start..start + data.len()].copy_from_slice(data);
        self.state.lock().unwrap().commands.push(MockCommand::UpdateVertices {
            offset,
            len: data.len(),
        });
        Ok(())
    }

    fn update_indices(&mut self, offset_in_indices: u32, indices: &[u32]) -> Result<()> {
        let offset = self.info.check_index_write(offset_in_indices, indices.len())?;
        let start = offset_in_indices as usize;
        self.indices[start..start + indices.len()].copy_from_slice(indices);
        self.state.lock().unwrap().commands.push(MockCommand::UpdateIndices {
            offset,
            count: indices.len(),
        });
        Ok(())
    }

    fn push_uniform_data(&mut self, slot: u32, byte_offset: u32, data: &[u8]) -> Result<()> {
        self.uniforms.write_constant(slot, byte_offset, data)
    }

    fn push_texture(&mut self, slot: u32, texture: &Arc<dyn Texture>) -> Result<()> {
        self.uniforms.bind_texture(slot, texture)
    }

    fn draw_count(&mut self, count: u32) -> Result<()> {
        self.info.check_draw_count(count)?;
        let mut state = self.state.lock().unwrap();
        self.uniforms.validate_for_draw(&state.render_targets)?;
        self.uniforms.mark_clean();
        state.commands.push(MockCommand::Draw(count));
        Ok(())
    }
}

// ============================================================================
// Mock GraphicsDevice
// ============================================================================

pub struct MockGraphicsDevice {
    pub state: Arc<Mutex<MockState>>,
    backend: Backend,
}

impl MockGraphicsDevice {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                commands: Vec::new(),
                render_targets: Vec::new(),
                viewport: Viewport::full(width, height),
                swapchain_size: (width, height),
                frames_presented: 0,
            })),
            backend: Backend::Unknown,
        }
    }

    /// Report `backend` from `GraphicsDevice::backend` (factory tests)
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn commands(&self) -> Vec<MockCommand> {
        self.state.lock().unwrap().commands.clone()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn create_shader(&mut self, attachments: &[ShaderAttachment]) -> Result<Arc<dyn Shader>> {
        validate_attachments(attachments)?;
        Ok(Arc::new(MockShader {
            stages: attachments.iter().map(|a| a.stage).collect(),
        }))
    }

    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> Result<Arc<dyn Texture>> {
        desc.validate(data)?;
        if data.is_some() {
            self.state.lock().unwrap().commands.push(MockCommand::UploadTexture {
                width: desc.width,
                height: desc.height,
                mips: desc.mip_levels(),
            });
        }
        Ok(Arc::new(MockTexture::new(*desc, data.map(|d| d.to_vec()))))
    }

    fn create_renderable(&mut self, info: &RenderableInfo) -> Result<Box<dyn Renderable>> {
        info.validate()?;
        Ok(Box::new(MockRenderable {
            info: info.clone(),
            state: Arc::clone(&self.state),
            vertices: vec![0; info.vertex_buffer_size() as usize],
            indices: vec![0; info.num_indices as usize],
            uniforms: UniformState::new(&info.uniforms),
        }))
    }

    fn set_render_textures(&mut self, textures: &[Arc<dyn Texture>]) -> Result<()> {
        let size = validate_render_targets(textures)?;
        let mut state = self.state.lock().unwrap();
        let (width, height) = size.unwrap_or(state.swapchain_size);
        state.render_targets = textures.to_vec();
        state.viewport = Viewport::full(width, height);
        state.commands.push(MockCommand::SetRenderTargets(textures.len()));
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        self.state.lock().unwrap().viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.state.lock().unwrap().viewport = viewport;
        Ok(())
    }

    fn clear(&mut self, color: Color) -> Result<()> {
        self.state.lock().unwrap().commands.push(MockCommand::Clear(color));
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.commands.push(MockCommand::Present);
        state.frames_presented += 1;
        Ok(())
    }

    fn resize_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.swapchain_size = (width, height);
        if state.render_targets.is_empty() {
            state.viewport = Viewport::full(width, height);
        }
        state.commands.push(MockCommand::Resize(width, height));
        Ok(())
    }

    fn swapchain_size(&self) -> (u32, u32) {
        self.state.lock().unwrap().swapchain_size
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
