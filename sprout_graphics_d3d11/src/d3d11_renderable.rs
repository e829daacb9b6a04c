/// D3D11Renderable - vertex, index and constant buffers plus a blend state
///
/// Dynamic geometry lives in `USAGE_DYNAMIC` buffers rewritten whole with
/// `WRITE_DISCARD` from a CPU shadow. Static geometry uses
/// `UpdateSubresource` on the written range.

use sprout_graphics::sprout::render::{Renderable, RenderableInfo, Texture, UniformState};
use sprout_graphics::{sprout_invariant, sprout_trace, Error, Result};
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::Arc;
use windows::Win32::Graphics::Direct3D::D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11BlendState, ID3D11Buffer, D3D11_BIND_CONSTANT_BUFFER, D3D11_BIND_FLAG, D3D11_BIND_INDEX_BUFFER,
    D3D11_BIND_VERTEX_BUFFER, D3D11_BOX, D3D11_BUFFER_DESC, D3D11_CPU_ACCESS_WRITE, D3D11_MAPPED_SUBRESOURCE,
    D3D11_MAP_WRITE_DISCARD, D3D11_SUBRESOURCE_DATA, D3D11_USAGE_DEFAULT, D3D11_USAGE_DYNAMIC,
};
use windows::Win32::Graphics::Dxgi::Common::DXGI_FORMAT_R32_UINT;

use crate::d3d11_bindings::check_resources;
use crate::d3d11_context::{hresult_err, D3D11Shared};
use crate::d3d11_convert::blend_desc;
use crate::d3d11_shader::D3D11Shader;
use crate::d3d11_texture::D3D11Texture;

/// GPU buffer, with a CPU copy when it is rewritten through `Map`
struct GeometryBuffer {
    buffer: ID3D11Buffer,
    shadow: Option<Vec<u8>>,
}

pub struct D3D11Renderable {
    shared: Rc<D3D11Shared>,
    info: RenderableInfo,
    uniforms: UniformState,
    vertex_buffer: Option<GeometryBuffer>,
    index_buffer: Option<GeometryBuffer>,
    constant_buffers: Vec<(u32, ID3D11Buffer)>,
    blend_state: ID3D11BlendState,
}

impl D3D11Renderable {
    pub(crate) fn new(shared: Rc<D3D11Shared>, info: &RenderableInfo) -> Result<Self> {
        info.validate()?;
        let shader = D3D11Shader::from_dyn(info.shader.as_ref())?;
        check_resources(shader.resources(), &info.uniforms)?;
        // Surfaces a location without a matching input before the first draw
        shader.input_layout(&info.vertex_input)?;

        let vertex_buffer = if info.num_vertices > 0 {
            Some(create_geometry_buffer(
                &shared,
                info.vertex_buffer_size(),
                D3D11_BIND_VERTEX_BUFFER,
                info.dynamic,
            )?)
        } else {
            None
        };
        let index_buffer = if info.num_indices > 0 {
            Some(create_geometry_buffer(
                &shared,
                info.index_buffer_size(),
                D3D11_BIND_INDEX_BUFFER,
                info.dynamic,
            )?)
        } else {
            None
        };

        let mut uniforms = UniformState::new(&info.uniforms);
        let mut constant_buffers = Vec::new();
        for (slot, shadow) in uniforms.constant_buffers() {
            let desc = D3D11_BUFFER_DESC {
                ByteWidth: shadow.len() as u32,
                Usage: D3D11_USAGE_DEFAULT,
                BindFlags: D3D11_BIND_CONSTANT_BUFFER.0 as u32,
                ..Default::default()
            };
            constant_buffers.push((slot, create_buffer(&shared, &desc, shadow)?));
        }
        uniforms.mark_clean();

        let mut blend_state = None;
        unsafe { shared.device.CreateBlendState(&blend_desc(&info.blend_mode), Some(&mut blend_state)) }
            .map_err(|e| hresult_err("CreateBlendState", &e))?;
        let blend_state =
            blend_state.ok_or_else(|| Error::BackendError("CreateBlendState returned no object".to_string()))?;

        sprout_trace!(
            "sprout::d3d11",
            "Created renderable: {} vertices x {} bytes, {} indices, {} uniform(s), dynamic {}",
            info.num_vertices,
            info.vertex_size,
            info.num_indices,
            info.uniforms.len(),
            info.dynamic
        );

        Ok(Self {
            shared,
            info: info.clone(),
            uniforms,
            vertex_buffer,
            index_buffer,
            constant_buffers,
            blend_state,
        })
    }

    fn write_geometry(shared: &D3D11Shared, target: &mut GeometryBuffer, byte_offset: u64, bytes: &[u8]) -> Result<()> {
        let start = byte_offset as usize;
        match &mut target.shadow {
            Some(shadow) => {
                shadow[start..start + bytes.len()].copy_from_slice(bytes);
                let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
                unsafe {
                    shared
                        .context
                        .Map(&target.buffer, 0, D3D11_MAP_WRITE_DISCARD, 0, Some(&mut mapped))
                        .map_err(|e| hresult_err("ID3D11DeviceContext::Map", &e))?;
                    std::ptr::copy_nonoverlapping(shadow.as_ptr(), mapped.pData as *mut u8, shadow.len());
                    shared.context.Unmap(&target.buffer, 0);
                }
            }
            None => {
                let region = D3D11_BOX {
                    left: start as u32,
                    top: 0,
                    front: 0,
                    right: (start + bytes.len()) as u32,
                    bottom: 1,
                    back: 1,
                };
                unsafe {
                    shared.context.UpdateSubresource(
                        &target.buffer,
                        0,
                        Some(&region),
                        bytes.as_ptr() as *const c_void,
                        0,
                        0,
                    )
                };
            }
        }
        Ok(())
    }

    fn bind_pipeline(&self) -> Result<()> {
        let shader = D3D11Shader::from_dyn(self.info.shader.as_ref())?;
        let layout = shader.input_layout(&self.info.vertex_input)?;
        let context = &self.shared.context;

        unsafe {
            shader.bind();
            context.IASetInputLayout(layout.as_ref());
            context.IASetPrimitiveTopology(D3D11_PRIMITIVE_TOPOLOGY_TRIANGLELIST);

            let vertex_buffer = self.vertex_buffer.as_ref().map(|b| b.buffer.clone());
            let stride = self.info.vertex_size;
            let offset = 0u32;
            context.IASetVertexBuffers(0, 1, Some(&vertex_buffer), Some(&stride), Some(&offset));
            context.IASetIndexBuffer(
                self.index_buffer.as_ref().map(|b| &b.buffer),
                DXGI_FORMAT_R32_UINT,
                0,
            );

            for (slot, buffer) in &self.constant_buffers {
                let buffers = [Some(buffer.clone())];
                context.VSSetConstantBuffers(*slot, Some(&buffers));
                context.PSSetConstantBuffers(*slot, Some(&buffers));
            }

            for (slot, _, texture) in self.uniforms.textures() {
                let texture = D3D11Texture::from_dyn(texture.as_ref())?;
                let view = texture.shader_view().cloned().ok_or_else(|| {
                    sprout_invariant!("sprout::d3d11", "Texture at slot {} has no shader resource view", slot)
                })?;
                context.PSSetShaderResources(*slot, Some(&[Some(view)]));
                context.PSSetSamplers(*slot, Some(&[Some(texture.sampler_state()?)]));
            }

            context.OMSetBlendState(&self.blend_state, None, u32::MAX);
        }
        Ok(())
    }
}

fn create_buffer(shared: &D3D11Shared, desc: &D3D11_BUFFER_DESC, initial: &[u8]) -> Result<ID3D11Buffer> {
    let data = D3D11_SUBRESOURCE_DATA {
        pSysMem: initial.as_ptr() as *const c_void,
        SysMemPitch: 0,
        SysMemSlicePitch: 0,
    };
    let mut buffer = None;
    unsafe { shared.device.CreateBuffer(desc, Some(&data), Some(&mut buffer)) }
        .map_err(|e| hresult_err("CreateBuffer", &e))?;
    buffer.ok_or_else(|| Error::BackendError("CreateBuffer returned no object".to_string()))
}

fn create_geometry_buffer(shared: &D3D11Shared, size: u64, bind: D3D11_BIND_FLAG, dynamic: bool) -> Result<GeometryBuffer> {
    let byte_width = u32::try_from(size)
        .map_err(|_| sprout_invariant!("sprout::d3d11", "Buffer of {} bytes is too large", size))?;
    let zeros = vec![0u8; byte_width as usize];
    let desc = D3D11_BUFFER_DESC {
        ByteWidth: byte_width,
        Usage: if dynamic { D3D11_USAGE_DYNAMIC } else { D3D11_USAGE_DEFAULT },
        BindFlags: bind.0 as u32,
        CPUAccessFlags: if dynamic { D3D11_CPU_ACCESS_WRITE.0 as u32 } else { 0 },
        ..Default::default()
    };
    let buffer = create_buffer(shared, &desc, &zeros)?;
    Ok(GeometryBuffer {
        buffer,
        shadow: dynamic.then_some(zeros),
    })
}

impl Renderable for D3D11Renderable {
    fn info(&self) -> &RenderableInfo {
        &self.info
    }

    fn update_vertices(&mut self, offset_in_vertices: u32, data: &[u8]) -> Result<()> {
        let byte_offset = self.info.check_vertex_write(offset_in_vertices, data.len())?;
        match &mut self.vertex_buffer {
            Some(buffer) if !data.is_empty() => Self::write_geometry(&self.shared, buffer, byte_offset, data),
            _ => Ok(()),
        }
    }

    fn update_indices(&mut self, offset_in_indices: u32, indices: &[u32]) -> Result<()> {
        let byte_offset = self.info.check_index_write(offset_in_indices, indices.len())?;
        match &mut self.index_buffer {
            Some(buffer) if !indices.is_empty() => {
                Self::write_geometry(&self.shared, buffer, byte_offset, bytemuck::cast_slice(indices))
            }
            _ => Ok(()),
        }
    }

    fn push_uniform_data(&mut self, slot: u32, byte_offset: u32, data: &[u8]) -> Result<()> {
        self.uniforms.write_constant(slot, byte_offset, data)
    }

    fn push_texture(&mut self, slot: u32, texture: &Arc<dyn Texture>) -> Result<()> {
        D3D11Texture::from_dyn(texture.as_ref())?;
        self.uniforms.bind_texture(slot, texture)
    }

    fn draw_count(&mut self, count: u32) -> Result<()> {
        self.uniforms.validate_for_draw(&self.shared.state().targets)?;
        self.info.check_draw_count(count)?;
        if count == 0 {
            return Ok(());
        }

        // Constant buffers are updated whole
        for (slot, shadow) in self.uniforms.dirty_constant_buffers() {
            if let Some((_, buffer)) = self.constant_buffers.iter().find(|(s, _)| *s == slot) {
                unsafe {
                    self.shared
                        .context
                        .UpdateSubresource(buffer, 0, None, shadow.as_ptr() as *const c_void, 0, 0)
                };
            }
        }
        self.uniforms.mark_clean();

        self.bind_pipeline()?;
        unsafe {
            if self.info.num_indices > 0 {
                self.shared.context.DrawIndexed(count, 0, 0);
            } else {
                self.shared.context.Draw(count, 0);
            }
        }
        Ok(())
    }
}
