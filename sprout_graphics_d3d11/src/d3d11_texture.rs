/// D3D11Texture - RGBA8 `Texture2D` with optional shader and render target views

use sprout_graphics::sprout::render::{Sampler, Texture, TextureDesc, TextureUsage};
use sprout_graphics::{sprout_invariant, sprout_trace, Error, Result};
use std::any::Any;
use std::cell::Cell;
use std::rc::Rc;
use windows::Win32::Graphics::Direct3D11::{
    ID3D11RenderTargetView, ID3D11Resource, ID3D11SamplerState, ID3D11ShaderResourceView, ID3D11Texture2D,
    D3D11_BIND_FLAG, D3D11_BIND_RENDER_TARGET, D3D11_BIND_SHADER_RESOURCE, D3D11_RESOURCE_MISC_FLAG,
    D3D11_RESOURCE_MISC_GENERATE_MIPS, D3D11_TEXTURE2D_DESC, D3D11_USAGE_DEFAULT,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_R8G8B8A8_UNORM, DXGI_SAMPLE_DESC};

use crate::d3d11_context::{hresult_err, D3D11Shared};

pub struct D3D11Texture {
    shared: Rc<D3D11Shared>,
    /// Storage the views point at
    _texture: ID3D11Texture2D,
    srv: Option<ID3D11ShaderResourceView>,
    rtv: Option<ID3D11RenderTargetView>,
    desc: TextureDesc,
    sampler: Cell<Sampler>,
}

impl D3D11Texture {
    pub(crate) fn new(shared: Rc<D3D11Shared>, desc: &TextureDesc, data: Option<&[u8]>) -> Result<Self> {
        desc.validate(data)?;
        let mip_levels = desc.mip_levels();

        let mut bind = D3D11_BIND_FLAG(0);
        let mut misc = D3D11_RESOURCE_MISC_FLAG(0);
        if desc.usage.contains(TextureUsage::SHADER) {
            bind |= D3D11_BIND_SHADER_RESOURCE;
        }
        // GenerateMips renders into the chain
        if desc.usage.contains(TextureUsage::RENDER_TEXTURE) || mip_levels > 1 {
            bind |= D3D11_BIND_RENDER_TARGET;
        }
        if mip_levels > 1 {
            misc |= D3D11_RESOURCE_MISC_GENERATE_MIPS;
        }

        let texture_desc = D3D11_TEXTURE2D_DESC {
            Width: desc.width,
            Height: desc.height,
            MipLevels: mip_levels,
            ArraySize: 1,
            Format: DXGI_FORMAT_R8G8B8A8_UNORM,
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: bind.0 as u32,
            CPUAccessFlags: 0,
            MiscFlags: misc.0 as u32,
        };

        let mut texture = None;
        unsafe { shared.device.CreateTexture2D(&texture_desc, None, Some(&mut texture)) }
            .map_err(|e| hresult_err("CreateTexture2D", &e))?;
        let texture: ID3D11Texture2D =
            texture.ok_or_else(|| Error::BackendError("CreateTexture2D returned no object".to_string()))?;
        let resource: ID3D11Resource = texture.clone().into();

        let srv = if desc.usage.contains(TextureUsage::SHADER) {
            let mut view = None;
            unsafe { shared.device.CreateShaderResourceView(&resource, None, Some(&mut view)) }
                .map_err(|e| hresult_err("CreateShaderResourceView", &e))?;
            view
        } else {
            None
        };

        let rtv = if desc.usage.contains(TextureUsage::RENDER_TEXTURE) {
            let mut view = None;
            unsafe { shared.device.CreateRenderTargetView(&resource, None, Some(&mut view)) }
                .map_err(|e| hresult_err("CreateRenderTargetView", &e))?;
            view
        } else {
            None
        };

        if let Some(bytes) = data {
            unsafe {
                shared.context.UpdateSubresource(
                    &resource,
                    0,
                    None,
                    bytes.as_ptr() as *const _,
                    desc.width * desc.format.bytes_per_pixel(),
                    0,
                );
                if mip_levels > 1 {
                    if let Some(view) = &srv {
                        shared.context.GenerateMips(view);
                    }
                }
            }
        }

        sprout_trace!(
            "sprout::d3d11",
            "Created {}x{} texture ({} mip level(s), usage {:?})",
            desc.width,
            desc.height,
            mip_levels,
            desc.usage
        );

        Ok(Self {
            shared,
            _texture: texture,
            srv,
            rtv,
            desc: *desc,
            sampler: Cell::new(Sampler::default()),
        })
    }

    pub(crate) fn shader_view(&self) -> Option<&ID3D11ShaderResourceView> {
        self.srv.as_ref()
    }

    pub(crate) fn render_view(&self) -> Option<&ID3D11RenderTargetView> {
        self.rtv.as_ref()
    }

    pub(crate) fn sampler_state(&self) -> Result<ID3D11SamplerState> {
        self.shared.get_sampler(&self.sampler.get())
    }

    pub(crate) fn from_dyn(texture: &dyn Texture) -> Result<&D3D11Texture> {
        texture
            .as_any()
            .downcast_ref::<D3D11Texture>()
            .ok_or_else(|| sprout_invariant!("sprout::d3d11", "Texture was not created by the D3D11 backend"))
    }
}

impl Texture for D3D11Texture {
    fn desc(&self) -> &TextureDesc {
        &self.desc
    }

    fn sampler(&self) -> Sampler {
        self.sampler.get()
    }

    /// Sampler objects are resolved at draw time, so this only records the state
    fn set_sampler(&self, sampler: Sampler) -> Result<()> {
        self.sampler.set(sampler);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
