/// D3D11Shared - device, immediate context and binding state
///
/// Resources keep an `Rc<D3D11Shared>`; everything runs on the thread that
/// created the device.

use sprout_graphics::sprout::render::{Sampler, SamplerCache, Texture, Viewport};
use sprout_graphics::{sprout_native_err, Error, Result};
use std::cell::{Ref, RefCell, RefMut};
use std::sync::Arc;
use windows::Win32::Graphics::Direct3D11::{ID3D11Device, ID3D11DeviceContext, ID3D11SamplerState};

use crate::d3d11_convert::{sampler_desc, viewport_to_d3d};

/// Current render target and viewport
pub(crate) struct BindState {
    pub targets: Vec<Arc<dyn Texture>>,
    pub target_size: (u32, u32),
    pub swapchain_size: (u32, u32),
    pub viewport: Viewport,
}

pub(crate) struct D3D11Shared {
    pub device: ID3D11Device,
    pub context: ID3D11DeviceContext,
    samplers: RefCell<SamplerCache<ID3D11SamplerState>>,
    state: RefCell<BindState>,
}

impl D3D11Shared {
    pub fn new(device: ID3D11Device, context: ID3D11DeviceContext, swapchain_size: (u32, u32)) -> Self {
        Self {
            device,
            context,
            samplers: RefCell::new(SamplerCache::new()),
            state: RefCell::new(BindState {
                targets: Vec::new(),
                target_size: swapchain_size,
                swapchain_size,
                viewport: Viewport::full(swapchain_size.0, swapchain_size.1),
            }),
        }
    }

    pub fn state(&self) -> Ref<'_, BindState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, BindState> {
        self.state.borrow_mut()
    }

    pub fn apply_viewport(&self) {
        let viewport = viewport_to_d3d(&self.state().viewport);
        unsafe { self.context.RSSetViewports(Some(&[viewport])) };
    }

    /// Sampler state object for `sampler`, created on first use
    pub fn get_sampler(&self, sampler: &Sampler) -> Result<ID3D11SamplerState> {
        let device = &self.device;
        self.samplers.borrow_mut().get_or_create(sampler, |desc| {
            let mut state = None;
            unsafe { device.CreateSamplerState(&sampler_desc(desc), Some(&mut state)) }
                .map_err(|e| hresult_err("CreateSamplerState", &e))?;
            state.ok_or_else(|| Error::BackendError("CreateSamplerState returned no object".to_string()))
        })
    }
}

/// Log a failed call and turn it into `Error::NativeCall`
pub(crate) fn hresult_err(operation: &str, error: &windows::core::Error) -> Error {
    if error.code() == windows::Win32::Foundation::E_OUTOFMEMORY {
        return Error::OutOfMemory;
    }
    sprout_native_err!("sprout::d3d11", operation, error.code().0)
}
