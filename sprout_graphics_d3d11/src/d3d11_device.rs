/// D3D11GraphicsDevice - `GraphicsDevice` over Direct3D 11 and a flip-model swapchain
///
/// Commands go to the immediate context. The back buffer view is the
/// render target whenever no render textures are bound.

use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use sprout_graphics::sprout::render::{
    validate_render_targets, Color, GraphicsDevice, NativeWindow, Renderable, RenderableInfo, Shader,
    ShaderAttachment, Texture, TextureDesc, Viewport, MAX_UNIFORM_SLOTS,
};
use sprout_graphics::sprout::{Backend, Config};
use sprout_graphics::{sprout_debug, sprout_info, sprout_invariant, sprout_warn, Error, Result};
use std::ffi::c_void;
use std::rc::Rc;
use std::sync::Arc;
use windows::core::Interface;
use windows::Win32::Foundation::{FALSE, HMODULE, HWND, TRUE};
use windows::Win32::Graphics::Direct3D::{D3D_DRIVER_TYPE_HARDWARE, D3D_FEATURE_LEVEL, D3D_FEATURE_LEVEL_11_0};
use windows::Win32::Graphics::Direct3D11::{
    D3D11CreateDevice, ID3D11DepthStencilView, ID3D11Device, ID3D11DeviceContext, ID3D11RenderTargetView,
    ID3D11ShaderResourceView, ID3D11Texture2D, D3D11_CREATE_DEVICE_BGRA_SUPPORT, D3D11_CREATE_DEVICE_DEBUG,
    D3D11_CREATE_DEVICE_FLAG, D3D11_CULL_NONE, D3D11_FILL_SOLID, D3D11_RASTERIZER_DESC, D3D11_SDK_VERSION,
};
use windows::Win32::Graphics::Dxgi::Common::{
    DXGI_ALPHA_MODE_UNSPECIFIED, DXGI_FORMAT_B8G8R8A8_UNORM, DXGI_FORMAT_UNKNOWN, DXGI_SAMPLE_DESC,
};
use windows::Win32::Graphics::Dxgi::{
    IDXGIAdapter, IDXGIDevice, IDXGIFactory2, IDXGIOutput, IDXGISwapChain1, DXGI_PRESENT, DXGI_SCALING_STRETCH,
    DXGI_SWAP_CHAIN_DESC1, DXGI_SWAP_CHAIN_FLAG, DXGI_SWAP_EFFECT_FLIP_DISCARD, DXGI_USAGE_RENDER_TARGET_OUTPUT,
};

use crate::d3d11_context::{hresult_err, D3D11Shared};
use crate::d3d11_renderable::D3D11Renderable;
use crate::d3d11_shader::D3D11Shader;
use crate::d3d11_texture::D3D11Texture;

const SWAPCHAIN_BUFFERS: u32 = 2;

pub struct D3D11GraphicsDevice {
    shared: Rc<D3D11Shared>,
    swapchain: IDXGISwapChain1,
    backbuffer_view: Option<ID3D11RenderTargetView>,
    /// Views of the bound render textures, empty for the swapchain
    target_views: Vec<ID3D11RenderTargetView>,
    vsync: bool,
}

impl D3D11GraphicsDevice {
    pub fn new(window: &dyn NativeWindow, config: &Config) -> Result<Self> {
        let hwnd = window_hwnd(window)?;
        let (width, height) = window.size_in_pixels();

        let (device, context) = create_device(config.enable_validation)?;

        let dxgi_device: IDXGIDevice = device
            .cast()
            .map_err(|e| Error::InitializationFailed(format!("Device has no IDXGIDevice interface: {}", e)))?;
        let adapter: IDXGIAdapter =
            unsafe { dxgi_device.GetAdapter() }.map_err(|e| hresult_err("IDXGIDevice::GetAdapter", &e))?;
        let factory: IDXGIFactory2 =
            unsafe { adapter.GetParent() }.map_err(|e| hresult_err("IDXGIAdapter::GetParent", &e))?;

        if let Ok(desc) = unsafe { adapter.GetDesc() } {
            let name = String::from_utf16_lossy(&desc.Description);
            sprout_info!("sprout::d3d11", "Adapter: {}", name.trim_end_matches('\0'));
        }

        let swapchain_desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: width.max(1),
            Height: height.max(1),
            Format: DXGI_FORMAT_B8G8R8A8_UNORM,
            Stereo: FALSE,
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: SWAPCHAIN_BUFFERS,
            Scaling: DXGI_SCALING_STRETCH,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            AlphaMode: DXGI_ALPHA_MODE_UNSPECIFIED,
            Flags: 0,
        };
        let swapchain = unsafe {
            factory.CreateSwapChainForHwnd(&device, hwnd, &swapchain_desc, None, None::<&IDXGIOutput>)
        }
        .map_err(|e| Error::InitializationFailed(format!("CreateSwapChainForHwnd failed: {}", e)))?;

        let rasterizer_desc = D3D11_RASTERIZER_DESC {
            FillMode: D3D11_FILL_SOLID,
            CullMode: D3D11_CULL_NONE,
            FrontCounterClockwise: FALSE,
            DepthClipEnable: TRUE,
            ..Default::default()
        };
        let mut rasterizer = None;
        unsafe { device.CreateRasterizerState(&rasterizer_desc, Some(&mut rasterizer)) }
            .map_err(|e| hresult_err("CreateRasterizerState", &e))?;
        unsafe { context.RSSetState(rasterizer.as_ref()) };

        let swapchain_size = (swapchain_desc.Width, swapchain_desc.Height);
        let shared = Rc::new(D3D11Shared::new(device, context, swapchain_size));

        let mut graphics_device = Self {
            shared,
            swapchain,
            backbuffer_view: None,
            target_views: Vec::new(),
            vsync: config.vsync,
        };
        graphics_device.create_backbuffer_view()?;
        graphics_device.bind_targets();
        graphics_device.shared.apply_viewport();

        sprout_info!(
            "sprout::d3d11",
            "Direct3D 11 device ready ({}x{}, vsync {}, validation {})",
            swapchain_size.0,
            swapchain_size.1,
            config.vsync,
            config.enable_validation
        );
        Ok(graphics_device)
    }

    fn create_backbuffer_view(&mut self) -> Result<()> {
        let backbuffer: ID3D11Texture2D =
            unsafe { self.swapchain.GetBuffer(0) }.map_err(|e| hresult_err("IDXGISwapChain::GetBuffer", &e))?;
        let mut view = None;
        unsafe { self.shared.device.CreateRenderTargetView(&backbuffer, None, Some(&mut view)) }
            .map_err(|e| hresult_err("CreateRenderTargetView", &e))?;
        self.backbuffer_view = view;
        Ok(())
    }

    fn current_views(&self) -> Vec<Option<ID3D11RenderTargetView>> {
        if self.target_views.is_empty() {
            vec![self.backbuffer_view.clone()]
        } else {
            self.target_views.iter().cloned().map(Some).collect()
        }
    }

    fn bind_targets(&self) {
        let views = self.current_views();
        unsafe {
            self.shared
                .context
                .OMSetRenderTargets(Some(&views), None::<&ID3D11DepthStencilView>)
        };
    }

    /// A texture still bound for sampling cannot become a render target
    fn unbind_shader_resources(&self) {
        let empty: [Option<ID3D11ShaderResourceView>; MAX_UNIFORM_SLOTS as usize] = std::array::from_fn(|_| None);
        unsafe { self.shared.context.PSSetShaderResources(0, Some(&empty)) };
    }
}

fn window_hwnd(window: &dyn NativeWindow) -> Result<HWND> {
    let handle = window
        .window_handle()
        .map_err(|e| Error::InitializationFailed(format!("Window handle unavailable: {}", e)))?;
    match handle.as_raw() {
        RawWindowHandle::Win32(win32) => Ok(HWND(win32.hwnd.get() as *mut c_void)),
        other => Err(Error::InitializationFailed(format!(
            "Direct3D 11 needs a Win32 window, got {:?}",
            other
        ))),
    }
}

fn try_create_device(flags: D3D11_CREATE_DEVICE_FLAG) -> windows::core::Result<(ID3D11Device, ID3D11DeviceContext)> {
    let feature_levels = [D3D_FEATURE_LEVEL_11_0];
    let mut device = None;
    let mut context = None;
    let mut feature_level = D3D_FEATURE_LEVEL::default();
    unsafe {
        D3D11CreateDevice(
            None::<&IDXGIAdapter>,
            D3D_DRIVER_TYPE_HARDWARE,
            HMODULE::default(),
            flags,
            Some(&feature_levels),
            D3D11_SDK_VERSION,
            Some(&mut device),
            Some(&mut feature_level),
            Some(&mut context),
        )?;
    }
    match (device, context) {
        (Some(device), Some(context)) => Ok((device, context)),
        _ => Err(windows::core::Error::from(windows::Win32::Foundation::E_POINTER)),
    }
}

/// Create the device, dropping the debug layer when it is not installed
fn create_device(validation: bool) -> Result<(ID3D11Device, ID3D11DeviceContext)> {
    if validation {
        match try_create_device(D3D11_CREATE_DEVICE_BGRA_SUPPORT | D3D11_CREATE_DEVICE_DEBUG) {
            Ok(pair) => return Ok(pair),
            Err(e) => sprout_warn!(
                "sprout::d3d11",
                "D3D11 debug layer unavailable ({}), continuing without validation",
                e
            ),
        }
    }
    try_create_device(D3D11_CREATE_DEVICE_BGRA_SUPPORT)
        .map_err(|e| Error::InitializationFailed(format!("D3D11CreateDevice failed: {}", e)))
}

impl GraphicsDevice for D3D11GraphicsDevice {
    fn backend(&self) -> Backend {
        Backend::D3D11
    }

    fn create_shader(&mut self, attachments: &[ShaderAttachment]) -> Result<Arc<dyn Shader>> {
        let shader = D3D11Shader::new(Rc::clone(&self.shared), attachments)?;
        Ok(Arc::new(shader))
    }

    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> Result<Arc<dyn Texture>> {
        let texture = D3D11Texture::new(Rc::clone(&self.shared), desc, data)?;
        Ok(Arc::new(texture))
    }

    fn create_renderable(&mut self, info: &RenderableInfo) -> Result<Box<dyn Renderable>> {
        let renderable = D3D11Renderable::new(Rc::clone(&self.shared), info)?;
        Ok(Box::new(renderable))
    }

    fn set_render_textures(&mut self, textures: &[Arc<dyn Texture>]) -> Result<()> {
        let size = validate_render_targets(textures)?;

        let mut views = Vec::with_capacity(textures.len());
        for (index, texture) in textures.iter().enumerate() {
            let view = D3D11Texture::from_dyn(texture.as_ref())?
                .render_view()
                .cloned()
                .ok_or_else(|| sprout_invariant!("sprout::d3d11", "Render texture {} has no render target view", index))?;
            views.push(view);
        }

        self.target_views = views;
        self.unbind_shader_resources();
        self.bind_targets();

        {
            let mut state = self.shared.state_mut();
            let target_size = size.unwrap_or(state.swapchain_size);
            state.targets = textures.to_vec();
            state.target_size = target_size;
            state.viewport = Viewport::full(target_size.0, target_size.1);
        }
        self.shared.apply_viewport();
        Ok(())
    }

    fn viewport(&self) -> Viewport {
        self.shared.state().viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        if viewport.width == 0 || viewport.height == 0 {
            return Err(sprout_invariant!(
                "sprout::d3d11",
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
        let rgba = color.to_array();
        for view in self.current_views().iter().flatten() {
            unsafe { self.shared.context.ClearRenderTargetView(view, &rgba) };
        }
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let interval = if self.vsync { 1 } else { 0 };
        unsafe { self.swapchain.Present(interval, DXGI_PRESENT(0)) }
            .ok()
            .map_err(|e| hresult_err("IDXGISwapChain::Present", &e))?;
        // Flip-model presentation unbinds the back buffer
        self.bind_targets();
        Ok(())
    }

    fn resize_swapchain(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            sprout_debug!("sprout::d3d11", "Ignoring swapchain resize to {}x{}", width, height);
            return Ok(());
        }

        // Every reference to the back buffer must be released first
        unsafe { self.shared.context.OMSetRenderTargets(None, None::<&ID3D11DepthStencilView>) };
        self.backbuffer_view = None;
        unsafe {
            self.swapchain
                .ResizeBuffers(0, width, height, DXGI_FORMAT_UNKNOWN, DXGI_SWAP_CHAIN_FLAG(0))
        }
        .map_err(|e| hresult_err("IDXGISwapChain::ResizeBuffers", &e))?;
        self.create_backbuffer_view()?;
        self.bind_targets();

        let onscreen = {
            let mut state = self.shared.state_mut();
            state.swapchain_size = (width, height);
            if state.targets.is_empty() {
                state.target_size = (width, height);
                state.viewport = Viewport::full(width, height);
            }
            state.targets.is_empty()
        };
        if onscreen {
            self.shared.apply_viewport();
        }
        sprout_debug!("sprout::d3d11", "Swapchain resized to {}x{}", width, height);
        Ok(())
    }

    fn swapchain_size(&self) -> (u32, u32) {
        self.shared.state().swapchain_size
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe { self.shared.context.Flush() };
        Ok(())
    }
}

impl Drop for D3D11GraphicsDevice {
    fn drop(&mut self) {
        self.shared.state_mut().targets.clear();
        unsafe {
            self.shared.context.ClearState();
            self.shared.context.Flush();
        }
    }
}
