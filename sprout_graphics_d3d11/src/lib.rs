/*!
# Sprout Graphics - Direct3D 11 Backend

Direct3D 11 implementation of the Sprout device contract, built on the
`windows` crate and a flip-model DXGI swapchain.

Shaders are DXBC payloads produced by `sprout_shader_compiler`. Register
numbers bind directly to uniform slots (`b<N>` for constant buffers,
`t<N>`/`s<N>` for textures), matching the HLSL the compiler consumes.

The backend only exists on Windows. Elsewhere [`register`] does nothing,
so applications can call it unconditionally.
*/

#![cfg_attr(not(windows), allow(dead_code))]

mod d3d11_bindings;
#[cfg(windows)]
mod d3d11_context;
#[cfg(windows)]
mod d3d11_convert;
#[cfg(windows)]
mod d3d11_device;
#[cfg(windows)]
mod d3d11_renderable;
#[cfg(windows)]
mod d3d11_shader;
#[cfg(windows)]
mod d3d11_texture;

#[cfg(windows)]
pub use d3d11_device::D3D11GraphicsDevice;
#[cfg(windows)]
pub use d3d11_renderable::D3D11Renderable;
#[cfg(windows)]
pub use d3d11_shader::D3D11Shader;
#[cfg(windows)]
pub use d3d11_texture::D3D11Texture;

/// Register the Direct3D 11 backend with the device factory
#[cfg(windows)]
pub fn register() {
    use sprout_graphics::sprout::render::{register_backend, GraphicsDevice};
    use sprout_graphics::sprout::Backend;

    register_backend(Backend::D3D11, |window, config| {
        let device = D3D11GraphicsDevice::new(window, config)?;
        Ok(Box::new(device) as Box<dyn GraphicsDevice>)
    });
}

/// Register the Direct3D 11 backend with the device factory
#[cfg(not(windows))]
pub fn register() {
    sprout_graphics::sprout_debug!("sprout::d3d11", "Direct3D 11 is not available on this platform");
}
