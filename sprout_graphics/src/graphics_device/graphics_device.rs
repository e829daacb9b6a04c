/// GraphicsDevice trait and the window collaborator it renders into

use std::ffi::c_void;
use std::sync::Arc;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::backend::Backend;
use crate::error::Result;
use crate::graphics_device::{
    Color, Renderable, RenderableInfo, Shader, ShaderAttachment, Texture, TextureDesc, Viewport,
};

// ============================================================================
// Window collaborator
// ============================================================================

/// OpenGL context owned by the windowing layer
///
/// The context must be current on the thread that drives the device.
pub trait GlContext {
    /// Address of a GL entry point, null when unavailable
    fn get_proc_address(&self, symbol: &str) -> *const c_void;

    fn swap_buffers(&self) -> std::result::Result<(), String>;

    /// Enable or disable vsync; contexts that cannot change it ignore the call
    fn set_swap_interval(&self, _vsync: bool) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Surface a device presents into
///
/// Implemented for `winit::window::Window`. Applications using the OpenGL
/// backend wrap their window and context in a type that also returns the
/// context from `gl_context`.
pub trait NativeWindow: HasWindowHandle + HasDisplayHandle {
    /// Drawable size in physical pixels
    fn size_in_pixels(&self) -> (u32, u32);

    fn gl_context(&self) -> Option<Arc<dyn GlContext>> {
        None
    }
}

impl NativeWindow for winit::window::Window {
    fn size_in_pixels(&self) -> (u32, u32) {
        let size = self.inner_size();
        (size.width, size.height)
    }
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Backend-neutral rendering device
///
/// Created through [`create_device`](crate::graphics_device::create_device).
/// Every resource created by a device must be dropped before the device.
pub trait GraphicsDevice {
    fn backend(&self) -> Backend;

    /// Create a program from per-stage payloads
    ///
    /// At most one attachment per stage; the vertex stage is required.
    fn create_shader(&mut self, attachments: &[ShaderAttachment]) -> Result<Arc<dyn Shader>>;

    /// Create a texture, optionally uploading level 0
    ///
    /// `data` must be exactly `width * height * 4` bytes. With
    /// `GENERATE_MIPMAPS` the chain is generated right after the upload.
    fn create_texture(&mut self, desc: &TextureDesc, data: Option<&[u8]>) -> Result<Arc<dyn Texture>>;

    /// Validate `info` and allocate zeroed buffers
    fn create_renderable(&mut self, info: &RenderableInfo) -> Result<Box<dyn Renderable>>;

    /// Bind color targets; an empty list restores the swapchain
    ///
    /// The viewport is reset to the full extent of the new target.
    fn set_render_textures(&mut self, textures: &[Arc<dyn Texture>]) -> Result<()>;

    fn set_render_texture(&mut self, texture: Option<&Arc<dyn Texture>>) -> Result<()> {
        match texture {
            Some(texture) => self.set_render_textures(std::slice::from_ref(texture)),
            None => self.set_render_textures(&[]),
        }
    }

    fn viewport(&self) -> Viewport;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Clear every bound color target
    fn clear(&mut self, color: Color) -> Result<()>;

    /// Submit the frame and present the swapchain image
    fn present(&mut self) -> Result<()>;

    /// Resize the swapchain to `width` x `height` pixels
    fn resize_swapchain(&mut self, width: u32, height: u32) -> Result<()>;

    fn swapchain_size(&self) -> (u32, u32);

    /// Block until the GPU has finished all submitted work
    fn wait_idle(&self) -> Result<()> {
        Ok(())
    }
}
