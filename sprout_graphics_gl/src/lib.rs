/*!
# Sprout Graphics - OpenGL Backend

OpenGL 3.3 core implementation of the Sprout device contract, built on
`glow`.

The window supplies the context through `NativeWindow::gl_context`; it
must be current on the thread that drives the device. Shaders are the
GLSL produced by `sprout_shader_compiler`, whose synthetic resource names
this backend binds by convention. Call [`register`] once at startup to
make the backend available to `create_device`.
*/

mod gl_context;
mod gl_convert;
mod gl_device;
mod gl_renderable;
mod gl_shader;
mod gl_texture;

pub use gl_device::GlGraphicsDevice;
pub use gl_renderable::GlRenderable;
pub use gl_shader::GlShader;
pub use gl_texture::GlTexture;

use sprout_graphics::sprout::render::{register_backend, GraphicsDevice};
use sprout_graphics::sprout::Backend;

/// Register the OpenGL backend with the device factory
pub fn register() {
    register_backend(Backend::OpenGL, |window, config| {
        let device = GlGraphicsDevice::new(window, config)?;
        Ok(Box::new(device) as Box<dyn GraphicsDevice>)
    });
}
