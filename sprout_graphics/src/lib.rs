/*!
# Sprout Graphics

Backend-neutral rendering contract for the Sprout runtime.

Application code talks to a [`GraphicsDevice`](graphics_device::GraphicsDevice)
trait object and never to a native API. Backend crates (Vulkan, OpenGL 3.3,
Direct3D 11) implement the traits and register themselves with the device
factory at startup.

## Architecture

- **GraphicsDevice**: creates resources, binds render targets, clears and presents
- **Shader**: compiled vertex + pixel program
- **Texture**: 2D RGBA8 image with a mutable sampler
- **Renderable**: vertex/index buffers, uniform slots, blend mode, draw
- **PrecompiledShader**: on-disk container of per-backend shader payloads
*/

mod error;
pub mod backend;
pub mod config;
pub mod log;
pub mod graphics_device;
pub mod precompiled_shader;

pub use error::{Error, Result};

// Main sprout namespace module
pub mod sprout {
    pub use crate::error::{Error, Result};
    pub use crate::backend::Backend;
    pub use crate::config::Config;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};
    }

    // Device contract, resource descriptors and the factory
    pub mod render {
        pub use crate::graphics_device::*;
    }

    pub use crate::precompiled_shader::{PrecompiledShader, ShaderRecord};
}
