/// Graphics device module - the backend-neutral device contract

pub mod graphics_device;
pub mod shader;
pub mod texture;
pub mod renderable;
pub mod blend;
pub mod color;
pub mod viewport;
pub mod uniform_state;
pub mod handle_cache;
pub mod factory;

pub use graphics_device::*;
pub use shader::*;
pub use texture::*;
pub use renderable::*;
pub use blend::*;
pub use color::*;
pub use viewport::*;
pub use uniform_state::*;
pub use handle_cache::*;
pub use factory::{create_device, is_registered, register_backend, registered_backends, DeviceFactory};

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
