//! Device creation tests that need no GL context
//!
//! Rendering through the OpenGL backend needs a current context from the
//! windowing layer and is covered by applications, not by these tests.

use raw_window_handle::{DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, WindowHandle};
use serial_test::serial;
use sprout_graphics::backend::BACKEND_ENV_VAR;
use sprout_graphics::sprout::render::{create_device, NativeWindow};
use sprout_graphics::sprout::{Backend, Config};
use sprout_graphics::Error;
use sprout_graphics_gl::GlGraphicsDevice;

/// Window that exposes neither handles nor a GL context
struct HeadlessWindow;

impl HasWindowHandle for HeadlessWindow {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl HasDisplayHandle for HeadlessWindow {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        Err(HandleError::Unavailable)
    }
}

impl NativeWindow for HeadlessWindow {
    fn size_in_pixels(&self) -> (u32, u32) {
        (640, 480)
    }
}

// ============================================================================
// DEVICE CREATION
// ============================================================================

#[test]
fn test_window_without_context_is_rejected() {
    let result = GlGraphicsDevice::new(&HeadlessWindow, &Config::default());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
#[serial]
fn test_registered_backend_reports_missing_context() {
    std::env::remove_var(BACKEND_ENV_VAR);
    sprout_graphics_gl::register();

    let result = create_device(&HeadlessWindow, Backend::OpenGL, &Config::default());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}
