#![allow(dead_code)]
//! GPU test utilities - hidden window creation for Direct3D 11 device tests

use winit::event_loop::{EventLoop, EventLoopBuilder};
use winit::window::Window;

#[cfg(target_os = "windows")]
use winit::platform::windows::EventLoopBuilderExtWindows;

/// Create a hidden 800x600 window usable from the test thread
#[allow(deprecated)]
pub fn create_test_window() -> (Window, EventLoop<()>) {
    #[cfg(target_os = "windows")]
    let event_loop = EventLoopBuilder::new().with_any_thread(true).build().unwrap();
    #[cfg(not(target_os = "windows"))]
    let event_loop = EventLoopBuilder::new().build().unwrap();

    let window_attrs = Window::default_attributes()
        .with_title("Sprout D3D11 Test Window")
        .with_inner_size(winit::dpi::PhysicalSize::new(800, 600))
        .with_visible(false);

    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}
