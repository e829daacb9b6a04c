/// GlShared - loaded GL functions plus the device's binding state
///
/// Every GL resource holds an `Rc<GlShared>`. GL objects belong to the
/// context's thread, so nothing here is shared across threads.

use glow::HasContext;
use sprout_graphics::sprout::render::{GlContext, Texture, Viewport};
use sprout_graphics::{sprout_info, sprout_native_err, Error, Result};
use std::cell::{Ref, RefCell, RefMut};
use std::sync::Arc;

use crate::gl_convert::{flip_y_value, gl_viewport_rect};

/// Current render target and viewport
pub(crate) struct BindState {
    pub targets: Vec<Arc<dyn Texture>>,
    /// Size of the bound target (the window while `targets` is empty)
    pub target_size: (u32, u32),
    pub window_size: (u32, u32),
    pub viewport: Viewport,
}

impl BindState {
    pub fn offscreen(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn flip_y(&self) -> f32 {
        flip_y_value(self.offscreen())
    }
}

pub(crate) struct GlShared {
    pub gl: glow::Context,
    window_context: Arc<dyn GlContext>,
    state: RefCell<BindState>,
}

impl GlShared {
    /// Load GL entry points through the window's context
    ///
    /// The context must already be current on this thread.
    pub fn load(window_context: Arc<dyn GlContext>, window_size: (u32, u32)) -> Result<Self> {
        let gl = unsafe { glow::Context::from_loader_function(|symbol| window_context.get_proc_address(symbol)) };

        let version = gl.version();
        if version.is_embedded || (version.major, version.minor) < (3, 3) {
            return Err(Error::InitializationFailed(format!(
                "OpenGL 3.3 core is required, context reports {}.{}{}",
                version.major,
                version.minor,
                if version.is_embedded { " ES" } else { "" }
            )));
        }

        let renderer = unsafe { gl.get_parameter_string(glow::RENDERER) };
        sprout_info!(
            "sprout::gl",
            "OpenGL {}.{} context on '{}'",
            version.major,
            version.minor,
            renderer
        );

        Ok(Self {
            gl,
            window_context,
            state: RefCell::new(BindState {
                targets: Vec::new(),
                target_size: window_size,
                window_size,
                viewport: Viewport::full(window_size.0, window_size.1),
            }),
        })
    }

    pub fn window_context(&self) -> &Arc<dyn GlContext> {
        &self.window_context
    }

    pub fn state(&self) -> Ref<'_, BindState> {
        self.state.borrow()
    }

    pub fn state_mut(&self) -> RefMut<'_, BindState> {
        self.state.borrow_mut()
    }

    /// Push the stored viewport to GL
    pub fn apply_viewport(&self) {
        let state = self.state();
        let [x, y, w, h] = gl_viewport_rect(&state.viewport, state.target_size.1, state.offscreen());
        unsafe { self.gl.viewport(x, y, w, h) };
    }

    /// Drain the GL error queue, reporting the first error against `operation`
    pub fn check_error(&self, operation: &str) -> Result<()> {
        let first = unsafe { self.gl.get_error() };
        if first == glow::NO_ERROR {
            return Ok(());
        }
        // A lost context may report errors forever
        for _ in 0..16 {
            if unsafe { self.gl.get_error() } == glow::NO_ERROR {
                break;
            }
        }
        if first == glow::OUT_OF_MEMORY {
            return Err(Error::OutOfMemory);
        }
        Err(sprout_native_err!("sprout::gl", operation, first as i32))
    }
}
