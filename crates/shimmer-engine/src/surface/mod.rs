//! Render surface.
//!
//! A `RenderSurface` owns one graphics context, one point-sprite program and the
//! named uniforms/buffers feeding it, and drives a continuous frame loop through
//! its host until destroyed.
//!
//! Naming conventions inside shaders:
//! - uniform `name` is looked up as `u_name`
//! - buffer `name` is bound to attribute `a_name`

mod buffer;
mod camera;
mod config;
mod error;
mod state;
mod uniform;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub use buffer::{position_vertex_count, BufferBinding, POSITION_BUFFER};
pub use camera::{orthographic, perspective, CameraConfig, CameraPatch};
pub use config::{
    BufferSpec, ResizeCallback, SurfaceConfig, TextureSource, UpdateCallback,
    DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER,
};
pub use error::SurfaceError;
pub use state::SurfaceState;
pub use uniform::{UniformBinding, UniformKind, UniformValue};

use crate::coords::Viewport;
use crate::host::{ContextAttributes, EventHandler, Host};
use crate::input::EventKind;
use crate::time::FrameClock;

use state::Setup;

/// Handle to a live surface.
///
/// Dropping the handle destroys the surface.
pub struct RenderSurface<H: Host> {
    shared: Rc<RefCell<SurfaceState<H>>>,
}

impl<H: Host> RenderSurface<H> {
    /// Creates the context, builds the program and bindings, performs the first
    /// resize and starts the frame loop.
    ///
    /// On failure every object allocated so far is released and the canvas is
    /// detached before the error is returned.
    pub fn new(mut host: H, config: SurfaceConfig<H>) -> Result<Self, SurfaceError> {
        let attributes = ContextAttributes {
            antialias: config.antialias,
            depth: config.depth_test,
        };
        let gl = host
            .create_context(attributes)
            .ok_or(SurfaceError::ContextUnavailable)?;
        host.attach_canvas();

        let uniforms = config.merged_uniforms();
        let buffers = config.merged_buffers();
        let camera = CameraConfig::default().merged(&config.camera);
        let clock = FrameClock::with_divisor(host.now(), config.time_divisor);

        let SurfaceConfig {
            depth_test,
            mousemove,
            autosize,
            vertex,
            fragment,
            texture,
            clear_color,
            on_update,
            on_resize,
            ..
        } = config;

        let mut state = SurfaceState::new(
            host,
            gl,
            camera,
            clear_color,
            depth_test,
            clock,
            on_update,
            on_resize,
        );

        let setup = Setup {
            vertex: &vertex,
            fragment: &fragment,
            uniforms,
            buffers,
            texture: texture.as_ref(),
        };
        if let Err(err) = state.setup(setup) {
            log::debug!("surface setup failed: {err}");
            state.destroy();
            return Err(err);
        }

        let shared = Rc::new(RefCell::new(state));
        {
            let mut state = shared.borrow_mut();
            state.me = Rc::downgrade(&shared);

            if autosize {
                let id = state.host.listen(EventKind::Resize, event_handler(Rc::downgrade(&shared)));
                state.listeners.push(id);
            }
            if mousemove {
                let id = state
                    .host
                    .listen(EventKind::PointerMove, event_handler(Rc::downgrade(&shared)));
                state.listeners.push(id);
            }

            state.resize();
            state.schedule_frame();
        }

        Ok(Self { shared })
    }

    /// Runs `f` with exclusive access to the surface state.
    ///
    /// Panics if called from inside one of the surface's own callbacks; those
    /// already receive the state.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SurfaceState<H>) -> R) -> R {
        let mut state = self.shared.borrow_mut();
        let out = f(&mut state);
        // A frame that fired while the state was borrowed was dropped.
        state.schedule_frame();
        out
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.shared.borrow().uniform(name)
    }

    pub fn set_uniform(&self, name: &str, value: impl Into<UniformValue>) -> Result<(), SurfaceError> {
        self.with_state(|state| state.set_uniform(name, value))
    }

    pub fn buffer(&self, name: &str) -> Option<Vec<f32>> {
        self.shared.borrow().buffer(name).map(<[f32]>::to_vec)
    }

    pub fn set_buffer(&self, name: &str, data: Vec<f32>) -> Result<(), SurfaceError> {
        self.with_state(|state| state.set_buffer(name, data))
    }

    pub fn vertex_count(&self) -> usize {
        self.shared.borrow().vertex_count()
    }

    pub fn size(&self) -> Viewport {
        self.shared.borrow().size()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.shared.borrow().aspect_ratio()
    }

    pub fn camera(&self) -> CameraConfig {
        self.shared.borrow().camera()
    }

    pub fn resize(&self) {
        self.with_state(|state| state.resize());
    }

    pub fn is_running(&self) -> bool {
        self.shared.borrow().is_running()
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.borrow().is_destroyed()
    }

    /// Tears the surface down. Safe to call more than once.
    pub fn destroy(&self) {
        self.shared.borrow_mut().destroy();
    }
}

impl<H: Host> Drop for RenderSurface<H> {
    fn drop(&mut self) {
        match self.shared.try_borrow_mut() {
            Ok(mut state) => state.destroy(),
            Err(_) => log::warn!("surface dropped while borrowed; teardown skipped"),
        }
    }
}

fn event_handler<H: Host>(me: Weak<RefCell<SurfaceState<H>>>) -> EventHandler {
    Box::new(move |event| {
        let Some(shared) = me.upgrade() else {
            return;
        };
        let Ok(mut state) = shared.try_borrow_mut() else {
            log::warn!("event {:?} re-entered a busy surface; dropped", event.kind());
            return;
        };
        state.handle_event(event);
        state.schedule_frame();
    })
}
