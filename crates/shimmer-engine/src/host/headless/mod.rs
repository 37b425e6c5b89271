//! Headless host.
//!
//! Runs a surface without a display: the container is an in-memory box, the
//! graphics context records every call, and frames and events only happen when a
//! `HeadlessDriver` asks for them. Used by tests, CI and the native demo.

mod gl;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::coords::Viewport;
use crate::gl::ShaderStage;
use crate::input::{EventKind, HostEvent};

use super::{ContextAttributes, EventHandler, FrameCallback, FrameHandle, Host, ListenerId};

pub use gl::{GlCall, HeadlessGl};

/// Initial state of the simulated container.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HeadlessConfig {
    pub layout: Viewport,
    pub device_pixel_ratio: f32,
    /// Host clock at creation, in milliseconds.
    pub start_time: f64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            layout: Viewport::new(800.0, 600.0),
            device_pixel_ratio: 1.0,
            start_time: 0.0,
        }
    }
}

/// Injected failures.
#[derive(Debug, Default)]
pub(crate) struct Faults {
    refuse_context: bool,
    /// `cancel_frame` becomes a no-op, leaving stale callbacks queued.
    ignore_cancel: bool,
    compile: HashMap<ShaderStage, String>,
    link: Option<String>,
    /// Resource names (`"shader"`, `"program"`, `"buffer"`, `"texture"`) whose
    /// creation returns no handle.
    refuse: Vec<&'static str>,
}

type SharedHandler = Rc<RefCell<EventHandler>>;

pub(crate) struct Shared {
    layout: Viewport,
    device_pixel_ratio: f32,
    now: f64,

    attached: bool,
    canvas_physical: (u32, u32),
    canvas_logical: Viewport,
    context_attributes: Option<ContextAttributes>,

    listeners: BTreeMap<ListenerId, (EventKind, SharedHandler)>,
    next_listener: u64,
    frames: BTreeMap<FrameHandle, FrameCallback>,
    next_frame: u64,

    calls: Vec<GlCall>,
    faults: Faults,
}

/// Host half handed to `RenderSurface::new`.
pub struct HeadlessHost {
    shared: Rc<RefCell<Shared>>,
}

/// Test-side half: inspects state and drives frames and events.
#[derive(Clone)]
pub struct HeadlessDriver {
    shared: Rc<RefCell<Shared>>,
}

impl HeadlessHost {
    pub fn new(config: HeadlessConfig) -> Self {
        let shared = Shared {
            layout: config.layout,
            device_pixel_ratio: config.device_pixel_ratio,
            now: config.start_time,
            attached: false,
            canvas_physical: (0, 0),
            canvas_logical: Viewport::default(),
            context_attributes: None,
            listeners: BTreeMap::new(),
            next_listener: 1,
            frames: BTreeMap::new(),
            next_frame: 1,
            calls: Vec::new(),
            faults: Faults::default(),
        };
        Self {
            shared: Rc::new(RefCell::new(shared)),
        }
    }

    /// Returns a driver sharing this host's state. Take it before the host moves
    /// into a surface.
    pub fn driver(&self) -> HeadlessDriver {
        HeadlessDriver {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl Host for HeadlessHost {
    type Gl = HeadlessGl;

    fn create_context(&mut self, attributes: ContextAttributes) -> Option<HeadlessGl> {
        let mut shared = self.shared.borrow_mut();
        if shared.faults.refuse_context {
            return None;
        }
        shared.context_attributes = Some(attributes);
        drop(shared);
        Some(HeadlessGl::new(Rc::clone(&self.shared)))
    }

    fn attach_canvas(&mut self) {
        self.shared.borrow_mut().attached = true;
    }

    fn detach_canvas(&mut self) {
        self.shared.borrow_mut().attached = false;
    }

    fn layout_size(&self) -> Viewport {
        self.shared.borrow().layout
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.shared.borrow().device_pixel_ratio
    }

    fn set_canvas_size(&mut self, physical: (u32, u32), logical: Viewport) {
        let mut shared = self.shared.borrow_mut();
        shared.canvas_physical = physical;
        shared.canvas_logical = logical;
    }

    fn listen(&mut self, kind: EventKind, handler: EventHandler) -> ListenerId {
        let mut shared = self.shared.borrow_mut();
        let id = ListenerId(shared.next_listener);
        shared.next_listener += 1;
        shared.listeners.insert(id, (kind, Rc::new(RefCell::new(handler))));
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        self.shared.borrow_mut().listeners.remove(&id);
    }

    fn request_frame(&mut self, callback: FrameCallback) -> Option<FrameHandle> {
        let mut shared = self.shared.borrow_mut();
        let handle = FrameHandle(shared.next_frame);
        shared.next_frame += 1;
        shared.frames.insert(handle, callback);
        Some(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let mut shared = self.shared.borrow_mut();
        if !shared.faults.ignore_cancel {
            shared.frames.remove(&handle);
        }
    }

    fn now(&self) -> f64 {
        self.shared.borrow().now
    }
}

impl HeadlessDriver {
    // ── driving ───────────────────────────────────────────────────────────

    /// Advances the clock to `now` and runs every frame callback that was
    /// pending before the call. Returns how many ran.
    pub fn run_frame(&self, now: f64) -> usize {
        let pending = {
            let mut shared = self.shared.borrow_mut();
            shared.now = now;
            std::mem::take(&mut shared.frames)
        };

        let ran = pending.len();
        for (_, callback) in pending {
            callback(now);
        }
        ran
    }

    /// Runs `count` frames spaced `interval_ms` apart, starting one interval after
    /// the current clock.
    pub fn run_frames(&self, count: usize, interval_ms: f64) {
        for _ in 0..count {
            let now = self.now() + interval_ms;
            self.run_frame(now);
        }
    }

    /// Delivers `event` to every listener subscribed to its kind.
    pub fn dispatch(&self, event: HostEvent) -> usize {
        let handlers: Vec<SharedHandler> = self
            .shared
            .borrow()
            .listeners
            .values()
            .filter(|(kind, _)| *kind == event.kind())
            .map(|(_, handler)| Rc::clone(handler))
            .collect();

        for handler in &handlers {
            let mut handler = handler.borrow_mut();
            (*handler)(event);
        }
        handlers.len()
    }

    /// Changes the container box and device pixel ratio, then fires `Resize`.
    pub fn resize_to(&self, layout: Viewport, device_pixel_ratio: f32) -> usize {
        {
            let mut shared = self.shared.borrow_mut();
            shared.layout = layout;
            shared.device_pixel_ratio = device_pixel_ratio;
        }
        self.dispatch(HostEvent::Resize)
    }

    /// Changes the container box without notifying anyone.
    pub fn set_layout(&self, layout: Viewport, device_pixel_ratio: f32) {
        let mut shared = self.shared.borrow_mut();
        shared.layout = layout;
        shared.device_pixel_ratio = device_pixel_ratio;
    }

    // ── faults ────────────────────────────────────────────────────────────

    pub fn refuse_context(&self) {
        self.shared.borrow_mut().faults.refuse_context = true;
    }

    /// Keeps cancelled frame callbacks queued so they still run on the next frame.
    pub fn ignore_cancel(&self) {
        self.shared.borrow_mut().faults.ignore_cancel = true;
    }

    pub fn fail_compile(&self, stage: ShaderStage, log: impl Into<String>) {
        self.shared.borrow_mut().faults.compile.insert(stage, log.into());
    }

    pub fn fail_link(&self, log: impl Into<String>) {
        self.shared.borrow_mut().faults.link = Some(log.into());
    }

    /// Makes creation of `resource` (`"shader"`, `"program"`, `"buffer"`,
    /// `"texture"`) return no handle.
    pub fn refuse(&self, resource: &'static str) {
        self.shared.borrow_mut().faults.refuse.push(resource);
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn now(&self) -> f64 {
        self.shared.borrow().now
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.shared.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.shared.borrow_mut().calls.clear();
    }

    pub fn pending_frames(&self) -> usize {
        self.shared.borrow().frames.len()
    }

    pub fn listener_count(&self) -> usize {
        self.shared.borrow().listeners.len()
    }

    pub fn is_attached(&self) -> bool {
        self.shared.borrow().attached
    }

    /// Canvas backing-store size in physical pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        self.shared.borrow().canvas_physical
    }

    /// Canvas display size in logical pixels.
    pub fn canvas_display_size(&self) -> Viewport {
        self.shared.borrow().canvas_logical
    }

    pub fn context_attributes(&self) -> Option<ContextAttributes> {
        self.shared.borrow().context_attributes
    }
}
