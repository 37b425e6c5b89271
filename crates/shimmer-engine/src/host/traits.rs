use crate::coords::Viewport;
use crate::gl::GraphicsContext;
use crate::input::{EventKind, HostEvent};

/// Callback run once on the next display refresh with the host timestamp (ms).
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// Listener invoked for every event of the subscribed kind.
pub type EventHandler = Box<dyn FnMut(HostEvent)>;

/// Identifies a pending frame request.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FrameHandle(pub u64);

/// Identifies a registered event listener.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ListenerId(pub u64);

/// Options applied when the graphics context is created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct ContextAttributes {
    pub antialias: bool,
    pub depth: bool,
}

/// Host environment a surface renders into.
pub trait Host: 'static {
    type Gl: GraphicsContext + 'static;

    /// Creates the graphics context bound to this host's canvas.
    fn create_context(&mut self, attributes: ContextAttributes) -> Option<Self::Gl>;

    fn attach_canvas(&mut self);

    /// Detaches the canvas from its container. Safe to call when detached.
    fn detach_canvas(&mut self);

    /// Current layout box of the container, in logical pixels.
    fn layout_size(&self) -> Viewport;

    fn device_pixel_ratio(&self) -> f32;

    /// Sets the canvas backing store (physical px) and its displayed size (logical px).
    fn set_canvas_size(&mut self, physical: (u32, u32), logical: Viewport);

    fn listen(&mut self, kind: EventKind, handler: EventHandler) -> ListenerId;

    /// Removes a listener. Unknown ids are ignored.
    fn unlisten(&mut self, id: ListenerId);

    /// Schedules `callback` for the next frame. `None` when the host refuses.
    fn request_frame(&mut self, callback: FrameCallback) -> Option<FrameHandle>;

    /// Cancels a pending frame. Unknown or already-run handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Monotonic time in milliseconds, on the same timeline as frame timestamps.
    fn now(&self) -> f64;
}
