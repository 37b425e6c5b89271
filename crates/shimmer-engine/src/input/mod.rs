//! Input subsystem.
//!
//! Public API is host-agnostic. Hosts translate platform events (DOM events,
//! headless dispatches) into `HostEvent`s before handing them to listeners.

mod types;

pub use types::{EventKind, HostEvent, PointerMoveEvent};
