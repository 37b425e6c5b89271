//! Host environment seam.
//!
//! A `Host` owns everything around the graphics context: the container the canvas
//! lives in, event subscriptions, and per-frame scheduling. All callbacks are
//! dispatched on one thread, one at a time.
//!
//! Implementations:
//! - `headless`: in-memory container and recording context, driven explicitly
//! - `web` (wasm32): DOM container, WebGL 1, `requestAnimationFrame`

#[cfg(any(target_arch = "wasm32", test))]
mod frames;
mod traits;

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use traits::{ContextAttributes, EventHandler, FrameCallback, FrameHandle, Host, ListenerId};
