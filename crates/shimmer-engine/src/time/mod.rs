//! Time subsystem.
//!
//! Frame timing is driven by host timestamps (milliseconds) instead of the
//! process clock, so the same clock works under `requestAnimationFrame` and
//! under a headless driver.
//! Intended usage:
//! - one `FrameClock` per surface
//! - call `tick(now)` once per scheduled frame to obtain `FrameTime`

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime, DEFAULT_TIME_DIVISOR};
