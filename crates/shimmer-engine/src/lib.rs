//! Shimmer engine crate.
//!
//! This crate owns a single point-sprite shader surface and the host seams it
//! renders through: a GL-style graphics context, a DOM-like container, and a
//! per-frame scheduler.

pub mod coords;
pub mod gl;
pub mod host;
pub mod input;
pub mod logging;
pub mod surface;
pub mod time;

pub use surface::{
    BufferBinding, CameraConfig, CameraPatch, RenderSurface, SurfaceConfig, SurfaceError,
    SurfaceState, TextureSource, UniformBinding, UniformKind, UniformValue,
};
