//! Graphics context seam.
//!
//! This module defines the GL-style operations the surface needs from a host:
//! - shader/program compilation and linking
//! - uniform and attribute location lookup, typed uniform uploads
//! - array buffers, 2D textures, fixed-function state, point draws
//!
//! Handles are associated types so each host keeps its native objects.

mod context;
mod types;

pub use context::GraphicsContext;
pub use types::{BlendFactor, Capability, ClearMask, ShaderStage};
