use thiserror::Error;

use crate::gl::ShaderStage;

use super::uniform::UniformKind;

/// Errors raised while building or writing to a surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("graphics context unavailable")]
    ContextUnavailable,

    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("failed to link program: {log}")]
    ProgramLink { log: String },

    #[error("failed to create {resource}")]
    ResourceCreation { resource: &'static str },

    #[error("uniform `{name}` is {expected}, got {found}")]
    UniformKindMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },

    #[error("buffer `{name}` takes {components} components per vertex, got {len} values")]
    BufferShape {
        name: String,
        len: usize,
        components: usize,
    },
}
