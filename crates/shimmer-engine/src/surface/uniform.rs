use std::fmt;

use crate::gl::GraphicsContext;

/// Shader-side type of a uniform.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UniformKind::Float => "float",
            UniformKind::Int => "int",
            UniformKind::Vec2 => "vec2",
            UniformKind::Vec3 => "vec3",
            UniformKind::Vec4 => "vec4",
            UniformKind::Mat2 => "mat2",
            UniformKind::Mat3 => "mat3",
            UniformKind::Mat4 => "mat4",
        };
        f.write_str(s)
    }
}

/// A uniform value. The variant fixes both the kind and the component count.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major.
    Mat2([f32; 4]),
    /// Column-major.
    Mat3([f32; 9]),
    /// Column-major.
    Mat4([f32; 16]),
}

impl UniformValue {
    pub const IDENTITY_MAT4: UniformValue = UniformValue::Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat2(_) => UniformKind::Mat2,
            UniformValue::Mat3(_) => UniformKind::Mat3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Pushes the value with the upload call matching its kind.
    pub(crate) fn upload<G: GraphicsContext>(&self, gl: &mut G, location: &G::UniformLocation) {
        match self {
            UniformValue::Float(v) => gl.uniform_1f(location, *v),
            UniformValue::Int(v) => gl.uniform_1i(location, *v),
            UniformValue::Vec2(v) => gl.uniform_2fv(location, v),
            UniformValue::Vec3(v) => gl.uniform_3fv(location, v),
            UniformValue::Vec4(v) => gl.uniform_4fv(location, v),
            UniformValue::Mat2(v) => gl.uniform_matrix_2fv(location, v),
            UniformValue::Mat3(v) => gl.uniform_matrix_3fv(location, v),
            UniformValue::Mat4(v) => gl.uniform_matrix_4fv(location, v),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<[f32; 2]> for UniformValue {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<glam::Mat4> for UniformValue {
    fn from(m: glam::Mat4) -> Self {
        UniformValue::Mat4(m.to_cols_array())
    }
}

/// Named uniform registered at program setup.
///
/// The kind is fixed at registration; `location` is `None` when the program has
/// no active uniform of that name (or after teardown).
#[derive(Debug, Clone)]
pub struct UniformBinding<L> {
    kind: UniformKind,
    value: UniformValue,
    pub(crate) location: Option<L>,
}

impl<L> UniformBinding<L> {
    pub(crate) fn new(value: UniformValue) -> Self {
        Self {
            kind: value.kind(),
            value,
            location: None,
        }
    }

    pub fn kind(&self) -> UniformKind {
        self.kind
    }

    pub fn value(&self) -> UniformValue {
        self.value
    }

    /// Stores `value`. Returns the registered kind on mismatch.
    pub(crate) fn store(&mut self, value: UniformValue) -> Result<(), UniformKind> {
        if value.kind() != self.kind {
            return Err(self.kind);
        }
        self.value = value;
        Ok(())
    }
}
