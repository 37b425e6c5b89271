use glam::Mat4;

/// Camera parameters the projection uniform is derived from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraConfig {
    /// Vertical field of view, in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub aspect: f32,
    /// Added to the translation terms of the perspective matrix.
    pub z: f32,
    pub perspective: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 60.0,
            near: 1.0,
            far: 10000.0,
            aspect: 1.0,
            z: 100.0,
            perspective: true,
        }
    }
}

impl CameraConfig {
    /// Applies every field set in `patch`.
    pub fn merged(mut self, patch: &CameraPatch) -> Self {
        if let Some(v) = patch.fov {
            self.fov = v;
        }
        if let Some(v) = patch.near {
            self.near = v;
        }
        if let Some(v) = patch.far {
            self.far = v;
        }
        if let Some(v) = patch.aspect {
            self.aspect = v;
        }
        if let Some(v) = patch.z {
            self.z = v;
        }
        if let Some(v) = patch.perspective {
            self.perspective = v;
        }
        self
    }

    /// Projection for a surface of `width` x `height` logical pixels, using the
    /// camera's current aspect ratio.
    pub fn projection(&self, width: f32, height: f32) -> [f32; 16] {
        if self.perspective {
            perspective(self.fov, self.aspect, self.near, self.far, self.z)
        } else {
            orthographic(width, height)
        }
    }
}

/// Partial camera override; unset fields keep the defaults.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct CameraPatch {
    pub fov: Option<f32>,
    pub near: Option<f32>,
    pub far: Option<f32>,
    pub aspect: Option<f32>,
    pub z: Option<f32>,
    pub perspective: Option<bool>,
}

/// Right-handed GL perspective with `z` added to elements 14 and 15.
pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32, z: f32) -> [f32; 16] {
    let mut m = Mat4::perspective_rh_gl(fov_degrees.to_radians(), aspect, near, far).to_cols_array();
    m[14] += z;
    m[15] += z;
    m
}

/// Maps pixel coordinates (origin top-left, y down) onto clip space.
pub fn orthographic(width: f32, height: f32) -> [f32; 16] {
    let (w, h) = (width.max(f32::EPSILON), height.max(f32::EPSILON));
    [
        2.0 / w, 0.0, 0.0, 0.0, //
        0.0, -2.0 / h, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        -1.0, 1.0, 0.0, 1.0,
    ]
}
