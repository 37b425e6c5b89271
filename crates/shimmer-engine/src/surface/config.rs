use std::collections::BTreeMap;

use crate::host::Host;
use crate::time::DEFAULT_TIME_DIVISOR;

use super::buffer::POSITION_BUFFER;
use super::camera::CameraPatch;
use super::state::SurfaceState;
use super::uniform::UniformValue;

pub const DEFAULT_VERTEX_SHADER: &str = include_str!("shaders/point.vert");
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("shaders/point.frag");

/// Called once per frame with the milliseconds since the previous frame.
pub type UpdateCallback<H> = Box<dyn FnMut(&mut SurfaceState<H>, f64)>;

/// Called after every resize with `(width, height, device_pixel_ratio)`.
pub type ResizeCallback<H> = Box<dyn FnMut(&mut SurfaceState<H>, f32, f32, f32)>;

/// Image bound to the `u_texture` sampler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSource {
    /// Path or URL resolved by the host; loads asynchronously where the host can.
    Image(String),
    /// Tightly packed RGBA8 pixels, uploaded during construction.
    Rgba {
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    },
}

/// Initial contents of a named attribute buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferSpec {
    pub components: usize,
    pub data: Vec<f32>,
}

impl BufferSpec {
    pub fn new(components: usize, data: Vec<f32>) -> Self {
        Self { components, data }
    }
}

/// Surface construction options.
///
/// `uniforms` and `buffers` are merged over the built-in defaults, so overriding a
/// default name replaces it (kind included).
pub struct SurfaceConfig<H: Host> {
    pub antialias: bool,
    pub depth_test: bool,
    /// Track pointer movement into the `mousemove` uniform.
    pub mousemove: bool,
    /// Follow host resize events.
    pub autosize: bool,
    pub vertex: String,
    pub fragment: String,
    pub uniforms: BTreeMap<String, UniformValue>,
    pub buffers: BTreeMap<String, BufferSpec>,
    pub camera: CameraPatch,
    pub texture: Option<TextureSource>,
    pub clear_color: [f32; 4],
    /// Elapsed milliseconds are divided by this before reaching `u_time`.
    pub time_divisor: f64,
    pub on_update: Option<UpdateCallback<H>>,
    pub on_resize: Option<ResizeCallback<H>>,
}

impl<H: Host> Default for SurfaceConfig<H> {
    fn default() -> Self {
        Self {
            antialias: false,
            depth_test: false,
            mousemove: false,
            autosize: true,
            vertex: DEFAULT_VERTEX_SHADER.to_string(),
            fragment: DEFAULT_FRAGMENT_SHADER.to_string(),
            uniforms: BTreeMap::new(),
            buffers: BTreeMap::new(),
            camera: CameraPatch::default(),
            texture: None,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            time_divisor: DEFAULT_TIME_DIVISOR,
            on_update: None,
            on_resize: None,
        }
    }
}

impl<H: Host> SurfaceConfig<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn antialias(mut self, on: bool) -> Self {
        self.antialias = on;
        self
    }

    pub fn depth_test(mut self, on: bool) -> Self {
        self.depth_test = on;
        self
    }

    pub fn mousemove(mut self, on: bool) -> Self {
        self.mousemove = on;
        self
    }

    pub fn autosize(mut self, on: bool) -> Self {
        self.autosize = on;
        self
    }

    pub fn vertex(mut self, source: impl Into<String>) -> Self {
        self.vertex = source.into();
        self
    }

    pub fn fragment(mut self, source: impl Into<String>) -> Self {
        self.fragment = source.into();
        self
    }

    pub fn uniform(mut self, name: impl Into<String>, value: impl Into<UniformValue>) -> Self {
        self.uniforms.insert(name.into(), value.into());
        self
    }

    pub fn buffer(mut self, name: impl Into<String>, components: usize, data: Vec<f32>) -> Self {
        self.buffers.insert(name.into(), BufferSpec::new(components, data));
        self
    }

    pub fn camera(mut self, patch: CameraPatch) -> Self {
        self.camera = patch;
        self
    }

    pub fn texture(mut self, source: TextureSource) -> Self {
        self.texture = Some(source);
        self
    }

    pub fn clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    pub fn time_divisor(mut self, divisor: f64) -> Self {
        self.time_divisor = divisor;
        self
    }

    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut SurfaceState<H>, f64) + 'static,
    {
        self.on_update = Some(Box::new(f));
        self
    }

    pub fn on_resize<F>(mut self, f: F) -> Self
    where
        F: FnMut(&mut SurfaceState<H>, f32, f32, f32) + 'static,
    {
        self.on_resize = Some(Box::new(f));
        self
    }

    /// Built-in uniforms with the configured overrides applied.
    pub(crate) fn merged_uniforms(&self) -> BTreeMap<String, UniformValue> {
        let mut merged = default_uniforms();
        merged.extend(self.uniforms.iter().map(|(k, v)| (k.clone(), *v)));
        merged
    }

    /// Built-in buffers with the configured overrides applied.
    pub(crate) fn merged_buffers(&self) -> BTreeMap<String, BufferSpec> {
        let mut merged = default_buffers();
        merged.extend(self.buffers.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

fn default_uniforms() -> BTreeMap<String, UniformValue> {
    [
        ("time", UniformValue::Float(0.0)),
        ("hasTexture", UniformValue::Int(0)),
        ("resolution", UniformValue::Vec2([0.0, 0.0])),
        ("aspectRatio", UniformValue::Float(1.0)),
        ("mousemove", UniformValue::Vec2([0.0, 0.0])),
        ("projection", UniformValue::IDENTITY_MAT4),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_buffers() -> BTreeMap<String, BufferSpec> {
    [
        (POSITION_BUFFER, BufferSpec::new(3, Vec::new())),
        ("color", BufferSpec::new(4, Vec::new())),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
