use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::coords::Viewport;
use crate::gl::{BlendFactor, Capability, ClearMask, GraphicsContext, ShaderStage};
use crate::host::{FrameCallback, FrameHandle, Host, ListenerId};
use crate::input::HostEvent;
use crate::time::FrameClock;

use super::buffer::{position_vertex_count, BufferBinding, POSITION_BUFFER};
use super::camera::CameraConfig;
use super::config::{BufferSpec, ResizeCallback, TextureSource, UpdateCallback};
use super::error::SurfaceError;
use super::uniform::{UniformBinding, UniformValue};

type Gl<H> = <H as Host>::Gl;
type ShaderOf<H> = <Gl<H> as GraphicsContext>::Shader;
type ProgramOf<H> = <Gl<H> as GraphicsContext>::Program;
type BufferOf<H> = <Gl<H> as GraphicsContext>::Buffer;
type TextureOf<H> = <Gl<H> as GraphicsContext>::Texture;
type LocationOf<H> = <Gl<H> as GraphicsContext>::UniformLocation;

/// Everything a surface owns: host, context, handles, bindings and callbacks.
///
/// Callbacks receive `&mut SurfaceState` so they can write uniforms and buffers
/// from inside the frame loop.
pub struct SurfaceState<H: Host> {
    pub(super) host: H,
    gl: Gl<H>,

    shaders: Vec<ShaderOf<H>>,
    program: Option<ProgramOf<H>>,
    texture: Option<TextureOf<H>>,
    uniforms: BTreeMap<String, UniformBinding<LocationOf<H>>>,
    buffers: BTreeMap<String, BufferBinding<BufferOf<H>>>,

    camera: CameraConfig,
    size: Viewport,
    device_pixel_ratio: f32,
    vertex_count: usize,
    clear_color: [f32; 4],
    depth_test: bool,

    clock: FrameClock,
    /// Pending frame. Shared with the frame callback, which clears it before it
    /// borrows the state.
    frame: Rc<Cell<Option<FrameHandle>>>,
    pub(super) listeners: Vec<ListenerId>,
    pub(super) me: Weak<RefCell<SurfaceState<H>>>,

    on_update: Option<UpdateCallback<H>>,
    on_resize: Option<ResizeCallback<H>>,
    destroyed: bool,
}

/// Construction inputs consumed by `SurfaceState::setup`.
pub(super) struct Setup<'a> {
    pub vertex: &'a str,
    pub fragment: &'a str,
    pub uniforms: BTreeMap<String, UniformValue>,
    pub buffers: BTreeMap<String, BufferSpec>,
    pub texture: Option<&'a TextureSource>,
}

impl<H: Host> SurfaceState<H> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        host: H,
        gl: Gl<H>,
        camera: CameraConfig,
        clear_color: [f32; 4],
        depth_test: bool,
        clock: FrameClock,
        on_update: Option<UpdateCallback<H>>,
        on_resize: Option<ResizeCallback<H>>,
    ) -> Self {
        Self {
            host,
            gl,
            shaders: Vec::new(),
            program: None,
            texture: None,
            uniforms: BTreeMap::new(),
            buffers: BTreeMap::new(),
            camera,
            size: Viewport::default(),
            device_pixel_ratio: 1.0,
            vertex_count: 0,
            clear_color,
            depth_test,
            clock,
            frame: Rc::new(Cell::new(None)),
            listeners: Vec::new(),
            me: Weak::new(),
            on_update,
            on_resize,
            destroyed: false,
        }
    }

    // ── setup ─────────────────────────────────────────────────────────────

    /// Builds program, bindings and texture. On error the caller tears down
    /// whatever was allocated.
    pub(super) fn setup(&mut self, setup: Setup<'_>) -> Result<(), SurfaceError> {
        self.gl.enable(Capability::Blend);
        self.gl.blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        if self.depth_test {
            self.gl.enable(Capability::DepthTest);
        }

        let program = self.build_program(setup.vertex, setup.fragment)?;
        self.bind_uniforms(&program, setup.uniforms);
        self.bind_buffers(&program, setup.buffers)?;

        if let Some(source) = setup.texture {
            self.bind_texture(source)?;
        }

        log::debug!(
            "surface ready: {} uniforms, {} buffers, {} vertices",
            self.uniforms.len(),
            self.buffers.len(),
            self.vertex_count
        );
        Ok(())
    }

    fn compile(&mut self, stage: ShaderStage, source: &str) -> Result<ShaderOf<H>, SurfaceError> {
        let shader = self
            .gl
            .create_shader(stage)
            .ok_or(SurfaceError::ResourceCreation { resource: "shader" })?;
        self.shaders.push(shader.clone());

        self.gl
            .compile_shader(&shader, source)
            .map_err(|log| SurfaceError::ShaderCompile { stage, log })?;
        Ok(shader)
    }

    fn build_program(&mut self, vertex: &str, fragment: &str) -> Result<ProgramOf<H>, SurfaceError> {
        let vs = self.compile(ShaderStage::Vertex, vertex)?;
        let fs = self.compile(ShaderStage::Fragment, fragment)?;

        let program = self
            .gl
            .create_program()
            .ok_or(SurfaceError::ResourceCreation { resource: "program" })?;
        self.program = Some(program.clone());

        self.gl.attach_shader(&program, &vs);
        self.gl.attach_shader(&program, &fs);
        self.gl
            .link_program(&program)
            .map_err(|log| SurfaceError::ProgramLink { log })?;
        self.gl.use_program(Some(&program));

        // The linked program keeps its own copy of the stages.
        for shader in self.shaders.drain(..) {
            self.gl.delete_shader(&shader);
        }

        Ok(program)
    }

    fn bind_uniforms(&mut self, program: &ProgramOf<H>, uniforms: BTreeMap<String, UniformValue>) {
        for (name, value) in uniforms {
            let mut binding = UniformBinding::new(value);
            binding.location = self.gl.uniform_location(program, &format!("u_{name}"));

            match &binding.location {
                Some(location) => value.upload(&mut self.gl, location),
                None => log::debug!("uniform `{name}` is not active in the program"),
            }

            self.uniforms.insert(name, binding);
        }
    }

    fn bind_buffers(
        &mut self,
        program: &ProgramOf<H>,
        buffers: BTreeMap<String, BufferSpec>,
    ) -> Result<(), SurfaceError> {
        for (name, spec) in buffers {
            let (len, components) = (spec.data.len(), spec.components);
            let mut binding = BufferBinding::new(components, spec.data).ok_or_else(|| {
                SurfaceError::BufferShape { name: name.clone(), len, components }
            })?;

            let handle = self
                .gl
                .create_buffer()
                .ok_or(SurfaceError::ResourceCreation { resource: "buffer" })?;

            binding.attrib = self.gl.attrib_location(program, &format!("a_{name}"));
            self.gl.bind_array_buffer(Some(&handle));
            if let Some(index) = binding.attrib {
                self.gl.enable_vertex_attrib(index);
                self.gl.vertex_attrib_pointer(index, components as u32);
            }
            binding.handle = Some(handle);

            upload_buffer(&mut self.gl, &binding);
            if name == POSITION_BUFFER {
                self.vertex_count = position_vertex_count(binding.data().len());
            }

            self.buffers.insert(name, binding);
        }

        self.gl.bind_array_buffer(None);
        Ok(())
    }

    fn bind_texture(&mut self, source: &TextureSource) -> Result<(), SurfaceError> {
        let texture = self
            .gl
            .create_texture()
            .ok_or(SurfaceError::ResourceCreation { resource: "texture" })?;
        self.texture = Some(texture.clone());

        // Transparent placeholder until real pixels arrive.
        self.gl.bind_texture(Some(&texture));
        self.gl.tex_image_rgba8(1, 1, &[0, 0, 0, 0]);

        match source {
            TextureSource::Image(src) => self.gl.load_texture_image(&texture, src),
            TextureSource::Rgba { width, height, pixels } => {
                let expected = *width as usize * *height as usize * 4;
                if pixels.len() == expected {
                    self.gl.tex_image_rgba8(*width, *height, pixels);
                    self.gl.generate_mipmap();
                } else {
                    log::warn!(
                        "texture pixels ignored: {}x{} needs {expected} bytes, got {}",
                        width,
                        height,
                        pixels.len()
                    );
                }
            }
        }

        self.write_builtin("hasTexture", UniformValue::Int(1));
        Ok(())
    }

    // ── uniforms ──────────────────────────────────────────────────────────

    /// Last value written to `name`.
    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.uniforms.get(name).map(|b| b.value())
    }

    /// Stores `value` and pushes it to the program.
    ///
    /// Unregistered names are ignored. A value of another kind than the one
    /// registered is rejected and nothing is uploaded.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<(), SurfaceError> {
        let value = value.into();
        let Some(binding) = self.uniforms.get_mut(name) else {
            log::trace!("ignoring write to unknown uniform `{name}`");
            return Ok(());
        };

        binding
            .store(value)
            .map_err(|expected| SurfaceError::UniformKindMismatch {
                name: name.to_string(),
                expected,
                found: value.kind(),
            })?;

        if let Some(location) = &binding.location {
            value.upload(&mut self.gl, location);
        }
        Ok(())
    }

    fn write_builtin(&mut self, name: &str, value: UniformValue) {
        if let Err(err) = self.set_uniform(name, value) {
            log::trace!("built-in write skipped: {err}");
        }
    }

    // ── buffers ───────────────────────────────────────────────────────────

    pub fn buffer(&self, name: &str) -> Option<&[f32]> {
        self.buffers.get(name).map(|b| b.data())
    }

    /// Replaces the data of `name` and re-uploads it.
    ///
    /// Unregistered names are ignored. Writing `position` also updates the
    /// vertex count.
    pub fn set_buffer(&mut self, name: &str, data: Vec<f32>) -> Result<(), SurfaceError> {
        let Some(binding) = self.buffers.get_mut(name) else {
            log::trace!("ignoring write to unknown buffer `{name}`");
            return Ok(());
        };

        let components = binding.components();
        binding.store(data).map_err(|data| SurfaceError::BufferShape {
            name: name.to_string(),
            len: data.len(),
            components,
        })?;

        if upload_buffer(&mut self.gl, binding) {
            self.gl.bind_array_buffer(None);
        }

        if name == POSITION_BUFFER {
            self.vertex_count = position_vertex_count(binding.data().len());
        }
        Ok(())
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Logical size from the last resize.
    pub fn size(&self) -> Viewport {
        self.size
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.camera.aspect
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    pub fn camera(&self) -> CameraConfig {
        self.camera
    }

    pub fn is_running(&self) -> bool {
        self.frame.get().is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    // ── resize / input ────────────────────────────────────────────────────

    /// Re-reads the container box and updates canvas, viewport and uniforms.
    pub fn resize(&mut self) {
        if self.destroyed {
            return;
        }

        let size = self.host.layout_size();
        let dpr = self.host.device_pixel_ratio();
        let (pw, ph) = size.physical_size(dpr);

        self.size = size;
        self.device_pixel_ratio = dpr;

        self.host.set_canvas_size((pw, ph), size);
        self.gl.viewport(0, 0, pw as i32, ph as i32);
        self.gl.clear_color(self.clear_color);

        self.camera.aspect = size.aspect_ratio();
        self.write_builtin("resolution", UniformValue::Vec2([size.width, size.height]));
        self.write_builtin("aspectRatio", UniformValue::Float(self.camera.aspect));
        self.update_projection();

        log::debug!("resized to {}x{} @{dpr}x", size.width, size.height);

        if let Some(mut cb) = self.on_resize.take() {
            cb(self, size.width, size.height, dpr);
            self.on_resize.get_or_insert(cb);
        }
    }

    fn update_projection(&mut self) {
        let m = self.camera.projection(self.size.width, self.size.height);
        self.write_builtin("projection", UniformValue::Mat4(m));
    }

    pub(super) fn handle_event(&mut self, event: HostEvent) {
        if self.destroyed {
            return;
        }
        match event {
            HostEvent::Resize => self.resize(),
            HostEvent::PointerMove(ev) => {
                self.write_builtin("mousemove", UniformValue::Vec2(ev.to_clip(self.size)));
            }
        }
    }

    // ── frame loop ────────────────────────────────────────────────────────

    /// Requests the next frame unless one is pending or the surface is destroyed.
    pub(super) fn schedule_frame(&mut self) {
        if self.destroyed || self.frame.get().is_some() {
            return;
        }
        let handle = self
            .host
            .request_frame(frame_callback(self.me.clone(), Rc::clone(&self.frame)));
        if handle.is_none() {
            log::warn!("host refused a frame request; render loop stopped");
        }
        self.frame.set(handle);
    }

    fn run_frame(&mut self, now: f64) {
        if self.destroyed {
            return;
        }

        let ft = self.clock.tick(now);
        self.write_builtin("time", UniformValue::Float(ft.elapsed as f32));

        if self.vertex_count > 0 {
            let mask = if self.depth_test {
                ClearMask::COLOR_DEPTH
            } else {
                ClearMask::COLOR
            };
            self.gl.clear(mask);
            self.gl.draw_points(0, self.vertex_count as i32);
        }

        log::trace!("frame {} dt={:.2}ms", ft.frame_index, ft.delta_ms);

        if let Some(mut cb) = self.on_update.take() {
            cb(self, ft.delta_ms);
            self.on_update.get_or_insert(cb);
        }

        self.schedule_frame();
    }

    // ── teardown ──────────────────────────────────────────────────────────

    /// Stops the frame loop, drops listeners, releases every GL object and
    /// detaches the canvas.
    ///
    /// Each step runs on its own; handles are taken as they are released, so a
    /// second call finds nothing left to release.
    pub fn destroy(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.host.cancel_frame(handle);
        }

        for id in self.listeners.drain(..) {
            self.host.unlisten(id);
        }

        for shader in self.shaders.drain(..) {
            self.gl.delete_shader(&shader);
        }

        for binding in self.buffers.values_mut() {
            if let Some(handle) = binding.handle.take() {
                self.gl.delete_buffer(&handle);
            }
            binding.attrib = None;
        }

        if let Some(texture) = self.texture.take() {
            self.gl.delete_texture(&texture);
        }

        for binding in self.uniforms.values_mut() {
            binding.location = None;
        }

        if let Some(program) = self.program.take() {
            self.gl.use_program(None);
            self.gl.delete_program(&program);
        }

        if !self.destroyed {
            self.host.detach_canvas();
            log::debug!("surface destroyed");
        }

        self.vertex_count = 0;
        self.destroyed = true;
    }
}

/// Uploads the binding's data through its own handle. `false` when unallocated.
fn upload_buffer<G: GraphicsContext>(gl: &mut G, binding: &BufferBinding<G::Buffer>) -> bool {
    let Some(handle) = &binding.handle else {
        return false;
    };
    gl.bind_array_buffer(Some(handle));
    gl.buffer_data(binding.data());
    true
}

fn frame_callback<H: Host>(
    me: Weak<RefCell<SurfaceState<H>>>,
    slot: Rc<Cell<Option<FrameHandle>>>,
) -> FrameCallback {
    Box::new(move |now| {
        // This frame is spent whether or not it runs.
        slot.set(None);

        let Some(shared) = me.upgrade() else {
            return;
        };
        let Ok(mut state) = shared.try_borrow_mut() else {
            log::warn!("frame callback re-entered a busy surface; rescheduled on release");
            return;
        };
        state.run_frame(now);
    })
}
