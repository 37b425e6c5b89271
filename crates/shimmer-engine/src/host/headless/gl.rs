use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Context;

use crate::gl::{BlendFactor, Capability, ClearMask, GraphicsContext, ShaderStage};

use super::Shared;

/// One recorded graphics call. Object ids are assigned per context, starting at 1.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader { id: u32, stage: ShaderStage },
    CompileShader { id: u32 },
    DeleteShader { id: u32 },
    CreateProgram { id: u32 },
    AttachShader { program: u32, shader: u32 },
    LinkProgram { id: u32 },
    UseProgram { id: Option<u32> },
    DeleteProgram { id: u32 },

    Uniform1f { location: u32, value: f32 },
    Uniform1i { location: u32, value: i32 },
    Uniform2fv { location: u32, value: [f32; 2] },
    Uniform3fv { location: u32, value: [f32; 3] },
    Uniform4fv { location: u32, value: [f32; 4] },
    UniformMatrix2fv { location: u32, value: [f32; 4] },
    UniformMatrix3fv { location: u32, value: [f32; 9] },
    UniformMatrix4fv { location: u32, value: [f32; 16] },

    CreateBuffer { id: u32 },
    BindArrayBuffer { id: Option<u32> },
    BufferData { bytes: usize },
    EnableVertexAttrib { index: u32 },
    VertexAttribPointer { index: u32, size: u32 },
    DeleteBuffer { id: u32 },

    CreateTexture { id: u32 },
    BindTexture { id: Option<u32> },
    TexImage { width: u32, height: u32 },
    GenerateMipmap,
    DeleteTexture { id: u32 },

    Enable(Capability),
    BlendFunc { src: BlendFactor, dst: BlendFactor },
    Viewport { x: i32, y: i32, width: i32, height: i32 },
    ClearColor([f32; 4]),
    Clear(ClearMask),
    DrawPoints { first: i32, count: i32 },
}

impl GlCall {
    /// True for the typed uniform upload calls.
    pub fn is_uniform_upload(&self) -> bool {
        matches!(
            self,
            GlCall::Uniform1f { .. }
                | GlCall::Uniform1i { .. }
                | GlCall::Uniform2fv { .. }
                | GlCall::Uniform3fv { .. }
                | GlCall::Uniform4fv { .. }
                | GlCall::UniformMatrix2fv { .. }
                | GlCall::UniformMatrix3fv { .. }
                | GlCall::UniformMatrix4fv { .. }
        )
    }

    /// Location targeted by a uniform upload.
    pub fn uniform_location(&self) -> Option<u32> {
        match self {
            GlCall::Uniform1f { location, .. }
            | GlCall::Uniform1i { location, .. }
            | GlCall::Uniform2fv { location, .. }
            | GlCall::Uniform3fv { location, .. }
            | GlCall::Uniform4fv { location, .. }
            | GlCall::UniformMatrix2fv { location, .. }
            | GlCall::UniformMatrix3fv { location, .. }
            | GlCall::UniformMatrix4fv { location, .. } => Some(*location),
            _ => None,
        }
    }
}

/// Recording graphics context.
///
/// Every call is appended to the host's command log. Every uniform and attribute
/// name resolves; locations are stable per name for the life of the context.
pub struct HeadlessGl {
    shared: Rc<RefCell<Shared>>,
    next_id: u32,
    shader_stages: HashMap<u32, ShaderStage>,
    uniform_locations: HashMap<String, u32>,
    attrib_locations: HashMap<String, u32>,
}

impl HeadlessGl {
    pub(super) fn new(shared: Rc<RefCell<Shared>>) -> Self {
        Self {
            shared,
            next_id: 1,
            shader_stages: HashMap::new(),
            uniform_locations: HashMap::new(),
            attrib_locations: HashMap::new(),
        }
    }

    fn record(&self, call: GlCall) {
        self.shared.borrow_mut().calls.push(call);
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn refuses(&self, resource: &str) -> bool {
        self.shared.borrow().faults.refuse.iter().any(|r| *r == resource)
    }
}

impl GraphicsContext for HeadlessGl {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type Texture = u32;
    type UniformLocation = u32;

    fn create_shader(&mut self, stage: ShaderStage) -> Option<u32> {
        if self.refuses("shader") {
            return None;
        }
        let id = self.alloc();
        self.shader_stages.insert(id, stage);
        self.record(GlCall::CreateShader { id, stage });
        Some(id)
    }

    fn compile_shader(&mut self, shader: &u32, source: &str) -> Result<(), String> {
        self.record(GlCall::CompileShader { id: *shader });

        let injected = self
            .shader_stages
            .get(shader)
            .and_then(|stage| self.shared.borrow().faults.compile.get(stage).cloned());
        if let Some(log) = injected {
            return Err(log);
        }
        if source.trim().is_empty() {
            return Err("ERROR: 0:0: empty shader source".to_string());
        }
        Ok(())
    }

    fn delete_shader(&mut self, shader: &u32) {
        self.record(GlCall::DeleteShader { id: *shader });
    }

    fn create_program(&mut self) -> Option<u32> {
        if self.refuses("program") {
            return None;
        }
        let id = self.alloc();
        self.record(GlCall::CreateProgram { id });
        Some(id)
    }

    fn attach_shader(&mut self, program: &u32, shader: &u32) {
        self.record(GlCall::AttachShader { program: *program, shader: *shader });
    }

    fn link_program(&mut self, program: &u32) -> Result<(), String> {
        self.record(GlCall::LinkProgram { id: *program });
        match self.shared.borrow().faults.link.clone() {
            Some(log) => Err(log),
            None => Ok(()),
        }
    }

    fn use_program(&mut self, program: Option<&u32>) {
        self.record(GlCall::UseProgram { id: program.copied() });
    }

    fn delete_program(&mut self, program: &u32) {
        self.record(GlCall::DeleteProgram { id: *program });
    }

    fn uniform_location(&mut self, _program: &u32, name: &str) -> Option<u32> {
        let next = self.uniform_locations.len() as u32;
        Some(*self.uniform_locations.entry(name.to_string()).or_insert(next))
    }

    fn attrib_location(&mut self, _program: &u32, name: &str) -> Option<u32> {
        let next = self.attrib_locations.len() as u32;
        Some(*self.attrib_locations.entry(name.to_string()).or_insert(next))
    }

    fn uniform_1f(&mut self, location: &u32, value: f32) {
        self.record(GlCall::Uniform1f { location: *location, value });
    }

    fn uniform_1i(&mut self, location: &u32, value: i32) {
        self.record(GlCall::Uniform1i { location: *location, value });
    }

    fn uniform_2fv(&mut self, location: &u32, value: &[f32; 2]) {
        self.record(GlCall::Uniform2fv { location: *location, value: *value });
    }

    fn uniform_3fv(&mut self, location: &u32, value: &[f32; 3]) {
        self.record(GlCall::Uniform3fv { location: *location, value: *value });
    }

    fn uniform_4fv(&mut self, location: &u32, value: &[f32; 4]) {
        self.record(GlCall::Uniform4fv { location: *location, value: *value });
    }

    fn uniform_matrix_2fv(&mut self, location: &u32, value: &[f32; 4]) {
        self.record(GlCall::UniformMatrix2fv { location: *location, value: *value });
    }

    fn uniform_matrix_3fv(&mut self, location: &u32, value: &[f32; 9]) {
        self.record(GlCall::UniformMatrix3fv { location: *location, value: *value });
    }

    fn uniform_matrix_4fv(&mut self, location: &u32, value: &[f32; 16]) {
        self.record(GlCall::UniformMatrix4fv { location: *location, value: *value });
    }

    fn create_buffer(&mut self) -> Option<u32> {
        if self.refuses("buffer") {
            return None;
        }
        let id = self.alloc();
        self.record(GlCall::CreateBuffer { id });
        Some(id)
    }

    fn bind_array_buffer(&mut self, buffer: Option<&u32>) {
        self.record(GlCall::BindArrayBuffer { id: buffer.copied() });
    }

    fn buffer_data(&mut self, data: &[f32]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.record(GlCall::BufferData { bytes: bytes.len() });
    }

    fn enable_vertex_attrib(&mut self, index: u32) {
        self.record(GlCall::EnableVertexAttrib { index });
    }

    fn vertex_attrib_pointer(&mut self, index: u32, size: u32) {
        self.record(GlCall::VertexAttribPointer { index, size });
    }

    fn delete_buffer(&mut self, buffer: &u32) {
        self.record(GlCall::DeleteBuffer { id: *buffer });
    }

    fn create_texture(&mut self) -> Option<u32> {
        if self.refuses("texture") {
            return None;
        }
        let id = self.alloc();
        self.record(GlCall::CreateTexture { id });
        Some(id)
    }

    fn bind_texture(&mut self, texture: Option<&u32>) {
        self.record(GlCall::BindTexture { id: texture.copied() });
    }

    fn tex_image_rgba8(&mut self, width: u32, height: u32, _pixels: &[u8]) {
        self.record(GlCall::TexImage { width, height });
    }

    fn generate_mipmap(&mut self) {
        self.record(GlCall::GenerateMipmap);
    }

    fn load_texture_image(&mut self, texture: &u32, source: &str) {
        match decode_rgba(source) {
            Ok((width, height, pixels)) => {
                self.bind_texture(Some(texture));
                self.tex_image_rgba8(width, height, &pixels);
                self.generate_mipmap();
            }
            Err(err) => log::warn!("texture image not loaded: {err:#}"),
        }
    }

    fn delete_texture(&mut self, texture: &u32) {
        self.record(GlCall::DeleteTexture { id: *texture });
    }

    fn enable(&mut self, capability: Capability) {
        self.record(GlCall::Enable(capability));
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.record(GlCall::BlendFunc { src, dst });
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport { x, y, width, height });
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        self.record(GlCall::ClearColor(rgba));
    }

    fn clear(&mut self, mask: ClearMask) {
        self.record(GlCall::Clear(mask));
    }

    fn draw_points(&mut self, first: i32, count: i32) {
        self.record(GlCall::DrawPoints { first, count });
    }
}

fn decode_rgba(path: &str) -> anyhow::Result<(u32, u32, Vec<u8>)> {
    let img = image::open(path)
        .with_context(|| format!("failed to decode image `{path}`"))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    Ok((w, h, img.into_raw()))
}
