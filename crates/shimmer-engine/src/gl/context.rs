use super::types::{BlendFactor, Capability, ClearMask, ShaderStage};

/// GL-style graphics context owned by exactly one surface.
///
/// Creation calls return `None` when the driver hands back no object. Compile
/// and link return the driver info log on failure. Uploads to a `None` location
/// are the caller's concern; the surface skips them.
pub trait GraphicsContext {
    type Shader: Clone + 'static;
    type Program: Clone + 'static;
    type Buffer: Clone + 'static;
    type Texture: Clone + 'static;
    type UniformLocation: Clone + 'static;

    // Shaders and programs
    fn create_shader(&mut self, stage: ShaderStage) -> Option<Self::Shader>;
    fn compile_shader(&mut self, shader: &Self::Shader, source: &str) -> Result<(), String>;
    fn delete_shader(&mut self, shader: &Self::Shader);

    fn create_program(&mut self) -> Option<Self::Program>;
    fn attach_shader(&mut self, program: &Self::Program, shader: &Self::Shader);
    fn link_program(&mut self, program: &Self::Program) -> Result<(), String>;
    fn use_program(&mut self, program: Option<&Self::Program>);
    fn delete_program(&mut self, program: &Self::Program);

    // Locations
    fn uniform_location(&mut self, program: &Self::Program, name: &str) -> Option<Self::UniformLocation>;
    fn attrib_location(&mut self, program: &Self::Program, name: &str) -> Option<u32>;

    // Typed uniform uploads
    fn uniform_1f(&mut self, location: &Self::UniformLocation, value: f32);
    fn uniform_1i(&mut self, location: &Self::UniformLocation, value: i32);
    fn uniform_2fv(&mut self, location: &Self::UniformLocation, value: &[f32; 2]);
    fn uniform_3fv(&mut self, location: &Self::UniformLocation, value: &[f32; 3]);
    fn uniform_4fv(&mut self, location: &Self::UniformLocation, value: &[f32; 4]);
    fn uniform_matrix_2fv(&mut self, location: &Self::UniformLocation, value: &[f32; 4]);
    fn uniform_matrix_3fv(&mut self, location: &Self::UniformLocation, value: &[f32; 9]);
    fn uniform_matrix_4fv(&mut self, location: &Self::UniformLocation, value: &[f32; 16]);

    // Array buffers
    fn create_buffer(&mut self) -> Option<Self::Buffer>;
    fn bind_array_buffer(&mut self, buffer: Option<&Self::Buffer>);
    /// Uploads to the currently bound array buffer.
    fn buffer_data(&mut self, data: &[f32]);
    fn enable_vertex_attrib(&mut self, index: u32);
    /// Tightly packed `f32` attribute reading `size` components per vertex.
    fn vertex_attrib_pointer(&mut self, index: u32, size: u32);
    fn delete_buffer(&mut self, buffer: &Self::Buffer);

    // 2D textures
    fn create_texture(&mut self) -> Option<Self::Texture>;
    fn bind_texture(&mut self, texture: Option<&Self::Texture>);
    /// Uploads RGBA8 pixels to the currently bound texture.
    fn tex_image_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]);
    fn generate_mipmap(&mut self);
    /// Starts loading an image into `texture`. Completion and failure are not
    /// reported; on failure the texture keeps whatever content it had.
    fn load_texture_image(&mut self, texture: &Self::Texture, source: &str);
    fn delete_texture(&mut self, texture: &Self::Texture);

    // State and draws
    fn enable(&mut self, capability: Capability);
    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor);
    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&mut self, rgba: [f32; 4]);
    fn clear(&mut self, mask: ClearMask);
    fn draw_points(&mut self, first: i32, count: i32);
}
