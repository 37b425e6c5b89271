//! Browser host.
//!
//! The surface gets a fresh `<canvas>` appended to a container element, a WebGL 1
//! context on it, `window` listeners for `resize`/`mousemove`, and frames from
//! `requestAnimationFrame`.

use std::collections::HashMap;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    HtmlCanvasElement, HtmlElement, HtmlImageElement, MouseEvent, WebGlBuffer,
    WebGlContextAttributes, WebGlProgram, WebGlRenderingContext as Gl, WebGlShader, WebGlTexture,
    WebGlUniformLocation, Window,
};

use crate::coords::Viewport;
use crate::gl::{BlendFactor, Capability, ClearMask, GraphicsContext, ShaderStage};
use crate::input::{EventKind, HostEvent, PointerMoveEvent};

use super::frames::FrameSlots;
use super::{ContextAttributes, EventHandler, FrameCallback, FrameHandle, Host, ListenerId};

type DomListener = Closure<dyn FnMut(web_sys::Event)>;
type FrameClosure = Closure<dyn FnMut(f64)>;

fn js_err(value: JsValue) -> anyhow::Error {
    anyhow!("{value:?}")
}

/// Host backed by the page's DOM.
pub struct WebHost {
    window: Window,
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    listeners: HashMap<ListenerId, (&'static str, DomListener)>,
    next_listener: u64,
    frames: FrameSlots<FrameClosure>,
}

impl WebHost {
    /// Creates a host rendering into a new canvas inside `container`.
    pub fn new(container: HtmlElement) -> Result<Self> {
        let window = web_sys::window().context("no global window")?;
        let document = window.document().context("window has no document")?;
        let canvas = document
            .create_element("canvas")
            .map_err(js_err)?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| anyhow!("created element is not a canvas"))?;

        Ok(Self {
            window,
            container,
            canvas,
            listeners: HashMap::new(),
            next_listener: 1,
            frames: FrameSlots::new(),
        })
    }

    /// Looks up the container by element id.
    pub fn from_element_id(id: &str) -> Result<Self> {
        let container = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .with_context(|| format!("no element with id `{id}`"))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| anyhow!("element `{id}` is not an HTML element"))?;
        Self::new(container)
    }

}

impl Host for WebHost {
    type Gl = WebGl;

    fn create_context(&mut self, attributes: ContextAttributes) -> Option<WebGl> {
        let options = WebGlContextAttributes::new();
        options.set_antialias(attributes.antialias);
        options.set_depth(attributes.depth);

        let context = match self.canvas.get_context_with_context_options("webgl", &options) {
            Ok(Some(context)) => context,
            Ok(None) => return None,
            Err(err) => {
                log::warn!("webgl context request failed: {err:?}");
                return None;
            }
        };

        context
            .dyn_into::<Gl>()
            .ok()
            .map(|gl| WebGl { gl, images: Vec::new() })
    }

    fn attach_canvas(&mut self) {
        if let Err(err) = self.container.append_child(&self.canvas) {
            log::warn!("failed to attach canvas: {err:?}");
        }
    }

    fn detach_canvas(&mut self) {
        if self.canvas.parent_node().is_some() {
            self.canvas.remove();
        }
    }

    fn layout_size(&self) -> Viewport {
        let rect = self.container.get_bounding_client_rect();
        Viewport::new(rect.width() as f32, rect.height() as f32)
    }

    fn device_pixel_ratio(&self) -> f32 {
        self.window.device_pixel_ratio() as f32
    }

    fn set_canvas_size(&mut self, physical: (u32, u32), logical: Viewport) {
        self.canvas.set_width(physical.0);
        self.canvas.set_height(physical.1);

        let style = self.canvas.style();
        let _ = style.set_property("width", &format!("{}px", logical.width));
        let _ = style.set_property("height", &format!("{}px", logical.height));
    }

    fn listen(&mut self, kind: EventKind, mut handler: EventHandler) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;

        let name = match kind {
            EventKind::Resize => "resize",
            EventKind::PointerMove => "mousemove",
        };

        let closure = DomListener::new(move |event: web_sys::Event| {
            let event = match kind {
                EventKind::Resize => HostEvent::Resize,
                EventKind::PointerMove => match event.dyn_ref::<MouseEvent>() {
                    Some(m) => HostEvent::PointerMove(PointerMoveEvent {
                        page_x: m.page_x() as f32,
                        page_y: m.page_y() as f32,
                    }),
                    None => return,
                },
            };
            handler(event);
        });

        if let Err(err) = self
            .window
            .add_event_listener_with_callback(name, closure.as_ref().unchecked_ref())
        {
            log::warn!("failed to add `{name}` listener: {err:?}");
        }

        self.listeners.insert(id, (name, closure));
        id
    }

    fn unlisten(&mut self, id: ListenerId) {
        let Some((name, closure)) = self.listeners.remove(&id) else {
            return;
        };
        let _ = self
            .window
            .remove_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
    }

    fn request_frame(&mut self, callback: FrameCallback) -> Option<FrameHandle> {
        let fired = self.frames.prepare();
        let done = Rc::clone(&fired);
        let mut callback = Some(callback);
        let closure = FrameClosure::new(move |timestamp: f64| {
            if let Some(callback) = callback.take() {
                callback(timestamp);
            }
            done.set(true);
        });

        match self
            .window
            .request_animation_frame(closure.as_ref().unchecked_ref())
        {
            Ok(id) => {
                let handle = FrameHandle(id as u64);
                self.frames.insert(handle, fired, closure);
                Some(handle)
            }
            Err(err) => {
                log::warn!("requestAnimationFrame failed: {err:?}");
                None
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let _ = self.window.cancel_animation_frame(handle.0 as i32);
        self.frames.cancel(handle);
    }

    fn now(&self) -> f64 {
        self.window.performance().map(|p| p.now()).unwrap_or(0.0)
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = self.listeners.keys().copied().collect();
        for id in ids {
            self.unlisten(id);
        }
        for handle in self.frames.pending() {
            self.cancel_frame(handle);
        }
    }
}

/// Image element whose `onload` uploads into `texture`.
struct PendingImage {
    texture: WebGlTexture,
    image: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
}

impl Drop for PendingImage {
    fn drop(&mut self) {
        self.image.set_onload(None);
    }
}

/// WebGL 1 context.
pub struct WebGl {
    gl: Gl,
    images: Vec<PendingImage>,
}

fn blend_factor(f: BlendFactor) -> u32 {
    match f {
        BlendFactor::SrcAlpha => Gl::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => Gl::ONE_MINUS_SRC_ALPHA,
    }
}

impl GraphicsContext for WebGl {
    type Shader = WebGlShader;
    type Program = WebGlProgram;
    type Buffer = WebGlBuffer;
    type Texture = WebGlTexture;
    type UniformLocation = WebGlUniformLocation;

    fn create_shader(&mut self, stage: ShaderStage) -> Option<WebGlShader> {
        let ty = match stage {
            ShaderStage::Vertex => Gl::VERTEX_SHADER,
            ShaderStage::Fragment => Gl::FRAGMENT_SHADER,
        };
        self.gl.create_shader(ty)
    }

    fn compile_shader(&mut self, shader: &WebGlShader, source: &str) -> std::result::Result<(), String> {
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);

        let ok = self
            .gl
            .get_shader_parameter(shader, Gl::COMPILE_STATUS)
            .as_bool()
            .unwrap_or(false);
        if ok {
            Ok(())
        } else {
            Err(self
                .gl
                .get_shader_info_log(shader)
                .unwrap_or_else(|| "unknown shader compile error".to_string()))
        }
    }

    fn delete_shader(&mut self, shader: &WebGlShader) {
        self.gl.delete_shader(Some(shader));
    }

    fn create_program(&mut self) -> Option<WebGlProgram> {
        self.gl.create_program()
    }

    fn attach_shader(&mut self, program: &WebGlProgram, shader: &WebGlShader) {
        self.gl.attach_shader(program, shader);
    }

    fn link_program(&mut self, program: &WebGlProgram) -> std::result::Result<(), String> {
        self.gl.link_program(program);

        let ok = self
            .gl
            .get_program_parameter(program, Gl::LINK_STATUS)
            .as_bool()
            .unwrap_or(false);
        if ok {
            Ok(())
        } else {
            Err(self
                .gl
                .get_program_info_log(program)
                .unwrap_or_else(|| "unknown program link error".to_string()))
        }
    }

    fn use_program(&mut self, program: Option<&WebGlProgram>) {
        self.gl.use_program(program);
    }

    fn delete_program(&mut self, program: &WebGlProgram) {
        self.gl.delete_program(Some(program));
    }

    fn uniform_location(&mut self, program: &WebGlProgram, name: &str) -> Option<WebGlUniformLocation> {
        self.gl.get_uniform_location(program, name)
    }

    fn attrib_location(&mut self, program: &WebGlProgram, name: &str) -> Option<u32> {
        u32::try_from(self.gl.get_attrib_location(program, name)).ok()
    }

    fn uniform_1f(&mut self, location: &WebGlUniformLocation, value: f32) {
        self.gl.uniform1f(Some(location), value);
    }

    fn uniform_1i(&mut self, location: &WebGlUniformLocation, value: i32) {
        self.gl.uniform1i(Some(location), value);
    }

    fn uniform_2fv(&mut self, location: &WebGlUniformLocation, value: &[f32; 2]) {
        self.gl.uniform2fv_with_f32_array(Some(location), value);
    }

    fn uniform_3fv(&mut self, location: &WebGlUniformLocation, value: &[f32; 3]) {
        self.gl.uniform3fv_with_f32_array(Some(location), value);
    }

    fn uniform_4fv(&mut self, location: &WebGlUniformLocation, value: &[f32; 4]) {
        self.gl.uniform4fv_with_f32_array(Some(location), value);
    }

    fn uniform_matrix_2fv(&mut self, location: &WebGlUniformLocation, value: &[f32; 4]) {
        self.gl.uniform_matrix2fv_with_f32_array(Some(location), false, value);
    }

    fn uniform_matrix_3fv(&mut self, location: &WebGlUniformLocation, value: &[f32; 9]) {
        self.gl.uniform_matrix3fv_with_f32_array(Some(location), false, value);
    }

    fn uniform_matrix_4fv(&mut self, location: &WebGlUniformLocation, value: &[f32; 16]) {
        self.gl.uniform_matrix4fv_with_f32_array(Some(location), false, value);
    }

    fn create_buffer(&mut self) -> Option<WebGlBuffer> {
        self.gl.create_buffer()
    }

    fn bind_array_buffer(&mut self, buffer: Option<&WebGlBuffer>) {
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, buffer);
    }

    fn buffer_data(&mut self, data: &[f32]) {
        self.gl
            .buffer_data_with_u8_array(Gl::ARRAY_BUFFER, bytemuck::cast_slice(data), Gl::STATIC_DRAW);
    }

    fn enable_vertex_attrib(&mut self, index: u32) {
        self.gl.enable_vertex_attrib_array(index);
    }

    fn vertex_attrib_pointer(&mut self, index: u32, size: u32) {
        self.gl
            .vertex_attrib_pointer_with_i32(index, size as i32, Gl::FLOAT, false, 0, 0);
    }

    fn delete_buffer(&mut self, buffer: &WebGlBuffer) {
        self.gl.delete_buffer(Some(buffer));
    }

    fn create_texture(&mut self) -> Option<WebGlTexture> {
        self.gl.create_texture()
    }

    fn bind_texture(&mut self, texture: Option<&WebGlTexture>) {
        self.gl.bind_texture(Gl::TEXTURE_2D, texture);
    }

    fn tex_image_rgba8(&mut self, width: u32, height: u32, pixels: &[u8]) {
        let result = self
            .gl
            .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                Gl::TEXTURE_2D,
                0,
                Gl::RGBA as i32,
                width as i32,
                height as i32,
                0,
                Gl::RGBA,
                Gl::UNSIGNED_BYTE,
                Some(pixels),
            );
        if let Err(err) = result {
            log::warn!("texture upload failed: {err:?}");
        }
    }

    fn generate_mipmap(&mut self) {
        self.gl.generate_mipmap(Gl::TEXTURE_2D);
    }

    fn load_texture_image(&mut self, texture: &WebGlTexture, source: &str) {
        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(err) => {
                log::warn!("cannot create image element: {err:?}");
                return;
            }
        };

        let gl = self.gl.clone();
        let target = texture.clone();
        let loaded = image.clone();
        let onload = Closure::<dyn FnMut()>::new(move || {
            gl.bind_texture(Gl::TEXTURE_2D, Some(&target));
            let result = gl.tex_image_2d_with_u32_and_u32_and_image(
                Gl::TEXTURE_2D,
                0,
                Gl::RGBA as i32,
                Gl::RGBA,
                Gl::UNSIGNED_BYTE,
                &loaded,
            );
            match result {
                Ok(()) => gl.generate_mipmap(Gl::TEXTURE_2D),
                Err(err) => log::warn!("texture image upload failed: {err:?}"),
            }
        });

        image.set_cross_origin(Some("anonymous"));
        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        image.set_src(source);

        self.images.push(PendingImage {
            texture: texture.clone(),
            image,
            _onload: onload,
        });
    }

    fn delete_texture(&mut self, texture: &WebGlTexture) {
        self.images.retain(|pending| pending.texture != *texture);
        self.gl.delete_texture(Some(texture));
    }

    fn enable(&mut self, capability: Capability) {
        let cap = match capability {
            Capability::Blend => Gl::BLEND,
            Capability::DepthTest => Gl::DEPTH_TEST,
        };
        self.gl.enable(cap);
    }

    fn blend_func(&mut self, src: BlendFactor, dst: BlendFactor) {
        self.gl.blend_func(blend_factor(src), blend_factor(dst));
    }

    fn viewport(&mut self, x: i32, y: i32, width: i32, height: i32) {
        self.gl.viewport(x, y, width, height);
    }

    fn clear_color(&mut self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        self.gl.clear_color(r, g, b, a);
    }

    fn clear(&mut self, mask: ClearMask) {
        let mut bits = 0;
        if mask.color {
            bits |= Gl::COLOR_BUFFER_BIT;
        }
        if mask.depth {
            bits |= Gl::DEPTH_BUFFER_BIT;
        }
        self.gl.clear(bits);
    }

    fn draw_points(&mut self, first: i32, count: i32) {
        self.gl.draw_arrays(Gl::POINTS, first, count);
    }
}
