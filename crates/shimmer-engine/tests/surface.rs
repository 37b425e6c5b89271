use std::cell::{Cell, RefCell};
use std::rc::Rc;

use shimmer_engine::coords::Viewport;
use shimmer_engine::gl::{Capability, ClearMask, ShaderStage};
use shimmer_engine::host::headless::{GlCall, HeadlessConfig, HeadlessDriver, HeadlessHost};
use shimmer_engine::input::{HostEvent, PointerMoveEvent};
use shimmer_engine::surface::{orthographic, perspective, CameraPatch, TextureSource};
use shimmer_engine::{RenderSurface, SurfaceConfig, SurfaceError, UniformValue};

type Config = SurfaceConfig<HeadlessHost>;

fn host(width: f32, height: f32, dpr: f32) -> (HeadlessHost, HeadlessDriver) {
    let host = HeadlessHost::new(HeadlessConfig {
        layout: Viewport::new(width, height),
        device_pixel_ratio: dpr,
        start_time: 0.0,
    });
    let driver = host.driver();
    (host, driver)
}

fn surface(config: Config) -> (RenderSurface<HeadlessHost>, HeadlessDriver) {
    let (host, driver) = host(800.0, 600.0, 1.0);
    let surface = RenderSurface::new(host, config).expect("surface");
    (surface, driver)
}

fn count(calls: &[GlCall], pred: impl Fn(&GlCall) -> bool) -> usize {
    calls.iter().filter(|c| pred(c)).count()
}

fn mat4(value: Option<UniformValue>) -> [f32; 16] {
    match value {
        Some(UniformValue::Mat4(m)) => m,
        other => panic!("expected mat4, got {other:?}"),
    }
}

// ── uniforms ──────────────────────────────────────────────────────────────

#[test]
fn every_uniform_kind_round_trips_with_one_typed_upload() {
    let config = Config::new()
        .uniform("f", 0.0f32)
        .uniform("i", 0i32)
        .uniform("v2", [0.0f32; 2])
        .uniform("v3", [0.0f32; 3])
        .uniform("v4", [0.0f32; 4])
        .uniform("m2", UniformValue::Mat2([0.0; 4]))
        .uniform("m3", UniformValue::Mat3([0.0; 9]))
        .uniform("m4", UniformValue::Mat4([0.0; 16]));
    let (surface, driver) = surface(config);

    let writes = [
        ("f", UniformValue::Float(1.5)),
        ("i", UniformValue::Int(7)),
        ("v2", UniformValue::Vec2([1.0, 2.0])),
        ("v3", UniformValue::Vec3([1.0, 2.0, 3.0])),
        ("v4", UniformValue::Vec4([1.0, 2.0, 3.0, 4.0])),
        ("m2", UniformValue::Mat2([1.0, 0.0, 0.0, 1.0])),
        ("m3", UniformValue::Mat3([2.0; 9])),
        ("m4", UniformValue::Mat4([3.0; 16])),
    ];

    for (name, value) in writes {
        driver.clear_calls();
        surface.set_uniform(name, value).unwrap();
        assert_eq!(surface.uniform(name), Some(value), "{name}");

        let calls = driver.calls();
        assert_eq!(calls.len(), 1, "{name}: {calls:?}");
        let matched = match (value, &calls[0]) {
            (UniformValue::Float(v), GlCall::Uniform1f { value, .. }) => *value == v,
            (UniformValue::Int(v), GlCall::Uniform1i { value, .. }) => *value == v,
            (UniformValue::Vec2(v), GlCall::Uniform2fv { value, .. }) => *value == v,
            (UniformValue::Vec3(v), GlCall::Uniform3fv { value, .. }) => *value == v,
            (UniformValue::Vec4(v), GlCall::Uniform4fv { value, .. }) => *value == v,
            (UniformValue::Mat2(v), GlCall::UniformMatrix2fv { value, .. }) => *value == v,
            (UniformValue::Mat3(v), GlCall::UniformMatrix3fv { value, .. }) => *value == v,
            (UniformValue::Mat4(v), GlCall::UniformMatrix4fv { value, .. }) => *value == v,
            _ => false,
        };
        assert!(matched, "{name}: {:?}", calls[0]);
    }
}

#[test]
fn unknown_uniform_write_is_silent() {
    let (surface, driver) = surface(Config::new());
    driver.clear_calls();

    assert_eq!(surface.set_uniform("doesNotExist", 1.0f32), Ok(()));
    assert_eq!(surface.uniform("doesNotExist"), None);
    assert!(driver.calls().is_empty());
}

#[test]
fn uniform_of_other_kind_is_rejected() {
    let (surface, driver) = surface(Config::new());
    driver.clear_calls();

    let err = surface.set_uniform("time", [1.0f32, 2.0]).unwrap_err();
    assert!(matches!(err, SurfaceError::UniformKindMismatch { .. }));
    assert_eq!(surface.uniform("time"), Some(UniformValue::Float(0.0)));
    assert!(driver.calls().is_empty());
}

// ── buffers ───────────────────────────────────────────────────────────────

#[test]
fn position_write_sets_vertex_count() {
    let (surface, driver) = surface(Config::new());
    driver.clear_calls();

    surface.set_buffer("position", vec![0.5; 15]).unwrap();
    assert_eq!(surface.vertex_count(), 5);
    assert_eq!(surface.buffer("position").map(|d| d.len()), Some(15));

    let calls = driver.calls();
    assert!(calls.contains(&GlCall::BufferData { bytes: 15 * 4 }));
    assert_eq!(calls.last(), Some(&GlCall::BindArrayBuffer { id: None }));
}

#[test]
fn empty_position_suspends_drawing() {
    let config = Config::new().buffer("position", 3, vec![0.0; 9]);
    let (surface, driver) = surface(config);
    assert_eq!(surface.vertex_count(), 3);

    surface.set_buffer("position", Vec::new()).unwrap();
    assert_eq!(surface.vertex_count(), 0);

    driver.clear_calls();
    driver.run_frame(16.0);
    let calls = driver.calls();
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DrawPoints { .. })), 0);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::Clear(_))), 0);
    assert_eq!(driver.pending_frames(), 1);
}

#[test]
fn other_buffers_leave_vertex_count_alone() {
    let config = Config::new().buffer("position", 3, vec![0.0; 6]);
    let (surface, _driver) = surface(config);

    surface.set_buffer("color", vec![1.0; 12]).unwrap();
    assert_eq!(surface.vertex_count(), 2);
}

#[test]
fn misshapen_buffer_write_is_rejected() {
    let (surface, driver) = surface(Config::new());
    driver.clear_calls();

    let err = surface.set_buffer("color", vec![1.0; 6]).unwrap_err();
    assert_eq!(
        err,
        SurfaceError::BufferShape { name: "color".into(), len: 6, components: 4 }
    );
    assert!(driver.calls().is_empty());
}

#[test]
fn unknown_buffer_write_is_silent() {
    let (surface, driver) = surface(Config::new());
    driver.clear_calls();

    assert_eq!(surface.set_buffer("normals", vec![0.0; 3]), Ok(()));
    assert_eq!(surface.buffer("normals"), None);
    assert!(driver.calls().is_empty());
}

// ── resize ────────────────────────────────────────────────────────────────

#[test]
fn resize_scales_canvas_by_pixel_ratio() {
    let (host, driver) = host(800.0, 600.0, 2.0);
    let surface = RenderSurface::new(host, Config::new()).unwrap();

    assert_eq!(driver.canvas_size(), (1600, 1200));
    assert_eq!(driver.canvas_display_size(), Viewport::new(800.0, 600.0));
    assert_eq!(surface.uniform("resolution"), Some(UniformValue::Vec2([800.0, 600.0])));
    assert!(driver.calls().contains(&GlCall::Viewport { x: 0, y: 0, width: 1600, height: 1200 }));
    assert!((surface.aspect_ratio() - 800.0 / 600.0).abs() < 1e-6);
}

#[test]
fn resize_event_follows_container() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let config = Config::new().on_resize(move |_, w, h, dpr| sink.borrow_mut().push((w, h, dpr)));
    let (surface, driver) = surface(config);

    assert_eq!(driver.resize_to(Viewport::new(1024.0, 512.0), 1.5), 1);
    assert_eq!(surface.size(), Viewport::new(1024.0, 512.0));
    assert_eq!(driver.canvas_size(), (1536, 768));
    assert_eq!(surface.uniform("aspectRatio"), Some(UniformValue::Float(2.0)));
    assert_eq!(*seen.borrow(), vec![(800.0, 600.0, 1.0), (1024.0, 512.0, 1.5)]);
}

#[test]
fn autosize_off_ignores_window_resizes() {
    let (surface, driver) = surface(Config::new().autosize(false));
    assert_eq!(driver.resize_to(Viewport::new(100.0, 100.0), 1.0), 0);
    assert_eq!(surface.size(), Viewport::new(800.0, 600.0));

    surface.resize();
    assert_eq!(surface.size(), Viewport::new(100.0, 100.0));
}

#[test]
fn resize_reapplies_clear_color() {
    let rgba = [0.1, 0.2, 0.3, 1.0];
    let (_surface, driver) = surface(Config::new().clear_color(rgba));
    assert_eq!(count(&driver.calls(), |c| *c == GlCall::ClearColor(rgba)), 1);

    driver.resize_to(Viewport::new(640.0, 480.0), 1.0);
    assert_eq!(count(&driver.calls(), |c| *c == GlCall::ClearColor(rgba)), 2);
}

// ── projection ────────────────────────────────────────────────────────────

#[test]
fn perspective_projection_for_square_surface() {
    let (host, _driver) = host(500.0, 500.0, 1.0);
    let surface = RenderSurface::new(host, Config::new()).unwrap();

    let camera = surface.camera();
    assert_eq!(camera.aspect, 1.0);

    let m = mat4(surface.uniform("projection"));
    let expected = (std::f64::consts::FRAC_PI_2 - 0.5 * 60f64.to_radians()).tan();
    assert!((m[5] as f64 - expected).abs() < 1e-5);

    let base = perspective(60.0, 1.0, 1.0, 10000.0, 0.0);
    assert!((m[14] - base[14] - 100.0).abs() < 1e-4);
    assert!((m[15] - base[15] - 100.0).abs() < 1e-4);
}

#[test]
fn orthographic_projection_uses_surface_size() {
    let config = Config::new().camera(CameraPatch { perspective: Some(false), ..Default::default() });
    let (surface, _driver) = surface(config);

    assert_eq!(mat4(surface.uniform("projection")), orthographic(800.0, 600.0));
}

// ── pointer ───────────────────────────────────────────────────────────────

#[test]
fn pointer_moves_feed_mousemove_uniform() {
    let (surface, driver) = surface(Config::new().mousemove(true));

    let delivered = driver.dispatch(HostEvent::PointerMove(PointerMoveEvent { page_x: 200.0, page_y: 150.0 }));
    assert_eq!(delivered, 1);
    assert_eq!(surface.uniform("mousemove"), Some(UniformValue::Vec2([-0.5, 0.5])));
}

#[test]
fn pointer_tracking_is_opt_in() {
    let (surface, driver) = surface(Config::new());
    let delivered = driver.dispatch(HostEvent::PointerMove(PointerMoveEvent { page_x: 0.0, page_y: 0.0 }));
    assert_eq!(delivered, 0);
    assert_eq!(surface.uniform("mousemove"), Some(UniformValue::Vec2([0.0, 0.0])));
}

// ── frame loop ────────────────────────────────────────────────────────────

#[test]
fn frame_pushes_time_draws_and_reschedules() {
    let deltas = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&deltas);
    let config = Config::new()
        .buffer("position", 3, vec![0.0; 12])
        .on_update(move |_, dt| sink.borrow_mut().push(dt));
    let (surface, driver) = surface(config);
    assert!(surface.is_running());

    driver.clear_calls();
    assert_eq!(driver.run_frame(16.0), 1);
    assert_eq!(driver.run_frame(40.0), 1);

    let calls = driver.calls();
    assert_eq!(count(&calls, |c| *c == GlCall::Clear(ClearMask::COLOR)), 2);
    assert_eq!(count(&calls, |c| *c == GlCall::DrawPoints { first: 0, count: 4 }), 2);
    assert_eq!(*deltas.borrow(), vec![16.0, 24.0]);
    assert_eq!(surface.uniform("time"), Some(UniformValue::Float((40.0 / 5000.0) as f32)));
    assert_eq!(driver.pending_frames(), 1);
}

#[test]
fn update_callback_can_write_bindings() {
    let config = Config::new().on_update(|state, _| {
        let n = state.vertex_count() + 1;
        state.set_buffer("position", vec![0.0; n * 3]).unwrap();
    });
    let (surface, driver) = surface(config);

    driver.run_frames(3, 16.0);
    assert_eq!(surface.vertex_count(), 3);
}

#[test]
fn frame_fired_while_borrowed_is_rescheduled() {
    let (surface, driver) = surface(Config::new());

    surface.with_state(|state| {
        assert_eq!(driver.run_frame(16.0), 1);
        assert!(!state.is_running());
    });

    assert!(surface.is_running());
    assert_eq!(driver.pending_frames(), 1);
    assert_eq!(driver.run_frame(32.0), 1);
    assert_eq!(surface.uniform("time"), Some(UniformValue::Float((32.0 / 5000.0) as f32)));
    assert_eq!(driver.pending_frames(), 1);
}

#[test]
fn time_divisor_scales_time_uniform() {
    let (surface, driver) = surface(Config::new().time_divisor(1000.0));
    driver.run_frame(500.0);
    assert_eq!(surface.uniform("time"), Some(UniformValue::Float(0.5)));
}

#[test]
fn depth_test_enables_capability_and_depth_clear() {
    let config = Config::new().depth_test(true).buffer("position", 3, vec![0.0; 3]);
    let (_surface, driver) = surface(config);

    assert!(driver.calls().contains(&GlCall::Enable(Capability::DepthTest)));
    assert_eq!(driver.context_attributes().map(|a| a.depth), Some(true));

    driver.clear_calls();
    driver.run_frame(16.0);
    assert!(driver.calls().contains(&GlCall::Clear(ClearMask::COLOR_DEPTH)));
}

#[test]
fn antialias_reaches_context_attributes() {
    let (_surface, driver) = surface(Config::new().antialias(true));
    assert_eq!(driver.context_attributes().map(|a| a.antialias), Some(true));
}

// ── texture ───────────────────────────────────────────────────────────────

#[test]
fn rgba_texture_replaces_placeholder() {
    let config = Config::new().texture(TextureSource::Rgba {
        width: 2,
        height: 2,
        pixels: vec![255; 16],
    });
    let (surface, driver) = surface(config);

    let calls = driver.calls();
    let placeholder = calls.iter().position(|c| *c == GlCall::TexImage { width: 1, height: 1 });
    let real = calls.iter().position(|c| *c == GlCall::TexImage { width: 2, height: 2 });
    assert!(placeholder.is_some() && real.is_some() && placeholder < real);
    assert!(calls.contains(&GlCall::GenerateMipmap));
    assert_eq!(surface.uniform("hasTexture"), Some(UniformValue::Int(1)));
}

#[test]
fn unloadable_image_keeps_placeholder() {
    let config = Config::new().texture(TextureSource::Image("/definitely/missing.png".into()));
    let (surface, driver) = surface(config);

    let calls = driver.calls();
    assert_eq!(count(&calls, |c| matches!(c, GlCall::TexImage { .. })), 1);
    assert!(!calls.contains(&GlCall::GenerateMipmap));
    assert_eq!(surface.uniform("hasTexture"), Some(UniformValue::Int(1)));
}

// ── teardown ──────────────────────────────────────────────────────────────

#[test]
fn destroy_twice_releases_each_handle_once() {
    let config = Config::new()
        .mousemove(true)
        .texture(TextureSource::Rgba { width: 1, height: 1, pixels: vec![0; 4] });
    let (surface, driver) = surface(config);
    assert_eq!(driver.listener_count(), 2);

    surface.destroy();
    surface.destroy();

    let calls = driver.calls();
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteBuffer { .. })), 2);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteTexture { .. })), 1);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteProgram { .. })), 1);
    assert_eq!(driver.listener_count(), 0);
    assert!(!driver.is_attached());
    assert!(surface.is_destroyed());
    assert!(!surface.is_running());
}

#[test]
fn destroy_without_texture_still_releases_the_rest() {
    let (surface, driver) = surface(Config::new());
    surface.destroy();

    let calls = driver.calls();
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteTexture { .. })), 0);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteBuffer { .. })), 2);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteProgram { .. })), 1);
}

#[test]
fn destroy_cancels_pending_frame() {
    let updates = Rc::new(Cell::new(0));
    let sink = Rc::clone(&updates);
    let (surface, driver) = surface(Config::new().on_update(move |_, _| sink.set(sink.get() + 1)));
    assert_eq!(driver.pending_frames(), 1);

    surface.destroy();
    assert_eq!(driver.pending_frames(), 0);
    assert_eq!(driver.run_frame(16.0), 0);
    assert_eq!(updates.get(), 0);
}

#[test]
fn stale_frame_after_destroy_does_nothing() {
    let updates = Rc::new(Cell::new(0));
    let sink = Rc::clone(&updates);
    let config = Config::new()
        .buffer("position", 3, vec![0.0; 3])
        .on_update(move |_, _| sink.set(sink.get() + 1));
    let (surface, driver) = surface(config);
    driver.ignore_cancel();

    surface.destroy();
    driver.clear_calls();

    assert_eq!(driver.run_frame(16.0), 1);
    assert!(driver.calls().is_empty());
    assert_eq!(updates.get(), 0);
    assert_eq!(driver.pending_frames(), 0);
}

#[test]
fn destroy_from_update_callback_stops_loop() {
    let (surface, driver) = surface(Config::new().on_update(|state, _| state.destroy()));

    driver.run_frame(16.0);
    assert!(surface.is_destroyed());
    assert_eq!(driver.pending_frames(), 0);
    assert!(!driver.is_attached());
}

#[test]
fn dropping_the_surface_tears_it_down() {
    let (surface, driver) = surface(Config::new().mousemove(true));
    drop(surface);

    assert_eq!(driver.pending_frames(), 0);
    assert_eq!(driver.listener_count(), 0);
    assert!(!driver.is_attached());
}

#[test]
fn writes_after_destroy_store_without_uploading() {
    let (surface, driver) = surface(Config::new());
    surface.destroy();
    driver.clear_calls();

    surface.set_uniform("time", 3.0f32).unwrap();
    surface.set_buffer("position", vec![0.0; 3]).unwrap();
    assert_eq!(surface.uniform("time"), Some(UniformValue::Float(3.0)));
    assert!(driver.calls().is_empty());
}

// ── construction failures ─────────────────────────────────────────────────

#[test]
fn missing_context_fails_construction() {
    let (host, driver) = host(800.0, 600.0, 1.0);
    driver.refuse_context();

    let err = RenderSurface::new(host, Config::new()).err();
    assert_eq!(err, Some(SurfaceError::ContextUnavailable));
    assert!(!driver.is_attached());
    assert!(driver.calls().is_empty());
}

#[test]
fn compile_failure_carries_log_and_releases_shaders() {
    let (host, driver) = host(800.0, 600.0, 1.0);
    driver.fail_compile(ShaderStage::Fragment, "ERROR: 0:3: 'foo' : undeclared identifier");

    let err = RenderSurface::new(host, Config::new()).err();
    assert_eq!(
        err,
        Some(SurfaceError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "ERROR: 0:3: 'foo' : undeclared identifier".into(),
        })
    );

    let calls = driver.calls();
    assert_eq!(count(&calls, |c| matches!(c, GlCall::CreateShader { .. })), 2);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteShader { .. })), 2);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::CreateProgram { .. })), 0);
    assert!(!driver.is_attached());
    assert_eq!(driver.pending_frames(), 0);
}

#[test]
fn empty_vertex_source_fails_to_compile() {
    let (host, _driver) = host(800.0, 600.0, 1.0);
    let err = RenderSurface::new(host, Config::new().vertex("   ")).err();
    assert!(matches!(
        err,
        Some(SurfaceError::ShaderCompile { stage: ShaderStage::Vertex, .. })
    ));
}

#[test]
fn link_failure_releases_program_and_shaders() {
    let (host, driver) = host(800.0, 600.0, 1.0);
    driver.fail_link("varying v_color not written");

    let err = RenderSurface::new(host, Config::new()).err();
    assert_eq!(err, Some(SurfaceError::ProgramLink { log: "varying v_color not written".into() }));

    let calls = driver.calls();
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteShader { .. })), 2);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteProgram { .. })), 1);
}

#[test]
fn buffer_allocation_failure_releases_program() {
    let (host, driver) = host(800.0, 600.0, 1.0);
    driver.refuse("buffer");

    let err = RenderSurface::new(host, Config::new()).err();
    assert_eq!(err, Some(SurfaceError::ResourceCreation { resource: "buffer" }));
    assert_eq!(count(&driver.calls(), |c| matches!(c, GlCall::DeleteProgram { .. })), 1);
    assert!(!driver.is_attached());
}

#[test]
fn texture_allocation_failure_releases_buffers() {
    let (host, driver) = host(800.0, 600.0, 1.0);
    driver.refuse("texture");

    let config = Config::new().texture(TextureSource::Image("sprite.png".into()));
    let err = RenderSurface::new(host, config).err();
    assert_eq!(err, Some(SurfaceError::ResourceCreation { resource: "texture" }));
    assert_eq!(count(&driver.calls(), |c| matches!(c, GlCall::DeleteBuffer { .. })), 2);
}

#[test]
fn misshapen_initial_buffer_fails_construction() {
    let (host, _driver) = host(800.0, 600.0, 1.0);
    let err = RenderSurface::new(host, Config::new().buffer("position", 3, vec![0.0; 4])).err();
    assert_eq!(
        err,
        Some(SurfaceError::BufferShape { name: "position".into(), len: 4, components: 3 })
    );
}

#[test]
fn refused_program_releases_both_shaders() {
    let (host, driver) = host(800.0, 600.0, 1.0);
    driver.refuse("program");

    let err = RenderSurface::new(host, Config::new()).err();
    assert_eq!(err, Some(SurfaceError::ResourceCreation { resource: "program" }));

    let calls = driver.calls();
    assert_eq!(count(&calls, |c| matches!(c, GlCall::CompileShader { .. })), 2);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteShader { .. })), 2);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::DeleteProgram { .. })), 0);
    assert!(!driver.is_attached());
}

#[test]
fn refused_shader_fails_before_compiling() {
    let (host, driver) = host(800.0, 600.0, 1.0);
    driver.refuse("shader");

    let err = RenderSurface::new(host, Config::new()).err();
    assert_eq!(err, Some(SurfaceError::ResourceCreation { resource: "shader" }));

    let calls = driver.calls();
    assert_eq!(count(&calls, |c| matches!(c, GlCall::CompileShader { .. })), 0);
    assert_eq!(count(&calls, |c| matches!(c, GlCall::CreateProgram { .. })), 0);
    assert!(!driver.is_attached());
    assert_eq!(driver.pending_frames(), 0);
}
