use anyhow::Context;
use shimmer_engine::logging::{init_logging, LoggingConfig};
use shimmer_engine::{CameraPatch, SurfaceConfig, UniformValue};

const PARTICLES: usize = 2_000;
const RADIUS: f32 = 40.0;

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    // Startup banner, printed before the first frame.
    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║          SHIMMER PARTICLE FIELD        ║");
    println!("  ║   point sprites  ·  one shader program ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    run()
}

/// Points spread evenly over a sphere, plus a colour per point.
fn sphere(count: usize, radius: f32) -> (Vec<f32>, Vec<f32>) {
    let golden = std::f32::consts::PI * (3.0 - 5f32.sqrt());
    let mut positions = Vec::with_capacity(count * 3);
    let mut colors = Vec::with_capacity(count * 4);

    for i in 0..count {
        let y = 1.0 - (i as f32 / (count.max(2) - 1) as f32) * 2.0;
        let ring = (1.0 - y * y).max(0.0).sqrt();
        let theta = golden * i as f32;

        positions.extend_from_slice(&[theta.cos() * ring * radius, y * radius, theta.sin() * ring * radius]);
        colors.extend_from_slice(&[0.5 + 0.5 * y, 0.4 + 0.3 * ring, 1.0 - 0.5 * ring, 1.0]);
    }

    (positions, colors)
}

fn config<H: shimmer_engine::host::Host>() -> SurfaceConfig<H> {
    let (positions, colors) = sphere(PARTICLES, RADIUS);
    SurfaceConfig::new()
        .antialias(true)
        .mousemove(true)
        .buffer("position", 3, positions)
        .buffer("color", 4, colors)
        .camera(CameraPatch { fov: Some(45.0), z: Some(120.0), ..Default::default() })
        .on_resize(|_, w, h, dpr| log::info!("surface {w}x{h} @{dpr}x"))
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> anyhow::Result<()> {
    use shimmer_engine::coords::Viewport;
    use shimmer_engine::host::headless::{GlCall, HeadlessConfig, HeadlessHost};
    use shimmer_engine::input::{HostEvent, PointerMoveEvent};
    use shimmer_engine::time::DEFAULT_TIME_DIVISOR;
    use shimmer_engine::RenderSurface;

    const FRAMES: usize = 120;

    let host = HeadlessHost::new(HeadlessConfig {
        layout: Viewport::new(960.0, 540.0),
        device_pixel_ratio: 2.0,
        start_time: 0.0,
    });
    let driver = host.driver();

    let config = config().on_update(|state, _| {
        // Every half second, drop or restore the lower hemisphere.
        let Some(UniformValue::Float(t)) = state.uniform("time") else {
            return;
        };
        let half_seconds = (f64::from(t) * DEFAULT_TIME_DIVISOR / 500.0) as u32;
        let keep = if half_seconds % 2 == 0 { PARTICLES } else { PARTICLES / 2 };
        if keep != state.vertex_count() {
            let (positions, _) = sphere(PARTICLES, RADIUS);
            if let Err(err) = state.set_buffer("position", positions[..keep * 3].to_vec()) {
                log::warn!("position update rejected: {err}");
            }
        }
    });

    let surface = RenderSurface::new(host, config).context("failed to create headless surface")?;
    log::info!("{} particles uploaded", surface.vertex_count());

    driver.clear_calls();
    for frame in 0..FRAMES {
        let t = frame as f64 / FRAMES as f64 * std::f64::consts::TAU;
        driver.dispatch(HostEvent::PointerMove(PointerMoveEvent {
            page_x: (480.0 + 300.0 * t.cos()) as f32,
            page_y: (270.0 + 200.0 * t.sin()) as f32,
        }));
        driver.run_frames(1, 1000.0 / 60.0);
    }
    driver.resize_to(Viewport::new(1280.0, 720.0), 1.0);

    let calls = driver.calls();
    let draws = calls.iter().filter(|c| matches!(c, GlCall::DrawPoints { .. })).count();
    let uploads = calls.iter().filter(|c| c.is_uniform_upload()).count();
    let mut locations: Vec<u32> = calls.iter().filter_map(GlCall::uniform_location).collect();
    locations.sort_unstable();
    locations.dedup();

    println!("  [RUN] {FRAMES} frames simulated");
    println!();
    println!("  Draw calls        >  {draws}");
    println!("  Uniform uploads   >  {uploads} across {} uniforms", locations.len());
    println!("  Canvas            >  {:?} px", driver.canvas_size());
    println!("  Pointer (clip)    >  {:?}", surface.uniform("mousemove"));
    println!("  Vertices          >  {}", surface.vertex_count());
    println!();

    surface.destroy();
    log::info!("surface torn down; {} listeners left", driver.listener_count());
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn run() -> anyhow::Result<()> {
    use shimmer_engine::host::web::WebHost;
    use shimmer_engine::RenderSurface;

    let host = WebHost::from_element_id("app").context("failed to mount into #app")?;
    let surface = RenderSurface::new(host, config()).context("failed to create WebGL surface")?;
    log::info!("{} particles uploaded", surface.vertex_count());

    // The frame loop lives as long as the surface; keep it for the page lifetime.
    std::mem::forget(surface);
    Ok(())
}
