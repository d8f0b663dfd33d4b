//! trigon - OpenGL 3.3 bootstrap on GBM/EGL
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │   GBM device / surface (DRM render node) │
//! │                   ↓                      │
//! │   EGL context (OpenGL 3.3 core)          │
//! │                   ↓                      │
//! │   GlContext (version check, errors)      │
//! │                   ↓                      │
//! │   Triangle (VAO/VBO/shader) per frame    │
//! └──────────────────────────────────────────┘
//! ```

mod config;
mod constants;
mod font;
mod gpu;

use anyhow::{Context, Result};
use log::{info, trace, warn};
use std::path::Path;

use gpu::{EglContext, GbmDevice, GbmSurface, GlContext, ShaderPaths, Triangle};

fn print_help() {
    println!(
        "trigon {} - OpenGL 3.3 triangle on GBM/EGL

USAGE:
    trigon [OPTIONS]

OPTIONS:
    -h, --help          Show this help
    -V, --version       Show version
    -t, --test          Build verification (no GPU access)
    --frames=N          Number of frames to render
    --screenshot        Save the last frame as PNG
    --init-config       Write the default config file
    -f, --force         Overwrite an existing config file

ENVIRONMENT:
    TRIGON_CONFIG       Config file path
    RUST_LOG            Log filter (default: warn)",
        env!("CARGO_PKG_VERSION")
    );
}

/// Value of `--frames=N`
fn parse_frames(args: &[String]) -> Option<u32> {
    args.iter()
        .find_map(|a| a.strip_prefix("--frames="))
        .and_then(|n| match n.parse() {
            Ok(frames) => Some(frames),
            Err(_) => {
                warn!("Ignoring invalid --frames value: {}", n);
                None
            }
        })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    // --help
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    // --version
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("trigon {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.iter().any(|a| a == "--test" || a == "-t") {
        info!("Test mode: skipping GPU initialization");
        eprintln!("[OK] trigon build verification complete");
        return Ok(());
    }

    if args.iter().any(|a| a == "--init-config") {
        let force = args.iter().any(|a| a == "--force" || a == "-f");
        let path = config::Config::default_write_path()?;
        if path.exists() && !force {
            println!("Config file already exists: {} (use --force)", path.display());
            return Ok(());
        }
        let path = config::Config::write_default()?;
        println!("Config written: {}", path.display());
        return Ok(());
    }

    info!("trigon starting...");

    let mut cfg = config::Config::load();
    if let Some(frames) = parse_frames(&args) {
        cfg.run.frames = frames;
    }
    if args.iter().any(|a| a == "--screenshot") {
        cfg.run.screenshot = true;
    }

    load_font(&cfg.font);

    run(&cfg)
}

/// Load the configured font; failures are logged, not fatal
fn load_font(cfg: &config::FontConfig) {
    if cfg.path.is_empty() {
        return;
    }
    let hinting = font::HintingMode::from_str(&cfg.hinting);
    let result = font::FontLoader::new(hinting)
        .and_then(|mut loader| loader.load_font(Path::new(&cfg.path), cfg.size, cfg.glyph_test));
    if let Err(e) = result {
        warn!("Font not loaded: {}", e);
    }
}

/// Create the context, draw the triangle, tear down in reverse order
fn run(cfg: &config::Config) -> Result<()> {
    let width = cfg.gpu.width;
    let height = cfg.gpu.height;

    let gbm = GbmDevice::open(&cfg.gpu.render_node)?;
    let surface = GbmSurface::new(gbm.device(), width, height)?;
    let egl = EglContext::new(gbm.device(), surface.surface())?;

    let gl = unsafe { glow::Context::from_loader_function(|name| egl.get_proc_address(name)) };
    let ctx = GlContext::initialize(gl, egl.handle()).context("OpenGL initialization failed")?;
    ctx.set_viewport(0, 0, width as i32, height as i32);

    let paths = ShaderPaths::from_cwd(&cfg.shaders.dir, &cfg.shaders.vertex, &cfg.shaders.fragment)
        .context("Failed to resolve working directory")?;
    let mut triangle = Triangle::new(paths, cfg.triangle.rgba());
    triangle
        .initialize(&ctx)
        .context("Triangle setup failed")?;
    ctx.log_errors("triangle setup");

    let result = render_frames(cfg, &ctx, &mut triangle, &egl, &surface);

    triangle.destroy(&ctx);
    ctx.log_errors("teardown");
    drop(ctx);
    drop(egl);
    info!("Shutdown complete");

    result
}

fn render_frames(
    cfg: &config::Config,
    ctx: &GlContext<glow::Context>,
    triangle: &mut Triangle<glow::Context>,
    egl: &EglContext,
    surface: &GbmSurface,
) -> Result<()> {
    let clear = cfg.gpu.clear_rgba();
    let frames = cfg.run.frames;
    info!("Rendering {} frames ({}x{})", frames, surface.width(), surface.height());

    for frame in 0..frames {
        ctx.clear(clear);
        triangle.render(ctx)?;
        ctx.log_errors("draw");

        // Read back before the swap invalidates the back buffer
        if cfg.run.screenshot && frame + 1 == frames {
            let dir = gpu::capture::expand_home(&cfg.run.screenshot_dir);
            gpu::capture::save_png(ctx, surface.width(), surface.height(), &dir)?;
        }

        egl.swap_buffers()?;
        // Returned to the surface when dropped
        let _front = surface.lock_front_buffer()?;
        trace!("Frame {} presented", frame);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_frames() {
        assert_eq!(parse_frames(&args(&["trigon", "--frames=10"])), Some(10));
        assert_eq!(parse_frames(&args(&["trigon", "--frames=ten"])), None);
        assert_eq!(parse_frames(&args(&["trigon"])), None);
    }
}
