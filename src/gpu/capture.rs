//! Framebuffer capture to PNG

use anyhow::{anyhow, bail, Context, Result};
use log::info;
use std::path::{Path, PathBuf};

use crate::constants::MAX_CAPTURE_DIMENSION;
use crate::gpu::api::{rgba_len, GlApi};
use crate::gpu::context::GlContext;

/// Read back the current framebuffer and save it as PNG in `dir`
pub fn save_png<A: GlApi>(ctx: &GlContext<A>, width: u32, height: u32, dir: &Path) -> Result<PathBuf> {
    if width == 0 || height == 0 || width > MAX_CAPTURE_DIMENSION || height > MAX_CAPTURE_DIMENSION {
        bail!("Cannot capture {}x{} framebuffer", width, height);
    }
    let gl_width = i32::try_from(width)?;
    let gl_height = i32::try_from(height)?;
    let len = rgba_len(gl_width, gl_height)
        .ok_or_else(|| anyhow!("Capture size {}x{} overflows", width, height))?;

    let mut pixels = vec![0u8; len];
    ctx.api()
        .read_pixels_rgba(0, 0, gl_width, gl_height, &mut pixels)
        .map_err(|e| anyhow!("Failed to read framebuffer: {}", e))?;

    // OpenGL origin is bottom-left
    let flipped = flip_rows(&pixels, len / height as usize);

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create capture directory: {}", dir.display()))?;

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("trigon_{}.png", timestamp));

    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&flipped)?;

    info!("Frame saved: {}", path.display());
    Ok(path)
}

/// Reverse row order of a tightly packed image
fn flip_rows(pixels: &[u8], row_size: usize) -> Vec<u8> {
    if row_size == 0 {
        return Vec::new();
    }
    let mut flipped = Vec::with_capacity(pixels.len());
    for row in pixels.chunks_exact(row_size).rev() {
        flipped.extend_from_slice(row);
    }
    flipped
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches('/')),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::context::fake_handle;
    use crate::gpu::mock::{GlCall, RecordingGl};

    #[test]
    fn test_flip_rows() {
        let pixels = [1, 1, 2, 2, 3, 3];
        assert_eq!(flip_rows(&pixels, 2), vec![3, 3, 2, 2, 1, 1]);
        assert!(flip_rows(&pixels, 0).is_empty());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/tmp/shots"), PathBuf::from("/tmp/shots"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~"), home);
            assert_eq!(expand_home("~/shots"), home.join("shots"));
        }
    }

    #[test]
    fn test_save_png_writes_file() {
        let mut gl = RecordingGl::new();
        gl.pixel_fill = 0x7f;
        let ctx = GlContext::initialize(gl, fake_handle()).unwrap();
        let dir = std::env::temp_dir().join(format!("trigon_capture_{}", std::process::id()));

        let path = save_png(&ctx, 4, 2, &dir).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        assert!(ctx.api().calls().contains(&GlCall::ReadPixels(4, 2)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_png_rejects_bad_size() {
        let ctx = GlContext::initialize(RecordingGl::new(), fake_handle()).unwrap();
        let dir = std::env::temp_dir().join(format!("trigon_capture_bad_{}", std::process::id()));

        assert!(save_png(&ctx, 65536, 65536, &dir).is_err());
        assert!(save_png(&ctx, u32::MAX, 1, &dir).is_err());
        assert!(save_png(&ctx, 0, 2, &dir).is_err());

        assert_eq!(ctx.api().count(|c| matches!(c, GlCall::ReadPixels(..))), 0);
        assert!(!dir.exists());
    }

    #[test]
    fn test_short_readback_buffer_refused() {
        let mut gl = RecordingGl::new();
        gl.pixel_fill = 0xff;
        let mut pixels = vec![0u8; 4 * 2 * 4 - 1];

        assert!(gl.read_pixels_rgba(0, 0, 4, 2, &mut pixels).is_err());
        assert!(gl.calls().is_empty());
        assert!(pixels.iter().all(|&b| b == 0));
    }
}
