//! Global constants for trigon

use crate::gpu::api::GlVersion;

// ============================================================================
// GPU
// ============================================================================

/// Oldest OpenGL version the renderer accepts (and requests from EGL)
pub const MIN_GL_VERSION: GlVersion = GlVersion::new(3, 3);

/// Upper bound on errors drained by one `log_errors` call
/// (a lost context can report errors indefinitely)
pub const MAX_ERROR_DRAIN: usize = 32;

/// Largest width or height accepted for a framebuffer capture
pub const MAX_CAPTURE_DIMENSION: u32 = 16384;

/// Default DRM render node
pub const DEFAULT_RENDER_NODE: &str = "/dev/dri/renderD128";

// ============================================================================
// Triangle geometry
// ============================================================================

/// Floats per vertex (x, y)
pub const VERTEX_COMPONENTS: usize = 2;

/// Vertices drawn per frame
pub const TRIANGLE_VERTEX_COUNT: i32 = 3;

/// Clip-space positions: top, bottom left, bottom right
#[rustfmt::skip]
pub const TRIANGLE_VERTICES: [f32; 6] = [
     0.0,  0.5,
    -0.5, -0.5,
     0.5, -0.5,
];

// ============================================================================
// Shader files
// ============================================================================

/// Shader directory relative to the working directory
pub const DEFAULT_SHADER_DIR: &str = "files/shaders";

pub const DEFAULT_VERTEX_SHADER: &str = "tri.vert";

pub const DEFAULT_FRAGMENT_SHADER: &str = "tri.frag";
