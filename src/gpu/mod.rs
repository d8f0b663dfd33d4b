//! GPU rendering with desktop OpenGL
//!
//! Handles:
//! - GBM device/surface creation
//! - EGL context creation (GBM platform, OpenGL 3.3 core)
//! - Context validation and error polling
//! - Drawable resources (VAO/VBO/shader program)

pub mod api;
pub mod capture;
pub mod context;
pub mod error;
#[cfg(test)]
pub mod mock;
pub mod shader;
pub mod triangle;

#[allow(unused_imports)]
pub use api::{GlApi, GlVersion};
#[allow(unused_imports)]
pub use context::{gl_error_string, ContextHandle, EglContext, GbmDevice, GbmSurface, GlContext};
#[allow(unused_imports)]
pub use error::{GpuError, ShaderError};
#[allow(unused_imports)]
pub use shader::{ShaderPaths, ShaderProgram};
#[allow(unused_imports)]
pub use triangle::{DrawableState, Triangle};
