//! Triangle drawable
//!
//! One VAO + one static VBO + an exclusively owned shader program.

use log::{error, info, trace};

use crate::constants::{TRIANGLE_VERTEX_COUNT, TRIANGLE_VERTICES, VERTEX_COMPONENTS};
use crate::gpu::api::GlApi;
use crate::gpu::context::GlContext;
use crate::gpu::error::GpuError;
use crate::gpu::shader::{ShaderPaths, ShaderProgram};

/// Uniform receiving the fill color
const COLOR_UNIFORM: &str = "u_color";

/// Lifecycle of a drawable's GPU resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawableState {
    Uninitialized,
    Ready,
    Released,
}

/// Hard-coded triangle
pub struct Triangle<A: GlApi> {
    state: DrawableState,
    paths: ShaderPaths,
    color: Option<[f32; 4]>,
    vao: Option<A::VertexArray>,
    vbo: Option<A::Buffer>,
    shader: Option<ShaderProgram<A>>,
}

impl<A: GlApi> Triangle<A> {
    /// Uninitialized triangle; no GPU calls are made until `initialize`
    pub fn new(paths: ShaderPaths, color: Option<[f32; 4]>) -> Self {
        Self {
            state: DrawableState::Uninitialized,
            paths,
            color,
            vao: None,
            vbo: None,
            shader: None,
        }
    }

    #[allow(dead_code)]
    pub fn state(&self) -> DrawableState {
        self.state
    }

    /// Shader program from the last `initialize`, valid or not
    #[allow(dead_code)]
    pub fn shader(&self) -> Option<&ShaderProgram<A>> {
        self.shader.as_ref()
    }

    /// Upload geometry and build the shader program
    ///
    /// On failure the triangle holds no GPU buffers and stays uninitialized;
    /// a failed shader program is kept for inspection. A released triangle
    /// cannot be initialized again.
    pub fn initialize(&mut self, ctx: &GlContext<A>) -> Result<(), GpuError> {
        if self.state == DrawableState::Released {
            return Err(GpuError::Released);
        }
        if !ctx.is_valid() {
            return Err(GpuError::ContextInvalid);
        }
        if self.state == DrawableState::Ready {
            self.release_resources(ctx.api());
        }
        self.state = DrawableState::Uninitialized;

        let gl = ctx.api();

        let vao = gl
            .create_vertex_array()
            .map_err(|message| GpuError::Allocation {
                what: "vertex array",
                message,
            })?;
        let vbo = match gl.create_buffer() {
            Ok(vbo) => vbo,
            Err(message) => {
                gl.delete_vertex_array(vao);
                return Err(GpuError::Allocation {
                    what: "vertex buffer",
                    message,
                });
            }
        };

        gl.bind_vertex_array(Some(vao));
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_f32(glow::ARRAY_BUFFER, &TRIANGLE_VERTICES, glow::STATIC_DRAW);

        // a_pos: location=0, vec2, tightly packed
        let stride = (VERTEX_COMPONENTS * std::mem::size_of::<f32>()) as i32;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, VERTEX_COMPONENTS as i32, glow::FLOAT, false, stride, 0);

        gl.bind_vertex_array(None);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);

        let shader = ShaderProgram::from_files(gl, &self.paths.vertex, &self.paths.fragment);
        if let Some(err) = shader.error().cloned() {
            error!("Triangle shader failed to compile/link: {}", err);
            gl.delete_vertex_array(vao);
            gl.delete_buffer(vbo);
            self.shader = Some(shader);
            return Err(err.into());
        }

        self.vao = Some(vao);
        self.vbo = Some(vbo);
        self.shader = Some(shader);
        self.state = DrawableState::Ready;
        info!("Triangle initialized");
        Ok(())
    }

    /// Issue one draw call for the triangle
    pub fn render(&mut self, ctx: &GlContext<A>) -> Result<(), GpuError> {
        match self.state {
            DrawableState::Ready => {}
            DrawableState::Released => return Err(GpuError::Released),
            DrawableState::Uninitialized => return Err(GpuError::NotReady),
        }
        let (Some(vao), Some(shader)) = (self.vao, self.shader.as_mut()) else {
            return Err(GpuError::NotReady);
        };

        let gl = ctx.api();
        shader.use_program(gl);
        if let Some(color) = self.color {
            shader.set_vec4(gl, COLOR_UNIFORM, color);
        }

        gl.bind_vertex_array(Some(vao));
        gl.draw_arrays(glow::TRIANGLES, 0, TRIANGLE_VERTEX_COUNT);
        gl.bind_vertex_array(None);

        trace!("Triangle drawn");
        Ok(())
    }

    /// Release resources; the triangle cannot be used afterwards
    pub fn destroy(&mut self, ctx: &GlContext<A>) {
        self.release_resources(ctx.api());
        self.state = DrawableState::Released;
    }

    fn release_resources(&mut self, gl: &A) {
        if let Some(mut shader) = self.shader.take() {
            shader.destroy(gl);
        }
        if let Some(vao) = self.vao.take() {
            gl.delete_vertex_array(vao);
        }
        if let Some(vbo) = self.vbo.take() {
            gl.delete_buffer(vbo);
        }
    }
}
