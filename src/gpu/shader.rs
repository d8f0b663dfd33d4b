//! Shader management
//!
//! GLSL 3.30 core shader loading, compilation and linking

use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::gpu::api::GlApi;
use crate::gpu::error::ShaderError;

/// Vertex/fragment source file locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderPaths {
    /// `base/dir/vertex` and `base/dir/fragment`, no existence check
    pub fn resolve(base: &Path, dir: &str, vertex: &str, fragment: &str) -> Self {
        let dir = base.join(dir);
        Self {
            vertex: dir.join(vertex),
            fragment: dir.join(fragment),
        }
    }

    /// Resolve relative to the process working directory
    pub fn from_cwd(dir: &str, vertex: &str, fragment: &str) -> std::io::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(Self::resolve(&cwd, dir, vertex, fragment))
    }
}

/// Linked shader program
///
/// Construction never fails: a program that could not be built is kept in
/// an invalid state together with the reason.
pub struct ShaderProgram<A: GlApi> {
    program: Option<A::Program>,
    error: Option<ShaderError>,
    /// Uniform name -> location (None = not present in program)
    uniforms: HashMap<String, Option<A::UniformLocation>>,
}

impl<A: GlApi> ShaderProgram<A> {
    /// Read, compile and link a vertex/fragment pair from disk
    pub fn from_files(gl: &A, vertex_path: &Path, fragment_path: &Path) -> Self {
        let sources = read_source(vertex_path)
            .and_then(|vs| read_source(fragment_path).map(|fs| (vs, fs)));

        match sources {
            Ok((vs, fs)) => {
                let program = Self::from_source(gl, &vs, &fs);
                if program.is_valid() {
                    info!(
                        "Shader compiled ({}, {})",
                        vertex_path.display(),
                        fragment_path.display()
                    );
                }
                program
            }
            Err(e) => Self::invalid(e),
        }
    }

    /// Compile and link from in-memory sources
    pub fn from_source(gl: &A, vertex_src: &str, fragment_src: &str) -> Self {
        match compile_program(gl, vertex_src, fragment_src) {
            Ok(program) => Self {
                program: Some(program),
                error: None,
                uniforms: HashMap::new(),
            },
            Err(e) => Self::invalid(e),
        }
    }

    fn invalid(error: ShaderError) -> Self {
        Self {
            program: None,
            error: Some(error),
            uniforms: HashMap::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.program.is_some()
    }

    /// Why the program is invalid
    pub fn error(&self) -> Option<&ShaderError> {
        self.error.as_ref()
    }

    #[allow(dead_code)]
    pub fn program(&self) -> Option<A::Program> {
        self.program
    }

    /// Activate the shader (no-op when invalid)
    pub fn use_program(&self, gl: &A) {
        if let Some(program) = self.program {
            gl.use_program(Some(program));
        }
    }

    /// Set a vec4 uniform; returns false if the program has no such uniform
    pub fn set_vec4(&mut self, gl: &A, name: &str, value: [f32; 4]) -> bool {
        let Some(program) = self.program else {
            return false;
        };

        let location = self
            .uniforms
            .entry(name.to_string())
            .or_insert_with(|| {
                let loc = gl.get_uniform_location(program, name);
                if loc.is_none() {
                    debug!("Uniform {} not found in program", name);
                }
                loc
            });

        match location {
            Some(loc) => {
                gl.uniform_4_f32(loc, value);
                true
            }
            None => false,
        }
    }

    /// Release resources
    pub fn destroy(&mut self, gl: &A) {
        if let Some(program) = self.program.take() {
            gl.delete_program(program);
        }
        self.uniforms.clear();
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|e| ShaderError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Compile shader and link program
fn compile_program<A: GlApi>(
    gl: &A,
    vertex_src: &str,
    fragment_src: &str,
) -> Result<A::Program, ShaderError> {
    let vs = compile_shader(gl, glow::VERTEX_SHADER, vertex_src)?;
    let fs = match compile_shader(gl, glow::FRAGMENT_SHADER, fragment_src) {
        Ok(fs) => fs,
        Err(e) => {
            gl.delete_shader(vs);
            return Err(e);
        }
    };

    let program = match gl.create_program() {
        Ok(program) => program,
        Err(e) => {
            gl.delete_shader(vs);
            gl.delete_shader(fs);
            return Err(ShaderError::Create(format!("program: {}", e)));
        }
    };

    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);

    // Shader objects no longer needed after linking
    gl.delete_shader(vs);
    gl.delete_shader(fs);

    if !gl.get_program_link_status(program) {
        let log = gl.get_program_info_log(program);
        gl.delete_program(program);
        return Err(ShaderError::Link(log));
    }

    Ok(program)
}

/// Compile individual shader
fn compile_shader<A: GlApi>(
    gl: &A,
    shader_type: u32,
    source: &str,
) -> Result<A::Shader, ShaderError> {
    let stage = match shader_type {
        glow::VERTEX_SHADER => "vertex",
        glow::FRAGMENT_SHADER => "fragment",
        _ => "unknown",
    };

    let shader = gl
        .create_shader(shader_type)
        .map_err(|e| ShaderError::Create(format!("{} shader: {}", stage, e)))?;

    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if !gl.get_shader_compile_status(shader) {
        let log = gl.get_shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(ShaderError::Compile { stage, log });
    }

    Ok(shader)
}
