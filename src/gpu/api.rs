//! GPU call interface
//!
//! Every OpenGL call made by the context manager, shader programs and
//! drawables goes through [`GlApi`]. The production implementation forwards
//! to `glow::Context`; tests substitute a recorder.
//!
//! All methods assume the owning context is current on the calling thread.

use glow::HasContext;
use std::fmt::Debug;

/// OpenGL function bindings used by the renderer
pub trait GlApi {
    type VertexArray: Copy + Debug + PartialEq;
    type Buffer: Copy + Debug + PartialEq;
    type Shader: Copy + Debug + PartialEq;
    type Program: Copy + Debug + PartialEq;
    type UniformLocation: Clone + Debug;

    /// GL_VERSION string reported by the driver
    fn version_string(&self) -> String;

    /// Next pending error (glGetError), `NO_ERROR` when the queue is empty
    fn get_error(&self) -> u32;

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String>;
    fn bind_vertex_array(&self, vao: Option<Self::VertexArray>);
    fn delete_vertex_array(&self, vao: Self::VertexArray);

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>);
    fn delete_buffer(&self, buffer: Self::Buffer);
    /// Upload `data` to the buffer bound at `target`
    fn buffer_data_f32(&self, target: u32, data: &[f32], usage: u32);

    fn enable_vertex_attrib_array(&self, index: u32);
    /// Describe a float attribute; `stride` and `offset` are in bytes
    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );

    fn create_shader(&self, shader_type: u32) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn get_shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn get_shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn get_program_link_status(&self, program: Self::Program) -> bool;
    fn get_program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Option<Self::Program>);
    fn delete_program(&self, program: Self::Program);

    fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation>;
    fn uniform_4_f32(&self, location: &Self::UniformLocation, value: [f32; 4]);

    fn draw_arrays(&self, mode: u32, first: i32, count: i32);

    fn clear_color(&self, color: [f32; 4]);
    fn clear(&self, mask: u32);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    /// Read back RGBA8 pixels into `pixels`
    ///
    /// Fails without touching GL when `pixels` is shorter than
    /// `width * height * 4` bytes.
    fn read_pixels_rgba(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pixels: &mut [u8],
    ) -> Result<(), String>;
}

impl GlApi for glow::Context {
    type VertexArray = glow::VertexArray;
    type Buffer = glow::Buffer;
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn version_string(&self) -> String {
        unsafe { self.get_parameter_string(glow::VERSION) }
    }

    fn get_error(&self) -> u32 {
        unsafe { HasContext::get_error(self) }
    }

    fn create_vertex_array(&self) -> Result<Self::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn bind_vertex_array(&self, vao: Option<Self::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vao) }
    }

    fn delete_vertex_array(&self, vao: Self::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vao) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn bind_buffer(&self, target: u32, buffer: Option<Self::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target, buffer) }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn buffer_data_f32(&self, target: u32, data: &[f32], usage: u32) {
        unsafe { self.buffer_data_u8_slice(target, f32_slice_as_bytes(data), usage) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { HasContext::enable_vertex_attrib_array(self, index) }
    }

    fn vertex_attrib_pointer_f32(
        &self,
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            HasContext::vertex_attrib_pointer_f32(
                self, index, size, data_type, normalized, stride, offset,
            )
        }
    }

    fn create_shader(&self, shader_type: u32) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, shader_type) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    fn get_shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { HasContext::get_shader_compile_status(self, shader) }
    }

    fn get_shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { HasContext::get_shader_info_log(self, shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn get_program_link_status(&self, program: Self::Program) -> bool {
        unsafe { HasContext::get_program_link_status(self, program) }
    }

    fn get_program_info_log(&self, program: Self::Program) -> String {
        unsafe { HasContext::get_program_info_log(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn get_uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn uniform_4_f32(&self, location: &Self::UniformLocation, value: [f32; 4]) {
        let [x, y, z, w] = value;
        unsafe { HasContext::uniform_4_f32(self, Some(location), x, y, z, w) }
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        unsafe { HasContext::draw_arrays(self, mode, first, count) }
    }

    fn clear_color(&self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe { HasContext::clear_color(self, r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        unsafe { HasContext::clear(self, mask) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { HasContext::viewport(self, x, y, width, height) }
    }

    fn read_pixels_rgba(
        &self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        pixels: &mut [u8],
    ) -> Result<(), String> {
        check_rgba_buffer(width, height, pixels.len())?;
        unsafe {
            self.read_pixels(
                x,
                y,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(pixels),
            );
        }
        Ok(())
    }
}

/// Byte length of a tightly packed RGBA8 image, None on negative size or overflow
pub fn rgba_len(width: i32, height: i32) -> Option<usize> {
    let width = usize::try_from(width).ok()?;
    let height = usize::try_from(height).ok()?;
    width.checked_mul(height)?.checked_mul(4)
}

/// Reject readback buffers too small for `width` x `height` RGBA8
pub fn check_rgba_buffer(width: i32, height: i32, len: usize) -> Result<(), String> {
    match rgba_len(width, height) {
        Some(needed) if needed <= len => Ok(()),
        Some(needed) => Err(format!(
            "pixel buffer too small for {}x{}: {} < {} bytes",
            width, height, len, needed
        )),
        None => Err(format!("invalid readback size {}x{}", width, height)),
    }
}

/// Convert &[f32] to &[u8]
fn f32_slice_as_bytes(slice: &[f32]) -> &[u8] {
    unsafe {
        std::slice::from_raw_parts(
            slice.as_ptr() as *const u8,
            std::mem::size_of_val(slice),
        )
    }
}

/// OpenGL version reported by the driver
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlVersion {
    pub major: u32,
    pub minor: u32,
}

impl GlVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse version from GL_VERSION string
    ///
    /// Desktop drivers report "3.3.0 NVIDIA 535.54", ES drivers
    /// "OpenGL ES 3.1 Mesa 23.0.0". Returns None if no "X.Y" prefix is found.
    pub fn parse(version_str: &str) -> Option<Self> {
        let rest = match version_str.find("ES ") {
            Some(pos) => &version_str[pos + 3..],
            None => version_str.trim_start(),
        };

        let version_part: String = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        let mut parts = version_part.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        Some(Self { major, minor })
    }
}

impl std::fmt::Display for GlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
