//! Call-recording GlApi for tests

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use crate::gpu::api::{check_rgba_buffer, GlApi};

/// One recorded GPU call
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    CreateBuffer(u32),
    BindBuffer(u32, Option<u32>),
    DeleteBuffer(u32),
    BufferData {
        target: u32,
        data: Vec<f32>,
        usage: u32,
    },
    EnableVertexAttribArray(u32),
    VertexAttribPointer {
        index: u32,
        size: i32,
        data_type: u32,
        normalized: bool,
        stride: i32,
        offset: i32,
    },
    CreateShader(u32, u32),
    ShaderSource(u32, String),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader(u32, u32),
    LinkProgram(u32),
    UseProgram(Option<u32>),
    DeleteProgram(u32),
    GetUniformLocation(u32, String),
    Uniform4f(u32, [f32; 4]),
    DrawArrays {
        mode: u32,
        first: i32,
        count: i32,
    },
    ClearColor([f32; 4]),
    Clear(u32),
    Viewport(i32, i32, i32, i32),
    ReadPixels(i32, i32),
}

/// Fake driver that records every call
pub struct RecordingGl {
    version: String,
    calls: RefCell<Vec<GlCall>>,
    next_id: Cell<u32>,
    shader_types: RefCell<HashMap<u32, u32>>,
    pending_errors: RefCell<Vec<u32>>,
    /// Shader stage whose compilation fails
    pub fail_compile: Option<u32>,
    pub fail_link: bool,
    /// Uniform names the linked program exposes
    pub uniforms: Vec<&'static str>,
    /// Fill value for pixel readback
    pub pixel_fill: u8,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::with_version("3.3.0 Mock")
    }

    pub fn with_version(version: &str) -> Self {
        Self {
            version: version.to_string(),
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            shader_types: RefCell::new(HashMap::new()),
            pending_errors: RefCell::new(Vec::new()),
            fail_compile: None,
            fail_link: false,
            uniforms: vec!["u_color"],
            pixel_fill: 0,
        }
    }

    /// Queue errors returned by get_error, oldest first
    pub fn push_errors(&self, codes: &[u32]) {
        self.pending_errors.borrow_mut().extend_from_slice(codes);
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn count(&self, pred: impl Fn(&GlCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: GlCall) {
        self.calls.borrow_mut().push(call);
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

impl GlApi for RecordingGl {
    type VertexArray = u32;
    type Buffer = u32;
    type Shader = u32;
    type Program = u32;
    type UniformLocation = u32;

    fn version_string(&self) -> String {
        self.version.clone()
    }

    fn get_error(&self) -> u32 {
        let mut pending = self.pending_errors.borrow_mut();
        if pending.is_empty() {
            glow::NO_ERROR
        } else {
            pending.remove(0)
        }
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let id = self.next_id();
        self.record(GlCall::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&self, vao: Option<u32>) {
        self.record(GlCall::BindVertexArray(vao));
    }

    fn delete_vertex_array(&self, vao: u32) {
        self.record(GlCall::DeleteVertexArray(vao));
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let id = self.next_id();
        self.record(GlCall::CreateBuffer(id));
        Ok(id)
    }

    fn bind_buffer(&self, target: u32, buffer: Option<u32>) {
        self.record(GlCall::BindBuffer(target, buffer));
    }

    fn delete_buffer(&self, buffer: u32) {
        self.record(GlCall::DeleteBuffer(buffer));
    }

    fn buffer_data_f32(&self, target: u32, data: &[f32], usage: u32) {
        self.record(GlCall::BufferData {
            target,
            data: data.to_vec(),
            usage,
        });
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GlCall::EnableVertexAttribArray(index));
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
        self.record(GlCall::VertexAttribPointer {
            index,
            size,
            data_type,
            normalized,
            stride,
            offset,
        });
    }

    fn create_shader(&self, shader_type: u32) -> Result<u32, String> {
        let id = self.next_id();
        self.shader_types.borrow_mut().insert(id, shader_type);
        self.record(GlCall::CreateShader(id, shader_type));
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.record(GlCall::ShaderSource(shader, source.to_string()));
    }

    fn compile_shader(&self, shader: u32) {
        self.record(GlCall::CompileShader(shader));
    }

    fn get_shader_compile_status(&self, shader: u32) -> bool {
        let shader_type = self.shader_types.borrow().get(&shader).copied();
        self.fail_compile.is_none() || shader_type != self.fail_compile
    }

    fn get_shader_info_log(&self, _shader: u32) -> String {
        "0:1(1): error: syntax error".to_string()
    }

    fn delete_shader(&self, shader: u32) {
        self.record(GlCall::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<u32, String> {
        let id = self.next_id();
        self.record(GlCall::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.record(GlCall::AttachShader(program, shader));
    }

    fn link_program(&self, program: u32) {
        self.record(GlCall::LinkProgram(program));
    }

    fn get_program_link_status(&self, _program: u32) -> bool {
        !self.fail_link
    }

    fn get_program_info_log(&self, _program: u32) -> String {
        "error: unresolved varying".to_string()
    }

    fn use_program(&self, program: Option<u32>) {
        self.record(GlCall::UseProgram(program));
    }

    fn delete_program(&self, program: u32) {
        self.record(GlCall::DeleteProgram(program));
    }

    fn get_uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        self.record(GlCall::GetUniformLocation(program, name.to_string()));
        self.uniforms
            .iter()
            .position(|u| *u == name)
            .map(|i| i as u32)
    }

    fn uniform_4_f32(&self, location: &u32, value: [f32; 4]) {
        self.record(GlCall::Uniform4f(*location, value));
    }

    fn draw_arrays(&self, mode: u32, first: i32, count: i32) {
        self.record(GlCall::DrawArrays { mode, first, count });
    }

    fn clear_color(&self, color: [f32; 4]) {
        self.record(GlCall::ClearColor(color));
    }

    fn clear(&self, mask: u32) {
        self.record(GlCall::Clear(mask));
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.record(GlCall::Viewport(x, y, width, height));
    }

    fn read_pixels_rgba(
        &self,
        _x: i32,
        _y: i32,
        width: i32,
        height: i32,
        pixels: &mut [u8],
    ) -> Result<(), String> {
        check_rgba_buffer(width, height, pixels.len())?;
        self.record(GlCall::ReadPixels(width, height));
        pixels.fill(self.pixel_fill);
        Ok(())
    }
}
