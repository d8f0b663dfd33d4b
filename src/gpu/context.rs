//! GPU context management
//!
//! GBM + EGL + desktop OpenGL 3.3 core setup, and the [`GlContext`] that
//! every GPU resource is created against.

use anyhow::{anyhow, Context, Result};
use gbm::AsRaw;
use khronos_egl as egl;
use log::{error, info, warn};
use std::cell::Cell;
use std::ffi::c_void;

use crate::constants::{MAX_ERROR_DRAIN, MIN_GL_VERSION};
use crate::gpu::api::{GlApi, GlVersion};
use crate::gpu::error::GpuError;

// EGL_PLATFORM_GBM_KHR (EGL extension)
const EGL_PLATFORM_GBM_KHR: egl::Enum = 0x31D7;

/// GBM device
pub struct GbmDevice {
    device: gbm::Device<std::fs::File>,
}

impl GbmDevice {
    /// Open a DRM node and create a GBM device on it
    pub fn open(path: &str) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open DRM node: {}", path))?;
        let device = gbm::Device::new(file)
            .map_err(|e| anyhow!("Failed to create GBM device: {:?}", e))?;
        info!("GBM device created on {}", path);
        Ok(Self { device })
    }

    /// Reference to internal device
    pub fn device(&self) -> &gbm::Device<std::fs::File> {
        &self.device
    }
}

/// Offscreen GBM surface
pub struct GbmSurface {
    surface: gbm::Surface<std::fs::File>,
    width: u32,
    height: u32,
}

impl GbmSurface {
    /// Create GBM surface usable as a render target
    pub fn new(device: &gbm::Device<std::fs::File>, width: u32, height: u32) -> Result<Self> {
        let surface = device
            .create_surface::<std::fs::File>(
                width,
                height,
                gbm::Format::Argb8888,
                gbm::BufferObjectFlags::RENDERING,
            )
            .map_err(|e| anyhow!("Failed to create GBM surface: {:?}", e))?;

        info!("GBM surface created: {}x{}", width, height);
        Ok(Self {
            surface,
            width,
            height,
        })
    }

    /// Reference to internal surface
    pub fn surface(&self) -> &gbm::Surface<std::fs::File> {
        &self.surface
    }

    /// Lock the presented buffer; dropping it returns it to the surface
    pub fn lock_front_buffer(&self) -> Result<gbm::BufferObject<std::fs::File>> {
        unsafe {
            self.surface
                .lock_front_buffer()
                .map_err(|e| anyhow!("Failed to lock front buffer: {:?}", e))
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// EGL instance type (dynamic loading)
type EglInstance = egl::Instance<egl::Dynamic<libloading::Library, egl::EGL1_5>>;

/// EGL context bound to a GBM surface
pub struct EglContext {
    instance: EglInstance,
    display: egl::Display,
    context: egl::Context,
    surface: egl::Surface,
}

impl EglContext {
    /// Create a desktop OpenGL core context of at least `MIN_GL_VERSION`
    pub fn new(
        gbm_device: &gbm::Device<std::fs::File>,
        gbm_surface: &gbm::Surface<std::fs::File>,
    ) -> Result<Self> {
        // Load EGL library
        let lib = unsafe {
            libloading::Library::new("libEGL.so.1")
                .or_else(|_| libloading::Library::new("libEGL.so"))
                .context("Failed to load EGL library")?
        };

        let instance: EglInstance = unsafe {
            egl::DynamicInstance::<egl::EGL1_5>::load_required_from(lib)
                .context("Failed to create EGL instance")?
        };

        let display = unsafe {
            instance
                .get_platform_display(
                    EGL_PLATFORM_GBM_KHR,
                    gbm_device.as_raw() as *mut c_void,
                    &[egl::ATTRIB_NONE],
                )
                .context("Failed to get EGL display")?
        };

        instance
            .initialize(display)
            .context("Failed to initialize EGL")?;

        if let Ok(version_str) = instance.query_string(Some(display), egl::VERSION) {
            info!("EGL version: {}", version_str.to_string_lossy());
        }

        instance
            .bind_api(egl::OPENGL_API)
            .context("Failed to bind OpenGL API")?;

        let config = Self::choose_config(&instance, display)?;

        let context_attribs = [
            egl::CONTEXT_MAJOR_VERSION,
            MIN_GL_VERSION.major as egl::Int,
            egl::CONTEXT_MINOR_VERSION,
            MIN_GL_VERSION.minor as egl::Int,
            egl::CONTEXT_OPENGL_PROFILE_MASK,
            egl::CONTEXT_OPENGL_CORE_PROFILE_BIT,
            egl::NONE,
        ];
        let context = instance
            .create_context(display, config, None, &context_attribs)
            .with_context(|| format!("Failed to create OpenGL {} core context", MIN_GL_VERSION))?;

        let surface = unsafe {
            instance
                .create_platform_window_surface(
                    display,
                    config,
                    gbm_surface.as_raw() as *mut c_void,
                    &[egl::ATTRIB_NONE],
                )
                .or_else(|_| {
                    instance.create_window_surface(
                        display,
                        config,
                        gbm_surface.as_raw() as egl::NativeWindowType,
                        None,
                    )
                })
                .context("Failed to create EGL surface")?
        };

        instance
            .make_current(display, Some(surface), Some(surface), Some(context))
            .context("Failed to make EGL context current")?;

        info!("EGL context created");

        Ok(Self {
            instance,
            display,
            context,
            surface,
        })
    }

    fn choose_config(instance: &EglInstance, display: egl::Display) -> Result<egl::Config> {
        let config_attribs = [
            egl::SURFACE_TYPE,
            egl::WINDOW_BIT,
            egl::RED_SIZE,
            8,
            egl::GREEN_SIZE,
            8,
            egl::BLUE_SIZE,
            8,
            egl::ALPHA_SIZE,
            8,
            egl::DEPTH_SIZE,
            0,
            egl::RENDERABLE_TYPE,
            egl::OPENGL_BIT,
            egl::NONE,
        ];

        instance
            .choose_first_config(display, &config_attribs)
            .context("choose_first_config failed")?
            .ok_or_else(|| anyhow!("No suitable EGL config found"))
    }

    /// Opaque native context handle
    pub fn handle(&self) -> ContextHandle {
        ContextHandle::from_raw(self.context.as_ptr())
    }

    /// Swap buffers
    pub fn swap_buffers(&self) -> Result<()> {
        self.instance
            .swap_buffers(self.display, self.surface)
            .context("Failed to swap buffers")?;
        Ok(())
    }

    /// Load GL function pointers
    pub fn get_proc_address(&self, name: &str) -> *const c_void {
        self.instance
            .get_proc_address(name)
            .map(|f| f as *const c_void)
            .unwrap_or(std::ptr::null())
    }
}

impl Drop for EglContext {
    fn drop(&mut self) {
        let _ = self.instance.make_current(self.display, None, None, None);
        let _ = self.instance.destroy_surface(self.display, self.surface);
        let _ = self.instance.destroy_context(self.display, self.context);
        let _ = self.instance.terminate(self.display);
        info!("EGL context destroyed");
    }
}

/// Platform-native context handle
///
/// Only compared against null; never dereferenced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContextHandle(*mut c_void);

impl ContextHandle {
    pub const fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    pub fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }
}

impl Default for ContextHandle {
    fn default() -> Self {
        Self::null()
    }
}

thread_local! {
    // GL contexts are current on exactly one thread
    static CONTEXT_LIVE: Cell<bool> = const { Cell::new(false) };
}

/// Validated OpenGL context
///
/// Owns the GL function bindings. Every drawable takes it by reference, so
/// resources cannot be created before it exists and must be destroyed
/// before it is dropped.
///
/// At most one `GlContext` is live per thread: `initialize` fails with
/// `ContextExists` while another one on the same thread has not been
/// dropped. Contexts on different threads are not checked against each other.
pub struct GlContext<A: GlApi> {
    api: A,
    handle: ContextHandle,
    version: GlVersion,
}

impl<A: GlApi> GlContext<A> {
    /// Validate the native context and the driver version
    pub fn initialize(api: A, handle: ContextHandle) -> Result<Self, GpuError> {
        if handle.is_null() {
            error!("OpenGL context creation failed: empty context handle");
            return Err(GpuError::ContextCreation);
        }

        if CONTEXT_LIVE.with(|live| live.get()) {
            error!("OpenGL context already initialized on this thread");
            return Err(GpuError::ContextExists);
        }

        let version_str = api.version_string();
        let version = match GlVersion::parse(&version_str) {
            Some(v) => v,
            None => {
                error!("Cannot parse GL_VERSION: {:?}", version_str);
                return Err(GpuError::UnknownVersion(version_str));
            }
        };

        if !Self::is_correct_version(version) {
            error!(
                "OpenGL {} required, driver reports {} ({})",
                MIN_GL_VERSION, version, version_str
            );
            return Err(GpuError::UnsupportedVersion {
                found: version,
                required: MIN_GL_VERSION,
            });
        }

        CONTEXT_LIVE.with(|live| live.set(true));
        info!("OpenGL: {}", version_str);
        info!("OpenGL {} context ready", version);

        Ok(Self {
            api,
            handle,
            version,
        })
    }

    /// Native handle of the context
    #[allow(dead_code)]
    pub fn handle(&self) -> ContextHandle {
        self.handle
    }

    pub fn is_valid(&self) -> bool {
        !self.handle.is_null()
    }

    #[allow(dead_code)]
    pub fn version(&self) -> GlVersion {
        self.version
    }

    /// GL function bindings
    pub fn api(&self) -> &A {
        &self.api
    }

    fn is_correct_version(version: GlVersion) -> bool {
        version >= MIN_GL_VERSION
    }

    /// Next pending GL error, if any
    pub fn poll_error(&self) -> Option<u32> {
        match self.api.get_error() {
            glow::NO_ERROR => None,
            code => Some(code),
        }
    }

    /// Drain pending GL errors and log each one; returns how many were found
    pub fn log_errors(&self, tag: &str) -> usize {
        let mut count = 0;
        while count < MAX_ERROR_DRAIN {
            let Some(code) = self.poll_error() else {
                break;
            };
            warn!("GL error after {}: {} (0x{:04X})", tag, gl_error_string(code), code);
            count += 1;
        }
        count
    }

    /// Clear the bound framebuffer with a solid color
    pub fn clear(&self, color: [f32; 4]) {
        self.api.clear_color(color);
        self.api.clear(glow::COLOR_BUFFER_BIT);
    }

    pub fn set_viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.api.viewport(x, y, width, height);
    }
}

impl<A: GlApi> Drop for GlContext<A> {
    fn drop(&mut self) {
        CONTEXT_LIVE.with(|live| live.set(false));
    }
}

/// Human-readable name of a glGetError code
pub fn gl_error_string(code: u32) -> &'static str {
    match code {
        glow::INVALID_ENUM => "GL_INVALID_ENUM",
        glow::INVALID_VALUE => "GL_INVALID_VALUE",
        glow::INVALID_OPERATION => "GL_INVALID_OPERATION",
        glow::STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        glow::STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        glow::OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        glow::INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        _ => "Unknown error",
    }
}

#[cfg(test)]
pub(crate) fn fake_handle() -> ContextHandle {
    ContextHandle::from_raw(std::ptr::NonNull::<u8>::dangling().as_ptr() as *mut c_void)
}
