//! GPU error types

use std::path::PathBuf;
use thiserror::Error;

use crate::gpu::api::GlVersion;

/// Failure while building a shader program
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShaderError {
    #[error("failed to read shader file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to create {0}")]
    Create(String),

    #[error("{stage} shader compile failed: {log}")]
    Compile { stage: &'static str, log: String },

    #[error("shader link failed: {0}")]
    Link(String),
}

/// Context and drawable failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GpuError {
    #[error("OpenGL context creation failed")]
    ContextCreation,

    #[error("an OpenGL context is already live on this thread")]
    ContextExists,

    #[error("unrecognized GL_VERSION string: {0:?}")]
    UnknownVersion(String),

    #[error("OpenGL {required} or newer required, driver reports {found}")]
    UnsupportedVersion { found: GlVersion, required: GlVersion },

    #[error("OpenGL context is not valid")]
    ContextInvalid,

    #[error("failed to allocate {what}: {message}")]
    Allocation { what: &'static str, message: String },

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("drawable is not initialized")]
    NotReady,

    #[error("drawable has been released")]
    Released,
}
