//! Error types for Sprout graphics
//!
//! One error enum is shared by the device contract, the backends, the
//! precompiled shader container and the shader compiler.

use std::fmt;

use crate::backend::Backend;
use crate::graphics_device::ShaderStage;

/// Result type for Sprout graphics operations
pub type Result<T> = std::result::Result<T, Error>;

/// Sprout graphics errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error that has no more precise category
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource or argument (texture, buffer, shader, etc.)
    InvalidResource(String),

    /// Device or backend creation failed
    InitializationFailed(String),

    /// Shader compilation failed, `message` is the compiler diagnostic verbatim
    ShaderCompile {
        backend: Backend,
        stage: ShaderStage,
        message: String,
    },

    /// A fixed-capacity per-frame buffer (staging, uniform upload) is exhausted
    ResourceLimit(String),

    /// The presentation surface went stale (resize, minimize)
    SurfaceLost(String),

    /// A native graphics API call returned a failure status
    NativeCall { operation: String, code: i32 },

    /// Programmer error: the call breaks a documented invariant
    InvariantViolation(String),

    /// A precompiled shader container could not be parsed
    InvalidContainer(String),

    /// The container has no payload for this (backend, stage) pair
    ShaderNotPresent { backend: u8, stage: u8 },

    /// File access failed
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ShaderCompile { backend, stage, message } => {
                write!(f, "Shader compilation failed ({}, {:?} stage): {}", backend, stage, message)
            }
            Error::ResourceLimit(msg) => write!(f, "Resource limit exceeded: {}", msg),
            Error::SurfaceLost(msg) => write!(f, "Surface lost: {}", msg),
            Error::NativeCall { operation, code } => {
                write!(f, "{} failed with status {} ({:#010x})", operation, code, code)
            }
            Error::InvariantViolation(msg) => write!(f, "Invariant violation: {}", msg),
            Error::InvalidContainer(msg) => write!(f, "Invalid precompiled shader container: {}", msg),
            Error::ShaderNotPresent { backend, stage } => {
                let backend_name = Backend::from_nibble(*backend)
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| format!("backend #{}", backend));
                let stage_name = ShaderStage::from_nibble(*stage)
                    .map(|s| format!("{:?}", s))
                    .unwrap_or_else(|| format!("stage #{}", stage));
                write!(
                    f,
                    "No {} shader for {} in container, it needs recompilation",
                    stage_name, backend_name
                )
            }
            Error::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
