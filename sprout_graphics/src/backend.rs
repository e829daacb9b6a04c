//! Backend identifiers
//!
//! The numeric value of each backend is persisted in precompiled shader
//! containers (high nibble of the record key) and must never change.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Environment variable overriding the backend choice at device creation
pub const BACKEND_ENV_VAR: &str = "SPROUT_BACKEND";

/// Native graphics API implementing the device contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Backend {
    /// No preference: the factory probes the platform order
    Unknown = 0,
    Vulkan = 1,
    D3D11 = 4,
    OpenGL = 5,
}

impl Backend {
    /// Value stored in the high nibble of a container record key
    pub fn nibble(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Backend::nibble`]. Reserved values (2, 3, 6) return `None`.
    pub fn from_nibble(value: u8) -> Option<Backend> {
        match value {
            0 => Some(Backend::Unknown),
            1 => Some(Backend::Vulkan),
            4 => Some(Backend::D3D11),
            5 => Some(Backend::OpenGL),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Backend::Unknown => "Auto",
            Backend::Vulkan => "Vulkan",
            Backend::D3D11 => "D3D11",
            Backend::OpenGL => "OpenGL",
        }
    }

    /// Probe order used when no backend is requested
    pub fn preferred_order() -> &'static [Backend] {
        if cfg!(windows) {
            &[Backend::D3D11, Backend::Vulkan, Backend::OpenGL]
        } else {
            &[Backend::Vulkan, Backend::OpenGL]
        }
    }

    /// Backends that have a shader payload format (everything but `Unknown`)
    pub fn all() -> &'static [Backend] {
        &[Backend::Vulkan, Backend::D3D11, Backend::OpenGL]
    }

    /// Read [`BACKEND_ENV_VAR`]
    ///
    /// Returns `None` when the variable is unset or invalid. An invalid
    /// value is logged and ignored.
    pub fn from_env() -> Option<Backend> {
        let value = std::env::var(BACKEND_ENV_VAR).ok();
        parse_override(value.as_deref())
    }

    /// Apply the environment override to a requested backend
    pub fn resolve(requested: Backend) -> Backend {
        Backend::from_env().unwrap_or(requested)
    }
}

/// Parse an override value, logging and discarding invalid ones
pub(crate) fn parse_override(value: Option<&str>) -> Option<Backend> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    match value.parse::<Backend>() {
        Ok(backend) => Some(backend),
        Err(_) => {
            crate::sprout_warn!(
                "sprout::factory",
                "Ignoring {}={:?}: expected vulkan, opengl, gl, d3d11 or auto",
                BACKEND_ENV_VAR,
                value
            );
            None
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vulkan" | "vk" => Ok(Backend::Vulkan),
            "opengl" | "gl" => Ok(Backend::OpenGL),
            "d3d11" | "dx11" => Ok(Backend::D3D11),
            "auto" | "unknown" => Ok(Backend::Unknown),
            other => Err(Error::InvalidResource(format!("Unknown backend '{}'", other))),
        }
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
