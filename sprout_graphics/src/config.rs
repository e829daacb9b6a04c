//! Device configuration

/// Configuration passed to every backend factory
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name (reported to the driver where the API allows it)
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Synchronize presentation with the display refresh
    pub vsync: bool,
    /// Number of frames the CPU may record ahead of the GPU (explicit backend)
    pub frames_in_flight: usize,
    /// Capacity of the per-frame staging buffer in bytes
    pub staging_buffer_size: u64,
    /// Capacity of the per-frame uniform upload buffer in bytes
    pub uniform_buffer_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Sprout Application".to_string(),
            app_version: (1, 0, 0),
            enable_validation: cfg!(debug_assertions),
            vsync: true,
            frames_in_flight: 3,
            staging_buffer_size: 32 * 1024 * 1024,
            uniform_buffer_size: 4 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.enable_validation = enabled;
        self
    }

    pub fn with_vsync(mut self, enabled: bool) -> Self {
        self.vsync = enabled;
        self
    }

    pub fn with_frames_in_flight(mut self, frames: usize) -> Self {
        self.frames_in_flight = frames.max(1);
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
