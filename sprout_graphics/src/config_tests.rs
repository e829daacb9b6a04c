//! Unit tests for config.rs

use crate::config::Config;

// ============================================================================
// DEFAULTS
// ============================================================================

#[test]
fn test_default_values() {
    let config = Config::default();
    assert_eq!(config.frames_in_flight, 3);
    assert_eq!(config.staging_buffer_size, 32 * 1024 * 1024);
    assert_eq!(config.uniform_buffer_size, 4 * 1024 * 1024);
    assert!(config.vsync);
    assert_eq!(config.enable_validation, cfg!(debug_assertions));
    assert_eq!(config.app_version, (1, 0, 0));
}

// ============================================================================
// BUILDERS
// ============================================================================

#[test]
fn test_builders_override_fields() {
    let config = Config::default()
        .with_app_name("Sprite Demo")
        .with_validation(false)
        .with_vsync(false)
        .with_frames_in_flight(2);
    assert_eq!(config.app_name, "Sprite Demo");
    assert!(!config.enable_validation);
    assert!(!config.vsync);
    assert_eq!(config.frames_in_flight, 2);
}

#[test]
fn test_frames_in_flight_is_at_least_one() {
    let config = Config::default().with_frames_in_flight(0);
    assert_eq!(config.frames_in_flight, 1);
}
