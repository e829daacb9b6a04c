//! Unit tests for backend.rs

use crate::backend::{parse_override, Backend, BACKEND_ENV_VAR};
use serial_test::serial;

// ============================================================================
// NIBBLE TESTS
// ============================================================================

#[test]
fn test_nibble_values_are_stable() {
    assert_eq!(Backend::Unknown.nibble(), 0);
    assert_eq!(Backend::Vulkan.nibble(), 1);
    assert_eq!(Backend::D3D11.nibble(), 4);
    assert_eq!(Backend::OpenGL.nibble(), 5);
}

#[test]
fn test_from_nibble_known_values() {
    for backend in [Backend::Unknown, Backend::Vulkan, Backend::D3D11, Backend::OpenGL] {
        assert_eq!(Backend::from_nibble(backend.nibble()), Some(backend));
    }
}

#[test]
fn test_from_nibble_reserved_values() {
    assert_eq!(Backend::from_nibble(2), None);
    assert_eq!(Backend::from_nibble(3), None);
    assert_eq!(Backend::from_nibble(6), None);
    assert_eq!(Backend::from_nibble(15), None);
}

// ============================================================================
// PARSING TESTS
// ============================================================================

#[test]
fn test_from_str_accepts_aliases() {
    assert_eq!("vulkan".parse::<Backend>().unwrap(), Backend::Vulkan);
    assert_eq!("OpenGL".parse::<Backend>().unwrap(), Backend::OpenGL);
    assert_eq!("gl".parse::<Backend>().unwrap(), Backend::OpenGL);
    assert_eq!("d3d11".parse::<Backend>().unwrap(), Backend::D3D11);
    assert_eq!(" auto ".parse::<Backend>().unwrap(), Backend::Unknown);
}

#[test]
fn test_from_str_rejects_unknown() {
    assert!("metal".parse::<Backend>().is_err());
}

#[test]
fn test_display_uses_name() {
    assert_eq!(Backend::Vulkan.to_string(), "Vulkan");
    assert_eq!(Backend::Unknown.to_string(), "Auto");
}

// ============================================================================
// PROBE ORDER / OVERRIDE TESTS
// ============================================================================

#[test]
fn test_preferred_order_ends_with_opengl() {
    let order = Backend::preferred_order();
    assert_eq!(order.last(), Some(&Backend::OpenGL));
    assert!(!order.contains(&Backend::Unknown));
    if cfg!(windows) {
        assert_eq!(order[0], Backend::D3D11);
    } else {
        assert_eq!(order, &[Backend::Vulkan, Backend::OpenGL]);
    }
}

#[test]
fn test_parse_override_values() {
    assert_eq!(parse_override(None), None);
    assert_eq!(parse_override(Some("")), None);
    assert_eq!(parse_override(Some("gl")), Some(Backend::OpenGL));
    assert_eq!(parse_override(Some("auto")), Some(Backend::Unknown));
    assert_eq!(parse_override(Some("glide")), None);
}

#[test]
#[serial]
fn test_from_env_reads_variable() {
    std::env::set_var(BACKEND_ENV_VAR, "opengl");
    assert_eq!(Backend::from_env(), Some(Backend::OpenGL));
    assert_eq!(Backend::resolve(Backend::Vulkan), Backend::OpenGL);

    std::env::set_var(BACKEND_ENV_VAR, "nonsense");
    assert_eq!(Backend::from_env(), None);
    assert_eq!(Backend::resolve(Backend::Vulkan), Backend::Vulkan);

    std::env::remove_var(BACKEND_ENV_VAR);
    assert_eq!(Backend::from_env(), None);
}
