//! Unit tests for error.rs

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::graphics_device::ShaderStage;

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("queue submit failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("queue submit failed"));
}

#[test]
fn test_out_of_memory_display() {
    assert_eq!(format!("{}", Error::OutOfMemory), "Out of GPU memory");
}

#[test]
fn test_shader_compile_display_keeps_diagnostic_verbatim() {
    let err = Error::ShaderCompile {
        backend: Backend::OpenGL,
        stage: ShaderStage::Pixel,
        message: "shader.hlsl:3:5: error: unknown type name 'flaot'".to_string(),
    };
    let display = format!("{}", err);
    assert!(display.contains("OpenGL"));
    assert!(display.contains("Pixel"));
    assert!(display.contains("shader.hlsl:3:5: error: unknown type name 'flaot'"));
}

#[test]
fn test_native_call_display_has_operation_and_code() {
    let err = Error::NativeCall {
        operation: "vkQueueSubmit".to_string(),
        code: -4,
    };
    let display = format!("{}", err);
    assert!(display.contains("vkQueueSubmit"));
    assert!(display.contains("-4"));
}

#[test]
fn test_shader_not_present_display_names_pair() {
    let err = Error::ShaderNotPresent {
        backend: Backend::Vulkan.nibble(),
        stage: ShaderStage::Vertex.nibble(),
    };
    let display = format!("{}", err);
    assert!(display.contains("Vulkan"));
    assert!(display.contains("Vertex"));
    assert!(display.contains("recompilation"));
}

#[test]
fn test_shader_not_present_display_unknown_nibbles() {
    let err = Error::ShaderNotPresent { backend: 3, stage: 7 };
    let display = format!("{}", err);
    assert!(display.contains("backend #3"));
    assert!(display.contains("stage #7"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::ResourceLimit("staging".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.pcsh");
    let err: Error = io.into();
    assert!(matches!(err, Error::Io(ref msg) if msg.contains("missing.pcsh")));
}

#[test]
fn test_result_alias_propagates() {
    fn inner() -> Result<u32> {
        Err(Error::InvariantViolation("slot 3 not declared".to_string()))
    }
    fn outer() -> Result<u32> {
        let v = inner()?;
        Ok(v + 1)
    }
    assert_eq!(
        outer(),
        Err(Error::InvariantViolation("slot 3 not declared".to_string()))
    );
}
