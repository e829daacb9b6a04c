//! Integration tests for the precompiled shader container
//!
//! No GPU required.
//!
//! Run with: cargo test --test container_integration_tests

use sprout_graphics::sprout::render::ShaderStage;
use sprout_graphics::sprout::{Backend, Error, PrecompiledShader};

// ============================================================================
// CONTAINER ON DISK
// ============================================================================

#[test]
fn test_integration_container_per_backend_attachments() {
    let mut container = PrecompiledShader::new();
    let spirv_magic = 0x0723_0203u32.to_le_bytes().to_vec();
    container
        .add(Backend::Vulkan, ShaderStage::Vertex, "VSMain", spirv_magic.clone())
        .unwrap();
    container
        .add(Backend::Vulkan, ShaderStage::Pixel, "PSMain", spirv_magic)
        .unwrap();
    container
        .add(Backend::OpenGL, ShaderStage::Vertex, "main", b"#version 330\n".to_vec())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shader.pcsh");
    container.save(&path).unwrap();

    let loaded = PrecompiledShader::load(&path).unwrap();
    assert_eq!(loaded.attachments(Backend::Vulkan).unwrap().len(), 2);
    assert_eq!(loaded.attachments(Backend::OpenGL).unwrap().len(), 1);

    let err = loaded.attachments(Backend::D3D11).unwrap_err();
    assert_eq!(err, Error::ShaderNotPresent { backend: 4, stage: 0 });
    assert!(err.to_string().contains("recompilation"));
}

#[test]
fn test_integration_garbage_file_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.pcsh");
    std::fs::write(&path, b"definitely not a shader container").unwrap();

    assert!(matches!(
        PrecompiledShader::load(&path),
        Err(Error::InvalidContainer(_))
    ));
}
