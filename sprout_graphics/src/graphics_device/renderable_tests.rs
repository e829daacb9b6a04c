//! Unit tests for renderable.rs

use std::sync::Arc;

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockShader;
use crate::graphics_device::{
    AttributeType, BlendMode, RenderableInfo, Shader, ShaderStage, Uniform, UniformType,
    VertexAttribute,
};

fn shader() -> Arc<dyn Shader> {
    Arc::new(MockShader {
        stages: vec![ShaderStage::Vertex, ShaderStage::Pixel],
    })
}

/// Sprite-like renderable: position + uv, 4 vertices, 6 indices
fn quad_info() -> RenderableInfo {
    RenderableInfo {
        num_vertices: 4,
        vertex_size: 16,
        num_indices: 6,
        vertex_input: vec![
            VertexAttribute::new(0, AttributeType::Float2, 0),
            VertexAttribute::new(1, AttributeType::Float2, 8),
        ],
        uniforms: vec![Uniform::constant_buffer(0, 64), Uniform::texture(1)],
        blend_mode: BlendMode::PREMULTIPLIED,
        dynamic: true,
        ..RenderableInfo::new(shader())
    }
}

// ============================================================================
// ATTRIBUTE / UNIFORM HELPERS
// ============================================================================

#[test]
fn test_attribute_sizes() {
    assert_eq!(AttributeType::Float.size(), 4);
    assert_eq!(AttributeType::Float2.size(), 8);
    assert_eq!(AttributeType::Float3.size(), 12);
    assert_eq!(AttributeType::Float4.size(), 16);
}

#[test]
fn test_uniform_helpers() {
    assert_eq!(
        Uniform::constant_buffer(2, 32).uniform_type,
        UniformType::ConstantBuffer { size: 32 }
    );
    assert_eq!(Uniform::texture(3).slot, 3);
}

// ============================================================================
// VALIDATE
// ============================================================================

#[test]
fn test_valid_quad() {
    let info = quad_info();
    assert!(info.validate().is_ok());
    assert_eq!(info.vertex_buffer_size(), 64);
    assert_eq!(info.index_buffer_size(), 24);
    assert_eq!(info.default_draw_count(), 6);
}

#[test]
fn test_fullscreen_triangle_without_buffers_is_valid() {
    let info = RenderableInfo::new(shader());
    assert!(info.validate().is_ok());
    assert_eq!(info.default_draw_count(), 0);
    assert!(info.check_draw_count(3).is_ok());
}

#[test]
fn test_indices_without_vertices_rejected() {
    let info = RenderableInfo {
        num_indices: 3,
        ..RenderableInfo::new(shader())
    };
    assert!(matches!(info.validate(), Err(Error::InvariantViolation(_))));
}

#[test]
fn test_vertices_without_stride_rejected() {
    let info = RenderableInfo {
        num_vertices: 3,
        ..RenderableInfo::new(shader())
    };
    assert!(matches!(info.validate(), Err(Error::InvariantViolation(_))));
}

#[test]
fn test_attribute_past_stride_rejected() {
    let mut info = quad_info();
    info.vertex_input.push(VertexAttribute::new(2, AttributeType::Float, 16));
    assert!(matches!(info.validate(), Err(Error::InvariantViolation(_))));
}

#[test]
fn test_duplicate_location_rejected() {
    let mut info = quad_info();
    info.vertex_input[1].location = 0;
    assert!(info.validate().is_err());
}

#[test]
fn test_duplicate_slot_rejected() {
    let mut info = quad_info();
    info.uniforms.push(Uniform::texture(0));
    assert!(info.validate().is_err());
}

#[test]
fn test_constant_buffer_size_must_be_multiple_of_16() {
    let mut info = quad_info();
    info.uniforms[0] = Uniform::constant_buffer(0, 20);
    assert!(info.validate().is_err());
    info.uniforms[0] = Uniform::constant_buffer(0, 0);
    assert!(info.validate().is_err());
}

#[test]
fn test_slot_out_of_range_rejected() {
    let mut info = quad_info();
    info.uniforms.push(Uniform::texture(16));
    assert!(info.validate().is_err());
}

// ============================================================================
// WRITE / DRAW CHECKS
// ============================================================================

#[test]
fn test_vertex_write_bounds() {
    let info = quad_info();
    assert_eq!(info.check_vertex_write(0, 64).unwrap(), 0);
    assert_eq!(info.check_vertex_write(2, 32).unwrap(), 32);
    assert!(info.check_vertex_write(3, 32).is_err());
    assert!(info.check_vertex_write(0, 10).is_err());
}

#[test]
fn test_index_write_bounds() {
    let info = quad_info();
    assert_eq!(info.check_index_write(3, 3).unwrap(), 12);
    assert!(info.check_index_write(4, 3).is_err());
}

#[test]
fn test_draw_count_limits() {
    let info = quad_info();
    assert!(info.check_draw_count(6).is_ok());
    assert!(info.check_draw_count(7).is_err());

    let no_indices = RenderableInfo {
        num_indices: 0,
        ..quad_info()
    };
    assert_eq!(no_indices.default_draw_count(), 4);
    assert!(no_indices.check_draw_count(5).is_err());
}
