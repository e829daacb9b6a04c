use super::*;
use sprout_graphics::Error;

fn resource(name: &str, kind: ResourceKind, slot: u32) -> ShaderResource {
    ShaderResource {
        name: name.to_string(),
        kind,
        slot,
    }
}

fn input(semantic: &str, semantic_index: u32, register: u32) -> InputParameter {
    InputParameter {
        semantic: semantic.to_string(),
        semantic_index,
        register,
    }
}

// ============================================================================
// RESOURCES
// ============================================================================

#[test]
fn test_textured_quad_resources_accepted() {
    let resources = [
        resource("Transform", ResourceKind::ConstantBuffer, 0),
        resource("Sprite", ResourceKind::Texture, 1),
        resource("SpriteSampler", ResourceKind::Sampler, 1),
    ];
    let uniforms = [Uniform::constant_buffer(0, 64), Uniform::texture(1)];
    assert!(check_resources(&resources, &uniforms).is_ok());
}

#[test]
fn test_undeclared_constant_buffer_rejected() {
    let resources = [resource("Transform", ResourceKind::ConstantBuffer, 2)];
    let uniforms = [Uniform::constant_buffer(0, 64)];
    assert!(matches!(
        check_resources(&resources, &uniforms),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_sampler_on_constant_buffer_slot_rejected() {
    let resources = [resource("SpriteSampler", ResourceKind::Sampler, 0)];
    let uniforms = [Uniform::constant_buffer(0, 16)];
    assert!(matches!(
        check_resources(&resources, &uniforms),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_texture_slot_does_not_satisfy_constant_buffer() {
    let resources = [resource("Transform", ResourceKind::ConstantBuffer, 1)];
    let uniforms = [Uniform::texture(1)];
    assert!(check_resources(&resources, &uniforms).is_err());
}

// ============================================================================
// INPUT SIGNATURE
// ============================================================================

#[test]
fn test_location_maps_to_register() {
    let inputs = [input("POSITION", 0, 0), input("TEXCOORD", 0, 1), input("COLOR", 0, 2)];
    assert_eq!(input_for_location(&inputs, 1).unwrap().semantic, "TEXCOORD");
    assert_eq!(input_for_location(&inputs, 2).unwrap().semantic, "COLOR");
}

#[test]
fn test_missing_location_rejected() {
    let inputs = [input("POSITION", 0, 0)];
    assert!(matches!(
        input_for_location(&inputs, 3),
        Err(Error::InvariantViolation(_))
    ));
}
