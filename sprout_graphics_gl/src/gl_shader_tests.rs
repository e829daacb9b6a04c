use super::*;

// ============================================================================
// SYNTHETIC NAMES
// ============================================================================

#[test]
fn test_names_match_shader_compiler_output() {
    use sprout_shader_compiler::glsl;

    assert_eq!(ATTRIBUTE_PREFIX, glsl::ATTRIBUTE_PREFIX);
    assert_eq!(FRAG_OUTPUT_PREFIX, glsl::FRAG_OUTPUT_PREFIX);
    assert_eq!(UNIFORM_BLOCK_PREFIX, glsl::UNIFORM_BLOCK_PREFIX);
    assert_eq!(TEXTURE_PREFIX, glsl::TEXTURE_PREFIX);
    assert_eq!(FLIP_Y_UNIFORM, glsl::FLIP_Y_UNIFORM);
}

#[test]
fn test_name_formatting() {
    assert_eq!(attribute_name(3), "sp_Attrib_3");
    assert_eq!(frag_output_name(0), "sp_FragColor_0");
    assert_eq!(uniform_block_name(12), "sp_Uniform_12");
    assert_eq!(texture_uniform_name(1), "sp_Texture_1");
}

// ============================================================================
// UNIFORM CHECKS
// ============================================================================

#[test]
fn test_matching_uniforms_accepted() {
    let blocks = [ProgramBlock { slot: 0, size: 64 }];
    let uniforms = [Uniform::constant_buffer(0, 64), Uniform::texture(1)];
    assert!(check_uniforms(&blocks, &[1], &uniforms).is_ok());
}

#[test]
fn test_unused_declared_uniforms_accepted() {
    let uniforms = [Uniform::constant_buffer(0, 16), Uniform::texture(1)];
    assert!(check_uniforms(&[], &[], &uniforms).is_ok());
}

#[test]
fn test_missing_block_rejected() {
    let blocks = [ProgramBlock { slot: 2, size: 16 }];
    let uniforms = [Uniform::constant_buffer(0, 16)];
    assert!(matches!(
        check_uniforms(&blocks, &[], &uniforms),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_undersized_block_rejected() {
    let blocks = [ProgramBlock { slot: 0, size: 64 }];
    let uniforms = [Uniform::constant_buffer(0, 32)];
    assert!(matches!(
        check_uniforms(&blocks, &[], &uniforms),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_sampler_on_constant_buffer_slot_rejected() {
    let uniforms = [Uniform::constant_buffer(1, 16)];
    assert!(matches!(
        check_uniforms(&[], &[1], &uniforms),
        Err(Error::InvariantViolation(_))
    ));
}
