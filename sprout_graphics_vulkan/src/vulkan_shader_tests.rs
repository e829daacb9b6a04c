use super::*;
use sprout_graphics::sprout::Backend;
use sprout_graphics::Error;

const TEXTURED_QUAD: &str = r#"
cbuffer Transform : register(b0)
{
    float4x4 Matrix;
};

Texture2D Sprite : register(t1);
SamplerState SpriteSampler : register(s1);

struct VSInput
{
    float2 Position : POSITION0;
    float2 TexCoord : TEXCOORD0;
};

struct VSOutput
{
    float4 Position : SV_Position;
    float2 TexCoord : TEXCOORD0;
};

VSOutput VSMain(VSInput input)
{
    VSOutput output;
    output.Position = mul(Matrix, float4(input.Position, 0.0, 1.0));
    output.TexCoord = input.TexCoord;
    return output;
}

float4 PSMain(VSOutput input) : SV_Target0
{
    return Sprite.Sample(SpriteSampler, input.TexCoord);
}
"#;

fn compile_words(stage: ShaderStage, entry: &str) -> Vec<u32> {
    let bytes = sprout_shader_compiler::compile(Backend::Vulkan, stage, TEXTURED_QUAD, entry, None)
        .expect("HLSL should compile to SPIR-V");
    spirv_words(&bytes).expect("compiler output should be valid SPIR-V")
}

fn binding(binding: u32, kind: BindingKind) -> ReflectedBinding {
    ReflectedBinding {
        name: String::new(),
        set: 0,
        binding,
        kind,
    }
}

// ============================================================================
// SPIR-V WORDS
// ============================================================================

#[test]
fn test_spirv_words_rejects_partial_word() {
    let result = spirv_words(&[0x03, 0x02, 0x23, 0x07, 0x00]);
    assert!(matches!(result, Err(Error::InvariantViolation(_))));
}

#[test]
fn test_spirv_words_rejects_bad_magic() {
    let result = spirv_words(&[0u8; 8]);
    assert!(matches!(result, Err(Error::InvariantViolation(_))));
}

#[test]
fn test_spirv_words_little_endian() {
    let words = spirv_words(&[0x03, 0x02, 0x23, 0x07, 0x01, 0x00, 0x00, 0x00]).unwrap();
    assert_eq!(words, vec![0x0723_0203, 1]);
}

// ============================================================================
// REFLECTION
// ============================================================================

#[test]
fn test_vertex_stage_reflects_constant_buffer() {
    let bindings = reflect_bindings(&compile_words(ShaderStage::Vertex, "VSMain")).unwrap();
    assert!(bindings
        .iter()
        .any(|b| b.set == 0 && b.binding == 0 && b.kind == BindingKind::UniformBuffer));
}

#[test]
fn test_pixel_stage_reflects_shifted_sampler() {
    let bindings = reflect_bindings(&compile_words(ShaderStage::Pixel, "PSMain")).unwrap();
    assert!(bindings
        .iter()
        .any(|b| b.binding == 1 && b.kind == BindingKind::SampledImage));
    assert!(bindings
        .iter()
        .any(|b| b.binding == 1 + SAMPLER_BINDING_SHIFT && b.kind == BindingKind::Sampler));
}

// ============================================================================
// BINDING CHECKS
// ============================================================================

#[test]
fn test_bindings_match_declared_uniforms() {
    let bindings = [
        binding(0, BindingKind::UniformBuffer),
        binding(1, BindingKind::SampledImage),
        binding(17, BindingKind::Sampler),
    ];
    let uniforms = [Uniform::constant_buffer(0, 64), Uniform::texture(1)];
    assert!(check_bindings(&bindings, &uniforms).is_ok());
}

#[test]
fn test_missing_constant_buffer_rejected() {
    let bindings = [binding(0, BindingKind::UniformBuffer)];
    let uniforms = [Uniform::texture(0)];
    assert!(matches!(
        check_bindings(&bindings, &uniforms),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_sampler_without_texture_slot_rejected() {
    let bindings = [binding(18, BindingKind::Sampler)];
    let uniforms = [Uniform::texture(1)];
    assert!(check_bindings(&bindings, &uniforms).is_err());
}

#[test]
fn test_unshifted_sampler_rejected() {
    let bindings = [binding(3, BindingKind::Sampler)];
    let uniforms = [Uniform::texture(3)];
    assert!(check_bindings(&bindings, &uniforms).is_err());
}

#[test]
fn test_nonzero_descriptor_set_rejected() {
    let mut b = binding(0, BindingKind::UniformBuffer);
    b.set = 1;
    assert!(check_bindings(&[b], &[Uniform::constant_buffer(0, 16)]).is_err());
}

#[test]
fn test_unused_uniforms_are_allowed() {
    let uniforms = [Uniform::constant_buffer(0, 16), Uniform::texture(2)];
    assert!(check_bindings(&[], &uniforms).is_ok());
}
