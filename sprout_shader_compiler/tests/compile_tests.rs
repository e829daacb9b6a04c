//! Integration tests for the HLSL cross-compiler
//!
//! No GPU required.
//!
//! Run with: cargo test --test compile_tests

use sprout_graphics::sprout::render::ShaderStage;
use sprout_graphics::sprout::{Backend, Error, PrecompiledShader};
use sprout_shader_compiler::{compile, compile_attachment, compile_precompiled};

const SPIRV_MAGIC: u32 = 0x0723_0203;

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

// ============================================================================
// VULKAN
// ============================================================================

#[test]
fn test_vulkan_output_is_spirv() {
    let bytes = compile(Backend::Vulkan, ShaderStage::Vertex, TEXTURED_QUAD, "VSMain", None).unwrap();
    assert_eq!(bytes.len() % 4, 0);
    let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(magic, SPIRV_MAGIC);
}

#[test]
fn test_compile_error_carries_diagnostic() {
    let err = compile(Backend::Vulkan, ShaderStage::Pixel, "float4 PSMain( : SV_Target", "PSMain", None)
        .unwrap_err();
    match err {
        Error::ShaderCompile { backend, stage, message } => {
            assert_eq!(backend, Backend::Vulkan);
            assert_eq!(stage, ShaderStage::Pixel);
            assert!(!message.is_empty());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_include_directory_is_searched() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("color.hlsli"), "float4 FillColor() { return float4(1, 0, 0, 1); }").unwrap();
    let source = "#include \"color.hlsli\"\nfloat4 PSMain() : SV_Target0 { return FillColor(); }\n";

    let bytes = compile(Backend::Vulkan, ShaderStage::Pixel, source, "PSMain", Some(dir.path())).unwrap();
    assert!(!bytes.is_empty());
}

// ============================================================================
// OPENGL
// ============================================================================

#[test]
fn test_opengl_vertex_uses_stable_names() {
    let attachment =
        compile_attachment(Backend::OpenGL, ShaderStage::Vertex, TEXTURED_QUAD, "VSMain", None).unwrap();
    assert_eq!(attachment.entry_point, "main");

    let glsl = String::from_utf8(attachment.source).unwrap();
    assert!(glsl.starts_with("#version 330"));
    assert!(glsl.contains("uniform float sp_FlipY;"));
    assert!(glsl.contains("sp_Uniform_0"));
    assert!(glsl.contains("sp_ToFrag_var"));
    assert!(glsl.contains("sp_Attrib_0"));
}

#[test]
fn test_opengl_pixel_uses_stable_names() {
    let bytes = compile(Backend::OpenGL, ShaderStage::Pixel, TEXTURED_QUAD, "PSMain", None).unwrap();
    let glsl = String::from_utf8(bytes).unwrap();
    assert!(glsl.contains("sp_Texture_1"));
    assert!(glsl.contains("sp_ToFrag_var"));
    assert!(!glsl.contains("sp_FlipY"));
}

// ============================================================================
// D3D11
// ============================================================================

#[cfg(not(windows))]
#[test]
fn test_dxbc_unavailable_off_windows() {
    let err = compile(Backend::D3D11, ShaderStage::Vertex, TEXTURED_QUAD, "VSMain", None).unwrap_err();
    assert!(err.to_string().contains("requires Windows"));
}

#[cfg(windows)]
#[test]
fn test_dxbc_output_has_container_header() {
    let bytes = compile(Backend::D3D11, ShaderStage::Vertex, TEXTURED_QUAD, "VSMain", None).unwrap();
    assert_eq!(&bytes[..4], b"DXBC");
}

// ============================================================================
// CONTAINER
// ============================================================================

#[test]
fn test_precompiled_container_round_trips_through_disk() {
    let container = compile_precompiled(
        TEXTURED_QUAD,
        "VSMain",
        "PSMain",
        None,
        &[Backend::Vulkan, Backend::OpenGL],
    )
    .unwrap();
    assert_eq!(container.len(), 4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quad.pcsh");
    container.save(&path).unwrap();

    let loaded = PrecompiledShader::load(&path).unwrap();
    let (entry, _) = loaded.get_source(Backend::Vulkan, ShaderStage::Pixel).unwrap();
    assert_eq!(entry, "PSMain");
    let (entry, _) = loaded.get_source(Backend::OpenGL, ShaderStage::Pixel).unwrap();
    assert_eq!(entry, "main");
}

#[test]
fn test_unknown_backend_is_rejected() {
    let err = compile(Backend::Unknown, ShaderStage::Vertex, TEXTURED_QUAD, "VSMain", None).unwrap_err();
    assert!(matches!(err, Error::InvalidResource(_)));
}
