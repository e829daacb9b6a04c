//! Integration tests for the Direct3D 11 device
//!
//! These tests require a GPU and are marked with #[ignore].
//! Run with: cargo test -p sprout_graphics_d3d11 --test d3d11_device_tests -- --ignored

#![cfg(windows)]

mod gpu_test_utils;

use std::sync::Arc;

use gpu_test_utils::create_test_window;
use serial_test::serial;
use sprout_graphics::sprout::render::{
    AttributeType, BlendMode, Color, GraphicsDevice, RenderableInfo, Sampler, ShaderStage, Texture, TextureDesc,
    TextureUsage, Uniform, VertexAttribute, Viewport,
};
use sprout_graphics::sprout::{Backend, Config};
use sprout_graphics::Error;
use sprout_graphics_d3d11::D3D11GraphicsDevice;
use sprout_shader_compiler::compile_attachment;

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

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

const QUAD_VERTICES: [f32; 16] = [
    -0.5, -0.5, 0.0, 1.0, //
    0.5, -0.5, 1.0, 1.0, //
    0.5, 0.5, 1.0, 0.0, //
    -0.5, 0.5, 0.0, 0.0,
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 0, 2, 3];

fn checkerboard(size: u32) -> Vec<u8> {
    (0..size * size)
        .flat_map(|i| {
            if ((i % size) + (i / size)) % 2 == 0 {
                [255, 255, 255, 255]
            } else {
                [40, 40, 40, 255]
            }
        })
        .collect()
}

fn quad_info(shader: Arc<dyn sprout_graphics::sprout::render::Shader>, dynamic: bool) -> RenderableInfo {
    let mut info = RenderableInfo::new(shader);
    info.num_vertices = 4;
    info.vertex_size = 16;
    info.num_indices = 6;
    info.vertex_input = vec![
        VertexAttribute::new(0, AttributeType::Float2, 0),
        VertexAttribute::new(1, AttributeType::Float2, 8),
    ];
    info.uniforms = vec![Uniform::constant_buffer(0, 64), Uniform::texture(1)];
    info.blend_mode = BlendMode::NON_PREMULTIPLIED;
    info.dynamic = dynamic;
    info
}

// ============================================================================
// INTEGRATION TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_d3d11_render_to_texture_then_swapchain() {
    let (window, _event_loop) = create_test_window();
    let config = Config::default().with_validation(true);
    let mut device = D3D11GraphicsDevice::new(&window, &config).expect("D3D11 device");
    assert_eq!(device.backend(), Backend::D3D11);

    let (width, height) = device.swapchain_size();
    assert!(width > 0 && height > 0);
    assert_eq!(device.viewport(), Viewport::full(width, height));

    // Shader
    let vertex = compile_attachment(Backend::D3D11, ShaderStage::Vertex, TEXTURED_QUAD, "VSMain", None).unwrap();
    let pixel = compile_attachment(Backend::D3D11, ShaderStage::Pixel, TEXTURED_QUAD, "PSMain", None).unwrap();
    let shader = device.create_shader(&[vertex.clone(), pixel]).unwrap();

    let duplicate = device.create_shader(&[vertex.clone(), vertex]);
    assert!(matches!(duplicate, Err(Error::InvariantViolation(_))));

    // Textures
    let sprite = device
        .create_texture(
            &TextureDesc::new(8, 8, TextureUsage::SHADER | TextureUsage::GENERATE_MIPMAPS),
            Some(&checkerboard(8)),
        )
        .unwrap();
    sprite.set_sampler(Sampler::POINT_CLAMP).unwrap();
    assert_eq!(sprite.sampler(), Sampler::POINT_CLAMP);

    let target: Arc<dyn Texture> = device
        .create_texture(
            &TextureDesc::new(64, 64, TextureUsage::SHADER | TextureUsage::RENDER_TEXTURE),
            None,
        )
        .unwrap();
    let render_only = device
        .create_texture(&TextureDesc::new(64, 64, TextureUsage::RENDER_TEXTURE), None)
        .unwrap();

    // One static and one dynamic renderable exercise both update paths
    let mut quads = vec![
        device.create_renderable(&quad_info(Arc::clone(&shader), false)).unwrap(),
        device.create_renderable(&quad_info(Arc::clone(&shader), true)).unwrap(),
    ];
    for quad in &mut quads {
        quad.update_vertices(0, bytemuck::cast_slice(&QUAD_VERTICES)).unwrap();
        quad.update_indices(0, &QUAD_INDICES).unwrap();
        quad.push_uniform_data(0, 0, bytemuck::cast_slice(&IDENTITY)).unwrap();
        assert!(matches!(quad.draw(), Err(Error::InvariantViolation(_))));
    }

    for _ in 0..3 {
        device.set_render_textures(&[Arc::clone(&target), Arc::clone(&render_only)]).unwrap();
        assert_eq!(device.viewport(), Viewport::full(64, 64));
        device.clear(Color::CORNFLOWER_BLUE).unwrap();
        for quad in &mut quads {
            quad.push_texture(1, &sprite).unwrap();
            quad.draw().unwrap();

            quad.push_texture(1, &target).unwrap();
            assert!(matches!(quad.draw(), Err(Error::InvariantViolation(_))));
        }

        device.set_render_texture(None).unwrap();
        assert_eq!(device.viewport(), Viewport::full(width, height));
        device.clear(Color::BLACK).unwrap();
        for quad in &mut quads {
            quad.draw().unwrap();
            quad.update_vertices(1, bytemuck::cast_slice(&QUAD_VERTICES[4..8])).unwrap();
            quad.draw_count(3).unwrap();
        }

        device.present().unwrap();
    }

    // A zero-size resize (minimized window) keeps the current swapchain
    device.resize_swapchain(0, 0).unwrap();
    assert_eq!(device.swapchain_size(), (width, height));

    device.resize_swapchain(640, 480).unwrap();
    assert_eq!(device.swapchain_size(), (640, 480));
    assert_eq!(device.viewport(), Viewport::full(640, 480));
    device.clear(Color::WHITE).unwrap();
    device.present().unwrap();

    device.wait_idle().unwrap();
}
