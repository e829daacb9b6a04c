//! Integration tests for the Vulkan device
//!
//! These tests require a GPU and a display and are marked with #[ignore].
//! Run with: cargo test -p sprout_graphics_vulkan --test vulkan_device_tests -- --ignored

mod gpu_test_utils;

use std::sync::Arc;

use gpu_test_utils::create_test_window;
use serial_test::serial;
use sprout_graphics::sprout::render::{
    AttributeType, BlendMode, Color, GraphicsDevice, RenderableInfo, ShaderStage, Texture, TextureDesc,
    TextureUsage, Uniform, VertexAttribute, Viewport,
};
use sprout_graphics::sprout::{Backend, Config};
use sprout_graphics::Error;
use sprout_graphics_vulkan::VulkanGraphicsDevice;
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
            let on = ((i % size) + (i / size)) % 2 == 0;
            if on {
                [255, 255, 255, 255]
            } else {
                [40, 40, 40, 255]
            }
        })
        .collect()
}

// ============================================================================
// INTEGRATION TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_render_to_texture_then_swapchain() {
    let (window, _event_loop) = create_test_window();
    let config = Config::default().with_validation(false).with_frames_in_flight(2);
    let mut device = VulkanGraphicsDevice::new(&window, &config).expect("Vulkan device");
    assert_eq!(device.backend(), Backend::Vulkan);

    let (width, height) = device.swapchain_size();
    assert!(width > 0 && height > 0);
    assert_eq!(device.viewport(), Viewport::full(width, height));

    // Shader
    let vertex = compile_attachment(Backend::Vulkan, ShaderStage::Vertex, TEXTURED_QUAD, "VSMain", None).unwrap();
    let pixel = compile_attachment(Backend::Vulkan, ShaderStage::Pixel, TEXTURED_QUAD, "PSMain", None).unwrap();
    let shader = device.create_shader(&[vertex.clone(), pixel]).unwrap();

    // Duplicate stages are rejected before any native object is made
    let duplicate = device.create_shader(&[vertex.clone(), vertex]);
    assert!(matches!(duplicate, Err(Error::InvariantViolation(_))));

    // Textures
    let sprite = device
        .create_texture(
            &TextureDesc::new(8, 8, TextureUsage::SHADER | TextureUsage::GENERATE_MIPMAPS),
            Some(&checkerboard(8)),
        )
        .unwrap();
    let target: Arc<dyn Texture> = device
        .create_texture(
            &TextureDesc::new(64, 64, TextureUsage::SHADER | TextureUsage::RENDER_TEXTURE),
            None,
        )
        .unwrap();
    let render_only = device
        .create_texture(&TextureDesc::new(64, 64, TextureUsage::RENDER_TEXTURE), None)
        .unwrap();

    // Renderable
    let mut info = RenderableInfo::new(Arc::clone(&shader));
    info.num_vertices = 4;
    info.vertex_size = 16;
    info.num_indices = 6;
    info.vertex_input = vec![
        VertexAttribute::new(0, AttributeType::Float2, 0),
        VertexAttribute::new(1, AttributeType::Float2, 8),
    ];
    info.uniforms = vec![Uniform::constant_buffer(0, 64), Uniform::texture(1)];
    info.blend_mode = BlendMode::NON_PREMULTIPLIED;
    let mut quad = device.create_renderable(&info).unwrap();

    quad.update_vertices(0, bytemuck::cast_slice(&QUAD_VERTICES)).unwrap();
    quad.update_indices(0, &QUAD_INDICES).unwrap();
    quad.push_uniform_data(0, 0, bytemuck::cast_slice(&IDENTITY)).unwrap();

    // Drawing with an unbound texture slot is refused
    assert!(matches!(quad.draw(), Err(Error::InvariantViolation(_))));

    for _ in 0..3 {
        // Off-screen pass into two targets of the same size
        device.set_render_textures(&[Arc::clone(&target), Arc::clone(&render_only)]).unwrap();
        assert_eq!(device.viewport(), Viewport::full(64, 64));
        device.clear(Color::CORNFLOWER_BLUE).unwrap();
        quad.push_texture(1, &sprite).unwrap();
        quad.draw().unwrap();

        // Sampling a bound target is refused
        quad.push_texture(1, &target).unwrap();
        assert!(matches!(quad.draw(), Err(Error::InvariantViolation(_))));

        // Swapchain pass sampling the off-screen result
        device.set_render_texture(None).unwrap();
        assert_eq!(device.viewport(), Viewport::full(width, height));
        device.clear(Color::BLACK).unwrap();
        quad.draw().unwrap();

        // An upload between draws keeps call order
        quad.update_vertices(1, bytemuck::cast_slice(&QUAD_VERTICES[4..8])).unwrap();
        device.set_viewport(Viewport::new(0, 0, width / 2, height / 2)).unwrap();
        quad.draw_count(3).unwrap();

        device.present().unwrap();
    }

    // Resize, then a full frame at the new size
    device.resize_swapchain(640, 480).unwrap();
    let (new_width, new_height) = device.swapchain_size();
    assert_eq!(device.viewport(), Viewport::full(new_width, new_height));
    device.clear(Color::WHITE).unwrap();
    device.present().unwrap();

    device.wait_idle().unwrap();
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_zero_sized_swapchain_skips_frames() {
    let (window, _event_loop) = create_test_window();
    let config = Config::default().with_validation(false);
    let mut device = VulkanGraphicsDevice::new(&window, &config).expect("Vulkan device");

    let vertex = compile_attachment(Backend::Vulkan, ShaderStage::Vertex, TEXTURED_QUAD, "VSMain", None).unwrap();
    let pixel = compile_attachment(Backend::Vulkan, ShaderStage::Pixel, TEXTURED_QUAD, "PSMain", None).unwrap();
    let shader = device.create_shader(&[vertex, pixel]).unwrap();
    let sprite = device
        .create_texture(&TextureDesc::new(8, 8, TextureUsage::SHADER), Some(&checkerboard(8)))
        .unwrap();

    let mut info = RenderableInfo::new(shader);
    info.num_vertices = 4;
    info.vertex_size = 16;
    info.num_indices = 6;
    info.vertex_input = vec![
        VertexAttribute::new(0, AttributeType::Float2, 0),
        VertexAttribute::new(1, AttributeType::Float2, 8),
    ];
    info.uniforms = vec![Uniform::constant_buffer(0, 64), Uniform::texture(1)];
    let mut quad = device.create_renderable(&info).unwrap();
    quad.push_uniform_data(0, 0, bytemuck::cast_slice(&IDENTITY)).unwrap();
    quad.push_texture(1, &sprite).unwrap();

    // Minimized: every frame call succeeds, uploads are still recorded
    device.resize_swapchain(0, 0).unwrap();
    for _ in 0..3 {
        quad.update_vertices(0, bytemuck::cast_slice(&QUAD_VERTICES)).unwrap();
        quad.update_indices(0, &QUAD_INDICES).unwrap();
        device.clear(Color::BLACK).unwrap();
        quad.draw().unwrap();
        device.present().unwrap();
    }

    // Restored
    device.resize_swapchain(320, 240).unwrap();
    let (width, height) = device.swapchain_size();
    assert!(width > 0 && height > 0);
    device.clear(Color::CORNFLOWER_BLUE).unwrap();
    quad.draw().unwrap();
    device.present().unwrap();

    device.wait_idle().unwrap();
}
