//! Unit tests for texture.rs

use std::sync::Arc;

use crate::error::Error;
use crate::graphics_device::mock_graphics_device::MockTexture;
use crate::graphics_device::{
    same_texture, validate_render_targets, Filter, PixelFormat, Sampler, Texture, TextureAddress,
    TextureDesc, TextureUsage,
};

fn mock(width: u32, height: u32, usage: TextureUsage) -> Arc<dyn Texture> {
    Arc::new(MockTexture::new(TextureDesc::new(width, height, usage), None))
}

// ============================================================================
// TEXTURE DESC VALIDATION
// ============================================================================

#[test]
fn test_render_only_texture_is_valid() {
    let desc = TextureDesc::new(128, 64, TextureUsage::RENDER_TEXTURE);
    assert!(desc.validate(None).is_ok());
    assert!(desc.is_render_only());
}

#[test]
fn test_render_texture_with_mipmaps_requires_shader() {
    let desc = TextureDesc::new(
        128,
        64,
        TextureUsage::RENDER_TEXTURE | TextureUsage::GENERATE_MIPMAPS,
    );
    assert!(matches!(desc.validate(None), Err(Error::InvariantViolation(_))));

    let desc = TextureDesc::new(
        128,
        64,
        TextureUsage::RENDER_TEXTURE | TextureUsage::GENERATE_MIPMAPS | TextureUsage::SHADER,
    );
    assert!(desc.validate(None).is_ok());
    assert!(!desc.is_render_only());
}

#[test]
fn test_empty_usage_rejected() {
    let desc = TextureDesc::new(4, 4, TextureUsage::empty());
    assert!(matches!(desc.validate(None), Err(Error::InvariantViolation(_))));
}

#[test]
fn test_zero_size_rejected() {
    let desc = TextureDesc::new(0, 4, TextureUsage::SHADER);
    assert!(matches!(desc.validate(None), Err(Error::InvariantViolation(_))));
}

#[test]
fn test_data_size_must_match() {
    let desc = TextureDesc::new(2, 2, TextureUsage::SHADER);
    assert_eq!(desc.data_size(), 16);
    assert!(desc.validate(Some(&[0u8; 16])).is_ok());
    assert!(matches!(
        desc.validate(Some(&[0u8; 15])),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_mip_levels() {
    assert_eq!(TextureDesc::new(256, 256, TextureUsage::SHADER).mip_levels(), 1);
    let mipped = TextureUsage::SHADER | TextureUsage::GENERATE_MIPMAPS;
    assert_eq!(TextureDesc::new(256, 256, mipped).mip_levels(), 9);
    assert_eq!(TextureDesc::new(256, 17, mipped).mip_levels(), 9);
    assert_eq!(TextureDesc::new(1, 1, mipped).mip_levels(), 1);
}

#[test]
fn test_pixel_format_size() {
    assert_eq!(PixelFormat::R8G8B8A8_UNORM.bytes_per_pixel(), 4);
}

#[test]
fn test_usage_bits_are_stable() {
    assert_eq!(TextureUsage::SHADER.bits(), 1);
    assert_eq!(TextureUsage::RENDER_TEXTURE.bits(), 2);
    assert_eq!(TextureUsage::GENERATE_MIPMAPS.bits(), 1 << 16);
}

// ============================================================================
// SAMPLER
// ============================================================================

#[test]
fn test_sampler_presets() {
    assert_eq!(Sampler::default(), Sampler::LINEAR);
    assert_eq!(Sampler::POINT.min_filter, Filter::Point);
    assert_eq!(Sampler::POINT.address_u, TextureAddress::Repeat);
    assert_eq!(Sampler::LINEAR_CLAMP.address_v, TextureAddress::ClampToEdge);
    assert_eq!(Sampler::POINT_CLAMP.mip_filter, Filter::Point);
}

#[test]
fn test_sampler_structural_equality() {
    let a = Sampler {
        address_u: TextureAddress::RepeatMirrored,
        ..Sampler::LINEAR
    };
    let b = Sampler {
        address_u: TextureAddress::RepeatMirrored,
        ..Sampler::LINEAR
    };
    assert_eq!(a, b);
    assert_ne!(a, Sampler::LINEAR);
}

#[test]
fn test_texture_sampler_is_mutable() {
    let texture = mock(4, 4, TextureUsage::SHADER);
    assert_eq!(texture.sampler(), Sampler::LINEAR);
    texture.set_sampler(Sampler::POINT_CLAMP).unwrap();
    assert_eq!(texture.sampler(), Sampler::POINT_CLAMP);
}

// ============================================================================
// RENDER TARGET LIST VALIDATION
// ============================================================================

#[test]
fn test_empty_target_list_means_swapchain() {
    assert_eq!(validate_render_targets(&[]).unwrap(), None);
}

#[test]
fn test_target_list_returns_common_size() {
    let a = mock(320, 200, TextureUsage::RENDER_TEXTURE);
    let b = mock(320, 200, TextureUsage::RENDER_TEXTURE | TextureUsage::SHADER);
    assert_eq!(validate_render_targets(&[a, b]).unwrap(), Some((320, 200)));
}

#[test]
fn test_target_list_rejects_size_mismatch() {
    let a = mock(320, 200, TextureUsage::RENDER_TEXTURE);
    let b = mock(64, 64, TextureUsage::RENDER_TEXTURE);
    assert!(matches!(
        validate_render_targets(&[a, b]),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_target_list_rejects_shader_only_texture() {
    let a = mock(16, 16, TextureUsage::SHADER);
    assert!(matches!(
        validate_render_targets(&[a]),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn test_target_list_rejects_duplicates() {
    let a = mock(16, 16, TextureUsage::RENDER_TEXTURE);
    assert!(same_texture(&a, &a.clone()));
    assert!(validate_render_targets(&[a.clone(), a]).is_err());
}
