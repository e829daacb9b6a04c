/// Conversions from sprout descriptions to Vulkan enums

use ash::vk;
use sprout_graphics::sprout::render::{
    AttributeType, BlendFactor, BlendMode, BlendOperation, Filter, PixelFormat, TextureAddress,
};

pub(crate) fn blend_factor_to_vk(factor: BlendFactor) -> vk::BlendFactor {
    match factor {
        BlendFactor::Zero => vk::BlendFactor::ZERO,
        BlendFactor::One => vk::BlendFactor::ONE,
        BlendFactor::SrcColor => vk::BlendFactor::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => vk::BlendFactor::ONE_MINUS_SRC_COLOR,
        BlendFactor::DestColor => vk::BlendFactor::DST_COLOR,
        BlendFactor::OneMinusDestColor => vk::BlendFactor::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => vk::BlendFactor::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DestAlpha => vk::BlendFactor::DST_ALPHA,
        BlendFactor::OneMinusDestAlpha => vk::BlendFactor::ONE_MINUS_DST_ALPHA,
    }
}

pub(crate) fn blend_op_to_vk(op: BlendOperation) -> vk::BlendOp {
    match op {
        BlendOperation::Add => vk::BlendOp::ADD,
        BlendOperation::Subtract => vk::BlendOp::SUBTRACT,
        BlendOperation::ReverseSubtract => vk::BlendOp::REVERSE_SUBTRACT,
        BlendOperation::Min => vk::BlendOp::MIN,
        BlendOperation::Max => vk::BlendOp::MAX,
    }
}

/// Color blend state for one attachment
pub(crate) fn blend_attachment(mode: &BlendMode) -> vk::PipelineColorBlendAttachmentState {
    let state = vk::PipelineColorBlendAttachmentState::default().color_write_mask(vk::ColorComponentFlags::RGBA);
    if !mode.enabled {
        return state.blend_enable(false);
    }
    state
        .blend_enable(true)
        .src_color_blend_factor(blend_factor_to_vk(mode.src))
        .dst_color_blend_factor(blend_factor_to_vk(mode.dest))
        .color_blend_op(blend_op_to_vk(mode.op))
        .src_alpha_blend_factor(blend_factor_to_vk(mode.src_alpha))
        .dst_alpha_blend_factor(blend_factor_to_vk(mode.dest_alpha))
        .alpha_blend_op(blend_op_to_vk(mode.op_alpha))
}

pub(crate) fn attribute_format(attribute_type: AttributeType) -> vk::Format {
    match attribute_type {
        AttributeType::Float => vk::Format::R32_SFLOAT,
        AttributeType::Float2 => vk::Format::R32G32_SFLOAT,
        AttributeType::Float3 => vk::Format::R32G32B32_SFLOAT,
        AttributeType::Float4 => vk::Format::R32G32B32A32_SFLOAT,
    }
}

pub(crate) fn pixel_format_to_vk(format: PixelFormat) -> vk::Format {
    match format {
        PixelFormat::R8G8B8A8_UNORM => vk::Format::R8G8B8A8_UNORM,
    }
}

pub(crate) fn filter_to_vk(filter: Filter) -> vk::Filter {
    match filter {
        Filter::Linear => vk::Filter::LINEAR,
        Filter::Point => vk::Filter::NEAREST,
    }
}

pub(crate) fn mip_filter_to_vk(filter: Filter) -> vk::SamplerMipmapMode {
    match filter {
        Filter::Linear => vk::SamplerMipmapMode::LINEAR,
        Filter::Point => vk::SamplerMipmapMode::NEAREST,
    }
}

pub(crate) fn address_to_vk(address: TextureAddress) -> vk::SamplerAddressMode {
    match address {
        TextureAddress::Repeat => vk::SamplerAddressMode::REPEAT,
        TextureAddress::RepeatMirrored => vk::SamplerAddressMode::MIRRORED_REPEAT,
        TextureAddress::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        TextureAddress::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
    }
}

/// Flipped viewport: origin at the bottom edge with a negative height
///
/// Puts clip-space +Y up, matching the other backends.
pub(crate) fn flipped_viewport(x: i32, y: i32, width: u32, height: u32) -> vk::Viewport {
    vk::Viewport {
        x: x as f32,
        y: y as f32 + height as f32,
        width: width as f32,
        height: -(height as f32),
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

#[cfg(test)]
#[path = "vulkan_convert_tests.rs"]
mod tests;
