/// Conversions from sprout descriptions to GL enums

use sprout_graphics::sprout::render::{
    AttributeType, BlendFactor, BlendOperation, Filter, Sampler, TextureAddress, Viewport,
};

pub(crate) fn blend_factor_to_gl(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcColor => glow::SRC_COLOR,
        BlendFactor::OneMinusSrcColor => glow::ONE_MINUS_SRC_COLOR,
        BlendFactor::DestColor => glow::DST_COLOR,
        BlendFactor::OneMinusDestColor => glow::ONE_MINUS_DST_COLOR,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
        BlendFactor::DestAlpha => glow::DST_ALPHA,
        BlendFactor::OneMinusDestAlpha => glow::ONE_MINUS_DST_ALPHA,
    }
}

pub(crate) fn blend_op_to_gl(op: BlendOperation) -> u32 {
    match op {
        BlendOperation::Add => glow::FUNC_ADD,
        BlendOperation::Subtract => glow::FUNC_SUBTRACT,
        BlendOperation::ReverseSubtract => glow::FUNC_REVERSE_SUBTRACT,
        BlendOperation::Min => glow::MIN,
        BlendOperation::Max => glow::MAX,
    }
}

/// Component count passed to `glVertexAttribPointer`
pub(crate) fn attribute_size(attribute_type: AttributeType) -> i32 {
    attribute_type.components() as i32
}

/// `GL_TEXTURE_MIN_FILTER` value; GL folds the mip filter into it
pub(crate) fn min_filter_to_gl(min: Filter, mip: Filter, has_mips: bool) -> i32 {
    let value = match (min, has_mips.then_some(mip)) {
        (Filter::Linear, None) => glow::LINEAR,
        (Filter::Point, None) => glow::NEAREST,
        (Filter::Linear, Some(Filter::Linear)) => glow::LINEAR_MIPMAP_LINEAR,
        (Filter::Linear, Some(Filter::Point)) => glow::LINEAR_MIPMAP_NEAREST,
        (Filter::Point, Some(Filter::Linear)) => glow::NEAREST_MIPMAP_LINEAR,
        (Filter::Point, Some(Filter::Point)) => glow::NEAREST_MIPMAP_NEAREST,
    };
    value as i32
}

pub(crate) fn mag_filter_to_gl(mag: Filter) -> i32 {
    match mag {
        Filter::Linear => glow::LINEAR as i32,
        Filter::Point => glow::NEAREST as i32,
    }
}

pub(crate) fn address_to_gl(address: TextureAddress) -> i32 {
    let value = match address {
        TextureAddress::Repeat => glow::REPEAT,
        TextureAddress::RepeatMirrored => glow::MIRRORED_REPEAT,
        TextureAddress::ClampToEdge => glow::CLAMP_TO_EDGE,
        TextureAddress::ClampToBorder => glow::CLAMP_TO_BORDER,
    };
    value as i32
}

/// `(parameter, value)` pairs written to a texture for `sampler`
pub(crate) fn sampler_parameters(sampler: &Sampler, has_mips: bool) -> [(u32, i32); 4] {
    [
        (
            glow::TEXTURE_MIN_FILTER,
            min_filter_to_gl(sampler.min_filter, sampler.mip_filter, has_mips),
        ),
        (glow::TEXTURE_MAG_FILTER, mag_filter_to_gl(sampler.mag_filter)),
        (glow::TEXTURE_WRAP_S, address_to_gl(sampler.address_u)),
        (glow::TEXTURE_WRAP_T, address_to_gl(sampler.address_v)),
    ]
}

/// Value of the vertex stage's flip uniform
///
/// Off-screen targets are rendered upside down so that their rows end up
/// top-first in memory, the same as every other backend.
pub(crate) fn flip_y_value(offscreen: bool) -> f32 {
    if offscreen {
        -1.0
    } else {
        1.0
    }
}

/// `glViewport` rectangle for a top-left origin viewport
///
/// With the flip active the target is already addressed top-down, so only
/// the default framebuffer needs its origin moved to the bottom-left.
pub(crate) fn gl_viewport_rect(viewport: &Viewport, target_height: u32, offscreen: bool) -> [i32; 4] {
    let y = if offscreen {
        viewport.y
    } else {
        target_height as i32 - (viewport.y + viewport.height as i32)
    };
    [viewport.x, y, viewport.width as i32, viewport.height as i32]
}

#[cfg(test)]
#[path = "gl_convert_tests.rs"]
mod tests;
