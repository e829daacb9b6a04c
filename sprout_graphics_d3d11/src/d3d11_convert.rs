/// Conversions from sprout descriptions to D3D11 enums

use sprout_graphics::sprout::render::{
    AttributeType, BlendFactor, BlendMode, BlendOperation, Filter, Sampler, TextureAddress, Viewport,
};
use windows::Win32::Foundation::{FALSE, TRUE};
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::*;

pub(crate) fn blend_factor_to_d3d(factor: BlendFactor) -> D3D11_BLEND {
    match factor {
        BlendFactor::Zero => D3D11_BLEND_ZERO,
        BlendFactor::One => D3D11_BLEND_ONE,
        BlendFactor::SrcColor => D3D11_BLEND_SRC_COLOR,
        BlendFactor::OneMinusSrcColor => D3D11_BLEND_INV_SRC_COLOR,
        BlendFactor::DestColor => D3D11_BLEND_DEST_COLOR,
        BlendFactor::OneMinusDestColor => D3D11_BLEND_INV_DEST_COLOR,
        BlendFactor::SrcAlpha => D3D11_BLEND_SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => D3D11_BLEND_INV_SRC_ALPHA,
        BlendFactor::DestAlpha => D3D11_BLEND_DEST_ALPHA,
        BlendFactor::OneMinusDestAlpha => D3D11_BLEND_INV_DEST_ALPHA,
    }
}

pub(crate) fn blend_op_to_d3d(op: BlendOperation) -> D3D11_BLEND_OP {
    match op {
        BlendOperation::Add => D3D11_BLEND_OP_ADD,
        BlendOperation::Subtract => D3D11_BLEND_OP_SUBTRACT,
        BlendOperation::ReverseSubtract => D3D11_BLEND_OP_REV_SUBTRACT,
        BlendOperation::Min => D3D11_BLEND_OP_MIN,
        BlendOperation::Max => D3D11_BLEND_OP_MAX,
    }
}

/// Blend state description, the same mode on every render target
pub(crate) fn blend_desc(mode: &BlendMode) -> D3D11_BLEND_DESC {
    let target = D3D11_RENDER_TARGET_BLEND_DESC {
        BlendEnable: if mode.enabled { TRUE } else { FALSE },
        SrcBlend: blend_factor_to_d3d(mode.src),
        DestBlend: blend_factor_to_d3d(mode.dest),
        BlendOp: blend_op_to_d3d(mode.op),
        SrcBlendAlpha: blend_factor_to_d3d(mode.src_alpha),
        DestBlendAlpha: blend_factor_to_d3d(mode.dest_alpha),
        BlendOpAlpha: blend_op_to_d3d(mode.op_alpha),
        RenderTargetWriteMask: D3D11_COLOR_WRITE_ENABLE_ALL.0 as u8,
    };
    D3D11_BLEND_DESC {
        AlphaToCoverageEnable: FALSE,
        IndependentBlendEnable: FALSE,
        RenderTarget: [target; 8],
    }
}

pub(crate) fn attribute_format(attribute_type: AttributeType) -> DXGI_FORMAT {
    match attribute_type {
        AttributeType::Float => DXGI_FORMAT_R32_FLOAT,
        AttributeType::Float2 => DXGI_FORMAT_R32G32_FLOAT,
        AttributeType::Float3 => DXGI_FORMAT_R32G32B32_FLOAT,
        AttributeType::Float4 => DXGI_FORMAT_R32G32B32A32_FLOAT,
    }
}

pub(crate) fn address_to_d3d(address: TextureAddress) -> D3D11_TEXTURE_ADDRESS_MODE {
    match address {
        TextureAddress::Repeat => D3D11_TEXTURE_ADDRESS_WRAP,
        TextureAddress::RepeatMirrored => D3D11_TEXTURE_ADDRESS_MIRROR,
        TextureAddress::ClampToEdge => D3D11_TEXTURE_ADDRESS_CLAMP,
        TextureAddress::ClampToBorder => D3D11_TEXTURE_ADDRESS_BORDER,
    }
}

/// Combined min/mag/mip filter
pub(crate) fn filter_to_d3d(min: Filter, mag: Filter, mip: Filter) -> D3D11_FILTER {
    use Filter::{Linear, Point};
    match (min, mag, mip) {
        (Point, Point, Point) => D3D11_FILTER_MIN_MAG_MIP_POINT,
        (Point, Point, Linear) => D3D11_FILTER_MIN_MAG_POINT_MIP_LINEAR,
        (Point, Linear, Point) => D3D11_FILTER_MIN_POINT_MAG_LINEAR_MIP_POINT,
        (Point, Linear, Linear) => D3D11_FILTER_MIN_POINT_MAG_MIP_LINEAR,
        (Linear, Point, Point) => D3D11_FILTER_MIN_LINEAR_MAG_MIP_POINT,
        (Linear, Point, Linear) => D3D11_FILTER_MIN_LINEAR_MAG_POINT_MIP_LINEAR,
        (Linear, Linear, Point) => D3D11_FILTER_MIN_MAG_LINEAR_MIP_POINT,
        (Linear, Linear, Linear) => D3D11_FILTER_MIN_MAG_MIP_LINEAR,
    }
}

pub(crate) fn sampler_desc(sampler: &Sampler) -> D3D11_SAMPLER_DESC {
    D3D11_SAMPLER_DESC {
        Filter: filter_to_d3d(sampler.min_filter, sampler.mag_filter, sampler.mip_filter),
        AddressU: address_to_d3d(sampler.address_u),
        AddressV: address_to_d3d(sampler.address_v),
        AddressW: D3D11_TEXTURE_ADDRESS_CLAMP,
        MipLODBias: 0.0,
        MaxAnisotropy: 1,
        ComparisonFunc: D3D11_COMPARISON_NEVER,
        BorderColor: [0.0; 4],
        MinLOD: 0.0,
        MaxLOD: D3D11_FLOAT32_MAX,
    }
}

pub(crate) fn viewport_to_d3d(viewport: &Viewport) -> D3D11_VIEWPORT {
    D3D11_VIEWPORT {
        TopLeftX: viewport.x as f32,
        TopLeftY: viewport.y as f32,
        Width: viewport.width as f32,
        Height: viewport.height as f32,
        MinDepth: 0.0,
        MaxDepth: 1.0,
    }
}

#[cfg(test)]
#[path = "d3d11_convert_tests.rs"]
mod tests;
