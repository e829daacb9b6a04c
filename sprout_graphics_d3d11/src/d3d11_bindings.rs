/// Shader interface as reported by DXBC reflection
///
/// Registers map straight to uniform slots: `b<N>` is constant buffer slot
/// N, `t<N>` and `s<N>` are texture slot N. Vertex attribute location N is
/// the input parameter in register N.

use sprout_graphics::sprout::render::{Uniform, UniformType};
use sprout_graphics::{sprout_invariant, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    ConstantBuffer,
    Texture,
    Sampler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ShaderResource {
    pub name: String,
    pub kind: ResourceKind,
    pub slot: u32,
}

/// Vertex shader input signature entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InputParameter {
    pub semantic: String,
    pub semantic_index: u32,
    pub register: u32,
}

/// Check that every resource the shader reads is backed by a declared uniform
pub(crate) fn check_resources(resources: &[ShaderResource], uniforms: &[Uniform]) -> Result<()> {
    for resource in resources {
        let want_texture = resource.kind != ResourceKind::ConstantBuffer;
        let declared = uniforms.iter().any(|u| {
            u.slot == resource.slot
                && match u.uniform_type {
                    UniformType::Texture => want_texture,
                    UniformType::ConstantBuffer { .. } => !want_texture,
                }
        });
        if !declared {
            return Err(sprout_invariant!(
                "sprout::d3d11",
                "Shader resource '{}' needs a {} uniform at slot {}",
                resource.name,
                if want_texture { "texture" } else { "constant buffer" },
                resource.slot
            ));
        }
    }
    Ok(())
}

/// Input parameter feeding attribute `location`
pub(crate) fn input_for_location(inputs: &[InputParameter], location: u32) -> Result<&InputParameter> {
    inputs.iter().find(|p| p.register == location).ok_or_else(|| {
        sprout_invariant!(
            "sprout::d3d11",
            "Vertex shader has no input at location {} ({} input(s) declared)",
            location,
            inputs.len()
        )
    })
}

#[cfg(test)]
#[path = "d3d11_bindings_tests.rs"]
mod tests;
