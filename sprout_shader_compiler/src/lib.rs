/*!
# Sprout Shader Compiler

Cross-compiles one HLSL source to the payload every backend consumes:

- **Vulkan**: SPIR-V from shaderc
- **OpenGL**: GLSL 330 translated from that SPIR-V by naga, with stable
  `sp_*` names the GL backend binds by
- **D3D11**: DXBC from `D3DCompile` (Windows only)

[`compile_precompiled`] bundles the results into a
[`PrecompiledShader`] container; the `compile_shaders` binary is the
command-line front end.
*/

pub mod dxbc;
pub mod glsl;
pub mod include;
pub mod spirv;

use std::path::Path;

use sprout_graphics::backend::Backend;
use sprout_graphics::graphics_device::{ShaderAttachment, ShaderStage};
use sprout_graphics::precompiled_shader::PrecompiledShader;
use sprout_graphics::{Error, Result};

pub use sprout_graphics::graphics_device::SAMPLER_BINDING_SHIFT;

/// Entry point name of every generated GLSL stage
pub const GLSL_ENTRY_POINT: &str = "main";

/// Compile `source` for one backend and stage
pub fn compile(
    backend: Backend,
    stage: ShaderStage,
    source: &str,
    entry_point: &str,
    include_dir: Option<&Path>,
) -> Result<Vec<u8>> {
    sprout_graphics::sprout_debug!(
        "sprout::shader_compiler",
        "Compiling {:?} stage '{}' for {}",
        stage,
        entry_point,
        backend
    );

    match backend {
        Backend::Vulkan => spirv::hlsl_to_spirv(backend, stage, source, entry_point, include_dir),
        Backend::OpenGL => {
            let words = spirv::hlsl_to_spirv(backend, stage, source, entry_point, include_dir)?;
            let text = glsl::spirv_to_glsl(stage, &words, entry_point)?;
            Ok(text.into_bytes())
        }
        Backend::D3D11 => dxbc::hlsl_to_dxbc(stage, source, entry_point, include_dir),
        Backend::Unknown => Err(Error::InvalidResource(
            "Cannot compile for Backend::Unknown, pick a concrete backend".to_string(),
        )),
    }
}

/// Compile one stage into an attachment ready for `create_shader`
pub fn compile_attachment(
    backend: Backend,
    stage: ShaderStage,
    source: &str,
    entry_point: &str,
    include_dir: Option<&Path>,
) -> Result<ShaderAttachment> {
    let payload = compile(backend, stage, source, entry_point, include_dir)?;
    Ok(ShaderAttachment::new(stage, payload, output_entry_point(backend, entry_point)))
}

/// Entry point name stored alongside a compiled payload
pub fn output_entry_point(backend: Backend, entry_point: &str) -> &str {
    match backend {
        Backend::OpenGL => GLSL_ENTRY_POINT,
        _ => entry_point,
    }
}

/// Backends this host can compile for
pub fn host_backends() -> Vec<Backend> {
    Backend::all()
        .iter()
        .copied()
        .filter(|b| *b != Backend::D3D11 || dxbc::is_available())
        .collect()
}

/// Compile the vertex and pixel stages of `source` for every backend listed
pub fn compile_precompiled(
    source: &str,
    vertex_entry: &str,
    pixel_entry: &str,
    include_dir: Option<&Path>,
    backends: &[Backend],
) -> Result<PrecompiledShader> {
    let mut container = PrecompiledShader::new();
    for &backend in backends {
        for (stage, entry) in [(ShaderStage::Vertex, vertex_entry), (ShaderStage::Pixel, pixel_entry)] {
            let payload = compile(backend, stage, source, entry, include_dir)?;
            container.add(backend, stage, output_entry_point(backend, entry), payload)?;
        }
    }
    Ok(container)
}
