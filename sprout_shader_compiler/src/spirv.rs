//! HLSL to SPIR-V front end (shaderc)

use std::path::Path;

use sprout_graphics::backend::Backend;
use sprout_graphics::graphics_device::ShaderStage;
use sprout_graphics::{Error, Result};

use crate::include::resolve_include;
use crate::SAMPLER_BINDING_SHIFT;

fn shader_kind(stage: ShaderStage) -> shaderc::ShaderKind {
    match stage {
        ShaderStage::Vertex => shaderc::ShaderKind::Vertex,
        ShaderStage::Pixel => shaderc::ShaderKind::Fragment,
    }
}

/// Compile HLSL to SPIR-V targeting Vulkan 1.3
///
/// Register numbers become binding numbers; samplers are shifted by
/// [`SAMPLER_BINDING_SHIFT`]. `backend` only labels errors. On failure the
/// shaderc diagnostic is returned verbatim.
pub fn hlsl_to_spirv(
    backend: Backend,
    stage: ShaderStage,
    source: &str,
    entry_point: &str,
    include_dir: Option<&Path>,
) -> Result<Vec<u8>> {
    let compiler = shaderc::Compiler::new().ok_or_else(|| {
        Error::InitializationFailed("shaderc compiler could not be created".to_string())
    })?;
    let mut options = shaderc::CompileOptions::new().ok_or_else(|| {
        Error::InitializationFailed("shaderc compile options could not be created".to_string())
    })?;

    options.set_source_language(shaderc::SourceLanguage::HLSL);
    options.set_target_env(shaderc::TargetEnv::Vulkan, shaderc::EnvVersion::Vulkan1_3 as u32);
    options.set_hlsl_io_mapping(true);
    options.set_auto_map_locations(true);
    options.set_auto_bind_uniforms(true);
    options.set_binding_base(shaderc::ResourceKind::Sampler, SAMPLER_BINDING_SHIFT);
    options.set_optimization_level(shaderc::OptimizationLevel::Performance);

    let include_dir = include_dir.map(Path::to_path_buf);
    options.set_include_callback(move |requested, _include_type, requesting, _depth| {
        let (resolved_name, content) = resolve_include(requested, requesting, include_dir.as_deref())?;
        Ok(shaderc::ResolvedInclude { resolved_name, content })
    });

    let artifact = compiler
        .compile_into_spirv(source, shader_kind(stage), "shader.hlsl", entry_point, Some(&options))
        .map_err(|e| {
            let message = e.to_string();
            sprout_graphics::sprout_error!(
                "sprout::shader_compiler",
                "{:?} stage '{}' failed to compile for {}",
                stage,
                entry_point,
                backend
            );
            Error::ShaderCompile { backend, stage, message }
        })?;

    if artifact.get_num_warnings() > 0 {
        sprout_graphics::sprout_warn!(
            "sprout::shader_compiler",
            "{}",
            artifact.get_warning_messages()
        );
    }

    Ok(artifact.as_binary_u8().to_vec())
}
