//! SPIR-V to GLSL 330 translation (naga)
//!
//! naga's generated identifiers are replaced by fixed names the GL backend
//! binds by:
//!
//! | naga name                | emitted name            |
//! |--------------------------|-------------------------|
//! | `_p2vs_location{N}`      | `sp_Attrib_{N}`         |
//! | `_vs2fs_location{N}`     | `sp_ToFrag_var{N}`      |
//! | `_fs2p_location{N}`      | `sp_FragColor_{N}`      |
//! | uniform block, binding N | `sp_Uniform_{N}`        |
//! | combined sampler, tex N  | `sp_Texture_{N}`        |
//!
//! Vertex stages also get a `sp_FlipY` uniform applied to `gl_Position.y`
//! and a depth remap from `[0, 1]` to `[-1, 1]`.

use naga::back::glsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use rustc_hash::FxHashMap;

use sprout_graphics::backend::Backend;
use sprout_graphics::graphics_device::ShaderStage;
use sprout_graphics::{Error, Result};

pub const ATTRIBUTE_PREFIX: &str = "sp_Attrib_";
pub const VARYING_PREFIX: &str = "sp_ToFrag_var";
pub const FRAG_OUTPUT_PREFIX: &str = "sp_FragColor_";
pub const UNIFORM_BLOCK_PREFIX: &str = "sp_Uniform_";
pub const TEXTURE_PREFIX: &str = "sp_Texture_";
pub const FLIP_Y_UNIFORM: &str = "sp_FlipY";

const GLSL_VERSION: u16 = 330;

fn compile_error(stage: ShaderStage, message: String) -> Error {
    sprout_graphics::sprout_error!("sprout::shader_compiler", "GLSL translation failed: {}", message);
    Error::ShaderCompile { backend: Backend::OpenGL, stage, message }
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Pixel => naga::ShaderStage::Fragment,
    }
}

/// Translate a SPIR-V module into GLSL 330 source
pub fn spirv_to_glsl(stage: ShaderStage, spirv: &[u8], entry_point: &str) -> Result<String> {
    let options = naga::front::spv::Options {
        adjust_coordinate_space: false,
        ..Default::default()
    };
    let module = naga::front::spv::parse_u8_slice(spirv, &options)
        .map_err(|e| compile_error(stage, format!("SPIR-V parse: {}", e)))?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| compile_error(stage, format!("validation: {}", e.as_inner())))?;

    let glsl_options = glsl::Options {
        version: glsl::Version::Desktop(GLSL_VERSION),
        writer_flags: glsl::WriterFlags::empty(),
        ..Default::default()
    };
    let pipeline_options = glsl::PipelineOptions {
        shader_stage: naga_stage(stage),
        entry_point: entry_point.to_string(),
        multiview: None,
    };

    let mut source = String::new();
    let reflection = {
        let mut writer = glsl::Writer::new(
            &mut source,
            &module,
            &info,
            &glsl_options,
            &pipeline_options,
            naga::proc::BoundsCheckPolicies::default(),
        )
        .map_err(|e| compile_error(stage, e.to_string()))?;
        writer.write().map_err(|e| compile_error(stage, e.to_string()))?
    };

    let mut renames: FxHashMap<String, String> = FxHashMap::default();
    for (handle, name) in &reflection.uniforms {
        if let Some(binding) = &module.global_variables[*handle].binding {
            renames.insert(name.clone(), format!("{}{}", UNIFORM_BLOCK_PREFIX, binding.binding));
        }
    }
    for (name, mapping) in &reflection.texture_mapping {
        if let Some(binding) = &module.global_variables[mapping.texture].binding {
            renames.insert(name.clone(), format!("{}{}", TEXTURE_PREFIX, binding.binding));
        }
    }

    let renamed = rename_identifiers(&source, |ident| {
        if let Some(new_name) = renames.get(ident) {
            return Some(new_name.clone());
        }
        stable_io_name(ident)
    });

    Ok(match stage {
        ShaderStage::Vertex => wrap_vertex_main(&renamed),
        ShaderStage::Pixel => renamed,
    })
}

/// Map a naga interface variable name to its stable `sp_*` name
pub fn stable_io_name(ident: &str) -> Option<String> {
    const PREFIXES: [(&str, &str); 3] = [
        ("_p2vs_location", ATTRIBUTE_PREFIX),
        ("_vs2fs_location", VARYING_PREFIX),
        ("_fs2p_location", FRAG_OUTPUT_PREFIX),
    ];
    PREFIXES.iter().find_map(|(from, to)| {
        let location = ident.strip_prefix(from)?;
        if location.is_empty() || !location.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(format!("{}{}", to, location))
    })
}

/// Rewrite every identifier token for which `rename` returns a new name
///
/// Numeric literals (`1.0e5`, `0u`) are copied untouched.
pub fn rename_identifiers<F>(source: &str, mut rename: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_alphanumeric() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let token = &source[start..i];
            if b.is_ascii_digit() {
                out.push_str(token);
            } else {
                match rename(token) {
                    Some(new_name) => out.push_str(&new_name),
                    None => out.push_str(token),
                }
            }
        } else {
            // Copy the whole (possibly multi-byte) character
            let ch_len = source[i..].chars().next().map_or(1, char::len_utf8);
            out.push_str(&source[i..i + ch_len]);
            i += ch_len;
        }
    }
    out
}

/// Byte offset just past the leading preprocessor block
fn preamble_end(source: &str) -> usize {
    let mut offset = 0;
    for line in source.split_inclusive('\n') {
        let trimmed = line.trim();
        if !(trimmed.starts_with('#') || trimmed.is_empty()) {
            break;
        }
        offset += line.len();
    }
    offset
}

/// Rename the vertex `main` and wrap it with the clip-space fix-up
pub fn wrap_vertex_main(source: &str) -> String {
    let renamed = rename_identifiers(source, |ident| (ident == "main").then(|| "sp_main".to_string()));
    let split = preamble_end(&renamed);

    let mut out = String::with_capacity(renamed.len() + 160);
    out.push_str(&renamed[..split]);
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!("uniform float {};\n", FLIP_Y_UNIFORM));
    out.push_str(&renamed[split..]);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!(
        "\nvoid main() {{\n    sp_main();\n    gl_Position.y *= {};\n    gl_Position.z = gl_Position.z * 2.0 - gl_Position.w;\n}}\n",
        FLIP_Y_UNIFORM
    ));
    out
}

#[cfg(test)]
#[path = "glsl_tests.rs"]
mod tests;
