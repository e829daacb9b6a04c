/// GlShader - linked GL program plus the resource names it exposes
///
/// The shader compiler gives every resource a synthetic name. Attribute and
/// fragment output locations are bound before linking; uniform blocks and
/// samplers are resolved after.

use glow::HasContext;
use rustc_hash::FxHashMap;
use sprout_graphics::sprout::render::{
    validate_attachments, Shader, ShaderAttachment, ShaderStage, Uniform, UniformType, MAX_RENDER_TARGETS,
    MAX_UNIFORM_SLOTS,
};
use sprout_graphics::sprout::Backend;
use sprout_graphics::{sprout_debug, sprout_err, sprout_error, sprout_invariant, Error, Result};
use std::any::Any;
use std::rc::Rc;

use crate::gl_context::GlShared;

pub(crate) const ATTRIBUTE_PREFIX: &str = "sp_Attrib_";
pub(crate) const FRAG_OUTPUT_PREFIX: &str = "sp_FragColor_";
pub(crate) const UNIFORM_BLOCK_PREFIX: &str = "sp_Uniform_";
pub(crate) const TEXTURE_PREFIX: &str = "sp_Texture_";
pub(crate) const FLIP_Y_UNIFORM: &str = "sp_FlipY";

/// Attribute locations bound before linking (the GL 3.3 minimum)
const MAX_VERTEX_ATTRIBS: u32 = 16;

pub(crate) fn attribute_name(location: u32) -> String {
    format!("{}{}", ATTRIBUTE_PREFIX, location)
}

pub(crate) fn frag_output_name(index: u32) -> String {
    format!("{}{}", FRAG_OUTPUT_PREFIX, index)
}

pub(crate) fn uniform_block_name(slot: u32) -> String {
    format!("{}{}", UNIFORM_BLOCK_PREFIX, slot)
}

pub(crate) fn texture_uniform_name(slot: u32) -> String {
    format!("{}{}", TEXTURE_PREFIX, slot)
}

/// Uniform block found in the linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ProgramBlock {
    pub slot: u32,
    /// Minimum buffer size the program reads
    pub size: u32,
}

pub struct GlShader {
    shared: Rc<GlShared>,
    program: glow::Program,
    stages: Vec<ShaderStage>,
    blocks: Vec<ProgramBlock>,
    texture_locations: FxHashMap<u32, glow::UniformLocation>,
    flip_y: Option<glow::UniformLocation>,
}

impl GlShader {
    pub(crate) fn new(shared: Rc<GlShared>, attachments: &[ShaderAttachment]) -> Result<Self> {
        validate_attachments(attachments)?;

        let program = unsafe { shared.gl.create_program() }
            .map_err(|e| sprout_err!("sprout::gl", "glCreateProgram failed: {}", e))?;

        // Drop deletes the program if anything below fails
        let mut shader = Self {
            shared,
            program,
            stages: attachments.iter().map(|a| a.stage).collect(),
            blocks: Vec::new(),
            texture_locations: FxHashMap::default(),
            flip_y: None,
        };

        let mut compiled = Vec::with_capacity(attachments.len());
        let linked = shader.compile_and_link(attachments, &mut compiled);
        unsafe {
            for stage_shader in compiled {
                shader.shared.gl.detach_shader(program, stage_shader);
                shader.shared.gl.delete_shader(stage_shader);
            }
        }
        linked?;

        shader.resolve_resources();
        sprout_debug!(
            "sprout::gl",
            "Linked program with {} uniform block(s), {} sampler(s)",
            shader.blocks.len(),
            shader.texture_locations.len()
        );
        Ok(shader)
    }

    fn compile_and_link(&self, attachments: &[ShaderAttachment], compiled: &mut Vec<glow::Shader>) -> Result<()> {
        let gl = &self.shared.gl;
        for attachment in attachments {
            let compile_error = |message: String| Error::ShaderCompile {
                backend: Backend::OpenGL,
                stage: attachment.stage,
                message,
            };

            let source = std::str::from_utf8(&attachment.source)
                .map_err(|_| compile_error("GLSL source is not valid UTF-8".to_string()))?;
            let kind = match attachment.stage {
                ShaderStage::Vertex => glow::VERTEX_SHADER,
                ShaderStage::Pixel => glow::FRAGMENT_SHADER,
            };

            unsafe {
                let stage_shader = gl.create_shader(kind).map_err(compile_error)?;
                compiled.push(stage_shader);
                gl.shader_source(stage_shader, source);
                gl.compile_shader(stage_shader);
                if !gl.get_shader_compile_status(stage_shader) {
                    let log = gl.get_shader_info_log(stage_shader);
                    sprout_error!("sprout::gl", "{:?} shader failed to compile: {}", attachment.stage, log);
                    return Err(compile_error(log));
                }
                gl.attach_shader(self.program, stage_shader);
            }
        }

        unsafe {
            for location in 0..MAX_VERTEX_ATTRIBS {
                gl.bind_attrib_location(self.program, location, &attribute_name(location));
            }
            for index in 0..MAX_RENDER_TARGETS as u32 {
                gl.bind_frag_data_location(self.program, index, &frag_output_name(index));
            }
            gl.link_program(self.program);
            if !gl.get_program_link_status(self.program) {
                let log = gl.get_program_info_log(self.program);
                return Err(sprout_err!("sprout::gl", "Program failed to link: {}", log));
            }
        }
        Ok(())
    }

    fn resolve_resources(&mut self) {
        let gl = &self.shared.gl;
        for slot in 0..MAX_UNIFORM_SLOTS {
            unsafe {
                if let Some(index) = gl.get_uniform_block_index(self.program, &uniform_block_name(slot)) {
                    gl.uniform_block_binding(self.program, index, slot);
                    let size = gl.get_active_uniform_block_parameter_i32(
                        self.program,
                        index,
                        glow::UNIFORM_BLOCK_DATA_SIZE,
                    );
                    self.blocks.push(ProgramBlock {
                        slot,
                        size: size.max(0) as u32,
                    });
                }
                if let Some(location) = gl.get_uniform_location(self.program, &texture_uniform_name(slot)) {
                    self.texture_locations.insert(slot, location);
                }
            }
        }
        self.flip_y = unsafe { gl.get_uniform_location(self.program, FLIP_Y_UNIFORM) };
    }

    pub(crate) fn blocks(&self) -> &[ProgramBlock] {
        &self.blocks
    }

    pub(crate) fn texture_slots(&self) -> Vec<u32> {
        let mut slots: Vec<u32> = self.texture_locations.keys().copied().collect();
        slots.sort_unstable();
        slots
    }

    /// Make the program current with the flip constant and sampler units set
    pub(crate) fn bind(&self, flip_y: f32, units: impl Iterator<Item = (u32, u32)>) {
        let gl = &self.shared.gl;
        unsafe {
            gl.use_program(Some(self.program));
            if let Some(location) = &self.flip_y {
                gl.uniform_1_f32(Some(location), flip_y);
            }
            for (slot, unit) in units {
                if let Some(location) = self.texture_locations.get(&slot) {
                    gl.uniform_1_i32(Some(location), unit as i32);
                }
            }
        }
    }

    pub(crate) fn from_dyn(shader: &dyn Shader) -> Result<&GlShader> {
        shader
            .as_any()
            .downcast_ref::<GlShader>()
            .ok_or_else(|| sprout_invariant!("sprout::gl", "Shader was not created by the OpenGL backend"))
    }
}

impl Shader for GlShader {
    fn has_stage(&self, stage: ShaderStage) -> bool {
        self.stages.contains(&stage)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for GlShader {
    fn drop(&mut self) {
        unsafe { self.shared.gl.delete_program(self.program) };
    }
}

/// Check that every block and sampler the program reads is a declared uniform
pub(crate) fn check_uniforms(blocks: &[ProgramBlock], texture_slots: &[u32], uniforms: &[Uniform]) -> Result<()> {
    for block in blocks {
        let declared = uniforms.iter().find_map(|u| match u.uniform_type {
            UniformType::ConstantBuffer { size } if u.slot == block.slot => Some(size),
            _ => None,
        });
        match declared {
            None => {
                return Err(sprout_invariant!(
                    "sprout::gl",
                    "Program reads uniform block {} but slot {} is not a constant buffer uniform",
                    uniform_block_name(block.slot),
                    block.slot
                ))
            }
            Some(size) if size < block.size => {
                return Err(sprout_invariant!(
                    "sprout::gl",
                    "Constant buffer slot {} is {} bytes, the program reads {}",
                    block.slot,
                    size,
                    block.size
                ))
            }
            Some(_) => {}
        }
    }

    for &slot in texture_slots {
        let declared = uniforms
            .iter()
            .any(|u| u.slot == slot && u.uniform_type == UniformType::Texture);
        if !declared {
            return Err(sprout_invariant!(
                "sprout::gl",
                "Program samples {} but slot {} is not a texture uniform",
                texture_uniform_name(slot),
                slot
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "gl_shader_tests.rs"]
mod tests;
