/// Shader trait, shader stages and per-stage attachments

use std::any::Any;

use crate::error::Result;

/// Offset added to HLSL sampler registers in SPIR-V (`s<N>` lands on binding `16 + N`)
///
/// Shared by the compiler and the Vulkan backend's descriptor mapping.
pub const SAMPLER_BINDING_SHIFT: u32 = 16;

/// Programmable pipeline stage
///
/// The numeric value is the low nibble of a precompiled container record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShaderStage {
    Vertex = 0,
    Pixel = 1,
}

impl ShaderStage {
    pub fn nibble(self) -> u8 {
        self as u8
    }

    pub fn from_nibble(value: u8) -> Option<ShaderStage> {
        match value {
            0 => Some(ShaderStage::Vertex),
            1 => Some(ShaderStage::Pixel),
            _ => None,
        }
    }

    pub fn all() -> &'static [ShaderStage] {
        &[ShaderStage::Vertex, ShaderStage::Pixel]
    }
}

/// One compiled stage handed to `GraphicsDevice::create_shader`
///
/// `source` holds whatever the device backend consumes: SPIR-V words for
/// Vulkan, GLSL text for OpenGL, DXBC for Direct3D 11.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderAttachment {
    pub stage: ShaderStage,
    pub source: Vec<u8>,
    pub entry_point: String,
}

impl ShaderAttachment {
    pub fn new(stage: ShaderStage, source: impl Into<Vec<u8>>, entry_point: impl Into<String>) -> Self {
        Self {
            stage,
            source: source.into(),
            entry_point: entry_point.into(),
        }
    }
}

/// Compiled, immutable GPU program
///
/// Released when the last `Arc` is dropped. Backends downcast through
/// `as_any` to reach their native program.
pub trait Shader: Any {
    fn has_stage(&self, stage: ShaderStage) -> bool;

    fn as_any(&self) -> &dyn Any;
}

/// Check a stage list before any native object is created
///
/// At most one attachment per stage, a vertex stage, and non-empty payloads.
pub fn validate_attachments(attachments: &[ShaderAttachment]) -> Result<()> {
    let mut seen = [false; 2];
    for attachment in attachments {
        let index = attachment.stage as usize;
        if seen[index] {
            return Err(crate::sprout_invariant!(
                "sprout::shader",
                "Shader has more than one {:?} attachment",
                attachment.stage
            ));
        }
        seen[index] = true;

        if attachment.source.is_empty() {
            return Err(crate::sprout_invariant!(
                "sprout::shader",
                "{:?} attachment has an empty payload",
                attachment.stage
            ));
        }
    }

    if !seen[ShaderStage::Vertex as usize] {
        return Err(crate::sprout_invariant!(
            "sprout::shader",
            "Shader has no vertex stage"
        ));
    }

    Ok(())
}

/// Find the attachment for a stage
pub fn find_attachment(attachments: &[ShaderAttachment], stage: ShaderStage) -> Option<&ShaderAttachment> {
    attachments.iter().find(|a| a.stage == stage)
}
