/// VulkanShader - per-stage shader modules plus reflected descriptor bindings
///
/// Bindings follow the compiler's register mapping: `b<N>` is binding N,
/// `t<N>` is binding N and `s<N>` is binding N + 16, all in set 0.

use ash::vk;
use sprout_graphics::sprout::render::SAMPLER_BINDING_SHIFT;
use sprout_graphics::sprout::render::{
    validate_attachments, Shader, ShaderAttachment, ShaderStage, Uniform, UniformType,
};
use sprout_graphics::{sprout_debug, sprout_err, sprout_invariant, sprout_native_err, Result};
use std::any::Any;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Descriptor kind found by reflection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BindingKind {
    UniformBuffer,
    SampledImage,
    Sampler,
    CombinedImageSampler,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReflectedBinding {
    pub name: String,
    pub set: u32,
    pub binding: u32,
    pub kind: BindingKind,
}

struct StageModule {
    stage: ShaderStage,
    module: vk::ShaderModule,
    entry_point: CString,
}

pub struct VulkanShader {
    ctx: Arc<GpuContext>,
    modules: Vec<StageModule>,
    bindings: Vec<ReflectedBinding>,
}

impl VulkanShader {
    pub(crate) fn new(ctx: Arc<GpuContext>, attachments: &[ShaderAttachment]) -> Result<Self> {
        validate_attachments(attachments)?;

        let mut shader = Self {
            ctx,
            modules: Vec::with_capacity(attachments.len()),
            bindings: Vec::new(),
        };

        for attachment in attachments {
            let words = spirv_words(&attachment.source)?;
            let entry_point = CString::new(attachment.entry_point.as_str()).map_err(|_| {
                sprout_invariant!(
                    "sprout::vulkan",
                    "{:?} entry point '{}' contains a NUL byte",
                    attachment.stage,
                    attachment.entry_point
                )
            })?;

            for binding in reflect_bindings(&words)? {
                if !shader.bindings.contains(&binding) {
                    shader.bindings.push(binding);
                }
            }

            let create_info = vk::ShaderModuleCreateInfo::default().code(&words);
            let module = unsafe { shader.ctx.device.create_shader_module(&create_info, None) }
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateShaderModule", e.as_raw()))?;
            shader.modules.push(StageModule {
                stage: attachment.stage,
                module,
                entry_point,
            });
        }

        sprout_debug!(
            "sprout::vulkan",
            "Created shader with {} stage(s), {} descriptor binding(s)",
            shader.modules.len(),
            shader.bindings.len()
        );
        Ok(shader)
    }

    pub(crate) fn bindings(&self) -> &[ReflectedBinding] {
        &self.bindings
    }

    /// Stage create infos borrowing this shader's modules and entry names
    pub(crate) fn stage_infos(&self) -> Vec<vk::PipelineShaderStageCreateInfo<'_>> {
        self.modules
            .iter()
            .map(|m| {
                let stage = match m.stage {
                    ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
                    ShaderStage::Pixel => vk::ShaderStageFlags::FRAGMENT,
                };
                vk::PipelineShaderStageCreateInfo::default()
                    .stage(stage)
                    .module(m.module)
                    .name(m.entry_point.as_c_str())
            })
            .collect()
    }

    pub(crate) fn from_dyn(shader: &dyn Shader) -> Result<&VulkanShader> {
        shader
            .as_any()
            .downcast_ref::<VulkanShader>()
            .ok_or_else(|| sprout_invariant!("sprout::vulkan", "Shader was not created by the Vulkan backend"))
    }
}

impl Shader for VulkanShader {
    fn has_stage(&self, stage: ShaderStage) -> bool {
        self.modules.iter().any(|m| m.stage == stage)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanShader {
    fn drop(&mut self) {
        for m in self.modules.drain(..) {
            unsafe { self.ctx.device.destroy_shader_module(m.module, None) };
        }
    }
}

/// Reinterpret a payload as SPIR-V words
pub(crate) fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(sprout_invariant!(
            "sprout::vulkan",
            "SPIR-V payload of {} bytes is not a whole number of words",
            bytes.len()
        ));
    }
    let words: Vec<u32> = bytemuck::pod_collect_to_vec(bytes);
    if words.first() != Some(&0x0723_0203) {
        return Err(sprout_invariant!("sprout::vulkan", "Payload is not SPIR-V (bad magic)"));
    }
    Ok(words)
}

/// Descriptor bindings used by every entry point in `words`
pub(crate) fn reflect_bindings(words: &[u32]) -> Result<Vec<ReflectedBinding>> {
    use spirq::ty::DescriptorType;

    let entry_points = spirq::ReflectConfig::new()
        .spv(words)
        .ref_all_rscs(true)
        .reflect()
        .map_err(|e| sprout_err!("sprout::vulkan", "SPIR-V reflection failed: {:?}", e))?;

    let mut bindings = Vec::new();
    for entry_point in &entry_points {
        for var in entry_point.vars.iter() {
            let spirq::var::Variable::Descriptor { name, desc_bind, desc_ty, .. } = var else {
                continue;
            };
            let kind = match desc_ty {
                DescriptorType::UniformBuffer() => BindingKind::UniformBuffer,
                DescriptorType::SampledImage() => BindingKind::SampledImage,
                DescriptorType::Sampler() => BindingKind::Sampler,
                DescriptorType::CombinedImageSampler() => BindingKind::CombinedImageSampler,
                other => {
                    return Err(sprout_invariant!(
                        "sprout::vulkan",
                        "Unsupported descriptor type {:?} at binding {}",
                        other,
                        desc_bind.bind()
                    ))
                }
            };
            let binding = ReflectedBinding {
                name: name.clone().unwrap_or_default(),
                set: desc_bind.set(),
                binding: desc_bind.bind(),
                kind,
            };
            if !bindings.contains(&binding) {
                bindings.push(binding);
            }
        }
    }
    Ok(bindings)
}

/// Check that every binding the shader reads is backed by a declared uniform
pub(crate) fn check_bindings(bindings: &[ReflectedBinding], uniforms: &[Uniform]) -> Result<()> {
    let has = |slot: u32, want_texture: bool| {
        uniforms.iter().any(|u| {
            u.slot == slot
                && match u.uniform_type {
                    UniformType::Texture => want_texture,
                    UniformType::ConstantBuffer { .. } => !want_texture,
                }
        })
    };

    for b in bindings {
        if b.set != 0 {
            return Err(sprout_invariant!(
                "sprout::vulkan",
                "Shader resource '{}' uses descriptor set {}, only set 0 is bound",
                b.name,
                b.set
            ));
        }
        let (slot, texture, what) = match b.kind {
            BindingKind::UniformBuffer => (b.binding, false, "constant buffer"),
            BindingKind::SampledImage | BindingKind::CombinedImageSampler => (b.binding, true, "texture"),
            BindingKind::Sampler => (b.binding.wrapping_sub(SAMPLER_BINDING_SHIFT), true, "texture"),
        };
        if b.kind == BindingKind::Sampler && b.binding < SAMPLER_BINDING_SHIFT || !has(slot, texture) {
            return Err(sprout_invariant!(
                "sprout::vulkan",
                "Shader resource '{}' at binding {} needs a {} uniform at slot {}",
                b.name,
                b.binding,
                what,
                slot
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "vulkan_shader_tests.rs"]
mod tests;
