/// Image layout state machine
///
/// Every image tracks its current `ImageState`. Only the edges below are
/// legal; each carries fixed stage and access masks for the barrier.

use ash::vk;
use sprout_graphics::{sprout_invariant, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageState {
    Undefined,
    TransferDst,
    ColorAttachment,
    ShaderReadOnly,
    PresentSource,
}

impl ImageState {
    pub fn layout(self) -> vk::ImageLayout {
        match self {
            ImageState::Undefined => vk::ImageLayout::UNDEFINED,
            ImageState::TransferDst => vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            ImageState::ColorAttachment => vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ImageState::ShaderReadOnly => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            ImageState::PresentSource => vk::ImageLayout::PRESENT_SRC_KHR,
        }
    }
}

/// Barrier masks of one legal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionMasks {
    pub src_stage: vk::PipelineStageFlags,
    pub src_access: vk::AccessFlags,
    pub dst_stage: vk::PipelineStageFlags,
    pub dst_access: vk::AccessFlags,
}

const fn masks(
    src_stage: vk::PipelineStageFlags,
    src_access: vk::AccessFlags,
    dst_stage: vk::PipelineStageFlags,
    dst_access: vk::AccessFlags,
) -> TransitionMasks {
    TransitionMasks { src_stage, src_access, dst_stage, dst_access }
}

/// Masks for `from -> to`
///
/// `Ok(None)` for a same-state transition, `InvariantViolation` for an
/// edge outside the table. `ColorAttachment -> ColorAttachment` is the
/// exception: a new rendering pass must wait on the previous pass's writes.
pub fn transition_masks(from: ImageState, to: ImageState) -> Result<Option<TransitionMasks>> {
    use ImageState::*;
    type S = vk::PipelineStageFlags;
    type A = vk::AccessFlags;

    if from == to && from != ColorAttachment {
        return Ok(None);
    }

    let m = match (from, to) {
        (ColorAttachment, ColorAttachment) => masks(
            S::COLOR_ATTACHMENT_OUTPUT,
            A::COLOR_ATTACHMENT_WRITE,
            S::COLOR_ATTACHMENT_OUTPUT,
            A::COLOR_ATTACHMENT_READ | A::COLOR_ATTACHMENT_WRITE,
        ),
        (Undefined, TransferDst) => masks(S::TOP_OF_PIPE, A::empty(), S::TRANSFER, A::TRANSFER_WRITE),
        (Undefined, ColorAttachment) => masks(
            S::COLOR_ATTACHMENT_OUTPUT,
            A::empty(),
            S::COLOR_ATTACHMENT_OUTPUT,
            A::COLOR_ATTACHMENT_READ | A::COLOR_ATTACHMENT_WRITE,
        ),
        (Undefined, ShaderReadOnly) => masks(S::TOP_OF_PIPE, A::empty(), S::FRAGMENT_SHADER, A::SHADER_READ),
        (Undefined, PresentSource) => masks(S::ALL_COMMANDS, A::empty(), S::BOTTOM_OF_PIPE, A::empty()),
        (TransferDst, ShaderReadOnly) => {
            masks(S::TRANSFER, A::TRANSFER_WRITE, S::FRAGMENT_SHADER, A::SHADER_READ)
        }
        (ColorAttachment, PresentSource) => masks(
            S::COLOR_ATTACHMENT_OUTPUT,
            A::COLOR_ATTACHMENT_WRITE,
            S::BOTTOM_OF_PIPE,
            A::empty(),
        ),
        (ColorAttachment, ShaderReadOnly) => masks(
            S::COLOR_ATTACHMENT_OUTPUT,
            A::COLOR_ATTACHMENT_WRITE,
            S::FRAGMENT_SHADER,
            A::SHADER_READ,
        ),
        (ShaderReadOnly, ColorAttachment) => masks(
            S::FRAGMENT_SHADER,
            A::SHADER_READ,
            S::COLOR_ATTACHMENT_OUTPUT,
            A::COLOR_ATTACHMENT_READ | A::COLOR_ATTACHMENT_WRITE,
        ),
        (ShaderReadOnly, TransferDst) => {
            masks(S::FRAGMENT_SHADER, A::SHADER_READ, S::TRANSFER, A::TRANSFER_WRITE)
        }
        (PresentSource, ColorAttachment) => masks(
            S::COLOR_ATTACHMENT_OUTPUT,
            A::empty(),
            S::COLOR_ATTACHMENT_OUTPUT,
            A::COLOR_ATTACHMENT_READ | A::COLOR_ATTACHMENT_WRITE,
        ),
        _ => {
            return Err(sprout_invariant!(
                "sprout::vulkan",
                "Illegal image layout transition {:?} -> {:?}",
                from,
                to
            ))
        }
    };
    Ok(Some(m))
}

/// Record the barrier moving `image` (all mips) from `*state` to `to`
///
/// `state` is updated only when the transition is legal.
pub(crate) fn record_transition(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    image: vk::Image,
    mip_levels: u32,
    state: &mut ImageState,
    to: ImageState,
) -> Result<()> {
    let Some(m) = transition_masks(*state, to)? else {
        return Ok(());
    };

    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(state.layout())
        .new_layout(to.layout())
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(color_range(0, mip_levels))
        .src_access_mask(m.src_access)
        .dst_access_mask(m.dst_access);

    unsafe {
        device.cmd_pipeline_barrier(
            command_buffer,
            m.src_stage,
            m.dst_stage,
            vk::DependencyFlags::empty(),
            &[],
            &[],
            &[barrier],
        );
    }

    *state = to;
    Ok(())
}

pub(crate) fn color_range(base_mip_level: u32, level_count: u32) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange {
        aspect_mask: vk::ImageAspectFlags::COLOR,
        base_mip_level,
        level_count,
        base_array_layer: 0,
        layer_count: 1,
    }
}

#[cfg(test)]
#[path = "vulkan_layout_tests.rs"]
mod tests;
