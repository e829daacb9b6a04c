use super::*;
use sprout_graphics::Error;

const ALL_STATES: [ImageState; 5] = [
    ImageState::Undefined,
    ImageState::TransferDst,
    ImageState::ColorAttachment,
    ImageState::ShaderReadOnly,
    ImageState::PresentSource,
];

const LEGAL_EDGES: [(ImageState, ImageState); 10] = [
    (ImageState::Undefined, ImageState::TransferDst),
    (ImageState::Undefined, ImageState::ColorAttachment),
    (ImageState::Undefined, ImageState::ShaderReadOnly),
    (ImageState::Undefined, ImageState::PresentSource),
    (ImageState::TransferDst, ImageState::ShaderReadOnly),
    (ImageState::ColorAttachment, ImageState::PresentSource),
    (ImageState::ColorAttachment, ImageState::ShaderReadOnly),
    (ImageState::ShaderReadOnly, ImageState::ColorAttachment),
    (ImageState::ShaderReadOnly, ImageState::TransferDst),
    (ImageState::PresentSource, ImageState::ColorAttachment),
];

// ============================================================================
// TRANSITION TABLE
// ============================================================================

#[test]
fn test_legal_edges_have_masks() {
    for (from, to) in LEGAL_EDGES {
        let masks = transition_masks(from, to).unwrap();
        assert!(masks.is_some(), "{:?} -> {:?} should be legal", from, to);
    }
}

#[test]
fn test_same_state_is_noop() {
    for state in ALL_STATES {
        if state == ImageState::ColorAttachment {
            continue;
        }
        assert_eq!(transition_masks(state, state).unwrap(), None);
    }
}

#[test]
fn test_color_attachment_resume_waits_on_previous_pass() {
    // clear, upload (rendering suspended), then draw with LOAD
    let m = transition_masks(ImageState::ColorAttachment, ImageState::ColorAttachment)
        .unwrap()
        .expect("resuming rendering into a color target needs a barrier");
    assert_eq!(m.src_stage, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
    assert_eq!(m.src_access, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
    assert_eq!(m.dst_stage, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
    assert!(m.dst_access.contains(vk::AccessFlags::COLOR_ATTACHMENT_READ));
    assert!(m.dst_access.contains(vk::AccessFlags::COLOR_ATTACHMENT_WRITE));
}

#[test]
fn test_every_other_edge_is_rejected() {
    for from in ALL_STATES {
        for to in ALL_STATES {
            if from == to || LEGAL_EDGES.contains(&(from, to)) {
                continue;
            }
            let result = transition_masks(from, to);
            assert!(
                matches!(result, Err(Error::InvariantViolation(_))),
                "{:?} -> {:?} should be rejected",
                from,
                to
            );
        }
    }
}

#[test]
fn test_nothing_transitions_back_to_undefined() {
    for from in ALL_STATES.into_iter().skip(1) {
        assert!(transition_masks(from, ImageState::Undefined).is_err());
    }
}

// ============================================================================
// MASKS
// ============================================================================

#[test]
fn test_upload_masks() {
    let m = transition_masks(ImageState::Undefined, ImageState::TransferDst).unwrap().unwrap();
    assert_eq!(m.dst_stage, vk::PipelineStageFlags::TRANSFER);
    assert_eq!(m.dst_access, vk::AccessFlags::TRANSFER_WRITE);

    let m = transition_masks(ImageState::TransferDst, ImageState::ShaderReadOnly).unwrap().unwrap();
    assert_eq!(m.src_access, vk::AccessFlags::TRANSFER_WRITE);
    assert_eq!(m.dst_access, vk::AccessFlags::SHADER_READ);
}

#[test]
fn test_render_target_to_sampled_waits_on_color_writes() {
    let m = transition_masks(ImageState::ColorAttachment, ImageState::ShaderReadOnly).unwrap().unwrap();
    assert_eq!(m.src_stage, vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT);
    assert_eq!(m.src_access, vk::AccessFlags::COLOR_ATTACHMENT_WRITE);
    assert_eq!(m.dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
}

#[test]
fn test_state_layouts() {
    assert_eq!(ImageState::Undefined.layout(), vk::ImageLayout::UNDEFINED);
    assert_eq!(ImageState::TransferDst.layout(), vk::ImageLayout::TRANSFER_DST_OPTIMAL);
    assert_eq!(ImageState::ColorAttachment.layout(), vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL);
    assert_eq!(ImageState::ShaderReadOnly.layout(), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(ImageState::PresentSource.layout(), vk::ImageLayout::PRESENT_SRC_KHR);
}
