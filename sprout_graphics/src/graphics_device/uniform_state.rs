/// CPU-side uniform slot state shared by every backend
///
/// Each renderable keeps one `UniformState`: a zeroed shadow copy per
/// constant buffer and the currently pushed texture per texture slot.
/// Backends copy the shadows to GPU memory at draw time.

use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{same_texture, Texture, TextureUsage, Uniform, UniformType};

/// State of one declared uniform slot
pub enum UniformSlot {
    ConstantBuffer {
        slot: u32,
        data: Vec<u8>,
        dirty: bool,
    },
    Texture {
        slot: u32,
        /// Texture unit / shader resource slot, assigned in declaration order
        unit: u32,
        texture: Option<Arc<dyn Texture>>,
    },
}

impl UniformSlot {
    pub fn slot(&self) -> u32 {
        match self {
            UniformSlot::ConstantBuffer { slot, .. } | UniformSlot::Texture { slot, .. } => *slot,
        }
    }
}

pub struct UniformState {
    slots: Vec<UniformSlot>,
}

impl UniformState {
    pub fn new(uniforms: &[Uniform]) -> Self {
        let mut next_unit = 0;
        let slots = uniforms
            .iter()
            .map(|uniform| match uniform.uniform_type {
                UniformType::ConstantBuffer { size } => UniformSlot::ConstantBuffer {
                    slot: uniform.slot,
                    data: vec![0; size as usize],
                    dirty: true,
                },
                UniformType::Texture => {
                    let unit = next_unit;
                    next_unit += 1;
                    UniformSlot::Texture {
                        slot: uniform.slot,
                        unit,
                        texture: None,
                    }
                }
            })
            .collect();
        Self { slots }
    }

    pub fn slots(&self) -> &[UniformSlot] {
        &self.slots
    }

    fn find_mut(&mut self, slot: u32) -> Result<&mut UniformSlot> {
        self.slots
            .iter_mut()
            .find(|s| s.slot() == slot)
            .ok_or_else(|| crate::sprout_invariant!("sprout::uniform", "Uniform slot {} is not declared", slot))
    }

    /// Copy `data` into the shadow of constant buffer `slot`
    pub fn write_constant(&mut self, slot: u32, byte_offset: u32, bytes: &[u8]) -> Result<()> {
        match self.find_mut(slot)? {
            UniformSlot::ConstantBuffer { data, dirty, .. } => {
                let start = byte_offset as usize;
                let end = start + bytes.len();
                if end > data.len() {
                    return Err(crate::sprout_invariant!(
                        "sprout::uniform",
                        "Writing {} bytes at {} overflows the {}-byte constant buffer at slot {}",
                        bytes.len(),
                        byte_offset,
                        data.len(),
                        slot
                    ));
                }
                data[start..end].copy_from_slice(bytes);
                *dirty = true;
                Ok(())
            }
            UniformSlot::Texture { .. } => Err(crate::sprout_invariant!(
                "sprout::uniform",
                "Slot {} is a texture slot, constant data cannot be pushed to it",
                slot
            )),
        }
    }

    /// Remember `texture` for texture slot `slot`
    pub fn bind_texture(&mut self, slot: u32, new_texture: &Arc<dyn Texture>) -> Result<()> {
        if !new_texture.usage().contains(TextureUsage::SHADER) {
            return Err(crate::sprout_invariant!(
                "sprout::uniform",
                "Texture pushed to slot {} was not created with SHADER usage",
                slot
            ));
        }
        match self.find_mut(slot)? {
            UniformSlot::Texture { texture, .. } => {
                *texture = Some(Arc::clone(new_texture));
                Ok(())
            }
            UniformSlot::ConstantBuffer { .. } => Err(crate::sprout_invariant!(
                "sprout::uniform",
                "Slot {} is a constant buffer slot, a texture cannot be pushed to it",
                slot
            )),
        }
    }

    /// Every texture slot must hold a texture before a draw
    pub fn require_textures_bound(&self) -> Result<()> {
        for slot in &self.slots {
            if let UniformSlot::Texture { slot, texture: None, .. } = slot {
                return Err(crate::sprout_invariant!(
                    "sprout::uniform",
                    "Texture slot {} has no texture bound",
                    slot
                ));
            }
        }
        Ok(())
    }

    /// A bound texture must not also be a current render target
    pub fn check_not_render_target(&self, targets: &[Arc<dyn Texture>]) -> Result<()> {
        for (slot, _, texture) in self.textures() {
            if targets.iter().any(|target| same_texture(target, texture)) {
                return Err(crate::sprout_invariant!(
                    "sprout::uniform",
                    "Texture at slot {} is sampled while bound as a render target",
                    slot
                ));
            }
        }
        Ok(())
    }

    /// Everything a draw needs checked before commands are recorded
    pub fn validate_for_draw(&self, targets: &[Arc<dyn Texture>]) -> Result<()> {
        self.require_textures_bound()?;
        self.check_not_render_target(targets)
    }

    /// `(slot, shadow)` for every constant buffer
    pub fn constant_buffers(&self) -> impl Iterator<Item = (u32, &[u8])> + '_ {
        self.slots.iter().filter_map(|s| match s {
            UniformSlot::ConstantBuffer { slot, data, .. } => Some((*slot, data.as_slice())),
            UniformSlot::Texture { .. } => None,
        })
    }

    /// `(slot, shadow)` for constant buffers written since the last `mark_clean`
    pub fn dirty_constant_buffers(&self) -> impl Iterator<Item = (u32, &[u8])> + '_ {
        self.slots.iter().filter_map(|s| match s {
            UniformSlot::ConstantBuffer { slot, data, dirty: true } => Some((*slot, data.as_slice())),
            _ => None,
        })
    }

    pub fn mark_clean(&mut self) {
        for slot in &mut self.slots {
            if let UniformSlot::ConstantBuffer { dirty, .. } = slot {
                *dirty = false;
            }
        }
    }

    /// `(slot, unit, texture)` for every bound texture slot
    pub fn textures(&self) -> impl Iterator<Item = (u32, u32, &Arc<dyn Texture>)> + '_ {
        self.slots.iter().filter_map(|s| match s {
            UniformSlot::Texture { slot, unit, texture: Some(texture) } => Some((*slot, *unit, texture)),
            _ => None,
        })
    }

    /// Unit assigned to texture slot `slot`
    #[cfg(test)]
    pub fn texture_unit(&self, slot: u32) -> Option<u32> {
        self.slots.iter().find_map(|s| match s {
            UniformSlot::Texture { slot: s_slot, unit, .. } if *s_slot == slot => Some(*unit),
            _ => None,
        })
    }
}

#[cfg(test)]
#[path = "uniform_state_tests.rs"]
mod tests;
