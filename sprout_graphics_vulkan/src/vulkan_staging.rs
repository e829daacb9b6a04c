/// Per-frame transient upload memory
///
/// A `TransientCursor` hands out aligned ranges of a fixed-capacity buffer
/// and is reset when its frame slot begins. Reservation checks capacity
/// before anything is written; overflow is fatal (`ResourceLimit`).

use ash::vk;
use sprout_graphics::{Error, Result};
use std::sync::Arc;

use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::GpuContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientCursor {
    name: &'static str,
    capacity: u64,
    offset: u64,
}

impl TransientCursor {
    pub fn new(name: &'static str, capacity: u64) -> Self {
        Self { name, capacity, offset: 0 }
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Bytes handed out since the last reset
    pub fn used(&self) -> u64 {
        self.offset
    }

    /// Reserve `size` bytes at an `alignment`-aligned offset
    ///
    /// On failure the cursor is left untouched.
    pub fn reserve(&mut self, size: u64, alignment: u64) -> Result<u64> {
        let alignment = alignment.max(1);
        let start = self.offset.div_ceil(alignment) * alignment;
        let end = start.checked_add(size).unwrap_or(u64::MAX);
        if end > self.capacity {
            sprout_graphics::sprout_error!(
                "sprout::vulkan",
                "{} buffer exhausted: {} bytes requested at offset {}, capacity {}",
                self.name,
                size,
                start,
                self.capacity
            );
            return Err(Error::ResourceLimit(format!(
                "{} buffer needs {} bytes but only {} of {} remain this frame",
                self.name,
                size,
                self.capacity.saturating_sub(start),
                self.capacity
            )));
        }
        self.offset = end;
        Ok(start)
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }
}

/// Host-visible buffer paired with a cursor
pub(crate) struct TransientBuffer {
    buffer: Buffer,
    cursor: TransientCursor,
}

impl TransientBuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        name: &'static str,
        capacity: u64,
        usage: vk::BufferUsageFlags,
    ) -> Result<Self> {
        let buffer = Buffer::new(ctx, name, capacity, usage, gpu_allocator::MemoryLocation::CpuToGpu)?;
        Ok(Self {
            buffer,
            cursor: TransientCursor::new(name, capacity),
        })
    }

    pub(crate) fn handle(&self) -> vk::Buffer {
        self.buffer.handle()
    }

    /// Copy `bytes` in and return their offset
    pub(crate) fn push(&mut self, bytes: &[u8], alignment: u64) -> Result<u64> {
        let offset = self.cursor.reserve(bytes.len() as u64, alignment)?;
        self.buffer.write(offset, bytes)?;
        Ok(offset)
    }

    pub(crate) fn reset(&mut self) {
        self.cursor.reset();
    }
}

#[cfg(test)]
#[path = "vulkan_staging_tests.rs"]
mod tests;
