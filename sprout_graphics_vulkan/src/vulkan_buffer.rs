/// Buffer - RAII Vulkan buffer with its gpu-allocator allocation

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use sprout_graphics::{sprout_err, sprout_error, Error, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub(crate) struct Buffer {
    ctx: Arc<GpuContext>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl Buffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        name: &'static str,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
    ) -> Result<Self> {
        unsafe {
            let create_info = vk::BufferCreateInfo::default()
                .size(size.max(4))
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = ctx
                .device
                .create_buffer(&create_info, None)
                .map_err(|e| sprout_err!("sprout::vulkan", "Failed to create {} buffer of {} bytes: {:?}", name, size, e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocated = ctx.allocator().and_then(|mut allocator| {
                allocator
                    .allocate(&AllocationCreateDesc {
                        name,
                        requirements,
                        location,
                        linear: true,
                        allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                    })
                    .map_err(|_| {
                        let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                        sprout_error!("sprout::vulkan", "Out of GPU memory for {} buffer ({:.2} MB)", name, size_mb);
                        Error::OutOfMemory
                    })
            });
            let allocation = match allocated {
                Ok(allocation) => allocation,
                Err(e) => {
                    ctx.device.destroy_buffer(buffer, None);
                    return Err(e);
                }
            };

            // From here Drop releases both halves
            let this = Self {
                ctx,
                buffer,
                allocation: Some(allocation),
                size,
            };
            if let Some(allocation) = &this.allocation {
                this.ctx
                    .device
                    .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                    .map_err(|e| sprout_err!("sprout::vulkan", "Failed to bind {} buffer memory: {:?}", name, e))?;
            }
            Ok(this)
        }
    }

    pub(crate) fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Copy `bytes` into a host-visible buffer at `offset`
    pub(crate) fn write(&self, offset: u64, bytes: &[u8]) -> Result<()> {
        let end = offset.checked_add(bytes.len() as u64).unwrap_or(u64::MAX);
        if end > self.size {
            return Err(sprout_graphics::sprout_invariant!(
                "sprout::vulkan",
                "Write of {} bytes at {} overflows the {}-byte buffer",
                bytes.len(),
                offset,
                self.size
            ));
        }
        let allocation = self
            .allocation
            .as_ref()
            .ok_or_else(|| sprout_err!("sprout::vulkan", "Buffer write failed: no GPU allocation"))?;
        let mapped = allocation
            .mapped_ptr()
            .ok_or_else(|| sprout_err!("sprout::vulkan", "Buffer is not CPU-accessible"))?
            .as_ptr() as *mut u8;
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped.add(offset as usize), bytes.len());
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator() {
                    allocator.free(allocation).ok();
                }
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
