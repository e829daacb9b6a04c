/// Frame slot scheduling
///
/// `frames_in_flight` slots are used round-robin. A slot is reused only
/// after the fence of its previous submission has been waited on, so slot
/// N + F never overlaps slot N on the GPU.

use ash::vk;
use sprout_graphics::{sprout_native_err, Result};

/// CPU-waitable completion signal per slot
pub(crate) trait FrameFences {
    /// Block until the last submission of `slot` completed, then re-arm it
    fn wait_and_reset(&mut self, slot: usize) -> Result<()>;
}

pub(crate) struct FrameScheduler<F: FrameFences> {
    fences: F,
    frames_in_flight: usize,
    slot: usize,
    in_frame: bool,
}

impl<F: FrameFences> FrameScheduler<F> {
    pub(crate) fn new(fences: F, frames_in_flight: usize) -> Self {
        Self {
            fences,
            frames_in_flight: frames_in_flight.max(1),
            slot: 0,
            in_frame: false,
        }
    }

    pub(crate) fn slot(&self) -> usize {
        self.slot
    }

    #[cfg(test)]
    pub(crate) fn frames_in_flight(&self) -> usize {
        self.frames_in_flight
    }

    pub(crate) fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Open the current slot, waiting on its fence
    ///
    /// Returns false when a frame is already open.
    pub(crate) fn begin(&mut self) -> Result<bool> {
        if self.in_frame {
            return Ok(false);
        }
        self.fences.wait_and_reset(self.slot)?;
        self.in_frame = true;
        Ok(true)
    }

    /// Close the current frame and advance to the next slot
    pub(crate) fn finish(&mut self) {
        self.in_frame = false;
        self.slot = (self.slot + 1) % self.frames_in_flight;
    }

    pub(crate) fn fences(&self) -> &F {
        &self.fences
    }

    #[cfg(test)]
    pub(crate) fn fences_mut(&mut self) -> &mut F {
        &mut self.fences
    }
}

/// Native fences, created signaled so the first wait returns at once
pub(crate) struct VulkanFences {
    device: ash::Device,
    fences: Vec<vk::Fence>,
}

impl VulkanFences {
    pub(crate) fn new(device: &ash::Device, count: usize) -> Result<Self> {
        let mut this = Self {
            device: device.clone(),
            fences: Vec::with_capacity(count),
        };
        let create_info = vk::FenceCreateInfo::default().flags(vk::FenceCreateFlags::SIGNALED);
        for _ in 0..count {
            let fence = unsafe { device.create_fence(&create_info, None) }
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateFence", e.as_raw()))?;
            this.fences.push(fence);
        }
        Ok(this)
    }

    pub(crate) fn fence(&self, slot: usize) -> vk::Fence {
        self.fences[slot]
    }
}

impl FrameFences for VulkanFences {
    fn wait_and_reset(&mut self, slot: usize) -> Result<()> {
        let fence = [self.fences[slot]];
        unsafe {
            self.device
                .wait_for_fences(&fence, true, u64::MAX)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkWaitForFences", e.as_raw()))?;
            self.device
                .reset_fences(&fence)
                .map_err(|e| sprout_native_err!("sprout::vulkan", "vkResetFences", e.as_raw()))?;
        }
        Ok(())
    }
}

impl Drop for VulkanFences {
    fn drop(&mut self) {
        unsafe {
            for fence in self.fences.drain(..) {
                self.device.destroy_fence(fence, None);
            }
        }
    }
}

/// Recycled binary semaphores for image acquisition
///
/// A semaphore handed to an acquire is returned once the fence of the
/// frame that waited on it has signaled.
pub(crate) struct SemaphorePool {
    device: ash::Device,
    free: Vec<vk::Semaphore>,
    in_use: Vec<Option<vk::Semaphore>>,
}

impl SemaphorePool {
    pub(crate) fn new(device: &ash::Device, frames_in_flight: usize) -> Self {
        Self {
            device: device.clone(),
            free: Vec::new(),
            in_use: vec![None; frames_in_flight],
        }
    }

    pub(crate) fn take(&mut self) -> Result<vk::Semaphore> {
        if let Some(semaphore) = self.free.pop() {
            return Ok(semaphore);
        }
        unsafe { self.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None) }
            .map_err(|e| sprout_native_err!("sprout::vulkan", "vkCreateSemaphore", e.as_raw()))
    }

    /// Put back a semaphore that was never waited on
    pub(crate) fn give_back(&mut self, semaphore: vk::Semaphore) {
        self.free.push(semaphore);
    }

    /// Record the semaphore used by `slot`, releasing the one it held before
    ///
    /// Only call after the slot's fence wait.
    pub(crate) fn assign(&mut self, slot: usize, semaphore: vk::Semaphore) {
        if let Some(previous) = self.in_use[slot].replace(semaphore) {
            self.free.push(previous);
        }
    }
}

impl Drop for SemaphorePool {
    fn drop(&mut self) {
        unsafe {
            for semaphore in self.free.drain(..).chain(self.in_use.iter_mut().filter_map(Option::take)) {
                self.device.destroy_semaphore(semaphore, None);
            }
        }
    }
}

#[cfg(test)]
#[path = "vulkan_frame_tests.rs"]
mod tests;
