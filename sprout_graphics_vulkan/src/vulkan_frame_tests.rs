use super::*;
use sprout_graphics::Error;

/// Mock fence set counting submissions that have not been waited on
struct CountingFences {
    outstanding: Vec<u32>,
    waits: Vec<usize>,
    fail_on_wait: bool,
}

impl CountingFences {
    fn new(slots: usize) -> Self {
        Self {
            outstanding: vec![0; slots],
            waits: Vec::new(),
            fail_on_wait: false,
        }
    }

    fn submit(&mut self, slot: usize) {
        self.outstanding[slot] += 1;
    }

    fn total_outstanding(&self) -> u32 {
        self.outstanding.iter().sum()
    }
}

impl FrameFences for CountingFences {
    fn wait_and_reset(&mut self, slot: usize) -> Result<()> {
        if self.fail_on_wait {
            return Err(Error::NativeCall {
                operation: "vkWaitForFences".to_string(),
                code: -4,
            });
        }
        self.waits.push(slot);
        self.outstanding[slot] = 0;
        Ok(())
    }
}

fn run_frame(scheduler: &mut FrameScheduler<CountingFences>) -> usize {
    assert!(scheduler.begin().unwrap());
    let slot = scheduler.slot();
    scheduler.fences_mut().submit(slot);
    scheduler.finish();
    slot
}

// ============================================================================
// SLOT ROTATION
// ============================================================================

#[test]
fn test_slots_rotate_round_robin() {
    let mut scheduler = FrameScheduler::new(CountingFences::new(3), 3);
    let slots: Vec<usize> = (0..7).map(|_| run_frame(&mut scheduler)).collect();
    assert_eq!(slots, vec![0, 1, 2, 0, 1, 2, 0]);
}

#[test]
fn test_slot_never_overlaps_its_previous_submission() {
    let frames = 3;
    let mut scheduler = FrameScheduler::new(CountingFences::new(frames), frames);

    for _ in 0..20 {
        assert!(scheduler.begin().unwrap());
        let slot = scheduler.slot();

        // The slot's previous submission was waited on before reuse
        assert_eq!(scheduler.fences().outstanding[slot], 0);
        assert!(scheduler.fences().total_outstanding() < frames as u32);

        scheduler.fences_mut().submit(slot);
        assert!(scheduler.fences().total_outstanding() <= frames as u32);
        scheduler.finish();
    }
}

#[test]
fn test_begin_is_idempotent_within_a_frame() {
    let mut scheduler = FrameScheduler::new(CountingFences::new(2), 2);
    assert!(scheduler.begin().unwrap());
    assert!(!scheduler.begin().unwrap());
    assert!(scheduler.in_frame());
    assert_eq!(scheduler.fences().waits, vec![0]);
}

#[test]
fn test_zero_frames_in_flight_is_clamped() {
    let mut scheduler = FrameScheduler::new(CountingFences::new(1), 0);
    assert_eq!(scheduler.frames_in_flight(), 1);
    assert_eq!(run_frame(&mut scheduler), 0);
    assert_eq!(run_frame(&mut scheduler), 0);
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_failed_wait_leaves_frame_closed() {
    let mut fences = CountingFences::new(2);
    fences.fail_on_wait = true;
    let mut scheduler = FrameScheduler::new(fences, 2);

    assert!(matches!(scheduler.begin(), Err(Error::NativeCall { .. })));
    assert!(!scheduler.in_frame());
    assert_eq!(scheduler.slot(), 0);
}
