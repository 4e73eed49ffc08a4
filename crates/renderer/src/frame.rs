//! Frame pacing and index bookkeeping.
//!
//! Two index spaces are tracked independently. The frame slot cycles through
//! the frames-in-flight ring and selects the acquire semaphore and fence. The
//! image index is whatever the swapchain hands back and selects the command
//! buffer, framebuffer, and render-finished semaphore. The two must never be
//! conflated: the swapchain may return images in any order.

use meshview_rhi::sync::MAX_FRAMES_IN_FLIGHT;

/// Tracks the frame slot ring and the currently recorded swapchain image.
pub struct FramePacer {
    frames_in_flight: usize,
    /// Current frame slot (0 to frames_in_flight - 1).
    current_frame: usize,
    /// Image index acquired for the frame being recorded, if any.
    active_image: Option<u32>,
}

impl FramePacer {
    pub fn new() -> Self {
        Self::with_frames_in_flight(MAX_FRAMES_IN_FLIGHT)
    }

    pub fn with_frames_in_flight(frames_in_flight: usize) -> Self {
        debug_assert!(frames_in_flight > 0);
        Self {
            frames_in_flight,
            current_frame: 0,
            active_image: None,
        }
    }

    /// Current frame slot, indexing per-frame sync objects.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Image index of the frame being recorded, if a frame has begun.
    pub fn active_image(&self) -> Option<u32> {
        self.active_image
    }

    /// Whether a frame has begun and not yet ended.
    pub fn is_recording(&self) -> bool {
        self.active_image.is_some()
    }

    /// Records the outcome of a swapchain acquire.
    ///
    /// `None` means the acquire reported an out-of-date swapchain and the
    /// frame is skipped. The frame slot does not advance on a skip, so the
    /// slot's fence and semaphore are reused untouched on the next attempt.
    pub fn begin(&mut self, acquired: Option<u32>) -> Option<u32> {
        debug_assert!(self.active_image.is_none(), "frame already begun");
        self.active_image = acquired;
        acquired
    }

    /// Finishes the current frame and advances the frame slot.
    ///
    /// Returns the image index that was recorded, or `None` if no frame had
    /// begun (in which case nothing changes).
    pub fn end(&mut self) -> Option<u32> {
        let image = self.active_image.take()?;
        self.current_frame = (self.current_frame + 1) % self.frames_in_flight;
        Some(image)
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_slot_cycles_through_ring() {
        let mut pacer = FramePacer::with_frames_in_flight(2);
        assert_eq!(pacer.current_frame(), 0);

        pacer.begin(Some(0));
        pacer.end();
        assert_eq!(pacer.current_frame(), 1);

        pacer.begin(Some(1));
        pacer.end();
        assert_eq!(pacer.current_frame(), 0);
    }

    #[test]
    fn skip_does_not_advance_frame_slot() {
        let mut pacer = FramePacer::with_frames_in_flight(2);
        pacer.begin(Some(0));
        pacer.end();
        assert_eq!(pacer.current_frame(), 1);

        // Out-of-date acquire: the slot must be reusable unchanged.
        assert_eq!(pacer.begin(None), None);
        assert!(!pacer.is_recording());
        assert_eq!(pacer.end(), None);
        assert_eq!(pacer.current_frame(), 1);
    }

    #[test]
    fn image_index_is_independent_of_frame_slot() {
        let mut pacer = FramePacer::with_frames_in_flight(2);

        // A three-image swapchain can hand back indices out of step with
        // the two-slot frame ring.
        for &image in &[0u32, 2, 1, 0, 2] {
            let slot_before = pacer.current_frame();
            pacer.begin(Some(image));
            assert_eq!(pacer.active_image(), Some(image));
            assert_eq!(pacer.current_frame(), slot_before);
            assert_eq!(pacer.end(), Some(image));
        }
        // Five completed frames in a two-slot ring.
        assert_eq!(pacer.current_frame(), 1);
    }

    #[test]
    fn end_without_begin_is_a_no_op() {
        let mut pacer = FramePacer::new();
        assert_eq!(pacer.end(), None);
        assert_eq!(pacer.current_frame(), 0);
    }
}
