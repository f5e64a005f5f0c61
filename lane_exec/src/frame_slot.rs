//! # Frame Slot
//!
//! Single-slot, latest-value-wins hand-off between the asynchronous frame
//! source and the fixed-rate control loop.
//!
//! The slot stores an `Arc<Frame>`, so a reader always gets either the previous
//! or the new complete frame, never a partially written one. Reading never
//! waits for a new frame, the same frame may be returned by many consecutive
//! reads when the camera is slower than the control loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::sync::{Arc, Mutex, MutexGuard};

use crate::frame::Frame;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Cloneable handle to the shared frame slot.
#[derive(Clone, Default)]
pub struct FrameSlot {
    inner: Arc<Mutex<SlotData>>
}

/// A frame read from the slot along with its sequence number.
#[derive(Debug, Clone)]
pub struct LatestFrame {
    /// Sequence number of the frame, incremented on each publish. The first
    /// published frame has sequence number 1.
    pub seq: u64,

    /// The frame itself
    pub frame: Arc<Frame>
}

#[derive(Default)]
struct SlotData {
    latest: Option<LatestFrame>,
    num_published: u64,
    failed: bool
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new frame, replacing any frame which has not yet been read.
    ///
    /// Publishing clears the failed flag as the source is evidently working.
    pub fn publish(&self, frame: Frame) {
        let mut data = self.lock();

        data.num_published += 1;
        data.latest = Some(LatestFrame {
            seq: data.num_published,
            frame: Arc::new(frame)
        });
        data.failed = false;
    }

    /// Get the most recently published frame, or `None` if no frame has
    /// arrived yet.
    pub fn latest(&self) -> Option<LatestFrame> {
        self.lock().latest.clone()
    }

    /// Number of frames published into the slot so far.
    pub fn num_published(&self) -> u64 {
        self.lock().num_published
    }

    /// Mark the frame source as failed. The last frame remains readable.
    pub fn mark_failed(&self) {
        self.lock().failed = true;
    }

    /// True if the frame source has reported an unrecoverable failure.
    pub fn is_failed(&self) -> bool {
        self.lock().failed
    }

    /// Lock the slot, recovering the data if a writer panicked while holding
    /// the lock. Every write replaces whole values so the data is always
    /// consistent.
    fn lock(&self) -> MutexGuard<SlotData> {
        match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;
    use image::RgbImage;
    use std::thread;

    fn frame(w: u32) -> Frame {
        Frame::new(RgbImage::new(w, 4), Utc::now()).unwrap()
    }

    #[test]
    fn test_empty_slot() {
        let slot = FrameSlot::new();
        assert!(slot.latest().is_none());
        assert_eq!(slot.num_published(), 0);
        assert!(!slot.is_failed());
    }

    #[test]
    fn test_latest_value_wins() {
        let slot = FrameSlot::new();
        slot.publish(frame(1));
        slot.publish(frame(2));

        let latest = slot.latest().unwrap();
        assert_eq!(latest.seq, 2);
        assert_eq!(latest.frame.width(), 2);

        // Reading does not consume
        let again = slot.latest().unwrap();
        assert_eq!(again.seq, 2);
        assert!(Arc::ptr_eq(&latest.frame, &again.frame));
    }

    #[test]
    fn test_failed_flag() {
        let slot = FrameSlot::new();
        slot.publish(frame(3));
        slot.mark_failed();

        assert!(slot.is_failed());
        assert!(slot.latest().is_some());

        slot.publish(frame(3));
        assert!(!slot.is_failed());
    }

    #[test]
    fn test_concurrent_publish() {
        let slot = FrameSlot::new();
        let writer = slot.clone();

        let h = thread::spawn(move || {
            for w in 1..=50 {
                writer.publish(frame(w));
            }
        });

        // Every observed frame must be complete, with a width matching one of
        // the published frames.
        for _ in 0..50 {
            if let Some(l) = slot.latest() {
                assert!(l.frame.width() >= 1 && l.frame.width() <= 50);
                assert_eq!(l.frame.height(), 4);
            }
        }

        h.join().unwrap();
        assert_eq!(slot.latest().unwrap().frame.width(), 50);
        assert_eq!(slot.num_published(), 50);
    }
}
