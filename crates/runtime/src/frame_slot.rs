use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use wayfarer_kernel::PhysicsFrame;

/// Latest published frame, swapped whole under a short lock.
///
/// Readers clone the `Arc` and then read without holding the lock, so a
/// reader never observes transforms from two different ticks.
#[derive(Debug)]
pub struct FrameSlot {
    current: Mutex<Arc<PhysicsFrame>>,
    published: AtomicU64,
}

impl Default for FrameSlot {
    fn default() -> Self {
        Self {
            current: Mutex::new(Arc::new(PhysicsFrame::empty())),
            published: AtomicU64::new(0),
        }
    }
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Arc<PhysicsFrame>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, frame: PhysicsFrame) {
        let frame = Arc::new(frame);
        *self.lock() = frame;
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn latest(&self) -> Arc<PhysicsFrame> {
        Arc::clone(&self.lock())
    }

    /// Number of frames published so far.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
