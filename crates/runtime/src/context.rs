use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use wayfarer_input::InputMailbox;

use crate::frame_slot::FrameSlot;

/// State shared by the main thread and the physics thread.
///
/// Owned by the runtime and handed out behind an `Arc`; there are no globals.
#[derive(Debug)]
pub struct SimulationContext {
    running: AtomicBool,
    play_mode: AtomicBool,
    tick: Duration,
    frames: FrameSlot,
    input: InputMailbox,
}

impl SimulationContext {
    pub fn new(tick: Duration) -> Self {
        Self {
            running: AtomicBool::new(false),
            play_mode: AtomicBool::new(true),
            tick,
            frames: FrameSlot::new(),
            input: InputMailbox::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    /// While play mode is off the physics thread keeps applying commands and
    /// publishing frames but does not step the world.
    pub fn play_mode(&self) -> bool {
        self.play_mode.load(Ordering::Relaxed)
    }

    pub fn set_play_mode(&self, on: bool) {
        self.play_mode.store(on, Ordering::Relaxed);
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick
    }

    pub fn frames(&self) -> &FrameSlot {
        &self.frames
    }

    pub fn input(&self) -> &InputMailbox {
        &self.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_default() {
        let ctx = SimulationContext::new(Duration::from_millis(20));
        assert!(!ctx.is_running());
        assert!(ctx.play_mode());
        ctx.set_running(true);
        ctx.set_play_mode(false);
        assert!(ctx.is_running());
        assert!(!ctx.play_mode());
        assert_eq!(ctx.tick_duration(), Duration::from_millis(20));
    }
}
