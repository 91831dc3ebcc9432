/// Edge detection for a digital button sampled once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonState {
    held: bool,
    was_held: bool,
}

impl ButtonState {
    /// Record this frame's sample.
    pub fn update(&mut self, down: bool) {
        self.was_held = self.held;
        self.held = down;
    }

    pub fn held(&self) -> bool {
        self.held
    }

    /// Went down this frame.
    pub fn pressed(&self) -> bool {
        self.held && !self.was_held
    }

    /// Went up this frame.
    pub fn released(&self) -> bool {
        !self.held && self.was_held
    }
}
