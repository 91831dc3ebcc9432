use std::time::Duration;

use glam::Mat4;

/// Previous and current physics transforms of one object.
///
/// Written once per tick by the physics side; the render side blends between
/// the two with [`interpolated`](Self::interpolated).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsTransformState {
    previous: Mat4,
    current: Mat4,
}

impl Default for PhysicsTransformState {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

impl PhysicsTransformState {
    /// Both slots start at `initial`, so the first frames do not blend from
    /// the origin.
    pub fn new(initial: Mat4) -> Self {
        Self {
            previous: initial,
            current: initial,
        }
    }

    /// Shift `current` into `previous` and store the new transform.
    pub fn update(&mut self, transform: Mat4) {
        self.previous = self.current;
        self.current = transform;
    }

    /// Set both slots. Used after a teleport so the render side does not
    /// blend across the jump.
    pub fn snap(&mut self, transform: Mat4) {
        self.previous = transform;
        self.current = transform;
    }

    pub fn previous(&self) -> Mat4 {
        self.previous
    }

    pub fn current(&self) -> Mat4 {
        self.current
    }

    /// Blend between the two slots. `alpha` is clamped to `[0, 1]`; both ends
    /// return the stored matrix unchanged.
    pub fn interpolated(&self, alpha: f32) -> Mat4 {
        let alpha = if alpha.is_nan() {
            1.0
        } else {
            alpha.clamp(0.0, 1.0)
        };
        if alpha == 0.0 {
            return self.previous;
        }
        if alpha == 1.0 || self.previous == self.current {
            return self.current;
        }
        let (_, r0, t0) = self.previous.to_scale_rotation_translation();
        let (s1, r1, t1) = self.current.to_scale_rotation_translation();
        Mat4::from_scale_rotation_translation(s1, r0.slerp(r1, alpha), t0.lerp(t1, alpha))
    }
}

/// Fraction of a tick that has elapsed since a frame was published.
pub fn interpolation_alpha(since_publish: Duration, tick: Duration) -> f32 {
    if tick.is_zero() {
        return 1.0;
    }
    (since_publish.as_secs_f32() / tick.as_secs_f32()).clamp(0.0, 1.0)
}
