use bitflags::bitflags;
use glam::{Vec2, Vec3};

bitflags! {
    /// Which sides of the capsule touched something during a sweep.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CollisionFlags: u8 {
        const SIDES = 1 << 0;
        const UP = 1 << 1;
        const DOWN = 1 << 2;
    }
}

/// Motion state derived from the controller flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Grounded,
    Airborne,
    SlidingDown,
    SlidingCeiling,
}

/// Per-controller mutable state.
///
/// The flags are recomputed every tick; only `velocity`, `prev_grounded` and
/// `prev_grounded_foot` carry meaning from one tick into the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharacterControllerState {
    /// Units per second.
    pub velocity: Vec3,
    pub grounded: bool,
    pub sliding: bool,
    pub sliding_ceiling: bool,
    /// Floor and ceiling touched in the same sweep.
    pub sandwiched: bool,
    pub collision_flags: CollisionFlags,
    pub ground_normal: Vec3,
    pub ceiling_normal: Vec3,
    pub prev_grounded: bool,
    pub prev_grounded_foot: Vec3,
    /// Angular velocity about up of the dynamic body being stood on.
    pub standing_on_angular_velocity: Option<f32>,
    /// Velocity handed to the main sweep on the last tick.
    pub cooked_velocity: Vec3,
}

impl Default for CharacterControllerState {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            grounded: false,
            sliding: false,
            sliding_ceiling: false,
            sandwiched: false,
            collision_flags: CollisionFlags::empty(),
            ground_normal: Vec3::Y,
            ceiling_normal: Vec3::NEG_Y,
            prev_grounded: false,
            prev_grounded_foot: Vec3::ZERO,
            standing_on_angular_velocity: None,
            cooked_velocity: Vec3::ZERO,
        }
    }
}

impl CharacterControllerState {
    pub fn motion_state(&self) -> MotionState {
        if self.sliding_ceiling {
            MotionState::SlidingCeiling
        } else if self.sliding {
            MotionState::SlidingDown
        } else if self.grounded {
            MotionState::Grounded
        } else {
            MotionState::Airborne
        }
    }

    /// Horizontal velocity as an XZ pair.
    pub fn flat_velocity(&self) -> Vec2 {
        Vec2::new(self.velocity.x, self.velocity.z)
    }
}

/// Ground test shared by the sweep classification and the probe.
/// A normal exactly at `threshold` is not flat.
pub fn is_flat_ground(normal: Vec3, threshold: f32) -> bool {
    normal.dot(Vec3::Y) > threshold
}
