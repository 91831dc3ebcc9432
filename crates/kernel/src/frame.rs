use std::time::Instant;

use glam::{Mat4, Vec2, Vec3};
use wayfarer_common::ObjectId;
use wayfarer_physics::MotionState;

use crate::interpolation::PhysicsTransformState;

/// One object's published transforms.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectFrame {
    pub id: ObjectId,
    pub name: String,
    pub kind: &'static str,
    pub state: PhysicsTransformState,
}

impl ObjectFrame {
    pub fn interpolated(&self, alpha: f32) -> Mat4 {
        self.state.interpolated(alpha)
    }
}

/// What the animation side needs to know about the player after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerTelemetry {
    pub id: ObjectId,
    pub motion: MotionState,
    pub grounded: bool,
    pub sliding: bool,
    pub velocity: Vec3,
    pub foot: Vec3,
    pub facing: Vec2,
    pub run_speed: f32,
    pub jumps: u32,
}

/// An immutable snapshot of the scene published after a tick.
///
/// The physics side builds a complete frame and swaps it in whole, so
/// readers never see transforms from two different ticks.
#[derive(Debug, Clone)]
pub struct PhysicsFrame {
    pub tick: u64,
    pub published_at: Instant,
    pub objects: Vec<ObjectFrame>,
    pub player: Option<PlayerTelemetry>,
}

impl PhysicsFrame {
    /// A frame with no objects, used before the first tick.
    pub fn empty() -> Self {
        Self {
            tick: 0,
            published_at: Instant::now(),
            objects: Vec::new(),
            player: None,
        }
    }

    pub fn object(&self, id: ObjectId) -> Option<&ObjectFrame> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_named(&self, name: &str) -> Option<&ObjectFrame> {
        self.objects.iter().find(|o| o.name == name)
    }
}
