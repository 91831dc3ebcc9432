use glam::Vec3;
use serde::{Deserialize, Serialize};

/// cos(46°): ground with a normal closer to vertical than this is flat.
pub const FLAT_GROUND_COS: f32 = 0.694_658_37;

/// Capsule dimensions and movement tuning for a character controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub radius: f32,
    /// Length of the cylindrical section, excluding the hemispherical caps.
    pub height: f32,
    /// Largest ledge the controller steps down without leaving the ground.
    pub step_offset: f32,
    /// Contact offset kept between the capsule and obstacles.
    pub skin: f32,
    /// Steepest slope the sweep lets the capsule walk up.
    pub slope_limit_degrees: f32,
    pub flat_threshold: f32,
    /// Ground probe starts this far above the foot and reaches this far past the step offset.
    pub probe_padding: f32,
    /// Downward acceleration in units/s².
    pub gravity: f32,
    /// Multiplier on the corrective downhill slide.
    pub slide_scale: f32,
    /// Distance pushed out of a floor/ceiling crevice.
    pub sandwich_push: f32,
    pub spawn_position: Vec3,
    /// Foot position restored by a reset.
    pub reset_point: Vec3,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            height: 4.5,
            step_offset: 0.5,
            skin: 0.01,
            slope_limit_degrees: 45.0,
            flat_threshold: FLAT_GROUND_COS,
            probe_padding: 0.05,
            gravity: 98.1,
            slide_scale: 1.0,
            sandwich_push: 0.1,
            spawn_position: Vec3::new(0.0, 100.0, 0.0),
            reset_point: Vec3::new(0.0, 4.0, 0.0),
        }
    }
}

impl ControllerConfig {
    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    /// Distance from the capsule centre down to its lowest point.
    pub fn foot_offset(&self) -> f32 {
        self.half_height() + self.radius
    }
}
