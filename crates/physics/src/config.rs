use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::PhysicsError;

/// Physics world construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Gravity applied to dynamic bodies, in units/s².
    pub gravity: Vec3,
    /// Requested solver worker threads. The serial pipeline records but does not use it.
    pub worker_threads: usize,
    /// Length of one fixed physics step in seconds.
    pub fixed_dt: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -98.1, 0.0),
            worker_threads: 1,
            fixed_dt: 1.0 / 50.0,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidConfig(format!(
                "gravity must be finite, got {}",
                self.gravity
            )));
        }
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "fixed_dt must be positive, got {}",
                self.fixed_dt
            )));
        }
        if self.worker_threads == 0 {
            return Err(PhysicsError::InvalidConfig(
                "worker_threads must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
