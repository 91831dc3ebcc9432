use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use wayfarer_kernel::LocomotionConfig;
use wayfarer_physics::{ControllerConfig, WorldConfig};
use wayfarer_render::AnimatorConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// How the physics thread spaces its ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicsPacing {
    /// Sleep out the rest of each tick so simulated time tracks wall-clock time.
    #[default]
    RealTime,
    /// Run ticks back to back.
    Unthrottled,
}

/// How the main loop spaces its frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FramePacing {
    Vsync { refresh_hz: u32 },
    Capped { fps: u32 },
    Uncapped,
}

impl Default for FramePacing {
    fn default() -> Self {
        Self::Vsync { refresh_hz: 60 }
    }
}

impl FramePacing {
    /// Target frame interval; `None` when uncapped.
    pub fn interval(&self) -> Option<Duration> {
        match *self {
            Self::Vsync { refresh_hz: hz } | Self::Capped { fps: hz } if hz > 0 => {
                Some(Duration::from_secs_f64(1.0 / f64::from(hz)))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    pub gravity: Vec3,
    pub worker_threads: usize,
    pub tick_hz: u32,
    pub pacing: PhysicsPacing,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        let world = WorldConfig::default();
        Self {
            gravity: world.gravity,
            worker_threads: world.worker_threads,
            tick_hz: 50,
            pacing: PhysicsPacing::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub pacing: FramePacing,
}

/// Top-level runtime configuration. Every field has a default, so an empty
/// YAML document is a valid config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub physics: PhysicsSettings,
    pub display: DisplaySettings,
    pub controller: ControllerConfig,
    pub locomotion: LocomotionConfig,
    pub animation: AnimatorConfig,
}

impl RuntimeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::info!(path = %path.display(), tick_hz = config.physics.tick_hz, "config loaded");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.physics.tick_hz.max(1)))
    }

    pub fn world_config(&self) -> WorldConfig {
        WorldConfig {
            gravity: self.physics.gravity,
            worker_threads: self.physics.worker_threads,
            fixed_dt: 1.0 / self.physics.tick_hz.max(1) as f32,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.physics.tick_hz == 0 {
            return Err(ConfigError::Invalid("physics.tick_hz must be at least 1".into()));
        }
        match self.display.pacing {
            FramePacing::Vsync { refresh_hz: 0 } => {
                return Err(ConfigError::Invalid("display refresh_hz must be at least 1".into()));
            }
            FramePacing::Capped { fps: 0 } => {
                return Err(ConfigError::Invalid("display fps must be at least 1".into()));
            }
            _ => {}
        }
        let c = &self.controller;
        if !(c.radius > 0.0 && c.height >= 0.0 && c.step_offset >= 0.0 && c.skin > 0.0) {
            return Err(ConfigError::Invalid(
                "controller radius and skin must be positive, height and step offset non-negative"
                    .into(),
            ));
        }
        if !(0.0..90.0).contains(&c.slope_limit_degrees) {
            return Err(ConfigError::Invalid(format!(
                "controller slope limit must be in [0, 90), got {}",
                c.slope_limit_degrees
            )));
        }
        self.world_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
