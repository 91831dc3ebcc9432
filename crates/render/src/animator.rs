use serde::{Deserialize, Serialize};
use wayfarer_kernel::PlayerTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationClip {
    Idle,
    Run,
    Jump,
    Fall,
    Land,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Seconds to blend from one clip into the next.
    pub crossfade: f32,
    /// Seconds the landing clip holds before idle takes over.
    pub land_duration: f32,
    /// Run speed below which the player idles.
    pub run_threshold: f32,
    /// Run speed at which the run clip plays at normal rate.
    pub reference_run_speed: f32,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            crossfade: 0.15,
            land_duration: 0.2,
            run_threshold: 1.0,
            reference_run_speed: 37.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipState {
    pub clip: AnimationClip,
    /// Seconds into the clip.
    pub time: f32,
}

/// What the renderer should show this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationPose {
    pub current: ClipState,
    /// Clip being faded out, if a crossfade is in progress.
    pub previous: Option<ClipState>,
    /// Weight of `current`, 0 to 1.
    pub blend: f32,
    pub playback_rate: f32,
}

/// Player animation state machine, run on the main thread.
#[derive(Debug, Clone)]
pub struct Animator {
    config: AnimatorConfig,
    current: ClipState,
    previous: Option<ClipState>,
    blend: f32,
    playback_rate: f32,
    land_timer: f32,
    was_grounded: bool,
}

impl Animator {
    pub fn new(config: AnimatorConfig) -> Self {
        Self {
            config,
            current: ClipState {
                clip: AnimationClip::Idle,
                time: 0.0,
            },
            previous: None,
            blend: 1.0,
            playback_rate: 1.0,
            land_timer: 0.0,
            was_grounded: true,
        }
    }

    pub fn clip(&self) -> AnimationClip {
        self.current.clip
    }

    pub fn pose(&self) -> AnimationPose {
        AnimationPose {
            current: self.current,
            previous: self.previous,
            blend: self.blend,
            playback_rate: self.playback_rate,
        }
    }

    /// Advance by `dt` seconds of wall-clock time using the latest telemetry.
    pub fn update(&mut self, telemetry: Option<&PlayerTelemetry>, dt: f32) {
        let dt = dt.max(0.0);
        let target = match telemetry {
            Some(t) => self.select(t, dt),
            None => AnimationClip::Idle,
        };
        if target != self.current.clip {
            tracing::debug!(from = ?self.current.clip, to = ?target, "animation transition");
            self.previous = Some(self.current);
            self.current = ClipState {
                clip: target,
                time: 0.0,
            };
            self.blend = 0.0;
        }

        self.playback_rate = match (target, telemetry) {
            (AnimationClip::Run, Some(t)) if self.config.reference_run_speed > 0.0 => {
                t.run_speed.abs() / self.config.reference_run_speed
            }
            _ => 1.0,
        };
        self.current.time += dt * self.playback_rate;

        if let Some(previous) = &mut self.previous {
            previous.time += dt;
            self.blend = if self.config.crossfade > 0.0 {
                (self.blend + dt / self.config.crossfade).min(1.0)
            } else {
                1.0
            };
            if self.blend >= 1.0 {
                self.previous = None;
            }
        }
    }

    fn select(&mut self, t: &PlayerTelemetry, dt: f32) -> AnimationClip {
        let grounded = t.grounded && !t.sliding;
        let landed = grounded && !self.was_grounded;
        self.was_grounded = grounded;

        if !grounded {
            self.land_timer = 0.0;
            return if t.velocity.y > 0.0 {
                AnimationClip::Jump
            } else {
                AnimationClip::Fall
            };
        }
        if landed {
            self.land_timer = self.config.land_duration;
        }
        let running = t.run_speed.abs() > self.config.run_threshold;
        if self.land_timer > 0.0 && !running {
            self.land_timer = (self.land_timer - dt).max(0.0);
            return AnimationClip::Land;
        }
        self.land_timer = 0.0;
        if running {
            AnimationClip::Run
        } else {
            AnimationClip::Idle
        }
    }
}
