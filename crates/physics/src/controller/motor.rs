use glam::{Vec2, Vec3};

use super::FacingSink;
use super::config::ControllerConfig;
use super::state::{CharacterControllerState, CollisionFlags, is_flat_ground};
use super::sweep::CapsuleSweep;

/// Speeds at or below this on landing leave the facing direction alone.
const MIN_LANDING_SPEED: f32 = 0.01;

/// The controller state machine, independent of any physics backend.
///
/// `position` is the capsule centre. Every query goes through a
/// [`CapsuleSweep`], so the same code runs against rapier or a scripted test world.
#[derive(Debug, Clone)]
pub struct CharacterMotor {
    config: ControllerConfig,
    state: CharacterControllerState,
    position: Vec3,
    suppress_transition: bool,
    reset_point: Vec3,
}

impl CharacterMotor {
    pub fn new(config: ControllerConfig, center: Vec3) -> Self {
        let mut state = CharacterControllerState::default();
        state.prev_grounded_foot = center - Vec3::Y * config.foot_offset();
        Self {
            reset_point: config.reset_point,
            config,
            state,
            position: center,
            suppress_transition: false,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn state(&self) -> &CharacterControllerState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut CharacterControllerState {
        &mut self.state
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn foot_position(&self) -> Vec3 {
        self.position - Vec3::Y * self.config.foot_offset()
    }

    pub fn reset_point(&self) -> Vec3 {
        self.reset_point
    }

    /// Move the capsule without sweeping. Velocity is zeroed and the next
    /// tick does not turn the jump into a transition velocity.
    pub fn teleport(&mut self, center: Vec3) {
        self.position = center;
        self.state.velocity = Vec3::ZERO;
        self.suppress_transition = true;
    }

    pub fn teleport_foot(&mut self, foot: Vec3) {
        self.teleport(foot + Vec3::Y * self.config.foot_offset());
    }

    /// Remember the current foot position as the reset point.
    pub fn set_reset_point(&mut self) {
        self.reset_point = self.foot_position();
        tracing::info!(point = %self.reset_point, "controller reset point set");
    }

    pub fn reset_to_reset_point(&mut self) {
        self.teleport_foot(self.reset_point);
    }

    /// Zero horizontal velocity, and vertical too when `vertical` is set.
    pub fn lock_velocity(&mut self, vertical: bool) {
        if vertical {
            self.state.velocity = Vec3::ZERO;
        } else {
            self.state.velocity.x = 0.0;
            self.state.velocity.z = 0.0;
        }
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.state.velocity = velocity;
    }

    /// Launch upward; the controller counts as airborne from now on.
    pub fn force_airborne(&mut self, vertical_speed: f32) {
        self.state.velocity.y = vertical_speed;
        self.state.grounded = false;
        self.state.sliding = false;
    }

    /// Run one fixed tick. Returns the new capsule centre.
    pub fn step<S: CapsuleSweep + ?Sized>(
        &mut self,
        sweep: &mut S,
        dt: f32,
        sink: Option<&mut dyn FacingSink>,
    ) -> Vec3 {
        let cfg = self.config;

        self.state.velocity.y -= cfg.gravity * dt;

        let mut cooked = self.state.velocity;
        if self.state.velocity.y > 0.0 && self.state.sliding_ceiling {
            cooked.x = 0.0;
            cooked.z = 0.0;
        }
        if self.state.grounded && !self.state.sliding {
            // One step height per tick keeps the capsule glued to stairs going down.
            cooked.y = -cfg.step_offset / dt;
        }
        self.state.cooked_velocity = cooked;

        let main = sweep.sweep(self.position, cooked * dt);
        self.position += main.applied;

        let prev_sliding = self.state.sliding;
        let st = &mut self.state;
        st.grounded = false;
        st.sliding = false;
        st.sliding_ceiling = false;
        st.sandwiched = false;
        st.standing_on_angular_velocity = None;
        st.collision_flags = main.flags;
        if let Some(n) = main.ground_normal {
            st.ground_normal = n;
        }
        if let Some(n) = main.ceiling_normal {
            st.ceiling_normal = n;
        }

        if main.flags.contains(CollisionFlags::DOWN | CollisionFlags::UP) {
            self.state.sandwiched = true;
            let away = (self.state.ground_normal + self.state.ceiling_normal) * 0.5;
            if let Some(dir) = Vec3::new(away.x, 0.0, away.z).try_normalize() {
                let push = sweep.sweep(self.position, dir * cfg.sandwich_push);
                self.position += push.applied;
            }
        }

        if main.flags.contains(CollisionFlags::DOWN) {
            self.state.grounded = true;
            let mut flat = is_flat_ground(self.state.ground_normal, cfg.flat_threshold);

            let origin = self.foot_position() + Vec3::Y * cfg.probe_padding;
            let probe = sweep.probe_ground(origin, cfg.step_offset + 2.0 * cfg.probe_padding);
            if let Some(hit) = &probe {
                if !prev_sliding {
                    flat |= is_flat_ground(hit.normal, cfg.flat_threshold);
                }
            }

            if flat {
                self.state.velocity.y = 0.0;
                self.state.standing_on_angular_velocity =
                    probe.and_then(|hit| hit.dynamic_angular_velocity);
            } else if self.state.velocity.y < 0.0 {
                self.state.sliding = true;
                let fall = (self.state.velocity.y * dt - main.applied.y).min(0.0);
                if let Some(offset) = downhill_slide(self.state.ground_normal, fall) {
                    let slide = sweep.sweep(self.position, offset * cfg.slide_scale);
                    self.position += slide.applied;
                }
            }
        }

        if self.state.velocity.y > 0.0 && main.flags.contains(CollisionFlags::UP) {
            if self.state.ceiling_normal.dot(Vec3::NEG_Y) > cfg.flat_threshold {
                self.state.velocity.y = 0.0;
            } else {
                // A ceiling slide implies a rise; no transition velocity this tick.
                self.state.sliding_ceiling = true;
                self.suppress_transition = true;
            }
        }

        if main.flags.contains(CollisionFlags::SIDES) {
            tracing::trace!(position = %self.position, "controller side contact");
        }

        self.synthesize_transition_velocity(dt, sink);
        self.position
    }

    fn synthesize_transition_velocity(&mut self, dt: f32, sink: Option<&mut dyn FacingSink>) {
        let foot = self.foot_position();
        let st = &mut self.state;

        if self.suppress_transition {
            self.suppress_transition = false;
        } else if st.grounded != st.prev_grounded {
            st.velocity = (foot - st.prev_grounded_foot) / dt;
            if st.grounded {
                if !st.sliding {
                    st.velocity.y = 0.0;
                }
                if let Some(sink) = sink {
                    hand_off_landing(st.flat_velocity(), sink);
                }
                tracing::trace!(velocity = %st.velocity, "controller landed");
            } else {
                st.velocity.y = st.velocity.y.max(0.0);
                tracing::trace!(velocity = %st.velocity, "controller left ground");
            }
        }

        st.prev_grounded_foot = foot;
        st.prev_grounded = st.grounded;
    }
}

/// Convert landing velocity into a facing direction and signed run speed,
/// keeping the current facing when the motion points backwards.
fn hand_off_landing(flat_velocity: Vec2, sink: &mut dyn FacingSink) {
    let mut speed = flat_velocity.length();
    if speed <= MIN_LANDING_SPEED {
        return;
    }
    let mut facing = flat_velocity / speed;
    if sink.facing().dot(facing) < 0.0 {
        facing = -facing;
        speed = -speed;
    }
    sink.set_facing_and_speed(facing, speed);
}

/// Displacement down the slope under `normal` whose vertical part is `fall`.
///
/// The downhill tangent is `(up × n) × n`. Returns `None` on flat or
/// vertical surfaces where the tangent has no vertical component.
pub(crate) fn downhill_slide(normal: Vec3, fall: f32) -> Option<Vec3> {
    if fall >= 0.0 {
        return None;
    }
    let tangent = Vec3::Y.cross(normal).cross(normal).try_normalize()?;
    if tangent.y > -1e-4 {
        return None;
    }
    Some(tangent * (fall / tangent.y))
}
