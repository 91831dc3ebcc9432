use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use wayfarer_common::{move_towards, move_towards_angle, move_towards_vec2, rotate_vec2};
use wayfarer_input::TickInput;
use wayfarer_physics::{CharacterController, FacingSink, PhysicsWorld};

/// Tuning for player locomotion. Speeds are in units per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    pub run_speed: f32,
    pub ground_acceleration: f32,
    pub ground_deceleration: f32,
    pub air_acceleration: f32,
    pub ground_turn_speed_degrees: f32,
    pub air_turn_speed_degrees: f32,
    /// Below this run speed the facing snaps to the input direction.
    pub instant_turn_speed: f32,
    pub jump_speed: f32,
    /// Seconds after leaving the ground during which a jump is still accepted.
    pub coyote_time: f32,
    /// Minimum seconds between two jumps.
    pub jump_debounce: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            run_speed: 37.5,
            ground_acceleration: 70.0,
            ground_deceleration: 500.0,
            air_acceleration: 125.0,
            ground_turn_speed_degrees: 400.0,
            air_turn_speed_degrees: 100.0,
            instant_turn_speed: 2.0,
            jump_speed: 40.0,
            coyote_time: 0.25,
            jump_debounce: 0.25,
        }
    }
}

/// Input dead zone.
const MOVE_EPSILON: f32 = 0.01;

/// Player behaviour: turns input into controller velocity.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerCharacter {
    config: LocomotionConfig,
    facing: Vec2,
    run_speed: f32,
    coyote_timer: f32,
    jump_cooldown: f32,
    jumps: u32,
}

impl PlayerCharacter {
    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            config,
            facing: Vec2::Y,
            run_speed: 0.0,
            coyote_timer: 0.0,
            jump_cooldown: 0.0,
            jumps: 0,
        }
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Unit facing direction in world XZ.
    pub fn facing(&self) -> Vec2 {
        self.facing
    }

    pub fn run_speed(&self) -> f32 {
        self.run_speed
    }

    pub fn jumps(&self) -> u32 {
        self.jumps
    }

    /// Apply one tick of input to `controller` before it moves.
    pub fn apply_input(
        &mut self,
        input: &TickInput,
        controller: &mut CharacterController,
        world: &mut PhysicsWorld,
        dt: f32,
    ) {
        if input.has(wayfarer_input::Action::SetResetPoint) {
            controller.motor_mut().set_reset_point();
        }
        if input.has(wayfarer_input::Action::ResetPosition) {
            controller.reset_to_reset_point(world);
            self.run_speed = 0.0;
            self.coyote_timer = 0.0;
        }
        if let Some(vertical) = input.lock_request() {
            controller.motor_mut().lock_velocity(vertical);
            self.run_speed = 0.0;
        }

        let state = *controller.state();
        if let Some(yaw_rate) = state.standing_on_angular_velocity {
            // Positive yaw about +Y turns clockwise in (x, z).
            self.facing = rotate_vec2(self.facing, -yaw_rate * dt).normalize_or(Vec2::Y);
        }

        let walking = state.grounded && !state.sliding;
        if walking {
            self.coyote_timer = self.config.coyote_time;
        } else {
            self.coyote_timer = (self.coyote_timer - dt).max(0.0);
        }
        self.jump_cooldown = (self.jump_cooldown - dt).max(0.0);

        let intent = input.movement.clamp_length_max(1.0);
        let velocity = if walking {
            self.ground_velocity(intent, state.ground_normal, dt)
        } else {
            self.air_velocity(intent, state.flat_velocity(), dt)
        };
        let vertical = controller.state().velocity.y;
        controller
            .motor_mut()
            .set_velocity(Vec3::new(velocity.x, vertical, velocity.y));

        if input.jump_pressed() && self.coyote_timer > 0.0 && self.jump_cooldown <= 0.0 {
            controller.motor_mut().force_airborne(self.config.jump_speed);
            self.coyote_timer = 0.0;
            self.jump_cooldown = self.config.jump_debounce;
            self.jumps += 1;
            tracing::debug!(jumps = self.jumps, "player jumped");
        }
    }

    fn turn_toward(&mut self, intent: Vec2, degrees_per_second: f32, dt: f32) {
        let target = intent.normalize();
        if self.run_speed.abs() < self.config.instant_turn_speed {
            self.facing = target;
            return;
        }
        let current = self.facing.y.atan2(self.facing.x);
        let wanted = target.y.atan2(target.x);
        let angle = move_towards_angle(current, wanted, degrees_per_second.to_radians() * dt);
        self.facing = Vec2::from_angle(angle);
    }

    /// Horizontal velocity (XZ) for a grounded tick.
    fn ground_velocity(&mut self, intent: Vec2, ground_normal: Vec3, dt: f32) -> Vec2 {
        let magnitude = intent.length();
        if magnitude > MOVE_EPSILON {
            self.turn_toward(intent, self.config.ground_turn_speed_degrees, dt);
        }
        let target = magnitude * self.config.run_speed;
        let rate = if target >= self.run_speed {
            self.config.ground_acceleration
        } else {
            self.config.ground_deceleration
        };
        self.run_speed = move_towards(self.run_speed, target, rate * dt);

        let flat = self.facing * self.run_speed;
        let along_slope = Quat::from_rotation_arc(Vec3::Y, ground_normal.normalize_or(Vec3::Y))
            * Vec3::new(flat.x, 0.0, flat.y);
        Vec2::new(along_slope.x, along_slope.z)
    }

    /// Horizontal velocity (XZ) while airborne or sliding.
    fn air_velocity(&mut self, intent: Vec2, current: Vec2, dt: f32) -> Vec2 {
        let magnitude = intent.length();
        if magnitude <= MOVE_EPSILON {
            return current;
        }
        self.turn_toward(intent, self.config.air_turn_speed_degrees, dt);
        let target = intent * self.config.run_speed;
        let velocity = move_towards_vec2(current, target, self.config.air_acceleration * dt);
        self.run_speed = velocity.length();
        velocity
    }
}

impl FacingSink for PlayerCharacter {
    fn facing(&self) -> Vec2 {
        self.facing
    }

    fn set_facing_and_speed(&mut self, facing: Vec2, run_speed: f32) {
        self.facing = facing.normalize_or(self.facing);
        self.run_speed = run_speed;
    }
}
