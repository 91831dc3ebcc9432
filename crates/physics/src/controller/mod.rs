//! Kinematic capsule character controller.
//!
//! [`CharacterMotor`] holds the per-tick state machine; [`CharacterController`]
//! binds it to a kinematic actor in a [`PhysicsWorld`] and sweeps with rapier.

mod config;
mod motor;
mod rapier_sweep;
mod state;
mod sweep;

pub use config::{ControllerConfig, FLAT_GROUND_COS};
pub use motor::CharacterMotor;
pub use state::{CharacterControllerState, CollisionFlags, MotionState, is_flat_ground};
pub use sweep::{CapsuleSweep, GroundProbe, SweepOutcome};

use glam::{Mat4, Vec2, Vec3};
use rapier3d::control::{CharacterLength, KinematicCharacterController};
use rapier3d::prelude::{ColliderBuilder, SharedShape};
use wayfarer_common::translation_of;

use crate::world::{ActorHandle, BodyKind, FilterTag, PhysicsWorld, ShapeHandle};
use rapier_sweep::RapierSweep;

/// Receives the facing direction and run speed a landing implies.
///
/// Only objects that track facing implement this; the controller never
/// needs to know the concrete owner type.
pub trait FacingSink {
    fn facing(&self) -> Vec2;
    fn set_facing_and_speed(&mut self, facing: Vec2, run_speed: f32);
}

/// A capsule controller living in a physics world.
pub struct CharacterController {
    motor: CharacterMotor,
    actor: ActorHandle,
    shape_handle: Option<ShapeHandle>,
    shape: SharedShape,
    kcc: KinematicCharacterController,
}

impl std::fmt::Debug for CharacterController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterController")
            .field("actor", &self.actor)
            .field("shape", &self.shape_handle)
            .field("motor", &self.motor)
            .finish_non_exhaustive()
    }
}

impl CharacterController {
    /// Spawn a kinematic capsule at the translation of `transform`.
    pub fn new(world: &mut PhysicsWorld, config: ControllerConfig, transform: &Mat4) -> Self {
        let center = translation_of(transform);
        let actor = world.create_actor(center, glam::Quat::IDENTITY, BodyKind::Kinematic);
        let actor = world.add_actor(actor);
        let collider = ColliderBuilder::capsule_y(config.half_height(), config.radius)
            .collision_groups(FilterTag::Entity.interaction_groups())
            .build();
        let shape_handle = world.attach_shape(actor, collider).ok();

        let kcc = KinematicCharacterController {
            offset: CharacterLength::Absolute(config.skin),
            slide: true,
            autostep: None,
            max_slope_climb_angle: config.slope_limit_degrees.to_radians(),
            // Slope sliding is handled by the motor.
            min_slope_slide_angle: std::f32::consts::FRAC_PI_2,
            snap_to_ground: None,
            ..KinematicCharacterController::default()
        };

        tracing::info!(
            %center,
            radius = config.radius,
            height = config.height,
            "character controller created"
        );
        Self {
            motor: CharacterMotor::new(config, center),
            actor,
            shape_handle,
            shape: SharedShape::capsule_y(config.half_height(), config.radius),
            kcc,
        }
    }

    pub fn actor(&self) -> ActorHandle {
        self.actor
    }

    pub fn shape_handle(&self) -> Option<ShapeHandle> {
        self.shape_handle
    }

    pub fn motor(&self) -> &CharacterMotor {
        &self.motor
    }

    pub fn motor_mut(&mut self) -> &mut CharacterMotor {
        &mut self.motor
    }

    pub fn state(&self) -> &CharacterControllerState {
        self.motor.state()
    }

    /// Capsule centre.
    pub fn position(&self) -> Vec3 {
        self.motor.position()
    }

    pub fn foot_position(&self) -> Vec3 {
        self.motor.foot_position()
    }

    /// Run one tick against the world and move the kinematic actor to the result.
    /// Returns the new capsule centre.
    pub fn physics_update(
        &mut self,
        world: &mut PhysicsWorld,
        dt: f32,
        sink: Option<&mut dyn FacingSink>,
    ) -> Vec3 {
        let center = {
            let mut sweep = RapierSweep::new(world, &self.kcc, &self.shape, self.actor, dt);
            self.motor.step(&mut sweep, dt, sink)
        };
        world.set_kinematic_target(self.actor, center);
        tracing::trace!(
            %center,
            state = ?self.motor.state().motion_state(),
            "controller tick"
        );
        center
    }

    /// Teleport to the translation of `transform`.
    pub fn propagate_new_transform(&mut self, world: &mut PhysicsWorld, transform: &Mat4) {
        self.teleport(world, translation_of(transform));
    }

    pub fn teleport(&mut self, world: &mut PhysicsWorld, center: Vec3) {
        self.motor.teleport(center);
        world.set_kinematic_target(self.actor, center);
    }

    pub fn reset_to_reset_point(&mut self, world: &mut PhysicsWorld) {
        self.motor.reset_to_reset_point();
        world.set_kinematic_target(self.actor, self.motor.position());
        tracing::info!(foot = %self.motor.foot_position(), "controller reset");
    }

    pub fn release(self, world: &mut PhysicsWorld) {
        world.remove_actor(self.actor);
    }
}
