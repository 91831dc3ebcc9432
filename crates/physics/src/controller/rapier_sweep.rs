use glam::Vec3;
use rapier3d::control::KinematicCharacterController;
use rapier3d::prelude::{QueryFilter, SharedShape};

use super::sweep::{CapsuleSweep, GroundProbe, SweepOutcome, classify_contact};
use crate::convert::{from_vector, to_isometry, to_vector};
use crate::world::{ActorHandle, PhysicsWorld, RayFilter};

/// [`CapsuleSweep`] backed by rapier's kinematic character controller.
pub(crate) struct RapierSweep<'a> {
    world: &'a PhysicsWorld,
    kcc: &'a KinematicCharacterController,
    shape: &'a SharedShape,
    actor: ActorHandle,
    dt: f32,
}

impl<'a> RapierSweep<'a> {
    pub(crate) fn new(
        world: &'a PhysicsWorld,
        kcc: &'a KinematicCharacterController,
        shape: &'a SharedShape,
        actor: ActorHandle,
        dt: f32,
    ) -> Self {
        Self {
            world,
            kcc,
            shape,
            actor,
            dt,
        }
    }
}

impl CapsuleSweep for RapierSweep<'_> {
    fn sweep(&mut self, center: Vec3, displacement: Vec3) -> SweepOutcome {
        let mut outcome = SweepOutcome::default();
        let filter = QueryFilter::default()
            .exclude_rigid_body(self.actor.0)
            .exclude_sensors();
        let movement = self.kcc.move_shape(
            self.dt,
            &self.world.bodies,
            &self.world.colliders,
            &self.world.query_pipeline,
            &**self.shape,
            &to_isometry(center, glam::Quat::IDENTITY),
            to_vector(displacement),
            filter,
            |collision| {
                let n = collision.hit.normal1;
                classify_contact(&mut outcome, Vec3::new(n.x, n.y, n.z));
            },
        );
        outcome.applied = from_vector(&movement.translation);
        outcome
    }

    fn probe_ground(&mut self, origin: Vec3, max_distance: f32) -> Option<GroundProbe> {
        let filter = RayFilter {
            exclude_actor: Some(self.actor),
            include_entities: false,
        };
        let hit = self
            .world
            .raycast(origin, Vec3::NEG_Y, max_distance, filter)?;
        Some(GroundProbe {
            normal: hit.normal,
            distance: hit.distance,
            dynamic_angular_velocity: hit.dynamic.then_some(hit.angular_velocity.y),
        })
    }
}
