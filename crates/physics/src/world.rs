use std::collections::HashMap;
use std::sync::Mutex;

use glam::{Quat, Vec3};
use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};

use crate::convert::{from_isometry, from_point, from_vector, to_isometry, to_point, to_vector};
use crate::{PhysicsError, WorldConfig};

/// Handle to a rigid actor that is a member of the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorHandle(pub(crate) RigidBodyHandle);

/// Handle to a shape attached to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub(crate) ColliderHandle);

/// How an actor participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyKind {
    #[default]
    Static,
    Dynamic,
    /// Moved explicitly each tick (character controllers, scripted platforms).
    Kinematic,
}

/// Collision filter tag carried by every shape.
///
/// Entity shapes (characters) are skipped by ground probes so a controller
/// never stands on itself or on another character's capsule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterTag {
    #[default]
    Untagged,
    Entity,
}

impl FilterTag {
    fn membership(self) -> Group {
        match self {
            FilterTag::Untagged => Group::GROUP_1,
            FilterTag::Entity => Group::GROUP_2,
        }
    }

    pub(crate) fn interaction_groups(self) -> InteractionGroups {
        InteractionGroups::new(self.membership(), Group::ALL)
    }
}

/// A body that has been created but not yet added to the world.
pub struct RigidActor {
    body: RigidBody,
    kind: BodyKind,
}

impl RigidActor {
    pub fn kind(&self) -> BodyKind {
        self.kind
    }
}

/// Phase of a trigger overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    Enter,
    Exit,
}

/// A trigger shape started or stopped overlapping another actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Actor owning the trigger shape.
    pub trigger: ActorHandle,
    /// Actor that entered or left the trigger.
    pub other: ActorHandle,
    pub phase: TriggerPhase,
}

/// Options for [`PhysicsWorld::raycast`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RayFilter {
    pub exclude_actor: Option<ActorHandle>,
    /// Also report hits against `FilterTag::Entity` shapes.
    pub include_entities: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub actor: Option<ActorHandle>,
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub dynamic: bool,
    /// Angular velocity of the hit body (zero for static geometry).
    pub angular_velocity: Vec3,
}

/// Geometry currently attached under a shape handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeGeometry {
    Box { half_extents: Vec3 },
    Sphere { radius: f32 },
    Capsule { half_height: f32, radius: f32 },
    TriangleMesh { triangles: usize },
    Other,
}

/// Counters reported when the world is shut down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldStats {
    pub ticks: u64,
    pub remaining_actors: usize,
}

#[derive(Debug, Clone, Copy)]
struct ShapeOwner {
    actor: ActorHandle,
    sensor: bool,
}

/// Collects sensor collision events raised during a step.
#[derive(Default)]
struct TriggerCollector {
    events: Mutex<Vec<CollisionEvent>>,
}

impl TriggerCollector {
    fn drain(&self) -> Vec<CollisionEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventHandler for TriggerCollector {
    fn handle_collision_event(
        &self,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if !event.sensor() {
            return;
        }
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// The physics simulation context.
///
/// Owned by exactly one thread. All actors are children of this world and
/// must be removed before it is shut down.
pub struct PhysicsWorld {
    config: WorldConfig,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub(crate) bodies: RigidBodySet,
    pub(crate) colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    pub(crate) query_pipeline: QueryPipeline,
    collector: TriggerCollector,
    owners: HashMap<ColliderHandle, ShapeOwner>,
    retired: Vec<ColliderHandle>,
    tick: u64,
}

impl std::fmt::Debug for PhysicsWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsWorld")
            .field("tick", &self.tick)
            .field("actors", &self.bodies.len())
            .field("shapes", &self.colliders.len())
            .finish_non_exhaustive()
    }
}

impl PhysicsWorld {
    /// Create the simulation context. Fails only on an invalid configuration.
    pub fn new(config: WorldConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        let integration_parameters = IntegrationParameters {
            dt: config.fixed_dt,
            ..IntegrationParameters::default()
        };
        tracing::info!(
            gravity = %config.gravity,
            worker_threads = config.worker_threads,
            fixed_dt = config.fixed_dt,
            "physics world initialized"
        );
        Ok(Self {
            config,
            gravity: to_vector(config.gravity),
            integration_parameters,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            collector: TriggerCollector::default(),
            owners: HashMap::new(),
            retired: Vec::new(),
            tick: 0,
        })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of completed steps.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn actor_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn shape_count(&self) -> usize {
        self.colliders.len()
    }

    /// Build an actor at the given pose. It is not simulated until [`add_actor`](Self::add_actor).
    pub fn create_actor(&self, position: Vec3, rotation: Quat, kind: BodyKind) -> RigidActor {
        let builder = match kind {
            BodyKind::Static => RigidBodyBuilder::fixed(),
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Kinematic => RigidBodyBuilder::kinematic_position_based(),
        };
        RigidActor {
            body: builder.position(to_isometry(position, rotation)).build(),
            kind,
        }
    }

    pub fn add_actor(&mut self, actor: RigidActor) -> ActorHandle {
        let handle = ActorHandle(self.bodies.insert(actor.body));
        tracing::debug!(?handle, kind = ?actor.kind, "actor added");
        handle
    }

    /// Remove an actor and every shape attached to it. Returns false if it was not a member.
    pub fn remove_actor(&mut self, handle: ActorHandle) -> bool {
        let Some(body) = self.bodies.get(handle.0) else {
            return false;
        };
        self.retired.extend_from_slice(body.colliders());
        let removed = self.bodies.remove(
            handle.0,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
        tracing::debug!(?handle, "actor removed");
        removed.is_some()
    }

    pub fn contains_actor(&self, handle: ActorHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    pub(crate) fn attach_shape(
        &mut self,
        actor: ActorHandle,
        collider: Collider,
    ) -> Result<ShapeHandle, PhysicsError> {
        if !self.bodies.contains(actor.0) {
            return Err(PhysicsError::UnknownActor(actor));
        }
        let sensor = collider.is_sensor();
        let handle = self
            .colliders
            .insert_with_parent(collider, actor.0, &mut self.bodies);
        self.owners.insert(handle, ShapeOwner { actor, sensor });
        Ok(ShapeHandle(handle))
    }

    /// Detach `old` (if any) and attach `collider` in one step.
    ///
    /// Nothing else touches the world between the two halves, so no reader
    /// ever observes the actor with zero or two shapes.
    pub(crate) fn replace_shape(
        &mut self,
        actor: ActorHandle,
        old: Option<ShapeHandle>,
        collider: Collider,
    ) -> Result<ShapeHandle, PhysicsError> {
        if !self.bodies.contains(actor.0) {
            return Err(PhysicsError::UnknownActor(actor));
        }
        if let Some(old) = old {
            if self
                .colliders
                .remove(old.0, &mut self.islands, &mut self.bodies, true)
                .is_some()
            {
                self.retired.push(old.0);
            }
        }
        self.attach_shape(actor, collider)
    }

    /// True while `shape` is attached to `actor`.
    pub fn is_attached(&self, actor: ActorHandle, shape: ShapeHandle) -> bool {
        self.bodies
            .get(actor.0)
            .is_some_and(|body| body.colliders().contains(&shape.0))
    }

    pub fn shapes_of(&self, actor: ActorHandle) -> Vec<ShapeHandle> {
        self.bodies
            .get(actor.0)
            .map(|body| body.colliders().iter().copied().map(ShapeHandle).collect())
            .unwrap_or_default()
    }

    pub fn shape_geometry(&self, shape: ShapeHandle) -> Option<ShapeGeometry> {
        let collider = self.colliders.get(shape.0)?;
        let shape = collider.shape();
        let geometry = if let Some(cuboid) = shape.as_cuboid() {
            ShapeGeometry::Box {
                half_extents: from_vector(&cuboid.half_extents),
            }
        } else if let Some(ball) = shape.as_ball() {
            ShapeGeometry::Sphere {
                radius: ball.radius,
            }
        } else if let Some(capsule) = shape.as_capsule() {
            ShapeGeometry::Capsule {
                half_height: capsule.half_height(),
                radius: capsule.radius,
            }
        } else if let Some(trimesh) = shape.as_trimesh() {
            ShapeGeometry::TriangleMesh {
                triangles: trimesh.indices().len(),
            }
        } else {
            ShapeGeometry::Other
        };
        Some(geometry)
    }

    pub fn is_sensor(&self, shape: ShapeHandle) -> bool {
        self.colliders.get(shape.0).is_some_and(|c| c.is_sensor())
    }

    pub fn actor_pose(&self, handle: ActorHandle) -> Option<(Vec3, Quat)> {
        self.bodies.get(handle.0).map(|b| from_isometry(b.position()))
    }

    pub fn actor_kind(&self, handle: ActorHandle) -> Option<BodyKind> {
        self.bodies.get(handle.0).map(|b| match b.body_type() {
            RigidBodyType::Fixed => BodyKind::Static,
            RigidBodyType::Dynamic => BodyKind::Dynamic,
            _ => BodyKind::Kinematic,
        })
    }

    /// Teleport an actor. Kinematic actors are moved through their next-step target.
    pub fn set_actor_pose(&mut self, handle: ActorHandle, position: Vec3, rotation: Quat) {
        let Some(body) = self.bodies.get_mut(handle.0) else {
            return;
        };
        let iso = to_isometry(position, rotation);
        if body.is_kinematic() {
            body.set_next_kinematic_position(iso);
        } else {
            body.set_position(iso, true);
            body.set_linvel(Vector::zeros(), true);
            body.set_angvel(Vector::zeros(), true);
        }
    }

    /// Target translation of a kinematic actor for the next step.
    pub fn set_kinematic_target(&mut self, handle: ActorHandle, position: Vec3) {
        if let Some(body) = self.bodies.get_mut(handle.0) {
            body.set_next_kinematic_translation(to_vector(position));
        }
    }

    pub fn actor_linear_velocity(&self, handle: ActorHandle) -> Option<Vec3> {
        self.bodies.get(handle.0).map(|b| from_vector(b.linvel()))
    }

    /// Advance the simulation by one fixed step and return the trigger events it produced.
    pub fn tick(&mut self, dt: f32) -> Vec<TriggerEvent> {
        let _span = tracing::trace_span!("physics_step", tick = self.tick).entered();
        self.integration_parameters.dt = dt;
        let retired = std::mem::take(&mut self.retired);

        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &self.collector,
        );
        self.tick += 1;

        let events: Vec<TriggerEvent> = self
            .collector
            .drain()
            .into_iter()
            .flat_map(|event| self.resolve_trigger(event))
            .collect();

        // Removed shapes stay resolvable until the step that reports their exits.
        for handle in retired {
            self.owners.remove(&handle);
        }
        events
    }

    fn resolve_trigger(&self, event: CollisionEvent) -> Vec<TriggerEvent> {
        let phase = if event.started() {
            TriggerPhase::Enter
        } else {
            TriggerPhase::Exit
        };
        let (Some(a), Some(b)) = (
            self.owners.get(&event.collider1()),
            self.owners.get(&event.collider2()),
        ) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(2);
        if a.sensor {
            out.push(TriggerEvent {
                trigger: a.actor,
                other: b.actor,
                phase,
            });
        }
        if b.sensor {
            out.push(TriggerEvent {
                trigger: b.actor,
                other: a.actor,
                phase,
            });
        }
        out
    }

    /// Closest hit along a ray. Trigger shapes never block.
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: RayFilter,
    ) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        let ray = Ray::new(to_point(origin), to_vector(direction));
        let mut query = QueryFilter::default().exclude_sensors();
        if let Some(actor) = filter.exclude_actor {
            query = query.exclude_rigid_body(actor.0);
        }
        if !filter.include_entities {
            query = query.groups(InteractionGroups::new(
                Group::ALL,
                FilterTag::Untagged.membership(),
            ));
        }

        let (collider, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            true,
            query,
        )?;
        let body = self
            .colliders
            .get(collider)
            .and_then(|c| c.parent())
            .and_then(|parent| self.bodies.get(parent).map(|b| (parent, b)));
        let (actor, dynamic, angular_velocity) = match body {
            Some((handle, b)) => (
                Some(ActorHandle(handle)),
                b.is_dynamic(),
                from_vector(b.angvel()),
            ),
            None => (None, false, Vec3::ZERO),
        };
        Some(RayHit {
            actor,
            distance: hit.time_of_impact,
            point: from_point(&ray.point_at(hit.time_of_impact)),
            normal: from_vector(&hit.normal),
            dynamic,
            angular_velocity,
        })
    }

    /// Tear the world down. Callers remove their actors first; leftovers are reported.
    pub fn shutdown(self) -> WorldStats {
        let stats = WorldStats {
            ticks: self.tick,
            remaining_actors: self.bodies.len(),
        };
        if stats.remaining_actors > 0 {
            tracing::warn!(
                remaining = stats.remaining_actors,
                "physics world released with actors still attached"
            );
        } else {
            tracing::info!(ticks = stats.ticks, "physics world released");
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(WorldConfig::default()).unwrap()
    }

    fn ground(world: &mut PhysicsWorld) -> ActorHandle {
        let actor = world.create_actor(Vec3::new(0.0, -1.0, 0.0), Quat::IDENTITY, BodyKind::Static);
        let handle = world.add_actor(actor);
        world
            .attach_shape(handle, ColliderBuilder::cuboid(50.0, 1.0, 50.0).build())
            .unwrap();
        handle
    }

    #[test]
    fn invalid_config_is_fatal() {
        let config = WorldConfig {
            fixed_dt: -1.0,
            ..WorldConfig::default()
        };
        assert!(PhysicsWorld::new(config).is_err());
    }

    #[test]
    fn create_does_not_add() {
        let world = world();
        let actor = world.create_actor(Vec3::ZERO, Quat::IDENTITY, BodyKind::Dynamic);
        assert_eq!(actor.kind(), BodyKind::Dynamic);
        assert_eq!(world.actor_count(), 0);
    }

    #[test]
    fn add_and_remove_actor() {
        let mut world = world();
        let handle = ground(&mut world);
        assert_eq!(world.actor_count(), 1);
        assert_eq!(world.shape_count(), 1);
        assert!(world.remove_actor(handle));
        assert_eq!(world.actor_count(), 0);
        assert_eq!(world.shape_count(), 0);
        assert!(!world.remove_actor(handle));
    }

    #[test]
    fn tick_advances_exactly_one_step() {
        let mut world = world();
        let actor =
            world.create_actor(Vec3::new(0.0, 10.0, 0.0), Quat::IDENTITY, BodyKind::Dynamic);
        let ball = world.add_actor(actor);
        world.attach_shape(ball, ColliderBuilder::ball(0.5).build()).unwrap();

        world.tick(1.0 / 50.0);
        assert_eq!(world.tick_count(), 1);
        let (p, _) = world.actor_pose(ball).unwrap();
        assert!(p.y < 10.0, "dynamic body should fall under gravity");
    }

    #[test]
    fn attach_to_unknown_actor_fails() {
        let mut world = world();
        let handle = ground(&mut world);
        world.remove_actor(handle);
        let result = world.attach_shape(handle, ColliderBuilder::ball(1.0).build());
        assert!(matches!(result, Err(PhysicsError::UnknownActor(_))));
    }

    #[test]
    fn raycast_hits_ground_after_step() {
        let mut world = world();
        let g = ground(&mut world);
        world.tick(1.0 / 50.0);

        let hit = world
            .raycast(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y, 10.0, RayFilter::default())
            .expect("ray should hit the ground box");
        assert_eq!(hit.actor, Some(g));
        assert!((hit.distance - 5.0).abs() < 1e-3);
        assert!(hit.normal.abs_diff_eq(Vec3::Y, 1e-4));
        assert!(!hit.dynamic);
    }

    #[test]
    fn raycast_skips_entities_and_excluded_actor() {
        let mut world = world();
        ground(&mut world);
        let actor =
            world.create_actor(Vec3::new(0.0, 2.0, 0.0), Quat::IDENTITY, BodyKind::Kinematic);
        let player = world.add_actor(actor);
        world
            .attach_shape(
                player,
                ColliderBuilder::ball(0.5)
                    .collision_groups(FilterTag::Entity.interaction_groups())
                    .build(),
            )
            .unwrap();
        world.tick(1.0 / 50.0);

        let origin = Vec3::new(0.0, 5.0, 0.0);
        let hit = world
            .raycast(origin, Vec3::NEG_Y, 10.0, RayFilter::default())
            .unwrap();
        assert!((hit.distance - 5.0).abs() < 1e-3, "entity shape must be skipped");

        let with_entities = RayFilter {
            include_entities: true,
            ..RayFilter::default()
        };
        let hit = world.raycast(origin, Vec3::NEG_Y, 10.0, with_entities).unwrap();
        assert_eq!(hit.actor, Some(player));

        let excluded = RayFilter {
            include_entities: true,
            exclude_actor: Some(player),
        };
        let hit = world.raycast(origin, Vec3::NEG_Y, 10.0, excluded).unwrap();
        assert_ne!(hit.actor, Some(player));
    }

    #[test]
    fn replace_shape_detaches_old() {
        let mut world = world();
        let handle = ground(&mut world);
        let old = world.shapes_of(handle)[0];
        let new = world
            .replace_shape(handle, Some(old), ColliderBuilder::cuboid(1.0, 1.0, 1.0).build())
            .unwrap();
        assert!(!world.is_attached(handle, old));
        assert!(world.is_attached(handle, new));
        assert_eq!(world.shapes_of(handle).len(), 1);
        assert_eq!(
            world.shape_geometry(new),
            Some(ShapeGeometry::Box {
                half_extents: Vec3::ONE
            })
        );
    }

    #[test]
    fn shutdown_reports_leftovers() {
        let mut world = world();
        ground(&mut world);
        world.tick(1.0 / 50.0);
        let stats = world.shutdown();
        assert_eq!(stats.ticks, 1);
        assert_eq!(stats.remaining_actors, 1);
    }
}
