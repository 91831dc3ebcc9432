use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use glam::Mat4;
use wayfarer_common::{ObjectId, Transform};
use wayfarer_input::TickInput;
use wayfarer_physics::{
    ActorHandle, CharacterController, ControllerConfig, PhysicsComponent, PhysicsError,
    PhysicsWorld, TriggerPhase, WorldConfig, WorldStats,
};

use crate::frame::{ObjectFrame, PhysicsFrame, PlayerTelemetry};
use crate::level::{LevelError, LevelFile, ObjectKindRecord, ObjectRecord};
use crate::object::{GameObject, ObjectKind, TriggerContact, TriggerVolume};
use crate::player::{LocomotionConfig, PlayerCharacter};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
    #[error("object {0} already exists")]
    DuplicateObject(ObjectId),
    #[error("scene already has a player")]
    DuplicatePlayer,
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Physics(#[from] PhysicsError),
}

/// A record produced by every mutation of the scene.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    Spawned { id: ObjectId, name: String },
    Despawned { id: ObjectId },
    Teleported { id: ObjectId, transform: Transform },
    TriggerEntered { volume: ObjectId, other: Option<ObjectId> },
    TriggerExited { volume: ObjectId, other: Option<ObjectId> },
}

/// A change requested from outside the physics thread, applied at a tick
/// boundary.
#[derive(Debug, Clone)]
pub enum SceneCommand {
    Spawn(ObjectRecord),
    Despawn(ObjectId),
    Teleport { id: ObjectId, transform: Transform },
    LoadLevel(LevelFile),
}

/// Result of one [`Scene::physics_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: u64,
    pub trigger_events: usize,
}

/// The physics-side scene: objects plus the world their actors live in.
///
/// Owned by the physics thread. Objects are kept in a BTreeMap so updates run
/// in a stable order.
#[derive(Debug)]
pub struct Scene {
    world: PhysicsWorld,
    controller: ControllerConfig,
    locomotion: LocomotionConfig,
    objects: BTreeMap<ObjectId, GameObject>,
    owners: HashMap<ActorHandle, ObjectId>,
    /// Actors of despawned objects, still resolvable for one more tick.
    retired: Vec<ActorHandle>,
    player: Option<ObjectId>,
    events: Vec<SceneEvent>,
}

impl Scene {
    pub fn new(
        world: WorldConfig,
        controller: ControllerConfig,
        locomotion: LocomotionConfig,
    ) -> Result<Self, SceneError> {
        Ok(Self {
            world: PhysicsWorld::new(world)?,
            controller,
            locomotion,
            objects: BTreeMap::new(),
            owners: HashMap::new(),
            retired: Vec::new(),
            player: None,
            events: Vec::new(),
        })
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn tick(&self) -> u64 {
        self.world.tick_count()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn find(&self, name: &str) -> Option<&GameObject> {
        self.objects.values().find(|o| o.name() == name)
    }

    pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    pub fn player_id(&self) -> Option<ObjectId> {
        self.player
    }

    pub fn player(&self) -> Option<&GameObject> {
        self.player.and_then(|id| self.objects.get(&id))
    }

    pub fn events(&self) -> &[SceneEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Create an object and its physics from a record.
    pub fn spawn(&mut self, record: &ObjectRecord) -> Result<ObjectId, SceneError> {
        let id = record.guid.unwrap_or_default();
        if self.objects.contains_key(&id) {
            return Err(SceneError::DuplicateObject(id));
        }
        let transform = record.transform.to_mat4();

        let object = match record.kind {
            ObjectKindRecord::Player => {
                if self.player.is_some() {
                    return Err(SceneError::DuplicatePlayer);
                }
                let controller =
                    CharacterController::new(&mut self.world, self.controller, &transform);
                self.player = Some(id);
                GameObject::new(
                    id,
                    &record.name,
                    transform,
                    ObjectKind::Player(PlayerCharacter::new(self.locomotion)),
                )
                .with_physics(PhysicsComponent::CapsuleController(Box::new(controller)), None)
            }
            kind => {
                let behaviour = match kind {
                    ObjectKindRecord::TriggerVolume => {
                        ObjectKind::TriggerVolume(TriggerVolume::default())
                    }
                    _ => ObjectKind::Prop,
                };
                let object = GameObject::new(id, &record.name, transform, behaviour);
                match &record.collider {
                    Some(desc) => {
                        let physics =
                            PhysicsComponent::from_desc(&mut self.world, &transform, desc);
                        object.with_physics(physics, Some(desc.clone()))
                    }
                    None => object,
                }
            }
        };

        if let Some(actor) = object.physics().and_then(|p| p.actor()) {
            self.owners.insert(actor, id);
        }
        tracing::debug!(%id, name = %record.name, kind = object.kind().name(), "object spawned");
        self.events.push(SceneEvent::Spawned {
            id,
            name: record.name.clone(),
        });
        self.objects.insert(id, object);
        Ok(id)
    }

    /// Remove an object and release its actor.
    pub fn despawn(&mut self, id: ObjectId) -> Result<(), SceneError> {
        let mut object = self.objects.remove(&id).ok_or(SceneError::UnknownObject(id))?;
        if let Some(physics) = object.take_physics() {
            if let Some(actor) = physics.actor() {
                self.retired.push(actor);
            }
            physics.release(&mut self.world);
        }
        if self.player == Some(id) {
            self.player = None;
        }
        tracing::debug!(%id, name = %object.name(), "object despawned");
        self.events.push(SceneEvent::Despawned { id });
        Ok(())
    }

    /// Move an object; its physics is re-derived from the new transform.
    pub fn teleport(&mut self, id: ObjectId, transform: Transform) -> Result<(), SceneError> {
        let object = self.objects.get_mut(&id).ok_or(SceneError::UnknownObject(id))?;
        object.set_transform(&mut self.world, transform.to_mat4());
        self.events.push(SceneEvent::Teleported { id, transform });
        Ok(())
    }

    pub fn apply(&mut self, command: SceneCommand) -> Result<(), SceneError> {
        match command {
            SceneCommand::Spawn(record) => self.spawn(&record).map(|_| ()),
            SceneCommand::Despawn(id) => self.despawn(id),
            SceneCommand::Teleport { id, transform } => self.teleport(id, transform),
            SceneCommand::LoadLevel(level) => self.spawn_level(&level).map(|_| ()),
        }
    }

    /// Spawn every object of a level.
    pub fn spawn_level(&mut self, level: &LevelFile) -> Result<Vec<ObjectId>, SceneError> {
        level.validate()?;
        let ids = level
            .objects
            .iter()
            .map(|record| self.spawn(record))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(level = %level.name, objects = ids.len(), "level spawned");
        Ok(ids)
    }

    /// Save current transforms back into a level.
    pub fn to_level(&self, name: impl Into<String>) -> LevelFile {
        let objects = self
            .objects
            .values()
            .map(|o| ObjectRecord {
                guid: Some(o.id()),
                name: o.name().to_string(),
                transform: Transform::from_mat4(&o.transform()),
                kind: match o.kind() {
                    ObjectKind::Prop => ObjectKindRecord::Prop,
                    ObjectKind::Player(_) => ObjectKindRecord::Player,
                    ObjectKind::TriggerVolume(_) => ObjectKindRecord::TriggerVolume,
                },
                collider: o.collider_desc().cloned(),
            })
            .collect();
        LevelFile {
            name: name.into(),
            objects,
        }
    }

    /// Run one fixed tick: object updates, the world step, trigger routing,
    /// then publication into every object's interpolation buffer.
    pub fn physics_tick(&mut self, input: &TickInput, dt: f32) -> TickSummary {
        let _span = tracing::info_span!("physics_tick", tick = self.world.tick_count()).entered();

        for object in self.objects.values_mut() {
            object.physics_update(input, &mut self.world, dt);
        }

        let triggers = self.world.tick(dt);
        for event in &triggers {
            self.route_trigger(event.trigger, event.other, event.phase);
        }
        for actor in self.retired.drain(..) {
            self.owners.remove(&actor);
        }

        for object in self.objects.values_mut() {
            object.sync_from_physics(&self.world);
        }

        TickSummary {
            tick: self.world.tick_count(),
            trigger_events: triggers.len(),
        }
    }

    fn route_trigger(&mut self, trigger: ActorHandle, other: ActorHandle, phase: TriggerPhase) {
        let Some(&volume) = self.owners.get(&trigger) else {
            return;
        };
        let other = self.owners.get(&other).copied();
        let Some(object) = self.objects.get_mut(&volume) else {
            return;
        };
        object.on_trigger(&TriggerContact { other, phase });
        self.events.push(match phase {
            TriggerPhase::Enter => SceneEvent::TriggerEntered { volume, other },
            TriggerPhase::Exit => SceneEvent::TriggerExited { volume, other },
        });
    }

    /// Build the frame the render side reads.
    pub fn snapshot(&self) -> PhysicsFrame {
        let objects = self
            .objects
            .values()
            .map(|o| ObjectFrame {
                id: o.id(),
                name: o.name().to_string(),
                kind: o.kind().name(),
                state: *o.physics_state(),
            })
            .collect();
        PhysicsFrame {
            tick: self.world.tick_count(),
            published_at: Instant::now(),
            objects,
            player: self.player_telemetry(),
        }
    }

    fn player_telemetry(&self) -> Option<PlayerTelemetry> {
        let object = self.player()?;
        let player = object.kind().as_player()?;
        let controller = object.physics()?.as_controller()?;
        let state = controller.state();
        Some(PlayerTelemetry {
            id: object.id(),
            motion: state.motion_state(),
            grounded: state.grounded,
            sliding: state.sliding,
            velocity: state.velocity,
            foot: controller.foot_position(),
            facing: player.facing(),
            run_speed: player.run_speed(),
            jumps: player.jumps(),
        })
    }

    /// Transform of an object as of the last tick.
    pub fn transform_of(&self, id: ObjectId) -> Option<Mat4> {
        self.objects.get(&id).map(|o| o.transform())
    }

    /// Remove every actor, then shut the world down.
    pub fn release(mut self) -> WorldStats {
        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        for id in ids {
            if let Some(mut object) = self.objects.remove(&id) {
                if let Some(physics) = object.take_physics() {
                    physics.release(&mut self.world);
                }
            }
        }
        self.owners.clear();
        let stats = self.world.shutdown();
        tracing::info!(ticks = stats.ticks, "scene released");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use wayfarer_input::Action;
    use wayfarer_physics::{ColliderDesc, ColliderShape};

    const DT: f32 = 1.0 / 50.0;

    fn scene() -> Scene {
        Scene::new(
            WorldConfig::default(),
            ControllerConfig::default(),
            LocomotionConfig::default(),
        )
        .unwrap()
    }

    fn floor() -> ObjectRecord {
        ObjectRecord::new("floor", Transform::from_position(Vec3::new(0.0, -1.0, 0.0)))
            .with_collider(ColliderDesc::new(ColliderShape::Box {
                extents: Vec3::new(100.0, 1.0, 100.0),
            }))
    }

    fn player_at(y: f32) -> ObjectRecord {
        ObjectRecord::new("player", Transform::from_position(Vec3::new(0.0, y, 0.0)))
            .with_kind(ObjectKindRecord::Player)
    }

    fn run(scene: &mut Scene, input: &TickInput, ticks: usize) {
        for _ in 0..ticks {
            scene.physics_tick(input, DT);
        }
    }

    #[test]
    fn spawn_and_despawn_log_events() {
        let mut scene = scene();
        let id = scene.spawn(&floor()).unwrap();
        assert_eq!(scene.world().actor_count(), 1);
        scene.despawn(id).unwrap();
        assert_eq!(scene.world().actor_count(), 0);
        let events = scene.drain_events();
        assert!(matches!(events[0], SceneEvent::Spawned { .. }));
        assert_eq!(events[1], SceneEvent::Despawned { id });
        assert!(matches!(scene.despawn(id), Err(SceneError::UnknownObject(_))));
    }

    #[test]
    fn second_player_is_rejected() {
        let mut scene = scene();
        scene.spawn(&player_at(5.0)).unwrap();
        assert!(matches!(scene.spawn(&player_at(8.0)), Err(SceneError::DuplicatePlayer)));
    }

    #[test]
    fn duplicate_guid_is_rejected() {
        let mut scene = scene();
        let mut record = floor();
        record.guid = Some(ObjectId::new());
        scene.spawn(&record).unwrap();
        assert!(matches!(scene.spawn(&record), Err(SceneError::DuplicateObject(_))));
    }

    #[test]
    fn player_lands_and_walks() {
        let mut scene = scene();
        scene.spawn(&floor()).unwrap();
        let player = scene.spawn(&player_at(6.0)).unwrap();
        run(&mut scene, &TickInput::idle(), 100);

        let frame = scene.snapshot();
        let telemetry = frame.player.unwrap();
        assert_eq!(telemetry.id, player);
        assert!(telemetry.grounded);

        run(&mut scene, &TickInput::with_movement(Vec2::new(1.0, 0.0)), 50);
        let x = scene.transform_of(player).unwrap().w_axis.x;
        assert!(x > 5.0, "player only reached x = {x}");
    }

    #[test]
    fn published_previous_equals_prior_current() {
        let mut scene = scene();
        let player = scene.spawn(&player_at(30.0)).unwrap();
        let mut last = scene.get(player).unwrap().physics_state().current();
        for _ in 0..20 {
            scene.physics_tick(&TickInput::idle(), DT);
            let state = *scene.get(player).unwrap().physics_state();
            assert_eq!(state.previous(), last);
            last = state.current();
        }
    }

    #[test]
    fn trigger_volume_sees_player_enter_and_leave() {
        let mut scene = scene();
        scene.spawn(&floor()).unwrap();
        let sensor = ColliderDesc::new(ColliderShape::Box {
            extents: Vec3::splat(3.0),
        })
        .as_trigger();
        let zone = scene
            .spawn(
                &ObjectRecord::new("zone", Transform::from_position(Vec3::new(0.0, 4.0, 0.0)))
                    .with_kind(ObjectKindRecord::TriggerVolume)
                    .with_collider(sensor),
            )
            .unwrap();
        let player = scene.spawn(&player_at(4.0)).unwrap();
        run(&mut scene, &TickInput::idle(), 20);

        let volume = scene.get(zone).unwrap().kind().as_trigger_volume().unwrap();
        assert!(volume.occupants().contains(&player));

        scene.despawn(player).unwrap();
        run(&mut scene, &TickInput::idle(), 2);
        let volume = scene.get(zone).unwrap().kind().as_trigger_volume().unwrap();
        assert!(!volume.is_occupied());
        assert!(scene.events().iter().any(|e| matches!(
            e,
            SceneEvent::TriggerExited { other: Some(o), .. } if *o == player
        )));
    }

    #[test]
    fn reset_action_reaches_controller() {
        let mut scene = scene();
        scene.spawn(&floor()).unwrap();
        let player = scene.spawn(&player_at(40.0)).unwrap();
        scene.physics_tick(&TickInput::idle().with_action(Action::ResetPosition), DT);
        let y = scene.transform_of(player).unwrap().w_axis.y;
        // Reset point foot (0, 4, 0) plus the capsule foot offset, minus one tick of fall.
        assert!(y < 10.0 && y > 5.0, "centre at y = {y}");
    }

    #[test]
    fn level_round_trip_keeps_objects() {
        let mut scene = scene();
        let ids = scene.spawn_level(&LevelFile::demo()).unwrap();
        assert_eq!(ids.len(), LevelFile::demo().objects.len());
        run(&mut scene, &TickInput::idle(), 10);

        let saved = scene.to_level("after");
        saved.validate().unwrap();
        assert_eq!(saved.objects.len(), ids.len());
        assert!(saved.player().is_some());

        let mut reloaded = self::scene();
        reloaded.spawn_level(&saved).unwrap();
        assert_eq!(reloaded.object_count(), scene.object_count());
    }

    #[test]
    fn commands_apply_at_call() {
        let mut scene = scene();
        let id = ObjectId::new();
        let mut record = floor();
        record.guid = Some(id);
        scene.apply(SceneCommand::Spawn(record)).unwrap();
        scene
            .apply(SceneCommand::Teleport {
                id,
                transform: Transform::from_position(Vec3::new(0.0, -5.0, 0.0)),
            })
            .unwrap();
        assert_eq!(scene.transform_of(id).unwrap().w_axis.y, -5.0);
        scene.apply(SceneCommand::Despawn(id)).unwrap();
        assert_eq!(scene.object_count(), 0);
    }

    #[test]
    fn release_removes_every_actor() {
        let mut scene = scene();
        scene.spawn_level(&LevelFile::demo()).unwrap();
        run(&mut scene, &TickInput::idle(), 3);
        let stats = scene.release();
        assert_eq!(stats.remaining_actors, 0);
        assert_eq!(stats.ticks, 3);
    }
}
