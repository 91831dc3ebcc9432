use std::collections::BTreeSet;

use glam::Mat4;
use wayfarer_common::{ObjectId, with_translation};
use wayfarer_input::TickInput;
use wayfarer_physics::{ColliderDesc, FacingSink, PhysicsComponent, PhysicsWorld, TriggerPhase};

use crate::interpolation::PhysicsTransformState;
use crate::player::PlayerCharacter;

/// A trigger overlap as seen by the trigger's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerContact {
    /// The object that entered or left; `None` when its actor has no owner.
    pub other: Option<ObjectId>,
    pub phase: TriggerPhase,
}

/// Tracks which objects are inside a trigger shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerVolume {
    occupants: BTreeSet<ObjectId>,
    entries: u64,
}

impl TriggerVolume {
    pub fn occupants(&self) -> &BTreeSet<ObjectId> {
        &self.occupants
    }

    pub fn is_occupied(&self) -> bool {
        !self.occupants.is_empty()
    }

    /// Total enter events seen.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    fn on_trigger(&mut self, contact: &TriggerContact) {
        let Some(other) = contact.other else {
            return;
        };
        match contact.phase {
            TriggerPhase::Enter => {
                if self.occupants.insert(other) {
                    self.entries += 1;
                }
            }
            TriggerPhase::Exit => {
                self.occupants.remove(&other);
            }
        }
    }
}

/// Per-object behaviour. Only the player reacts to input and owns a facing.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ObjectKind {
    #[default]
    Prop,
    Player(PlayerCharacter),
    TriggerVolume(TriggerVolume),
}

impl ObjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prop => "prop",
            Self::Player(_) => "player",
            Self::TriggerVolume(_) => "trigger_volume",
        }
    }

    /// Capability query for the controller's landing hand-off.
    pub fn facing_sink(&mut self) -> Option<&mut dyn FacingSink> {
        match self {
            Self::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_player(&self) -> Option<&PlayerCharacter> {
        match self {
            Self::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_trigger_volume(&self) -> Option<&TriggerVolume> {
        match self {
            Self::TriggerVolume(t) => Some(t),
            _ => None,
        }
    }
}

/// A scene object: identity, world transform, optional physics.
#[derive(Debug)]
pub struct GameObject {
    id: ObjectId,
    name: String,
    transform: Mat4,
    physics_state: PhysicsTransformState,
    physics: Option<PhysicsComponent>,
    /// The request the collider was built from, kept for saving.
    collider: Option<ColliderDesc>,
    kind: ObjectKind,
}

impl GameObject {
    pub fn new(id: ObjectId, name: impl Into<String>, transform: Mat4, kind: ObjectKind) -> Self {
        Self {
            id,
            name: name.into(),
            transform,
            physics_state: PhysicsTransformState::new(transform),
            physics: None,
            collider: None,
            kind,
        }
    }

    pub fn with_physics(
        mut self,
        physics: PhysicsComponent,
        collider: Option<ColliderDesc>,
    ) -> Self {
        self.physics = Some(physics);
        self.collider = collider;
        self
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn physics_state(&self) -> &PhysicsTransformState {
        &self.physics_state
    }

    pub fn physics(&self) -> Option<&PhysicsComponent> {
        self.physics.as_ref()
    }

    pub fn collider_desc(&self) -> Option<&ColliderDesc> {
        self.collider.as_ref()
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Move the object and its actor. The interpolation buffer snaps so the
    /// render side does not blend across the move.
    pub fn set_transform(&mut self, world: &mut PhysicsWorld, transform: Mat4) {
        self.transform = transform;
        if let Some(physics) = &mut self.physics {
            physics.propagate_new_transform(world, &transform);
        }
        self.physics_state.snap(transform);
    }

    /// Once per tick, before the world steps.
    pub fn physics_update(&mut self, input: &TickInput, world: &mut PhysicsWorld, dt: f32) {
        let Some(controller) = self.physics.as_mut().and_then(|p| p.as_controller_mut()) else {
            return;
        };
        if let ObjectKind::Player(player) = &mut self.kind {
            player.apply_input(input, controller, world, dt);
        }
        let center = controller.physics_update(world, dt, self.kind.facing_sink());
        self.transform = with_translation(&self.transform, center);
    }

    /// Once per tick, after the world steps: pull solver poses back into the
    /// transform and publish it to the interpolation buffer.
    pub fn sync_from_physics(&mut self, world: &PhysicsWorld) {
        if let Some(physics) = &self.physics {
            if physics.is_simulated(world) {
                if let Some((position, rotation)) = physics.global_pose(world) {
                    let (scale, _, _) = self.transform.to_scale_rotation_translation();
                    self.transform =
                        Mat4::from_scale_rotation_translation(scale, rotation, position);
                }
            }
        }
        self.physics_state.update(self.transform);
    }

    pub fn on_trigger(&mut self, contact: &TriggerContact) {
        match &mut self.kind {
            ObjectKind::TriggerVolume(volume) => {
                volume.on_trigger(contact);
                tracing::debug!(
                    volume = %self.name,
                    other = ?contact.other,
                    phase = ?contact.phase,
                    occupants = volume.occupants.len(),
                    "trigger contact"
                );
            }
            _ => tracing::trace!(
                object = %self.name,
                phase = ?contact.phase,
                "trigger contact ignored"
            ),
        }
    }

    /// Take the physics component out so its actor can be released.
    pub fn take_physics(&mut self) -> Option<PhysicsComponent> {
        self.physics.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use wayfarer_physics::{
        BodyKind, CharacterController, ColliderShape, ControllerConfig, WorldConfig,
    };

    use crate::player::LocomotionConfig;

    #[test]
    fn dynamic_object_follows_solver() {
        let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
        let transform = Mat4::from_scale_rotation_translation(
            Vec3::splat(2.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 50.0, 0.0),
        );
        let desc = ColliderDesc::new(ColliderShape::Box { extents: Vec3::ONE })
            .with_body(BodyKind::Dynamic);
        let physics = PhysicsComponent::from_desc(&mut world, &transform, &desc);
        let mut obj = GameObject::new(ObjectId::new(), "crate", transform, ObjectKind::Prop)
            .with_physics(physics, Some(desc));

        for _ in 0..10 {
            obj.physics_update(&TickInput::idle(), &mut world, 0.02);
            world.tick(0.02);
            obj.sync_from_physics(&world);
        }
        let t = obj.transform();
        assert!(t.w_axis.y < 50.0);
        let (scale, _, _) = t.to_scale_rotation_translation();
        assert!(scale.abs_diff_eq(Vec3::splat(2.0), 1e-4));
        assert_eq!(obj.physics_state().current(), t);
    }

    #[test]
    fn player_update_moves_transform() {
        let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
        let transform = Mat4::from_translation(Vec3::new(0.0, 20.0, 0.0));
        let controller =
            CharacterController::new(&mut world, ControllerConfig::default(), &transform);
        let mut obj = GameObject::new(
            ObjectId::new(),
            "player",
            transform,
            ObjectKind::Player(PlayerCharacter::new(LocomotionConfig::default())),
        )
        .with_physics(PhysicsComponent::CapsuleController(Box::new(controller)), None);

        obj.physics_update(&TickInput::idle(), &mut world, 0.02);
        assert!(obj.transform().w_axis.y < 20.0);
        assert!(obj.kind.facing_sink().is_some());
    }

    #[test]
    fn trigger_volume_tracks_occupants() {
        let mut obj = GameObject::new(
            ObjectId::new(),
            "zone",
            Mat4::IDENTITY,
            ObjectKind::TriggerVolume(TriggerVolume::default()),
        );
        let visitor = ObjectId::new();
        obj.on_trigger(&TriggerContact {
            other: Some(visitor),
            phase: TriggerPhase::Enter,
        });
        let volume = obj.kind().as_trigger_volume().unwrap();
        assert!(volume.occupants().contains(&visitor));
        assert_eq!(volume.entries(), 1);

        obj.on_trigger(&TriggerContact {
            other: Some(visitor),
            phase: TriggerPhase::Exit,
        });
        assert!(!obj.kind().as_trigger_volume().unwrap().is_occupied());
    }

    #[test]
    fn set_transform_snaps_interpolation() {
        let mut world = PhysicsWorld::new(WorldConfig::default()).unwrap();
        let mut obj = GameObject::new(ObjectId::new(), "p", Mat4::IDENTITY, ObjectKind::Prop);
        obj.sync_from_physics(&world);
        let moved = Mat4::from_translation(Vec3::X * 10.0);
        obj.set_transform(&mut world, moved);
        assert_eq!(obj.physics_state().previous(), moved);
        assert_eq!(obj.physics_state().interpolated(0.5), moved);
    }
}
