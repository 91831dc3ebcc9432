use glam::{Mat4, Quat, Vec3};

use crate::collider::{
    BoxCollider, ColliderDesc, ColliderShape, SphereCollider, TriangleMeshCollider, global_pose_of,
    release,
};
use crate::controller::CharacterController;
use crate::world::{ActorHandle, BodyKind, PhysicsWorld};

/// The physics capability of a game object. Owns exactly one actor
/// (none for a degraded triangle mesh).
#[derive(Debug)]
pub enum PhysicsComponent {
    Box(BoxCollider),
    Sphere(SphereCollider),
    TriangleMesh(TriangleMeshCollider),
    CapsuleController(Box<CharacterController>),
}

impl PhysicsComponent {
    /// Build a collider component from a construction request.
    pub fn from_desc(world: &mut PhysicsWorld, transform: &Mat4, desc: &ColliderDesc) -> Self {
        match &desc.shape {
            ColliderShape::Box { extents } => Self::Box(BoxCollider::new(
                world,
                transform,
                *extents,
                desc.body,
                desc.trigger,
                desc.tag,
            )),
            ColliderShape::Sphere { radius } => Self::Sphere(SphereCollider::new(
                world,
                transform,
                *radius,
                desc.body,
                desc.trigger,
                desc.tag,
            )),
            ColliderShape::TriangleMesh { mesh } => Self::TriangleMesh(TriangleMeshCollider::new(
                world,
                transform,
                mesh,
                desc.body,
                desc.trigger,
                desc.tag,
            )),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Box(_) => "box",
            Self::Sphere(_) => "sphere",
            Self::TriangleMesh(_) => "triangle_mesh",
            Self::CapsuleController(_) => "capsule_controller",
        }
    }

    pub fn actor(&self) -> Option<ActorHandle> {
        match self {
            Self::Box(c) => Some(c.body().actor()),
            Self::Sphere(c) => Some(c.body().actor()),
            Self::TriangleMesh(c) => c.body().map(|b| b.actor()),
            Self::CapsuleController(c) => Some(c.actor()),
        }
    }

    /// True when the solver, not the owner, drives this actor's pose.
    pub fn is_simulated(&self, world: &PhysicsWorld) -> bool {
        match self {
            Self::CapsuleController(_) => false,
            _ => self
                .actor()
                .and_then(|a| world.actor_kind(a))
                .is_some_and(|k| k == BodyKind::Dynamic),
        }
    }

    /// Re-derive geometry and pose from a new owner transform.
    pub fn propagate_new_transform(&mut self, world: &mut PhysicsWorld, transform: &Mat4) {
        match self {
            Self::Box(c) => c.propagate_new_transform(world, transform),
            Self::Sphere(c) => c.propagate_new_transform(world, transform),
            Self::TriangleMesh(c) => c.propagate_new_transform(world, transform),
            Self::CapsuleController(c) => c.propagate_new_transform(world, transform),
        }
    }

    pub fn global_pose(&self, world: &PhysicsWorld) -> Option<(Vec3, Quat)> {
        match self {
            Self::Box(c) => global_pose_of(c, world),
            Self::Sphere(c) => global_pose_of(c, world),
            Self::TriangleMesh(c) => global_pose_of(c, world),
            Self::CapsuleController(c) => Some((c.position(), Quat::IDENTITY)),
        }
    }

    pub fn as_controller(&self) -> Option<&CharacterController> {
        match self {
            Self::CapsuleController(c) => Some(&**c),
            _ => None,
        }
    }

    pub fn as_controller_mut(&mut self) -> Option<&mut CharacterController> {
        match self {
            Self::CapsuleController(c) => Some(&mut **c),
            _ => None,
        }
    }

    /// Remove the actor and its shape from the world.
    pub fn release(self, world: &mut PhysicsWorld) {
        match self {
            Self::Box(c) => release(c, world),
            Self::Sphere(c) => release(c, world),
            Self::TriangleMesh(c) => release(c, world),
            Self::CapsuleController(c) => (*c).release(world),
        }
    }
}
