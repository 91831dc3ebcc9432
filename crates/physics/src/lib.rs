//! Physics World Adapter: rapier-backed world, collider components, and the
//! kinematic capsule character controller.
//!
//! # Invariants
//! - The world is mutated by one thread only; other threads queue requests.
//! - One `tick` is exactly one fixed step: no sub-stepping, no catch-up.
//! - A collider owns exactly one actor and at most one shape; scale changes
//!   replace the shape, never mutate it.
//! - Every actor is removed before the world is shut down.

mod collider;
mod component;
mod config;
pub mod controller;
mod convert;
mod error;
mod mesh;
mod world;

pub use collider::{
    BoxCollider, ColliderBody, ColliderDesc, ColliderShape, SphereCollider, TriangleMeshCollider,
};
pub use component::PhysicsComponent;
pub use config::WorldConfig;
pub use controller::{
    CharacterController, CharacterControllerState, ControllerConfig, FacingSink, MotionState,
};
pub use error::{CookError, PhysicsError};
pub use mesh::{CookedMesh, MeshSource, SubMesh};
pub use world::{
    ActorHandle, BodyKind, FilterTag, PhysicsWorld, RayFilter, RayHit, RigidActor, ShapeGeometry,
    ShapeHandle, TriggerEvent, TriggerPhase, WorldStats,
};
