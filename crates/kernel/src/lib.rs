//! Scene kernel: game objects, the physics-side scene, transform
//! interpolation, player locomotion and level files.
//!
//! # Invariants
//! - Every object's interpolation buffer is updated exactly once per tick,
//!   after the world step.
//! - External changes (spawn, despawn, teleport) are applied between ticks.
//! - `Scene::release` removes every actor before the world is shut down.

pub mod frame;
pub mod interpolation;
pub mod level;
pub mod object;
pub mod player;
pub mod scene;

pub use frame::{ObjectFrame, PhysicsFrame, PlayerTelemetry};
pub use interpolation::{PhysicsTransformState, interpolation_alpha};
pub use level::{LevelError, LevelFile, ObjectKindRecord, ObjectRecord};
pub use object::{GameObject, ObjectKind, TriggerContact, TriggerVolume};
pub use player::{LocomotionConfig, PlayerCharacter};
pub use scene::{Scene, SceneCommand, SceneError, SceneEvent, TickSummary};
pub use wayfarer_physics::MotionState;
