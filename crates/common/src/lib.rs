//! Shared types: object identity, decomposed transforms, small math helpers.
//!
//! # Invariants
//! - `ObjectId` is stable for the lifetime of an object and survives level save/load.
//! - `Transform::to_mat4` and `Transform::from_mat4` agree for non-degenerate, unsheared matrices.

mod math;
mod types;

pub use math::{
    move_towards, move_towards_angle, move_towards_vec2, rotate_vec2, scale_of, translation_of,
    with_translation,
};
pub use types::{ObjectId, Transform};
