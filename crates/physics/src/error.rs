use crate::world::ActorHandle;

/// Errors from the physics world adapter.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("invalid world configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown actor {0:?}")]
    UnknownActor(ActorHandle),

    #[error("mesh cooking failed: {0}")]
    Cook(#[from] CookError),
}

/// Reasons a triangle mesh cannot be cooked into a collision mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CookError {
    #[error("mesh has no vertices")]
    Empty,

    #[error("sub-mesh {submesh} has {count} indices, not a multiple of three")]
    NotTriangles { submesh: usize, count: usize },

    #[error("sub-mesh {submesh} references vertex {index} but has {vertex_count}")]
    IndexOutOfRange {
        submesh: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("sub-mesh {submesh} has a non-finite vertex at {vertex}")]
    NonFiniteVertex { submesh: usize, vertex: usize },

    #[error("mesh has no non-degenerate triangles")]
    Degenerate,
}
