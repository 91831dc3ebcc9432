//! Developer tooling: read-only inspection of published frames, live scenes
//! and level files.
//!
//! # Invariants
//! - Tools never mutate what they inspect.

mod inspector;
mod level_check;

pub use inspector::{FrameInspector, FrameSummary, ObjectInfo, SceneSummary};
pub use level_check::{LevelReport, MeshReport, check_level};
