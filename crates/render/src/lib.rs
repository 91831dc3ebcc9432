//! Render side: presents published physics frames and drives player
//! animation.
//!
//! # Invariants
//! - Renderers read frames; they never touch the physics scene.
//! - Transforms shown are interpolated between the last two ticks.
//! - Animation advances by wall-clock frame time, not by ticks.

mod animator;
mod renderer;

pub use animator::{AnimationClip, AnimationPose, Animator, AnimatorConfig, ClipState};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};
