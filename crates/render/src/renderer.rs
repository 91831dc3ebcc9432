use std::fmt::Write;

use glam::Vec3;
use wayfarer_common::translation_of;
use wayfarer_kernel::PhysicsFrame;

use crate::animator::AnimationPose;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Field of view in degrees.
    pub fov_degrees: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 10.0, 10.0),
            target: Vec3::ZERO,
            fov_degrees: 60.0,
        }
    }
}

impl RenderView {
    /// Third-person view behind and above `target`.
    pub fn follow(target: Vec3, distance: f32) -> Self {
        Self {
            eye: target + Vec3::new(0.0, distance * 0.5, distance),
            target,
            ..Self::default()
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads a published frame and never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame, blending each object `alpha` of the way from its
    /// previous to its current tick transform.
    fn render(
        &mut self,
        frame: &PhysicsFrame,
        alpha: f32,
        animation: Option<&AnimationPose>,
        view: &RenderView,
    ) -> Self::Output;
}

/// Produces a human-readable dump of a frame. Used for headless runs and
/// tests of the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(
        &mut self,
        frame: &PhysicsFrame,
        alpha: f32,
        animation: Option<&AnimationPose>,
        view: &RenderView,
    ) -> String {
        self.frames += 1;
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "=== Frame {} (tick={}, alpha={:.2}) ===",
            self.frames, frame.tick, alpha
        );
        let _ = writeln!(out, "Objects: {}", frame.objects.len());
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.target.x,
            view.target.y,
            view.target.z,
            view.fov_degrees
        );

        for object in &frame.objects {
            let p = translation_of(&object.interpolated(alpha));
            let _ = writeln!(
                out,
                "  [{}] {:<16} {:<15} pos=({:.2}, {:.2}, {:.2})",
                object.id.short(),
                object.name,
                object.kind,
                p.x,
                p.y,
                p.z
            );
        }

        if let Some(player) = &frame.player {
            let _ = writeln!(
                out,
                "Player: {:?} speed={:.2} facing=({:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2})",
                player.motion,
                player.run_speed,
                player.facing.x,
                player.facing.y,
                player.velocity.x,
                player.velocity.y,
                player.velocity.z
            );
        }
        if let Some(pose) = animation {
            let _ = write!(out, "Animation: {:?} t={:.2}", pose.current.clip, pose.current.time);
            if let Some(previous) = &pose.previous {
                let _ = write!(out, " (from {:?}, blend={:.2})", previous.clip, pose.blend);
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;
    use wayfarer_common::ObjectId;
    use wayfarer_kernel::{ObjectFrame, PhysicsTransformState};

    use crate::animator::{AnimationClip, ClipState};

    fn frame_with_mover() -> PhysicsFrame {
        let mut state = PhysicsTransformState::new(Mat4::from_translation(Vec3::ZERO));
        state.update(Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)));
        let mut frame = PhysicsFrame::empty();
        frame.tick = 7;
        frame.objects.push(ObjectFrame {
            id: ObjectId::new(),
            name: "mover".into(),
            kind: "prop",
            state,
        });
        frame
    }

    #[test]
    fn debug_renderer_empty_frame() {
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&PhysicsFrame::empty(), 0.0, None, &RenderView::default());
        assert!(output.contains("tick=0"));
        assert!(output.contains("Objects: 0"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn debug_renderer_interpolates() {
        let mut renderer = DebugTextRenderer::new();
        let frame = frame_with_mover();
        let output = renderer.render(&frame, 0.5, None, &RenderView::default());
        assert!(output.contains("tick=7"));
        assert!(output.contains("pos=(1.00, 0.00, 0.00)"), "{output}");
    }

    #[test]
    fn debug_renderer_shows_animation_blend() {
        let mut renderer = DebugTextRenderer::new();
        let pose = AnimationPose {
            current: ClipState {
                clip: AnimationClip::Run,
                time: 0.1,
            },
            previous: Some(ClipState {
                clip: AnimationClip::Idle,
                time: 1.0,
            }),
            blend: 0.5,
            playback_rate: 1.0,
        };
        let output =
            renderer.render(&PhysicsFrame::empty(), 1.0, Some(&pose), &RenderView::default());
        assert!(output.contains("Animation: Run"));
        assert!(output.contains("from Idle, blend=0.50"));
    }

    #[test]
    fn follow_view_looks_at_target() {
        let view = RenderView::follow(Vec3::new(1.0, 2.0, 3.0), 10.0);
        assert_eq!(view.target, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(view.eye, Vec3::new(1.0, 7.0, 13.0));
        assert_eq!(RenderView::default().fov_degrees, 60.0);
    }
}
