use glam::Vec3;

use super::state::CollisionFlags;

/// Result of sweeping the capsule along a displacement.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SweepOutcome {
    /// Displacement actually applied after collision resolution.
    pub applied: Vec3,
    pub flags: CollisionFlags,
    /// Most upward-facing floor contact normal, when `DOWN` is set.
    pub ground_normal: Option<Vec3>,
    /// Most downward-facing ceiling contact normal, when `UP` is set.
    pub ceiling_normal: Option<Vec3>,
}

/// Downward ray hit below the foot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbe {
    pub normal: Vec3,
    pub distance: f32,
    /// Angular velocity about up when the hit body is dynamic.
    pub dynamic_angular_velocity: Option<f32>,
}

/// Collision queries the controller runs against the world.
pub trait CapsuleSweep {
    /// Move the capsule centred at `center` by `displacement`, sliding along
    /// whatever it hits.
    fn sweep(&mut self, center: Vec3, displacement: Vec3) -> SweepOutcome;

    /// Cast straight down from `origin`. `None` is inconclusive, not an error.
    fn probe_ground(&mut self, origin: Vec3, max_distance: f32) -> Option<GroundProbe>;
}

/// Normals within this of horizontal count as side contacts.
pub(crate) const SIDE_NORMAL_EPSILON: f32 = 0.05;

/// Fold one contact normal into an outcome.
pub(crate) fn classify_contact(outcome: &mut SweepOutcome, normal: Vec3) {
    if normal.y > SIDE_NORMAL_EPSILON {
        outcome.flags |= CollisionFlags::DOWN;
        if outcome.ground_normal.is_none_or(|n| normal.y > n.y) {
            outcome.ground_normal = Some(normal);
        }
    } else if normal.y < -SIDE_NORMAL_EPSILON {
        outcome.flags |= CollisionFlags::UP;
        if outcome.ceiling_normal.is_none_or(|n| normal.y < n.y) {
            outcome.ceiling_normal = Some(normal);
        }
    } else {
        outcome.flags |= CollisionFlags::SIDES;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_sorts_contacts_by_normal() {
        let mut out = SweepOutcome::default();
        classify_contact(&mut out, Vec3::new(0.0, 0.8, 0.6));
        classify_contact(&mut out, Vec3::Y);
        classify_contact(&mut out, Vec3::X);
        classify_contact(&mut out, Vec3::new(0.6, -0.8, 0.0));
        assert_eq!(
            out.flags,
            CollisionFlags::DOWN | CollisionFlags::SIDES | CollisionFlags::UP
        );
        assert_eq!(out.ground_normal, Some(Vec3::Y));
        assert_eq!(out.ceiling_normal, Some(Vec3::new(0.6, -0.8, 0.0)));
    }

    #[test]
    fn near_horizontal_normal_is_a_side() {
        let mut out = SweepOutcome::default();
        classify_contact(&mut out, Vec3::new(1.0, 0.01, 0.0).normalize());
        assert_eq!(out.flags, CollisionFlags::SIDES);
        assert!(out.ground_normal.is_none());
    }
}
