use glam::{Mat4, Vec2, Vec3};

/// Translation column of a world matrix.
pub fn translation_of(mat: &Mat4) -> Vec3 {
    mat.w_axis.truncate()
}

/// Copy of `mat` with its translation column replaced. Rotation and scale are untouched.
pub fn with_translation(mat: &Mat4, position: Vec3) -> Mat4 {
    let mut out = *mat;
    out.w_axis = position.extend(1.0);
    out
}

/// Per-axis scale as the length of each basis column. Always non-negative.
pub fn scale_of(mat: &Mat4) -> Vec3 {
    Vec3::new(
        mat.x_axis.truncate().length(),
        mat.y_axis.truncate().length(),
        mat.z_axis.truncate().length(),
    )
}

/// Step `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

pub fn move_towards_vec2(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let dist = delta.length();
    if dist <= max_delta || dist == 0.0 {
        target
    } else {
        current + delta / dist * max_delta
    }
}

/// Step an angle (radians) toward `target` along the shorter arc.
pub fn move_towards_angle(current: f32, target: f32, max_delta: f32) -> f32 {
    let tau = std::f32::consts::TAU;
    let mut delta = (target - current).rem_euclid(tau);
    if delta > std::f32::consts::PI {
        delta -= tau;
    }
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Rotate a 2D vector counter-clockwise by `radians`.
pub fn rotate_vec2(v: Vec2, radians: f32) -> Vec2 {
    Vec2::from_angle(radians).rotate(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn with_translation_keeps_basis() {
        let mat = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 3.0, 4.0),
            Quat::from_rotation_x(0.3),
            Vec3::ZERO,
        );
        let moved = with_translation(&mat, Vec3::new(5.0, 6.0, 7.0));
        assert_eq!(moved.x_axis, mat.x_axis);
        assert_eq!(moved.y_axis, mat.y_axis);
        assert_eq!(moved.z_axis, mat.z_axis);
        assert_eq!(translation_of(&moved), Vec3::new(5.0, 6.0, 7.0));
    }

    #[test]
    fn scale_of_ignores_rotation() {
        let mat = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 0.5),
            Quat::from_rotation_y(1.1),
            Vec3::new(9.0, 0.0, 0.0),
        );
        assert!(scale_of(&mat).abs_diff_eq(Vec3::new(2.0, 1.0, 0.5), 1e-5));
    }

    #[test]
    fn move_towards_clamps_to_target() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.9, 1.0, 0.25), 1.0);
        assert_eq!(move_towards(0.0, -1.0, 0.5), -0.5);
    }

    #[test]
    fn move_towards_vec2_respects_max_delta() {
        let v = move_towards_vec2(Vec2::ZERO, Vec2::new(3.0, 4.0), 1.0);
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert_eq!(move_towards_vec2(Vec2::ZERO, Vec2::X, 2.0), Vec2::X);
    }

    #[test]
    fn move_towards_angle_takes_short_way() {
        let pi = std::f32::consts::PI;
        // From just below +pi to just above -pi is a small positive step.
        let a = move_towards_angle(pi - 0.1, -pi + 0.1, 0.05);
        assert!((a - (pi - 0.05)).abs() < 1e-5);
    }

    #[test]
    fn rotate_vec2_quarter_turn() {
        let v = rotate_vec2(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert!(v.abs_diff_eq(Vec2::Y, 1e-6));
    }
}
