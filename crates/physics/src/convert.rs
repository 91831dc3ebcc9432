//! glam <-> nalgebra conversions at the rapier boundary.

use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Point3, Quaternion, Translation3, UnitQuaternion, Vector3};

pub(crate) fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub(crate) fn to_point(v: Vec3) -> Point3<f32> {
    Point3::new(v.x, v.y, v.z)
}

pub(crate) fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn from_point(p: &Point3<f32>) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

pub(crate) fn to_isometry(position: Vec3, rotation: Quat) -> Isometry3<f32> {
    let q = rotation.normalize();
    Isometry3::from_parts(
        Translation3::new(position.x, position.y, position.z),
        UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z)),
    )
}

pub(crate) fn from_isometry(iso: &Isometry3<f32>) -> (Vec3, Quat) {
    let c = iso.rotation.coords;
    (
        from_vector(&iso.translation.vector),
        Quat::from_xyzw(c.x, c.y, c.z, c.w),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isometry_roundtrip() {
        let rotation = Quat::from_rotation_z(0.4) * Quat::from_rotation_y(-1.2);
        let position = Vec3::new(3.0, -1.0, 8.0);
        let (p, r) = from_isometry(&to_isometry(position, rotation));
        assert!(p.abs_diff_eq(position, 1e-6));
        assert!(r.abs_diff_eq(rotation, 1e-5));
    }
}
