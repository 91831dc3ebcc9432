use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use rapier3d::na::Point3;
use rapier3d::prelude::{ActiveCollisionTypes, ActiveEvents, Collider, ColliderBuilder};
use serde::{Deserialize, Serialize};
use wayfarer_common::{Transform, scale_of};

use crate::convert::to_point;
use crate::mesh::{CookedMesh, MeshSource};
use crate::world::{ActorHandle, BodyKind, FilterTag, PhysicsWorld, ShapeHandle};

/// Geometry requested for a collider, before scale is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColliderShape {
    /// Box with unscaled half-extents.
    Box { extents: Vec3 },
    Sphere { radius: f32 },
    TriangleMesh { mesh: MeshSource },
}

/// A collider construction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColliderDesc {
    pub shape: ColliderShape,
    #[serde(default)]
    pub body: BodyKind,
    /// Trigger shapes report overlaps and never block.
    #[serde(default)]
    pub trigger: bool,
    #[serde(default)]
    pub tag: FilterTag,
}

impl ColliderDesc {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            body: BodyKind::Static,
            trigger: false,
            tag: FilterTag::Untagged,
        }
    }

    pub fn with_body(mut self, body: BodyKind) -> Self {
        self.body = body;
        self
    }

    pub fn as_trigger(mut self) -> Self {
        self.trigger = true;
        self
    }
}

/// Actor plus its single attached shape.
#[derive(Debug)]
pub struct ColliderBody {
    actor: ActorHandle,
    shape: Option<ShapeHandle>,
    trigger: bool,
    tag: FilterTag,
}

impl ColliderBody {
    fn spawn(
        world: &mut PhysicsWorld,
        transform: &Mat4,
        kind: BodyKind,
        trigger: bool,
        tag: FilterTag,
        builder: ColliderBuilder,
    ) -> Self {
        let t = Transform::from_mat4(transform);
        let actor = world.create_actor(t.position, t.rotation, kind);
        let actor = world.add_actor(actor);
        let shape = world
            .attach_shape(actor, finish(builder, trigger, tag))
            .ok();
        Self {
            actor,
            shape,
            trigger,
            tag,
        }
    }

    pub fn actor(&self) -> ActorHandle {
        self.actor
    }

    pub fn shape(&self) -> Option<ShapeHandle> {
        self.shape
    }

    fn replace(&mut self, world: &mut PhysicsWorld, builder: ColliderBuilder) {
        let collider = finish(builder, self.trigger, self.tag);
        match world.replace_shape(self.actor, self.shape, collider) {
            Ok(shape) => self.shape = Some(shape),
            Err(err) => {
                tracing::warn!(%err, "shape replacement failed");
                self.shape = None;
            }
        }
    }

    fn reposition(&self, world: &mut PhysicsWorld, transform: &Mat4) {
        let t = Transform::from_mat4(transform);
        world.set_actor_pose(self.actor, t.position, t.rotation);
    }

    fn global_pose(&self, world: &PhysicsWorld) -> Option<(Vec3, Quat)> {
        world.actor_pose(self.actor)
    }

    fn release(self, world: &mut PhysicsWorld) {
        world.remove_actor(self.actor);
    }
}

fn finish(builder: ColliderBuilder, trigger: bool, tag: FilterTag) -> Collider {
    let builder = builder.collision_groups(tag.interaction_groups());
    if trigger {
        builder
            .sensor(true)
            .active_events(ActiveEvents::COLLISION_EVENTS)
            .active_collision_types(ActiveCollisionTypes::all())
            .build()
    } else {
        builder.build()
    }
}

/// Box collider. Half-extents are `extents` scaled per axis by the transform.
#[derive(Debug)]
pub struct BoxCollider {
    body: ColliderBody,
    extents: Vec3,
}

impl BoxCollider {
    pub fn new(
        world: &mut PhysicsWorld,
        transform: &Mat4,
        extents: Vec3,
        kind: BodyKind,
        trigger: bool,
        tag: FilterTag,
    ) -> Self {
        let half = Self::half_extents_for(extents, transform);
        let builder = ColliderBuilder::cuboid(half.x, half.y, half.z);
        Self {
            body: ColliderBody::spawn(world, transform, kind, trigger, tag, builder),
            extents,
        }
    }

    pub fn half_extents_for(extents: Vec3, transform: &Mat4) -> Vec3 {
        extents * scale_of(transform)
    }

    pub fn body(&self) -> &ColliderBody {
        &self.body
    }

    pub fn propagate_new_transform(&mut self, world: &mut PhysicsWorld, transform: &Mat4) {
        let half = Self::half_extents_for(self.extents, transform);
        self.body
            .replace(world, ColliderBuilder::cuboid(half.x, half.y, half.z));
        self.body.reposition(world, transform);
    }
}

/// Sphere collider. Radius is scaled by the largest axis scale.
#[derive(Debug)]
pub struct SphereCollider {
    body: ColliderBody,
    radius: f32,
}

impl SphereCollider {
    pub fn new(
        world: &mut PhysicsWorld,
        transform: &Mat4,
        radius: f32,
        kind: BodyKind,
        trigger: bool,
        tag: FilterTag,
    ) -> Self {
        let builder = ColliderBuilder::ball(Self::radius_for(radius, transform));
        Self {
            body: ColliderBody::spawn(world, transform, kind, trigger, tag, builder),
            radius,
        }
    }

    pub fn radius_for(radius: f32, transform: &Mat4) -> f32 {
        radius * scale_of(transform).max_element()
    }

    pub fn body(&self) -> &ColliderBody {
        &self.body
    }

    pub fn propagate_new_transform(&mut self, world: &mut PhysicsWorld, transform: &Mat4) {
        let r = Self::radius_for(self.radius, transform);
        self.body.replace(world, ColliderBuilder::ball(r));
        self.body.reposition(world, transform);
    }
}

/// Static triangle-mesh collider, cooked once at construction.
///
/// Rescaling is not supported: the scale of the construction transform is
/// baked into the cooked vertices and later scale changes only reposition.
/// A mesh that fails to cook leaves the collider degraded (no actor).
#[derive(Debug)]
pub struct TriangleMeshCollider {
    body: Option<ColliderBody>,
    mesh: Option<Arc<CookedMesh>>,
}

impl TriangleMeshCollider {
    pub fn new(
        world: &mut PhysicsWorld,
        transform: &Mat4,
        source: &MeshSource,
        kind: BodyKind,
        trigger: bool,
        tag: FilterTag,
    ) -> Self {
        let mesh = match source.cook(scale_of(transform)) {
            Ok(mesh) => Arc::new(mesh),
            Err(err) => {
                tracing::warn!(%err, "triangle mesh collider degraded: cooking failed");
                return Self {
                    body: None,
                    mesh: None,
                };
            }
        };
        let vertices: Vec<Point3<f32>> = mesh.vertices().iter().map(|v| to_point(*v)).collect();
        let builder = ColliderBuilder::trimesh(vertices, mesh.triangles().to_vec());
        Self {
            body: Some(ColliderBody::spawn(
                world, transform, kind, trigger, tag, builder,
            )),
            mesh: Some(mesh),
        }
    }

    pub fn body(&self) -> Option<&ColliderBody> {
        self.body.as_ref()
    }

    pub fn mesh(&self) -> Option<&Arc<CookedMesh>> {
        self.mesh.as_ref()
    }

    pub fn is_degraded(&self) -> bool {
        self.body.is_none()
    }

    pub fn propagate_new_transform(&mut self, world: &mut PhysicsWorld, transform: &Mat4) {
        if let Some(body) = &self.body {
            body.reposition(world, transform);
        }
    }
}

/// Shared dispatch for the three collider kinds.
pub(crate) trait ColliderParts {
    fn parts(&self) -> Option<&ColliderBody>;
    fn into_parts(self) -> Option<ColliderBody>;
}

impl ColliderParts for BoxCollider {
    fn parts(&self) -> Option<&ColliderBody> {
        Some(&self.body)
    }
    fn into_parts(self) -> Option<ColliderBody> {
        Some(self.body)
    }
}

impl ColliderParts for SphereCollider {
    fn parts(&self) -> Option<&ColliderBody> {
        Some(&self.body)
    }
    fn into_parts(self) -> Option<ColliderBody> {
        Some(self.body)
    }
}

impl ColliderParts for TriangleMeshCollider {
    fn parts(&self) -> Option<&ColliderBody> {
        self.body.as_ref()
    }
    fn into_parts(self) -> Option<ColliderBody> {
        self.body
    }
}

pub(crate) fn global_pose_of<C: ColliderParts>(
    c: &C,
    world: &PhysicsWorld,
) -> Option<(Vec3, Quat)> {
    c.parts().and_then(|b| b.global_pose(world))
}

pub(crate) fn release<C: ColliderParts>(c: C, world: &mut PhysicsWorld) {
    if let Some(body) = c.into_parts() {
        body.release(world);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::ShapeGeometry;
    use crate::WorldConfig;

    fn world() -> PhysicsWorld {
        PhysicsWorld::new(WorldConfig::default()).unwrap()
    }

    fn scaled(scale: Vec3, position: Vec3) -> Mat4 {
        Mat4::from_scale_rotation_translation(scale, Quat::IDENTITY, position)
    }

    #[test]
    fn box_scale_change_rebuilds_shape() {
        let mut world = world();
        let mut collider = BoxCollider::new(
            &mut world,
            &Mat4::IDENTITY,
            Vec3::ONE,
            BodyKind::Static,
            false,
            FilterTag::Untagged,
        );
        let actor = collider.body().actor();
        let old = collider.body().shape().unwrap();

        collider.propagate_new_transform(&mut world, &scaled(Vec3::new(2.0, 1.0, 1.0), Vec3::ZERO));

        let new = collider.body().shape().unwrap();
        assert_ne!(old, new);
        assert!(!world.is_attached(actor, old));
        assert!(world.is_attached(actor, new));
        match world.shape_geometry(new) {
            Some(ShapeGeometry::Box { half_extents }) => {
                assert!(half_extents.abs_diff_eq(Vec3::new(2.0, 1.0, 1.0), 1e-6));
            }
            other => panic!("expected a box, got {other:?}"),
        }
    }

    #[test]
    fn box_propagation_repositions_actor() {
        let mut world = world();
        let mut collider = BoxCollider::new(
            &mut world,
            &Mat4::IDENTITY,
            Vec3::ONE,
            BodyKind::Static,
            false,
            FilterTag::Untagged,
        );
        let target =
            Mat4::from_rotation_translation(Quat::from_rotation_y(0.5), Vec3::new(3.0, 4.0, 5.0));
        collider.propagate_new_transform(&mut world, &target);
        let (p, r) = global_pose_of(&collider, &world).unwrap();
        assert!(p.abs_diff_eq(Vec3::new(3.0, 4.0, 5.0), 1e-5));
        assert!(r.abs_diff_eq(Quat::from_rotation_y(0.5), 1e-5));
    }

    #[test]
    fn sphere_uses_largest_axis_scale() {
        let mut world = world();
        let transform = scaled(Vec3::new(1.0, 3.0, 2.0), Vec3::ZERO);
        let collider = SphereCollider::new(
            &mut world,
            &transform,
            0.5,
            BodyKind::Dynamic,
            false,
            FilterTag::Untagged,
        );
        let shape = collider.body().shape().unwrap();
        assert_eq!(
            world.shape_geometry(shape),
            Some(ShapeGeometry::Sphere { radius: 1.5 })
        );
    }

    #[test]
    fn trigger_shapes_are_sensors() {
        let mut world = world();
        let collider = BoxCollider::new(
            &mut world,
            &Mat4::IDENTITY,
            Vec3::ONE,
            BodyKind::Static,
            true,
            FilterTag::Untagged,
        );
        assert!(world.is_sensor(collider.body().shape().unwrap()));
    }

    #[test]
    fn triangle_mesh_cooks_and_ignores_rescale() {
        let mut world = world();
        let source = MeshSource::grid(3, 3, 1.0, &[0.0; 9]);
        let mut collider = TriangleMeshCollider::new(
            &mut world,
            &Mat4::IDENTITY,
            &source,
            BodyKind::Static,
            false,
            FilterTag::Untagged,
        );
        assert!(!collider.is_degraded());
        let shape = collider.body().and_then(|b| b.shape()).unwrap();
        assert_eq!(
            world.shape_geometry(shape),
            Some(ShapeGeometry::TriangleMesh { triangles: 8 })
        );

        collider.propagate_new_transform(&mut world, &scaled(Vec3::splat(4.0), Vec3::Y));
        let after = collider.body().and_then(|b| b.shape()).unwrap();
        assert_eq!(shape, after, "mesh shapes are not rebuilt");
        let (p, _) = global_pose_of(&collider, &world).unwrap();
        assert!(p.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn bad_mesh_degrades_without_actor() {
        let mut world = world();
        let source = MeshSource::single(vec![Vec3::ZERO, Vec3::X], vec![0, 1, 5]);
        let collider = TriangleMeshCollider::new(
            &mut world,
            &Mat4::IDENTITY,
            &source,
            BodyKind::Static,
            false,
            FilterTag::Untagged,
        );
        assert!(collider.is_degraded());
        assert!(collider.mesh().is_none());
        assert_eq!(world.actor_count(), 0);
    }

    #[test]
    fn release_removes_actor() {
        let mut world = world();
        let collider = SphereCollider::new(
            &mut world,
            &Mat4::IDENTITY,
            1.0,
            BodyKind::Static,
            false,
            FilterTag::Untagged,
        );
        assert_eq!(world.actor_count(), 1);
        release(collider, &mut world);
        assert_eq!(world.actor_count(), 0);
        assert_eq!(world.shape_count(), 0);
    }
}
