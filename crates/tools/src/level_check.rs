use std::fmt;

use wayfarer_kernel::{LevelFile, ObjectKindRecord};
use wayfarer_physics::{BodyKind, ColliderShape, CookError};

/// Cooking outcome for one triangle-mesh collider.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshReport {
    pub object: String,
    /// Vertex and triangle counts after cooking, or why it failed.
    pub cooked: Result<(usize, usize), CookError>,
}

/// What a level contains and whether it would load cleanly.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelReport {
    pub name: String,
    pub objects: usize,
    pub players: usize,
    pub trigger_volumes: usize,
    pub dynamic_bodies: usize,
    pub meshes: Vec<MeshReport>,
    /// Structural validation failure, if any.
    pub invalid: Option<String>,
}

impl LevelReport {
    /// No validation error and every mesh cooks.
    pub fn is_clean(&self) -> bool {
        self.invalid.is_none() && self.meshes.iter().all(|m| m.cooked.is_ok())
    }
}

impl fmt::Display for LevelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Level '{}': objects={} players={} triggers={} dynamic={}",
            self.name, self.objects, self.players, self.trigger_volumes, self.dynamic_bodies
        )?;
        for mesh in &self.meshes {
            match &mesh.cooked {
                Ok((v, t)) => writeln!(f, "  mesh {}: {v} vertices, {t} triangles", mesh.object)?,
                Err(e) => writeln!(f, "  mesh {}: cook failed: {e}", mesh.object)?,
            }
        }
        if let Some(reason) = &self.invalid {
            writeln!(f, "  invalid: {reason}")?;
        }
        write!(f, "  status: {}", if self.is_clean() { "OK" } else { "PROBLEMS" })
    }
}

/// Validate a level and cook its meshes without creating a physics world.
pub fn check_level(level: &LevelFile) -> LevelReport {
    let count = |kind| level.objects.iter().filter(|o| o.kind == kind).count();
    let dynamic_bodies = level
        .objects
        .iter()
        .filter_map(|o| o.collider.as_ref())
        .filter(|c| c.body == BodyKind::Dynamic)
        .count();
    let meshes = level
        .objects
        .iter()
        .filter_map(|o| match o.collider.as_ref().map(|c| &c.shape) {
            Some(ColliderShape::TriangleMesh { mesh }) => Some(MeshReport {
                object: o.name.clone(),
                cooked: mesh
                    .cook(o.transform.scale)
                    .map(|c| (c.vertices().len(), c.triangles().len())),
            }),
            _ => None,
        })
        .collect();

    LevelReport {
        name: level.name.clone(),
        objects: level.objects.len(),
        players: count(ObjectKindRecord::Player),
        trigger_volumes: count(ObjectKindRecord::TriggerVolume),
        dynamic_bodies,
        meshes,
        invalid: level.validate().err().map(|e| e.to_string()),
    }
}
