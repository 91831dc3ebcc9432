use std::collections::HashSet;
use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use wayfarer_common::{ObjectId, Transform};
use wayfarer_physics::{BodyKind, ColliderDesc, ColliderShape, MeshSource};

#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("level io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("level json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid level: {0}")]
    Invalid(String),
}

/// Behaviour attached to a saved object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKindRecord {
    #[default]
    Prop,
    Player,
    TriggerVolume,
}

/// One saved object. Physics poses are re-derived from `transform` on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guid: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub kind: ObjectKindRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collider: Option<ColliderDesc>,
}

impl ObjectRecord {
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            guid: None,
            name: name.into(),
            transform,
            kind: ObjectKindRecord::Prop,
            collider: None,
        }
    }

    pub fn with_kind(mut self, kind: ObjectKindRecord) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_collider(mut self, collider: ColliderDesc) -> Self {
        self.collider = Some(collider);
        self
    }
}

/// A level on disk: a named list of objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelFile {
    pub name: String,
    #[serde(default)]
    pub objects: Vec<ObjectRecord>,
}

impl LevelFile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
        }
    }

    /// Read and validate a level.
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let text = std::fs::read_to_string(path)?;
        let level: Self = serde_json::from_str(&text)?;
        level.validate()?;
        tracing::info!(
            path = %path.display(),
            name = %level.name,
            objects = level.objects.len(),
            "level loaded"
        );
        Ok(level)
    }

    pub fn save(&self, path: &Path) -> Result<(), LevelError> {
        self.validate()?;
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        tracing::info!(path = %path.display(), objects = self.objects.len(), "level saved");
        Ok(())
    }

    /// Structural checks that do not need a physics world.
    pub fn validate(&self) -> Result<(), LevelError> {
        let players = self
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKindRecord::Player)
            .count();
        if players > 1 {
            return Err(LevelError::Invalid(format!(
                "{players} player objects, expected at most one"
            )));
        }

        let mut seen = HashSet::new();
        for object in &self.objects {
            if let Some(guid) = object.guid {
                if !seen.insert(guid) {
                    return Err(LevelError::Invalid(format!("duplicate guid {guid}")));
                }
            }
            if object.kind == ObjectKindRecord::TriggerVolume
                && !object.collider.as_ref().is_some_and(|c| c.trigger)
            {
                return Err(LevelError::Invalid(format!(
                    "trigger volume '{}' needs a trigger collider",
                    object.name
                )));
            }
            let scale = object.transform.scale;
            if !scale.is_finite() || scale.cmpeq(Vec3::ZERO).any() {
                return Err(LevelError::Invalid(format!(
                    "object '{}' has a degenerate scale",
                    object.name
                )));
            }
        }
        Ok(())
    }

    pub fn player(&self) -> Option<&ObjectRecord> {
        self.objects.iter().find(|o| o.kind == ObjectKindRecord::Player)
    }

    /// Playground with one of everything the controller has to handle.
    pub fn demo() -> Self {
        let boxed = |extents: Vec3| ColliderDesc::new(ColliderShape::Box { extents });
        let at = |x: f32, y: f32, z: f32| Transform::from_position(Vec3::new(x, y, z));
        let tilted = |position: Vec3, degrees: f32| Transform {
            position,
            rotation: Quat::from_rotation_x(degrees.to_radians()),
            scale: Vec3::ONE,
        };

        let mut objects = vec![
            ObjectRecord::new("ground", at(0.0, -1.0, 0.0))
                .with_collider(boxed(Vec3::new(200.0, 1.0, 200.0))),
            ObjectRecord::new("gentle_ramp", tilted(Vec3::new(40.0, 3.0, 0.0), 25.0))
                .with_collider(boxed(Vec3::new(10.0, 0.5, 20.0))),
            ObjectRecord::new("steep_ramp", tilted(Vec3::new(-40.0, 6.0, 0.0), 55.0))
                .with_collider(boxed(Vec3::new(10.0, 0.5, 20.0))),
            ObjectRecord::new("ceiling", at(0.0, 8.0, 40.0))
                .with_collider(boxed(Vec3::new(10.0, 0.5, 10.0))),
            ObjectRecord::new("checkpoint", at(0.0, 5.0, -30.0))
                .with_kind(ObjectKindRecord::TriggerVolume)
                .with_collider(boxed(Vec3::splat(5.0)).as_trigger()),
        ];

        for i in 0..3 {
            let offset = i as f32 * 3.0;
            objects.push(
                ObjectRecord::new(format!("crate_{i}"), at(10.0 + offset, 20.0 + offset, 10.0))
                    .with_collider(boxed(Vec3::ONE).with_body(BodyKind::Dynamic)),
            );
        }

        let (columns, rows) = (9, 9);
        let heights: Vec<f32> = (0..columns * rows)
            .map(|i| {
                let (c, r) = ((i % columns) as f32, (i / columns) as f32);
                (c * 0.7).sin() * 1.5 + (r * 0.5).cos()
            })
            .collect();
        objects.push(
            ObjectRecord::new("terrain_patch", at(0.0, 0.5, 90.0)).with_collider(ColliderDesc::new(
                ColliderShape::TriangleMesh {
                    mesh: MeshSource::grid(columns, rows, 4.0, &heights),
                },
            )),
        );

        objects.push(
            ObjectRecord::new("player", at(0.0, 10.0, 0.0)).with_kind(ObjectKindRecord::Player),
        );

        Self {
            name: "demo".into(),
            objects,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_is_valid() {
        let level = LevelFile::demo();
        level.validate().unwrap();
        assert!(level.player().is_some());
        assert!(level.objects.iter().any(|o| o.kind == ObjectKindRecord::TriggerVolume));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.json");
        let level = LevelFile::demo();
        level.save(&path).unwrap();
        let loaded = LevelFile::load(&path).unwrap();
        assert_eq!(loaded, level);
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let json = r#"{
            "name": "tiny",
            "objects": [
                {
                    "name": "floor",
                    "collider": { "shape": { "type": "box", "extents": [5.0, 1.0, 5.0] } }
                },
                { "name": "hero", "kind": "player" }
            ]
        }"#;
        let level: LevelFile = serde_json::from_str(json).unwrap();
        level.validate().unwrap();
        let floor = &level.objects[0];
        assert_eq!(floor.transform, Transform::default());
        assert_eq!(floor.collider.as_ref().unwrap().body, BodyKind::Static);
        assert_eq!(level.player().unwrap().name, "hero");
    }

    #[test]
    fn rejects_two_players() {
        let mut level = LevelFile::new("bad");
        for name in ["a", "b"] {
            level.objects.push(
                ObjectRecord::new(name, Transform::default()).with_kind(ObjectKindRecord::Player),
            );
        }
        assert!(matches!(level.validate(), Err(LevelError::Invalid(_))));
    }

    #[test]
    fn rejects_trigger_volume_without_trigger_shape() {
        let mut level = LevelFile::new("bad");
        level.objects.push(
            ObjectRecord::new("zone", Transform::default())
                .with_kind(ObjectKindRecord::TriggerVolume)
                .with_collider(ColliderDesc::new(ColliderShape::Sphere { radius: 2.0 })),
        );
        assert!(matches!(level.validate(), Err(LevelError::Invalid(_))));
    }

    #[test]
    fn load_reports_missing_file_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            LevelFile::load(&dir.path().join("nope.json")),
            Err(LevelError::Io(_))
        ));
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(LevelFile::load(&path), Err(LevelError::Json(_))));
    }
}
