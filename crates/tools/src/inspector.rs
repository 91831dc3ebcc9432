use wayfarer_common::{ObjectId, Transform};
use wayfarer_kernel::{MotionState, PhysicsFrame, Scene};

/// Read-only queries against published frames and scenes for debugging and
/// development UI.
pub struct FrameInspector;

impl FrameInspector {
    /// Produce a summary of a frame.
    pub fn summary(frame: &PhysicsFrame) -> FrameSummary {
        FrameSummary {
            tick: frame.tick,
            object_count: frame.objects.len(),
            player: frame.player.map(|p| p.motion),
        }
    }

    /// Interpolated transform of one object.
    pub fn inspect_object(frame: &PhysicsFrame, id: ObjectId, alpha: f32) -> Option<ObjectInfo> {
        frame.object(id).map(|object| {
            let t = Transform::from_mat4(&object.interpolated(alpha));
            ObjectInfo {
                id,
                name: object.name.clone(),
                kind: object.kind,
                position: t.position.to_array(),
                rotation: t.rotation.to_array(),
                scale: t.scale.to_array(),
            }
        })
    }

    /// List all object ids in the frame, in publication order.
    pub fn list_objects(frame: &PhysicsFrame) -> Vec<ObjectId> {
        frame.objects.iter().map(|o| o.id).collect()
    }

    /// Counts from a live scene, including the physics world behind it.
    pub fn scene_summary(scene: &Scene) -> SceneSummary {
        let occupied_triggers = scene
            .objects()
            .filter_map(|o| o.kind().as_trigger_volume())
            .filter(|v| v.is_occupied())
            .count();
        SceneSummary {
            tick: scene.tick(),
            objects: scene.object_count(),
            actors: scene.world().actor_count(),
            shapes: scene.world().shape_count(),
            occupied_triggers,
            pending_events: scene.events().len(),
        }
    }
}

/// Summary of a published frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSummary {
    pub tick: u64,
    pub object_count: usize,
    pub player: Option<MotionState>,
}

impl std::fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame: tick={} objects={}", self.tick, self.object_count)?;
        if let Some(motion) = self.player {
            write!(f, " player={motion:?}")?;
        }
        Ok(())
    }
}

/// Summary of a live scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneSummary {
    pub tick: u64,
    pub objects: usize,
    pub actors: usize,
    pub shapes: usize,
    pub occupied_triggers: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: tick={} objects={} actors={} shapes={} occupied_triggers={} pending_events={}",
            self.tick,
            self.objects,
            self.actors,
            self.shapes,
            self.occupied_triggers,
            self.pending_events
        )
    }
}

/// Detailed info about a single object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub id: ObjectId,
    pub name: String,
    pub kind: &'static str,
    pub position: [f32; 3],
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl std::fmt::Display for ObjectInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Object [{}] {} ({}) pos=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2})",
            self.id.short(),
            self.name,
            self.kind,
            self.position[0],
            self.position[1],
            self.position[2],
            self.scale[0],
            self.scale[1],
            self.scale[2],
        )
    }
}
