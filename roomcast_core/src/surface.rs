//! Contract with whatever draws the room, plus a headless implementation that
//! keeps the scene in memory for the interactive host and for tests.

use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use serde::Serialize;

use crate::camera::CameraPose;
use crate::state::{FurnitureItem, Pose};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Footprint {
    pub width: f32,
    pub depth: f32,
    pub height: f32,
}

impl Footprint {
    pub fn of(item: &FurnitureItem) -> Self {
        Footprint {
            width: item.width(),
            depth: item.depth(),
            height: item.height(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Visual {
    /// Loaded model, scaled per axis to the declared footprint. `anchor` is
    /// the local offset that centers it on the pose and rests it on the floor.
    Model {
        model: String,
        scale: [f32; 3],
        anchor: [f32; 3],
    },
    /// Generated box with the variant's dimensions and color.
    Placeholder { color: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneObject {
    pub pose: Pose,
    pub footprint: Footprint,
    pub visual: Visual,
}

impl SceneObject {
    pub fn placeholder(item: &FurnitureItem, pose: Pose) -> Self {
        SceneObject {
            pose,
            footprint: Footprint::of(item),
            visual: Visual::Placeholder {
                color: item.color().to_string(),
            },
        }
    }

    /// Whether a floor point falls inside the rotated footprint.
    pub fn covers(&self, x: f32, z: f32) -> bool {
        let offset = Vec3::new(x - self.pose.x, 0.0, z - self.pose.z);
        let local = Quat::from_rotation_y(-self.pose.rotation.to_radians()) * offset;
        local.x.abs() <= self.footprint.width / 2.0 + 1e-4
            && local.z.abs() <= self.footprint.depth / 2.0 + 1e-4
    }
}

/// Sink for scene mutations. The room state never reads back from it.
pub trait RenderSurface {
    /// Place or replace the object for `id`.
    fn spawn(&mut self, id: &str, object: SceneObject);

    /// Move an existing object without touching its geometry.
    fn set_pose(&mut self, id: &str, pose: Pose);

    fn remove(&mut self, id: &str);

    fn set_camera(&mut self, _camera: &CameraPose) {}

    /// Item under a screen point, if the surface supports hit testing.
    fn pick(&self, _sx: f32, _sy: f32) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceEvent {
    Spawn { id: String, object: SceneObject },
    Remove { id: String },
}

/// In-memory scene. Screen coordinates for [`RenderSurface::pick`] are
/// interpreted as a top-down view in room meters.
#[derive(Debug, Default, Clone)]
pub struct HeadlessSurface {
    objects: BTreeMap<String, SceneObject>,
    stacking: Vec<String>,
    camera: Option<CameraPose>,
    events: Option<Vec<SurfaceEvent>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that also keeps its spawn/remove history.
    pub fn with_event_log() -> Self {
        HeadlessSurface {
            events: Some(Vec::new()),
            ..Self::default()
        }
    }

    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    pub fn pose(&self, id: &str) -> Option<Pose> {
        self.objects.get(id).map(|object| object.pose)
    }

    pub fn camera(&self) -> Option<CameraPose> {
        self.camera
    }

    /// Spawn/remove history, oldest first. Empty unless the surface was
    /// built with [`HeadlessSurface::with_event_log`]; per-frame moves are
    /// never recorded.
    pub fn events(&self) -> &[SurfaceEvent] {
        self.events.as_deref().unwrap_or(&[])
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }
}

impl RenderSurface for HeadlessSurface {
    fn spawn(&mut self, id: &str, object: SceneObject) {
        log::trace!("surface spawn {id} at {:.3},{:.3}", object.pose.x, object.pose.z);
        self.stacking.retain(|existing| existing != id);
        self.stacking.push(id.to_string());
        if let Some(events) = self.events.as_mut() {
            events.push(SurfaceEvent::Spawn {
                id: id.to_string(),
                object: object.clone(),
            });
        }
        self.objects.insert(id.to_string(), object);
    }

    fn set_pose(&mut self, id: &str, pose: Pose) {
        if let Some(object) = self.objects.get_mut(id) {
            object.pose = pose;
        }
    }

    fn remove(&mut self, id: &str) {
        if self.objects.remove(id).is_some() {
            log::trace!("surface remove {id}");
            self.stacking.retain(|existing| existing != id);
            if let Some(events) = self.events.as_mut() {
                events.push(SurfaceEvent::Remove { id: id.to_string() });
            }
        }
    }

    fn set_camera(&mut self, camera: &CameraPose) {
        self.camera = Some(*camera);
    }

    fn pick(&self, sx: f32, sy: f32) -> Option<String> {
        self.stacking
            .iter()
            .rev()
            .find(|id| {
                self.objects
                    .get(id.as_str())
                    .is_some_and(|object| object.covers(sx, sy))
            })
            .cloned()
    }
}
