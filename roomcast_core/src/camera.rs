//! Named viewpoints and cancellable camera transitions.
//!
//! Unlike furniture tweens, a newer view transition does not snap the older
//! one: it flags it `cancelled` and the older transition simply stops
//! touching the camera on the next tick.

use std::time::Duration;

use glam::Vec3;

use crate::animation::{progress, Easing};
use crate::surface::RenderSurface;

pub const DEFAULT_VIEW_TRANSITION: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
    pub fov: f32,
}

impl CameraPose {
    pub fn lerp(&self, other: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            position: self.position.lerp(other.position, t),
            target: self.target.lerp(other.target, t),
            fov: self.fov + (other.fov - self.fov) * t,
        }
    }
}

/// `(name, position, look target, vertical fov)` for every preset view.
const VIEWPOINTS: [(&str, [f32; 3], [f32; 3], f32); 5] = [
    ("corner", [8.0, 5.5, -2.0], [2.5, 0.5, 4.0], 50.0),
    ("birdseye", [2.5, 10.0, 4.0], [2.5, 0.0, 4.0], 55.0),
    ("entrance", [2.5, 1.6, -0.3], [2.5, 1.2, 5.0], 65.0),
    ("window", [2.5, 1.6, 8.3], [2.5, 1.0, 3.0], 65.0),
    ("side", [9.0, 3.0, 4.0], [2.5, 0.6, 4.0], 45.0),
];

pub fn viewpoint(name: &str) -> Option<CameraPose> {
    VIEWPOINTS
        .iter()
        .find(|(view, ..)| view.eq_ignore_ascii_case(name))
        .map(|(_, position, target, fov)| CameraPose {
            position: Vec3::from_array(*position),
            target: Vec3::from_array(*target),
            fov: *fov,
        })
}

pub fn viewpoint_names() -> impl Iterator<Item = &'static str> {
    VIEWPOINTS.iter().map(|(name, ..)| *name)
}

#[derive(Debug, Clone)]
struct ViewTransition {
    name: String,
    from: CameraPose,
    to: CameraPose,
    started_at: Duration,
    cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct CameraRig {
    pose: CameraPose,
    duration: Duration,
    easing: Easing,
    transitions: Vec<ViewTransition>,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_TRANSITION)
    }
}

impl CameraRig {
    pub fn new(duration: Duration) -> Self {
        let pose = viewpoint("corner").unwrap_or(CameraPose {
            position: Vec3::new(8.0, 5.5, -2.0),
            target: Vec3::new(2.5, 0.5, 4.0),
            fov: 50.0,
        });
        CameraRig {
            pose,
            duration,
            easing: Easing::EaseInOutCubic,
            transitions: Vec::new(),
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    /// Name of the view the camera is currently heading toward.
    pub fn active_view(&self) -> Option<&str> {
        self.transitions
            .iter()
            .rev()
            .find(|transition| !transition.cancelled)
            .map(|transition| transition.name.as_str())
    }

    /// Start easing toward a named viewpoint. Unknown names are ignored.
    pub fn transition_to(&mut self, name: &str, now: Duration) -> bool {
        let Some(to) = viewpoint(name) else {
            log::debug!("ignoring unknown viewpoint {name:?}");
            return false;
        };
        for transition in &mut self.transitions {
            transition.cancelled = true;
        }
        self.transitions.push(ViewTransition {
            name: name.to_ascii_lowercase(),
            from: self.pose,
            to,
            started_at: now,
            cancelled: false,
        });
        true
    }

    pub fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> bool {
        self.transitions.retain(|transition| !transition.cancelled);
        let Some(transition) = self.transitions.last() else {
            return false;
        };

        let raw = progress(transition.started_at, now, self.duration);
        self.pose = if raw >= 1.0 {
            transition.to
        } else {
            transition.from.lerp(&transition.to, self.easing.apply(raw))
        };
        surface.set_camera(&self.pose);

        if raw >= 1.0 {
            self.transitions.clear();
        }
        !self.transitions.is_empty()
    }
}
