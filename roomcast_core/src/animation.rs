//! Frame-driven pose interpolation for furniture.
//!
//! The scheduler owns the *rendered* pose of every item, the mirror of what
//! the surface is showing. Each item has at most one running tween; a new
//! request for the same item first snaps the object onto the running tween's
//! target, so the new start point (and the history entry recorded for it) is
//! always a settled pose rather than a half-interpolated one.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::geometry::{normalize_degrees, shortest_delta_degrees};
use crate::history::UndoHistory;
use crate::state::Pose;
use crate::surface::RenderSurface;

pub const DEFAULT_ANIMATION: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    Linear,
    #[default]
    EaseOutQuad,
    EaseInOutCubic,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseOutQuad => t * (2.0 - t),
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Fraction of `duration` elapsed between `started_at` and `now`, in `[0, 1]`.
pub(crate) fn progress(started_at: Duration, now: Duration, duration: Duration) -> f32 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_sub(started_at);
    (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
}

#[derive(Debug, Clone, Copy)]
struct Tween {
    start: Pose,
    target: Pose,
    rotation_delta: f32,
    started_at: Duration,
}

impl Tween {
    fn sample(&self, eased: f32) -> Pose {
        Pose {
            x: self.start.x + (self.target.x - self.start.x) * eased,
            z: self.start.z + (self.target.z - self.start.z) * eased,
            rotation: normalize_degrees(self.start.rotation + self.rotation_delta * eased),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    duration: Duration,
    easing: Easing,
    rendered: BTreeMap<String, Pose>,
    tweens: BTreeMap<String, Tween>,
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION)
    }
}

impl AnimationScheduler {
    pub fn new(duration: Duration) -> Self {
        AnimationScheduler {
            duration,
            easing: Easing::default(),
            rendered: BTreeMap::new(),
            tweens: BTreeMap::new(),
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Start tracking `id` at a resting pose, dropping any running tween.
    pub fn track(&mut self, id: &str, pose: Pose) {
        self.tweens.remove(id);
        self.rendered.insert(id.to_string(), pose);
    }

    pub fn rendered_pose(&self, id: &str) -> Option<Pose> {
        self.rendered.get(id).copied()
    }

    /// Where the running tween for `id` is heading, if one is running.
    pub fn pending_target(&self, id: &str) -> Option<Pose> {
        self.tweens.get(id).map(|tween| tween.target)
    }

    pub fn is_animating(&self, id: &str) -> bool {
        self.tweens.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    /// Snap a running tween onto its target and return the settled pose.
    pub fn settle(&mut self, id: &str, surface: &mut dyn RenderSurface) -> Option<Pose> {
        if let Some(tween) = self.tweens.remove(id) {
            log::debug!(
                "snapping {id} to pending target {:.3},{:.3} @ {:.1}",
                tween.target.x,
                tween.target.z,
                tween.target.rotation
            );
            self.rendered.insert(id.to_string(), tween.target);
            surface.set_pose(id, tween.target);
        }
        self.rendered.get(id).copied()
    }

    /// Begin moving `id` toward `(x, z)` and, if given, `rotation`.
    ///
    /// When `history` is supplied the settled start pose is pushed onto it.
    /// Returns the tween's target, or `None` if `id` is not tracked.
    #[allow(clippy::too_many_arguments)]
    pub fn animate_to(
        &mut self,
        id: &str,
        x: f32,
        z: f32,
        rotation: Option<f32>,
        now: Duration,
        history: Option<&mut UndoHistory>,
        surface: &mut dyn RenderSurface,
    ) -> Option<Pose> {
        let start = self.settle(id, surface)?;
        if let Some(history) = history {
            history.push(id, start);
        }

        let target = Pose::new(x, z, rotation.unwrap_or(start.rotation));
        let tween = Tween {
            start,
            target,
            rotation_delta: shortest_delta_degrees(start.rotation, target.rotation),
            started_at: now,
        };
        log::debug!(
            "animating {id} {:.3},{:.3} -> {:.3},{:.3} (turn {:+.1})",
            start.x,
            start.z,
            target.x,
            target.z,
            tween.rotation_delta
        );
        self.tweens.insert(id.to_string(), tween);
        Some(target)
    }

    /// Advance every running tween to `now`. Returns how many are still running.
    pub fn tick(&mut self, now: Duration, surface: &mut dyn RenderSurface) -> usize {
        let mut finished = Vec::new();
        for (id, tween) in &self.tweens {
            let t = progress(tween.started_at, now, self.duration);
            let pose = if t >= 1.0 {
                finished.push(id.clone());
                tween.target
            } else {
                tween.sample(self.easing.apply(t))
            };
            self.rendered.insert(id.clone(), pose);
            surface.set_pose(id, pose);
        }
        for id in finished {
            self.tweens.remove(&id);
        }
        self.tweens.len()
    }
}
