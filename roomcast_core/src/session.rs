//! The owned aggregate behind one open room.
//!
//! `RoomSession` is the only writer of [`RoomState`]. The host drives it from a
//! single loop: instructions, undo/swap commands, finished asset loads, and
//! frame ticks all arrive as method calls, so a mutation is always complete
//! before the next one starts.

use std::time::Duration;

use crate::animation::{AnimationScheduler, DEFAULT_ANIMATION};
use crate::camera::{CameraRig, DEFAULT_VIEW_TRANSITION};
use crate::catalog::Catalog;
use crate::error::{AssetLoadError, CatalogError};
use crate::history::{UndoHistory, HISTORY_DEPTH};
use crate::state::{Pose, RoomState};
use crate::surface::RenderSurface;
use crate::validator::ValidatedInstruction;
use crate::variants::{AssetRequest, LoadOutcome, ModelBounds, VariantDescriptor, VariantSwapManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub animation: Duration,
    pub camera: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        SessionTiming {
            animation: DEFAULT_ANIMATION,
            camera: DEFAULT_VIEW_TRANSITION,
        }
    }
}

/// What an applied instruction dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub moved: Vec<String>,
    pub swapped: Vec<String>,
}

pub struct RoomSession<S: RenderSurface> {
    state: RoomState,
    history: UndoHistory,
    scheduler: AnimationScheduler,
    swaps: VariantSwapManager,
    camera: CameraRig,
    surface: S,
    clock: Duration,
    room_description: String,
}

impl<S: RenderSurface> RoomSession<S> {
    pub fn new(catalog: Catalog, surface: S, timing: SessionTiming) -> Result<Self, CatalogError> {
        let state = RoomState::from_catalog(catalog)?;
        let mut session = RoomSession {
            state,
            history: UndoHistory::new(HISTORY_DEPTH),
            scheduler: AnimationScheduler::new(timing.animation),
            swaps: VariantSwapManager::new(),
            camera: CameraRig::new(timing.camera),
            surface,
            clock: Duration::ZERO,
            room_description: String::new(),
        };

        let placements: Vec<(String, Pose)> = session
            .state
            .items()
            .map(|item| (item.id().to_string(), item.pose()))
            .collect();
        for (id, pose) in placements {
            session.scheduler.track(&id, pose);
            session
                .swaps
                .present(&session.state, &mut session.surface, &id, pose);
        }
        log::info!(
            "room session ready with {} items ({} model loads queued)",
            session.state.items().len(),
            session.swaps.pending_loads()
        );
        Ok(session)
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Time of the last tick; new tweens start from here.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Description from the last successfully applied instruction.
    pub fn room_description(&self) -> &str {
        &self.room_description
    }

    pub fn set_room_description(&mut self, description: impl Into<String>) {
        self.room_description = description.into();
    }

    pub fn can_undo(&self, id: &str) -> bool {
        !self.history.is_empty(id)
    }

    /// Clamp to the item's footprint, record it as authoritative, and start
    /// the tween. The settled pre-move pose goes onto the undo stack.
    pub fn animate_to(&mut self, id: &str, x: f32, z: f32, rotation: Option<f32>) -> Option<Pose> {
        let item = self.state.get(id)?;
        let (x, z) = self
            .state
            .room()
            .clamp_center(x, z, item.width(), item.depth());
        let target = Pose::new(x, z, rotation.unwrap_or(item.pose().rotation));
        self.state.set_pose(id, target);
        self.scheduler.animate_to(
            id,
            target.x,
            target.z,
            Some(target.rotation),
            self.clock,
            Some(&mut self.history),
            &mut self.surface,
        )
    }

    pub fn undo(&mut self, id: &str) -> bool {
        let Some(previous) = self.history.pop(id) else {
            log::debug!("nothing to undo for {id}");
            return false;
        };
        self.state.set_pose(id, previous);
        self.scheduler.animate_to(
            id,
            previous.x,
            previous.z,
            Some(previous.rotation),
            self.clock,
            None,
            &mut self.surface,
        );
        log::info!(
            "undo {id} -> {:.2},{:.2} @ {:.0} ({} left)",
            previous.x,
            previous.z,
            previous.rotation,
            self.history.len(id)
        );
        true
    }

    pub fn swap(&mut self, id: &str) -> Option<VariantDescriptor> {
        self.swaps.swap(
            &mut self.state,
            &mut self.history,
            &mut self.scheduler,
            &mut self.surface,
            id,
        )
    }

    /// Apply validated actions in order, then keep the new room description.
    ///
    /// A swap writes its pose before swapping, since the new variant is
    /// anchored on the stored pose. A move is clamped again against the
    /// item's current footprint, which an earlier swap in the same payload
    /// may have changed.
    pub fn apply(&mut self, instruction: &ValidatedInstruction) -> ApplySummary {
        let mut summary = ApplySummary::default();
        for action in &instruction.actions {
            if action.swap {
                let pose = Pose::new(action.x, action.z, action.rotation);
                if self.state.set_pose(&action.id, pose) && self.swap(&action.id).is_some() {
                    summary.swapped.push(action.id.clone());
                }
            } else if self
                .animate_to(&action.id, action.x, action.z, Some(action.rotation))
                .is_some()
            {
                summary.moved.push(action.id.clone());
            }
        }
        self.room_description = instruction.room_description.clone();
        log::info!(
            "applied instruction: {} moved, {} swapped",
            summary.moved.len(),
            summary.swapped.len()
        );
        summary
    }

    /// Advance tweens and the camera to `now`. Returns whether anything is
    /// still in motion.
    pub fn tick(&mut self, now: Duration) -> bool {
        self.clock = self.clock.max(now);
        let furniture = self.scheduler.tick(self.clock, &mut self.surface);
        let camera = self.camera.tick(self.clock, &mut self.surface);
        furniture > 0 || camera
    }

    pub fn advance(&mut self, delta: Duration) -> bool {
        self.tick(self.clock + delta)
    }

    pub fn transition_to_view(&mut self, name: &str) -> bool {
        self.camera.transition_to(name, self.clock)
    }

    pub fn take_asset_requests(&mut self) -> Vec<AssetRequest> {
        self.swaps.take_requests()
    }

    pub fn complete_asset_load(
        &mut self,
        ticket: u64,
        result: Result<ModelBounds, AssetLoadError>,
    ) -> LoadOutcome {
        self.swaps.complete_load(
            &mut self.state,
            &self.scheduler,
            &mut self.surface,
            ticket,
            result,
        )
    }

    pub fn pick(&self, sx: f32, sy: f32) -> Option<String> {
        self.surface.pick(sx, sy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessSurface, Visual};
    use crate::validator::validate;

    fn session() -> RoomSession<HeadlessSurface> {
        RoomSession::new(Catalog::builtin(), HeadlessSurface::new(), SessionTiming::default())
            .expect("builtin catalog is valid")
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn startup_places_every_item() {
        let mut session = session();
        assert_eq!(session.surface().object_count(), 2);
        let requests = session.take_asset_requests();
        let ids: Vec<&str> = requests.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["sofa", "bed", "wardrobe"]);
        for request in requests {
            session.complete_asset_load(
                request.ticket,
                Err(AssetLoadError::MissingBounds(request.model.clone())),
            );
        }
        assert_eq!(session.surface().object_count(), 5);
    }

    #[test]
    fn history_keeps_the_ten_most_recent_poses() {
        let mut session = session();
        let targets: Vec<f32> = (0..12).map(|i| 1.2 + 0.2 * i as f32).collect();
        for &x in &targets {
            session.animate_to("sofa", x, 2.0, None);
            session.advance(ms(100));
        }
        let expected: Vec<Pose> = targets[1..11]
            .iter()
            .map(|&x| Pose::new(x, 2.0, 0.0))
            .collect();
        assert_eq!(session.history().entries("sofa"), expected);
    }

    #[test]
    fn undo_restores_the_previous_pose_exactly() {
        let mut session = session();
        let start = session.state().get("desk").map(|desk| desk.pose());
        session.animate_to("desk", 2.0, 3.0, Some(90.0));
        session.advance(ms(200));

        assert!(session.undo("desk"));
        assert_eq!(session.state().get("desk").map(|desk| desk.pose()), start);
        assert!(!session.can_undo("desk"));
        session.advance(ms(600));
        assert_eq!(session.surface().pose("desk"), start);
        assert!(!session.undo("desk"));
    }

    #[test]
    fn swap_clears_undo_and_keeps_the_pose() {
        let mut session = session();
        session.animate_to("coffee_table", 2.0, 4.0, Some(30.0));
        assert!(session.can_undo("coffee_table"));

        let descriptor = session.swap("coffee_table").expect("swappable");
        assert_eq!(descriptor.label, "Round Coffee Table");
        assert!(!session.undo("coffee_table"));
        let object = session.surface().object("coffee_table").expect("placeholder");
        assert_eq!(object.pose, Pose::new(2.0, 4.0, 30.0));
        assert!(matches!(object.visual, Visual::Placeholder { .. }));
        assert!(session.swap("desk").is_none());
    }

    #[test]
    fn applied_instructions_respect_room_bounds() {
        let mut session = session();
        let raw = r#"{"actions":[
            {"id":"sofa","x":10,"z":-3},
            {"id":"bed","x":-4,"z":40,"rotation":450},
            {"id":"desk","x":2.5,"z":4},
            {"id":"lamp","x":1,"z":1}],
            "room_description":"A sofa against the wall.","user_message":"Done."}"#;
        let instruction = validate(raw, session.state()).expect("valid payload");
        let summary = session.apply(&instruction);
        assert_eq!(summary.moved, vec!["sofa", "bed", "desk"]);
        assert_eq!(session.room_description(), "A sofa against the wall.");

        session.advance(ms(500));
        let room = session.state().room();
        for item in session.state().items() {
            let pose = item.pose();
            assert!(room.contains_footprint(pose.x, pose.z, item.width(), item.depth()), "{}", item.id());
            assert_eq!(session.scheduler().rendered_pose(item.id()), Some(pose));
        }
        assert_eq!(session.state().get("bed").map(|bed| bed.pose().rotation), Some(90.0));
    }

    #[test]
    fn swap_actions_write_the_pose_before_swapping() {
        let mut session = session();
        let raw = r#"{"actions":[{"id":"sofa","x":2.5,"z":5,"rotation":180,"swap":true}],
            "room_description":"d","user_message":"m"}"#;
        let instruction = validate(raw, session.state()).expect("valid payload");
        let summary = session.apply(&instruction);
        assert_eq!(summary.swapped, vec!["sofa"]);

        let sofa = session.state().get("sofa").expect("sofa");
        assert_eq!(sofa.label(), "Sectional Sofa");
        assert_eq!(sofa.pose(), Pose::new(2.5, 5.0, 180.0));
        assert_eq!(session.surface().pose("sofa"), Some(Pose::new(2.5, 5.0, 180.0)));
    }

    #[test]
    fn move_after_swap_is_clamped_to_the_new_footprint() {
        let mut session = session();
        let raw = r#"{"actions":[
            {"id":"sofa","x":2.5,"z":4,"swap":true},
            {"id":"sofa","x":0,"z":0}],
            "room_description":"d","user_message":"m"}"#;
        let instruction = validate(raw, session.state()).expect("valid payload");
        let summary = session.apply(&instruction);
        assert_eq!(summary.swapped, vec!["sofa"]);
        assert_eq!(summary.moved, vec!["sofa"]);
        session.advance(ms(600));

        let sofa = session.state().get("sofa").expect("sofa");
        assert_eq!(sofa.label(), "Sectional Sofa");
        let pose = sofa.pose();
        assert!(
            session
                .state()
                .room()
                .contains_footprint(pose.x, pose.z, sofa.width(), sofa.depth()),
            "{pose:?}"
        );
        assert!((pose.x - sofa.width() / 2.0).abs() < 1e-4, "{pose:?}");
        assert!((pose.z - sofa.depth() / 2.0).abs() < 1e-4, "{pose:?}");
        assert_eq!(session.scheduler().rendered_pose("sofa"), Some(pose));
    }

    #[test]
    fn camera_ticks_with_the_session() {
        let mut session = session();
        assert!(session.transition_to_view("birdseye"));
        assert!(session.advance(ms(100)));
        session.advance(ms(800));
        assert_eq!(session.surface().camera(), crate::camera::viewpoint("birdseye"));
    }
}
