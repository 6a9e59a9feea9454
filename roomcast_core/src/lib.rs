//! Room model for the roomcast furniture rearranger.
//!
//! Everything that turns an untrusted placement command into a safe,
//! animated change of the room lives here: the catalog and per-item state,
//! the validator, the tween scheduler with its undo stacks, variant swaps,
//! and the camera rig. Rendering is abstracted behind [`RenderSurface`].

pub mod animation;
pub mod camera;
pub mod catalog;
pub mod error;
pub mod geometry;
pub mod history;
pub mod session;
pub mod state;
pub mod surface;
pub mod validator;
pub mod variants;

pub use animation::{AnimationScheduler, Easing};
pub use camera::{viewpoint, viewpoint_names, CameraPose, CameraRig};
pub use catalog::{Catalog, FurnitureSpec, VariantSpec};
pub use error::{AssetLoadError, CatalogError, ValidationError};
pub use geometry::{normalize_degrees, RoomDimensions};
pub use history::UndoHistory;
pub use session::{ApplySummary, RoomSession, SessionTiming};
pub use state::{FurnitureItem, Pose, RoomState};
pub use surface::{HeadlessSurface, RenderSurface, SceneObject, Visual};
pub use validator::{validate, SanitizedAction, ValidatedInstruction};
pub use variants::{AssetRequest, LoadOutcome, ModelBounds, VariantDescriptor};
