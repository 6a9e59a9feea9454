//! Cycling items through their catalog variants and keeping the scene's
//! representation in step with the new footprint.
//!
//! Model loads are asynchronous from the room's point of view: presenting a
//! variant with a model reference queues an [`AssetRequest`], the host loads
//! it however it likes, and hands the result back to
//! [`VariantSwapManager::complete_load`]. Every request carries a ticket so a
//! load that finishes after the item was swapped again is discarded.

use std::collections::BTreeMap;

use glam::Vec3;
use serde::Serialize;

use crate::animation::AnimationScheduler;
use crate::error::AssetLoadError;
use crate::history::UndoHistory;
use crate::state::{FurnitureItem, Pose, RoomState};
use crate::surface::{Footprint, RenderSurface, SceneObject, Visual};

/// Label gap above a loaded model's top, which sits a little tighter than
/// the generated-box clearance.
pub const MODEL_LABEL_CLEARANCE: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl ModelBounds {
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn union(&self, other: &ModelBounds) -> ModelBounds {
        ModelBounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Per-axis scale and local offset that make a model fill its footprint,
/// centered on the pose with its lowest point on the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelFit {
    pub scale: Vec3,
    pub anchor: Vec3,
}

pub fn fit_model(bounds: &ModelBounds, footprint: &Footprint) -> Option<ModelFit> {
    let size = bounds.size();
    if !size.is_finite() || size.min_element() <= f32::EPSILON {
        return None;
    }
    let declared = Vec3::new(footprint.width, footprint.height, footprint.depth);
    let scale = declared / size;
    let center = (bounds.min + bounds.max) * 0.5;
    Some(ModelFit {
        scale,
        anchor: Vec3::new(
            -center.x * scale.x,
            -bounds.min.y * scale.y,
            -center.z * scale.z,
        ),
    })
}

/// What the command surface reports back after a successful swap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantDescriptor {
    pub id: String,
    pub variant: usize,
    pub label: String,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl VariantDescriptor {
    fn of(item: &FurnitureItem) -> Self {
        VariantDescriptor {
            id: item.id().to_string(),
            variant: item.variant(),
            label: item.label().to_string(),
            width: item.width(),
            depth: item.depth(),
            height: item.height(),
            color: item.color().to_string(),
            model: item.model().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub ticket: u64,
    pub item_id: String,
    pub model: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Fallback,
    Stale,
}

#[derive(Debug, Default)]
pub struct VariantSwapManager {
    next_ticket: u64,
    in_flight: BTreeMap<String, u64>,
    queued: Vec<AssetRequest>,
}

impl VariantSwapManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put the item's current variant on the surface at `pose`: a generated
    /// box straight away, or a queued model load.
    pub fn present(
        &mut self,
        state: &RoomState,
        surface: &mut dyn RenderSurface,
        id: &str,
        pose: Pose,
    ) {
        let Some(item) = state.get(id) else {
            return;
        };
        match item.model() {
            Some(model) => {
                self.next_ticket += 1;
                let ticket = self.next_ticket;
                self.in_flight.insert(id.to_string(), ticket);
                self.queued.push(AssetRequest {
                    ticket,
                    item_id: id.to_string(),
                    model: model.to_string(),
                });
                log::debug!("queued model load #{ticket} {model} for {id}");
            }
            None => {
                self.in_flight.remove(id);
                surface.spawn(id, SceneObject::placeholder(item, pose));
            }
        }
    }

    /// Advance `id` to its next catalog variant. `None` when the item is
    /// unknown or has fewer than two variants.
    pub fn swap(
        &mut self,
        state: &mut RoomState,
        history: &mut UndoHistory,
        scheduler: &mut AnimationScheduler,
        surface: &mut dyn RenderSurface,
        id: &str,
    ) -> Option<VariantDescriptor> {
        let variant_count = state.catalog().get(id)?.variants.len();
        if variant_count < 2 {
            log::debug!("{id} has no alternative variants");
            return None;
        }
        let item = state.get(id)?;
        let next = (item.variant() + 1) % variant_count;
        let pose = item.pose();

        scheduler.track(id, pose);
        surface.remove(id);
        self.in_flight.remove(id);
        history.clear(id);

        let descriptor = VariantDescriptor::of(state.apply_variant(id, next)?);
        log::info!(
            "swapped {id} to variant {next} ({}, {:.2}x{:.2}x{:.2})",
            descriptor.label,
            descriptor.width,
            descriptor.depth,
            descriptor.height
        );
        self.present(state, surface, id, pose);
        Some(descriptor)
    }

    /// Drain model loads queued since the last call.
    pub fn take_requests(&mut self) -> Vec<AssetRequest> {
        std::mem::take(&mut self.queued)
    }

    pub fn is_loading(&self, id: &str) -> bool {
        self.in_flight.contains_key(id)
    }

    pub fn pending_loads(&self) -> usize {
        self.in_flight.len()
    }

    /// Apply a finished model load. Failures fall back to a generated box.
    pub fn complete_load(
        &mut self,
        state: &mut RoomState,
        scheduler: &AnimationScheduler,
        surface: &mut dyn RenderSurface,
        ticket: u64,
        result: Result<ModelBounds, AssetLoadError>,
    ) -> LoadOutcome {
        let Some(id) = self
            .in_flight
            .iter()
            .find(|(_, pending)| **pending == ticket)
            .map(|(id, _)| id.clone())
        else {
            log::debug!("discarding stale model load #{ticket}");
            return LoadOutcome::Stale;
        };
        self.in_flight.remove(&id);

        let Some(item) = state.get(&id) else {
            return LoadOutcome::Stale;
        };
        let pose = scheduler.rendered_pose(&id).unwrap_or_else(|| item.pose());
        let footprint = Footprint::of(item);
        let model = item.model().unwrap_or_default().to_string();

        let fitted = result.and_then(|bounds| {
            fit_model(&bounds, &footprint)
                .ok_or_else(|| AssetLoadError::DegenerateBounds(model.clone()))
        });
        match fitted {
            Ok(fit) => {
                surface.spawn(
                    &id,
                    SceneObject {
                        pose,
                        footprint,
                        visual: Visual::Model {
                            model,
                            scale: fit.scale.to_array(),
                            anchor: fit.anchor.to_array(),
                        },
                    },
                );
                state.set_label_offset(&id, footprint.height + MODEL_LABEL_CLEARANCE);
                LoadOutcome::Applied
            }
            Err(err) => {
                log::warn!("{err}; showing placeholder box for {id}");
                surface.spawn(&id, SceneObject::placeholder(item, pose));
                LoadOutcome::Fallback
            }
        }
    }
}
