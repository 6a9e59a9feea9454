//! Authoritative per-item pose and variant store.
//!
//! Items are created once from the catalog and never added or removed. Reads
//! are public; writes are `pub(crate)` so only the animation scheduler, undo,
//! and swap paths in [`crate::session::RoomSession`] can move furniture.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, FurnitureSpec, VariantSpec};
use crate::error::CatalogError;
use crate::geometry::{normalize_degrees, RoomDimensions};

/// Gap between an item's top and its floating display label.
pub const LABEL_CLEARANCE: f32 = 0.2;

/// Floor-anchored placement of one item: center `(x, z)` and yaw in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f32,
    pub z: f32,
    pub rotation: f32,
}

impl Pose {
    pub fn new(x: f32, z: f32, rotation: f32) -> Self {
        Self {
            x,
            z,
            rotation: normalize_degrees(rotation),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FurnitureItem {
    id: String,
    label: String,
    width: f32,
    depth: f32,
    height: f32,
    color: String,
    model: Option<String>,
    pose: Pose,
    variant: usize,
    label_offset: f32,
}

impl FurnitureItem {
    fn from_spec(spec: &FurnitureSpec, initial: &VariantSpec) -> Self {
        FurnitureItem {
            id: spec.id.clone(),
            label: initial.label.clone(),
            width: initial.width,
            depth: initial.depth,
            height: initial.height,
            color: initial.color.clone(),
            model: initial.model.clone(),
            pose: Pose::new(spec.x, spec.z, spec.rotation),
            variant: 0,
            label_offset: initial.height + LABEL_CLEARANCE,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn depth(&self) -> f32 {
        self.depth
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn variant(&self) -> usize {
        self.variant
    }

    /// Height above the floor at which the item's name tag is drawn.
    pub fn label_offset(&self) -> f32 {
        self.label_offset
    }
}

/// Serialized room snapshot handed to the reasoning service.
#[derive(Debug, Serialize)]
pub struct RoomDescription<'a> {
    pub room: RoomDimensions,
    pub furniture: Vec<ItemDescription<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ItemDescription<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    pub x: f32,
    pub z: f32,
    pub rotation: f32,
    pub color: &'a str,
    pub swappable: bool,
}

#[derive(Debug, Clone)]
pub struct RoomState {
    catalog: Catalog,
    items: Vec<FurnitureItem>,
    index: BTreeMap<String, usize>,
}

impl RoomState {
    pub fn from_catalog(catalog: Catalog) -> Result<Self, CatalogError> {
        catalog.validate()?;

        let mut items = Vec::with_capacity(catalog.items.len());
        let mut index = BTreeMap::new();
        for spec in &catalog.items {
            let initial = spec
                .variants
                .first()
                .ok_or_else(|| CatalogError::NoVariants(spec.id.clone()))?;
            index.insert(spec.id.clone(), items.len());
            items.push(FurnitureItem::from_spec(spec, initial));
        }

        Ok(RoomState {
            catalog,
            items,
            index,
        })
    }

    pub fn room(&self) -> RoomDimensions {
        self.catalog.room
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn get(&self, id: &str) -> Option<&FurnitureItem> {
        self.index.get(id).map(|&slot| &self.items[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn items(&self) -> impl ExactSizeIterator<Item = &FurnitureItem> {
        self.items.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|item| item.id.as_str())
    }

    pub fn describe(&self) -> RoomDescription<'_> {
        let furniture = self
            .items
            .iter()
            .map(|item| ItemDescription {
                id: &item.id,
                label: &item.label,
                width: item.width,
                depth: item.depth,
                height: item.height,
                x: item.pose.x,
                z: item.pose.z,
                rotation: item.pose.rotation,
                color: &item.color,
                swappable: self
                    .catalog
                    .get(&item.id)
                    .is_some_and(FurnitureSpec::is_swappable),
            })
            .collect();
        RoomDescription {
            room: self.room(),
            furniture,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.describe())
    }

    pub(crate) fn set_pose(&mut self, id: &str, pose: Pose) -> bool {
        let Some(item) = self.item_mut(id) else {
            return false;
        };
        item.pose = Pose::new(pose.x, pose.z, pose.rotation);
        true
    }

    /// Switch an item to catalog variant `index`, keeping its pose.
    pub(crate) fn apply_variant(&mut self, id: &str, index: usize) -> Option<&FurnitureItem> {
        let variant = self.catalog.get(id)?.variant(index)?.clone();
        let item = self.item_mut(id)?;
        item.label = variant.label;
        item.width = variant.width;
        item.depth = variant.depth;
        item.height = variant.height;
        item.color = variant.color;
        item.model = variant.model;
        item.variant = index;
        item.label_offset = variant.height + LABEL_CLEARANCE;
        Some(item)
    }

    pub(crate) fn set_label_offset(&mut self, id: &str, offset: f32) {
        if let Some(item) = self.item_mut(id) {
            item.label_offset = offset;
        }
    }

    fn item_mut(&mut self, id: &str) -> Option<&mut FurnitureItem> {
        let slot = *self.index.get(id)?;
        self.items.get_mut(slot)
    }
}
