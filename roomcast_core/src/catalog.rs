//! Static list of placeable furniture and the alternative footprints each
//! item can be swapped between.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::geometry::RoomDimensions;

/// One appearance an item can take: footprint, color, and optional model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub label: String,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    pub color: String,
    /// Model file relative to the asset root; `None` renders a generated box.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// A catalog entry. The first variant is the item's initial appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FurnitureSpec {
    pub id: String,
    pub x: f32,
    pub z: f32,
    #[serde(default)]
    pub rotation: f32,
    pub variants: Vec<VariantSpec>,
}

impl FurnitureSpec {
    pub fn is_swappable(&self) -> bool {
        self.variants.len() >= 2
    }

    pub fn variant(&self, index: usize) -> Option<&VariantSpec> {
        self.variants.get(index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub room: RoomDimensions,
    pub items: Vec<FurnitureSpec>,
}

impl Catalog {
    /// Studio apartment furnished with the default five pieces.
    pub fn builtin() -> Self {
        let items = vec![
            spec(
                "sofa",
                (1.5, 2.0),
                vec![
                    variant("Sofa", (2.2, 0.9, 0.85), "#4A90D9", Some("couch_pillows.gltf")),
                    variant("Sectional Sofa", (2.6, 1.6, 0.85), "#3E7CB1", None),
                ],
            ),
            spec(
                "bed",
                (3.0, 5.0),
                vec![
                    variant("Queen Bed", (1.6, 2.0, 0.50), "#7B68EE", Some("bed_double_A.gltf")),
                    variant("Single Bed", (1.0, 2.0, 0.45), "#9A8CF0", None),
                ],
            ),
            spec(
                "desk",
                (1.0, 6.5),
                vec![variant("Desk", (1.2, 0.6, 0.75), "#8B6914", None)],
            ),
            spec(
                "wardrobe",
                (4.0, 1.0),
                vec![variant(
                    "Wardrobe",
                    (1.2, 0.6, 2.0),
                    "#5D4037",
                    Some("cabinet_medium.gltf"),
                )],
            ),
            spec(
                "coffee_table",
                (1.5, 3.0),
                vec![
                    variant("Coffee Table", (1.0, 0.5, 0.45), "#A0522D", None),
                    variant("Round Coffee Table", (0.8, 0.8, 0.42), "#B5651D", None),
                ],
            ),
        ];

        Catalog {
            room: RoomDimensions::default(),
            items,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&FurnitureSpec> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Reject catalogs whose starting layout would break the room-bound
    /// invariant or whose variants could never be placed.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.items.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = BTreeSet::new();
        for item in &self.items {
            if !seen.insert(item.id.as_str()) {
                return Err(CatalogError::DuplicateId(item.id.clone()));
            }
            let Some(initial) = item.variants.first() else {
                return Err(CatalogError::NoVariants(item.id.clone()));
            };
            for variant in &item.variants {
                let dims = [variant.width, variant.depth, variant.height];
                if dims.iter().any(|value| !(*value > 0.0) || !value.is_finite()) {
                    return Err(CatalogError::InvalidDimension {
                        id: item.id.clone(),
                        label: variant.label.clone(),
                    });
                }
                if !self.room.fits(variant.width, variant.depth, variant.height) {
                    return Err(CatalogError::OversizedVariant {
                        id: item.id.clone(),
                        label: variant.label.clone(),
                    });
                }
            }
            if !self
                .room
                .contains_footprint(item.x, item.z, initial.width, initial.depth)
            {
                return Err(CatalogError::StartOutOfBounds(item.id.clone()));
            }
        }

        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn spec(id: &str, (x, z): (f32, f32), variants: Vec<VariantSpec>) -> FurnitureSpec {
    FurnitureSpec {
        id: id.to_string(),
        x,
        z,
        rotation: 0.0,
        variants,
    }
}

fn variant(
    label: &str,
    (width, depth, height): (f32, f32, f32),
    color: &str,
    model: Option<&str>,
) -> VariantSpec {
    VariantSpec {
        label: label.to_string(),
        width,
        depth,
        height,
        color: color.to_string(),
        model: model.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let catalog = Catalog::builtin();
        catalog.validate().expect("builtin catalog validates");
        assert_eq!(catalog.items.len(), 5);
        assert!(catalog.get("sofa").is_some_and(FurnitureSpec::is_swappable));
        assert!(!catalog.get("desk").is_some_and(FurnitureSpec::is_swappable));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut catalog = Catalog::builtin();
        let copy = catalog.items[0].clone();
        catalog.items.push(copy);
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::DuplicateId(id)) if id == "sofa"
        ));
    }

    #[test]
    fn start_pose_must_fit_the_initial_footprint() {
        let mut catalog = Catalog::builtin();
        catalog.items[2].x = 0.5;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::StartOutOfBounds(id)) if id == "desk"
        ));
    }

    #[test]
    fn json_catalog_defaults_room_and_rotation() {
        let json = r##"{
            "items": [
                {"id": "lamp", "x": 0.5, "z": 0.5,
                 "variants": [{"label": "Lamp", "width": 0.3, "depth": 0.3, "height": 1.6, "color": "#FFFFFF"}]}
            ]
        }"##;
        let catalog = Catalog::from_json_str(json).expect("catalog parses");
        assert_eq!(catalog.room, RoomDimensions::default());
        assert_eq!(catalog.items[0].rotation, 0.0);
        assert_eq!(catalog.items[0].variants[0].model, None);
    }

    #[test]
    fn zero_sized_variant_is_rejected() {
        let json = r##"{"items": [{"id": "rug", "x": 1, "z": 1,
            "variants": [{"label": "Rug", "width": 1.0, "depth": 1.0, "height": 0.0, "color": "#000"}]}]}"##;
        assert!(matches!(
            Catalog::from_json_str(json),
            Err(CatalogError::InvalidDimension { .. })
        ));
    }
}
