//! Model bounds from glTF documents.
//!
//! Only the JSON half of a `.gltf` file is read: the `min`/`max` recorded on
//! each primitive's `POSITION` accessor are enough to size and floor-anchor
//! the model, so vertex buffers are never touched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glam::Vec3;
use roomcast_core::{AssetLoadError, AssetRequest, ModelBounds};
use serde::Deserialize;
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
struct GltfDocument {
    #[serde(default)]
    accessors: Vec<Accessor>,
    #[serde(default)]
    meshes: Vec<Mesh>,
}

#[derive(Debug, Deserialize)]
struct Accessor {
    #[serde(default)]
    min: Option<Vec<f32>>,
    #[serde(default)]
    max: Option<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct Mesh {
    #[serde(default)]
    primitives: Vec<Primitive>,
}

#[derive(Debug, Deserialize)]
struct Primitive {
    #[serde(default)]
    attributes: BTreeMap<String, usize>,
}

fn vec3(values: &[f32]) -> Option<Vec3> {
    match values {
        [x, y, z, ..] => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}

/// Union of every mesh primitive's position bounds.
pub fn bounds_from_gltf(model: &str, json: &str) -> Result<ModelBounds, AssetLoadError> {
    let document: GltfDocument =
        serde_json::from_str(json).map_err(|err| AssetLoadError::Malformed {
            model: model.to_string(),
            reason: err.to_string(),
        })?;

    let mut bounds: Option<ModelBounds> = None;
    for primitive in document.meshes.iter().flat_map(|mesh| &mesh.primitives) {
        let Some(&index) = primitive.attributes.get("POSITION") else {
            continue;
        };
        let Some(accessor) = document.accessors.get(index) else {
            log::debug!("{model}: POSITION accessor {index} does not exist");
            continue;
        };
        let (Some(min), Some(max)) = (
            accessor.min.as_deref().and_then(vec3),
            accessor.max.as_deref().and_then(vec3),
        ) else {
            continue;
        };
        let primitive_bounds = ModelBounds { min, max };
        bounds = Some(match bounds {
            Some(existing) => existing.union(&primitive_bounds),
            None => primitive_bounds,
        });
    }
    bounds.ok_or_else(|| AssetLoadError::MissingBounds(model.to_string()))
}

#[derive(Debug)]
pub struct AssetCompletion {
    pub ticket: u64,
    pub item_id: String,
    pub result: Result<ModelBounds, AssetLoadError>,
}

#[derive(Debug, Clone)]
pub struct GltfAssetLoader {
    root: PathBuf,
}

impl GltfAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        GltfAssetLoader { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, model: &str) -> PathBuf {
        self.root.join(model)
    }

    pub async fn load(&self, model: &str) -> Result<ModelBounds, AssetLoadError> {
        let path = self.resolve(model);
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| AssetLoadError::Unreadable {
                model: model.to_string(),
                reason: format!("{}: {err}", path.display()),
            })?;
        bounds_from_gltf(model, &json)
    }

    /// Load in the background and post the result to `completions`.
    pub fn spawn(&self, request: AssetRequest, completions: mpsc::UnboundedSender<AssetCompletion>) {
        let loader = self.clone();
        tokio::spawn(async move {
            let result = loader.load(&request.model).await;
            let completion = AssetCompletion {
                ticket: request.ticket,
                item_id: request.item_id,
                result,
            };
            if completions.send(completion).is_err() {
                log::debug!("asset completion dropped; host loop has exited");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PRIMITIVES: &str = r#"{
        "asset": {"version": "2.0"},
        "accessors": [
            {"count": 3, "type": "VEC3", "min": [-1.0, 0.0, -0.5], "max": [1.0, 0.8, 0.5]},
            {"count": 3, "type": "VEC3"},
            {"count": 3, "type": "VEC3", "min": [-0.2, -0.1, -0.4], "max": [1.4, 0.4, 0.3]}
        ],
        "meshes": [
            {"primitives": [{"attributes": {"POSITION": 0, "NORMAL": 1}}]},
            {"primitives": [{"attributes": {"POSITION": 2}}, {"attributes": {"NORMAL": 1}}]}
        ]
    }"#;

    #[test]
    fn position_bounds_are_unioned_across_meshes() {
        let bounds = bounds_from_gltf("couch.gltf", TWO_PRIMITIVES).expect("bounds present");
        assert_eq!(bounds.min, Vec3::new(-1.0, -0.1, -0.5));
        assert_eq!(bounds.max, Vec3::new(1.4, 0.8, 0.5));
    }

    #[test]
    fn documents_without_positions_have_no_bounds() {
        let json = r#"{"meshes":[{"primitives":[{"attributes":{"POSITION":4}}]}]}"#;
        assert!(matches!(
            bounds_from_gltf("ghost.gltf", json),
            Err(AssetLoadError::MissingBounds(model)) if model == "ghost.gltf"
        ));
        assert!(matches!(
            bounds_from_gltf("binary.glb", "glTF\u{2}"),
            Err(AssetLoadError::Malformed { .. })
        ));
    }
}
