use std::fs;

use anyhow::Result;
use roomcast_core::{
    AssetLoadError, Catalog, HeadlessSurface, LoadOutcome, RoomSession, SessionTiming, Visual,
};
use roomcast_engine::GltfAssetLoader;
use tempfile::tempdir;
use tokio::sync::mpsc;

const COUCH: &str = r#"{
    "asset": {"version": "2.0"},
    "accessors": [{"count": 24, "type": "VEC3", "min": [-1.0, 0.0, -0.5], "max": [1.0, 0.8, 0.5]}],
    "meshes": [{"primitives": [{"attributes": {"POSITION": 0}}]}]
}"#;

fn session() -> RoomSession<HeadlessSurface> {
    RoomSession::new(Catalog::builtin(), HeadlessSurface::new(), SessionTiming::default())
        .expect("builtin catalog")
}

#[tokio::test]
async fn present_models_load_and_missing_ones_fall_back() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("couch_pillows.gltf"), COUCH)?;
    let loader = GltfAssetLoader::new(dir.path());
    let mut session = session();

    let requests = session.take_asset_requests();
    assert_eq!(requests.len(), 3);
    let (tx, mut rx) = mpsc::unbounded_channel();
    for request in requests {
        loader.spawn(request, tx.clone());
    }
    drop(tx);

    while let Some(completion) = rx.recv().await {
        let expected = if completion.item_id == "sofa" {
            LoadOutcome::Applied
        } else {
            assert!(matches!(completion.result, Err(AssetLoadError::Unreadable { .. })));
            LoadOutcome::Fallback
        };
        assert_eq!(
            session.complete_asset_load(completion.ticket, completion.result),
            expected
        );
    }

    let sofa = session.surface().object("sofa").expect("sofa placed");
    match &sofa.visual {
        Visual::Model { model, scale, anchor } => {
            assert_eq!(model, "couch_pillows.gltf");
            assert!((scale[0] - 1.1).abs() < 1e-4);
            assert!((scale[1] - 1.0625).abs() < 1e-4);
            assert!((scale[2] - 0.9).abs() < 1e-4);
            assert!(anchor[1].abs() < 1e-6);
        }
        other => panic!("sofa should use its model, got {other:?}"),
    }
    let label = session.state().get("sofa").map(|sofa| sofa.label_offset());
    assert!(label.is_some_and(|offset| (offset - 1.0).abs() < 1e-5));

    let wardrobe = session.surface().object("wardrobe").expect("wardrobe placed");
    assert!(matches!(&wardrobe.visual, Visual::Placeholder { color } if color == "#5D4037"));
    assert_eq!(session.surface().object_count(), 5);
    Ok(())
}

#[tokio::test]
async fn swapping_back_before_a_load_finishes_discards_it() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("bed_double_A.gltf"), COUCH)?;
    let loader = GltfAssetLoader::new(dir.path());
    let mut session = session();

    let first = session
        .take_asset_requests()
        .into_iter()
        .find(|request| request.item_id == "bed")
        .expect("bed requested");
    session.swap("bed");
    let result = loader.load(&first.model).await;
    assert!(result.is_ok());
    assert_eq!(session.complete_asset_load(first.ticket, result), LoadOutcome::Stale);
    assert_eq!(
        session.state().get("bed").map(|bed| bed.label().to_string()),
        Some("Single Bed".to_string())
    );
    assert!(matches!(
        session.surface().object("bed").map(|object| &object.visual),
        Some(Visual::Placeholder { .. })
    ));
    Ok(())
}
