//! Tile store integration tests.
//!
//! Tests verify:
//! - A persisted tile set reopens with the same layout and tile bytes
//! - The on-disk layout follows `manifest.json` + `tiles/<level>/<row>_<col>.png`
//! - Malformed tile sets are rejected when opened, before any tile is read
//! - Missing and out-of-bounds tiles map to distinct errors
//! - Memory and directory stores serve identical tiles

use std::sync::Arc;

use pyramid_viewer::error::StoreError;
use pyramid_viewer::pyramid::{decode_tile, TileKey, TILE_SIZE};
use pyramid_viewer::store::{
    parse_tile_path, tile_path, write_tile_set, DirectoryTileStore, Manifest, MemoryTileStore,
    TileStore, MANIFEST_FILE,
};

use super::test_utils::{build_pyramid, directory_fixture, gradient_image};

// =============================================================================
// Persisted Layout
// =============================================================================

#[tokio::test]
async fn test_written_files_follow_convention() {
    let dir = tempfile::tempdir().unwrap();
    let pyramid = build_pyramid(gradient_image(300, 200));
    write_tile_set(&pyramid, dir.path()).await.unwrap();

    let manifest: serde_json::Value =
        serde_json::from_slice(&std::fs::read(dir.path().join(MANIFEST_FILE)).unwrap()).unwrap();
    assert_eq!(manifest["originalDimensions"]["width"], 300);
    assert_eq!(manifest["originalDimensions"]["height"], 200);
    assert_eq!(manifest["numLevels"], 3);

    for level in pyramid.layout().levels() {
        for row in 0..level.rows {
            for col in 0..level.cols {
                let key = TileKey::new(level.index, row, col);
                let path = dir.path().join(tile_path(key));
                assert!(path.is_file(), "missing {}", path.display());
            }
        }
    }
    assert!(dir.path().join("tiles/2/1_2.png").is_file());
    assert!(!dir.path().join("tiles/2/2_0.png").exists());
}

#[tokio::test]
async fn test_reopened_store_matches_memory_store() {
    let pyramid = build_pyramid(gradient_image(520, 260));
    let dir = tempfile::tempdir().unwrap();
    write_tile_set(&pyramid, dir.path()).await.unwrap();

    let disk = DirectoryTileStore::open(dir.path()).await.unwrap();
    let memory = MemoryTileStore::new(Arc::clone(&pyramid));

    assert_eq!(disk.layout(), memory.layout());
    assert_eq!(*disk.manifest(), pyramid.manifest());

    for (key, _) in pyramid.tiles() {
        let a = disk.get(*key).await.unwrap();
        let b = memory.get(*key).await.unwrap();
        assert_eq!(a, b, "tile {:?}", key);
    }
}

#[tokio::test]
async fn test_directory_tiles_decode_full_size() {
    let (_dir, store) = directory_fixture(gradient_image(200, 150)).await;
    let layout = store.layout().clone();

    for level in layout.levels() {
        for row in 0..level.rows {
            for col in 0..level.cols {
                let bytes = store.get(TileKey::new(level.index, row, col)).await.unwrap();
                let tile = decode_tile(&bytes).unwrap();
                assert_eq!(tile.dimensions(), (TILE_SIZE, TILE_SIZE));
            }
        }
    }
}

#[test]
fn test_path_convention_round_trip() {
    let key = TileKey::new(5, 12, 7);
    assert_eq!(tile_path(key), "tiles/5/12_7.png");
    assert_eq!(parse_tile_path("tiles/5/12_7.png"), Some(key));
    assert_eq!(parse_tile_path("tiles/5/12-7.png"), None);
    assert_eq!(parse_tile_path("other/5/12_7.png"), None);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_missing_tile_file() {
    let (dir, store) = directory_fixture(gradient_image(300, 300)).await;
    let key = TileKey::new(2, 1, 1);
    std::fs::remove_file(dir.path().join(tile_path(key))).unwrap();

    match store.get(key).await {
        Err(StoreError::TileNotFound { level, row, col }) => {
            assert_eq!((level, row, col), (2, 1, 1));
        }
        other => panic!("expected TileNotFound, got {:?}", other),
    }
    assert!(store.get(TileKey::new(2, 0, 0)).await.is_ok());
}

#[tokio::test]
async fn test_out_of_bounds_keys() {
    let (_dir, store) = directory_fixture(gradient_image(300, 300)).await;

    for key in [
        TileKey::new(3, 0, 0),
        TileKey::new(2, 3, 0),
        TileKey::new(2, 0, 3),
        TileKey::new(0, 1, 0),
    ] {
        assert!(
            matches!(store.get(key).await, Err(StoreError::TileOutOfBounds { .. })),
            "key {:?}",
            key
        );
    }
}

#[tokio::test]
async fn test_open_without_manifest() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        DirectoryTileStore::open(dir.path()).await,
        Err(StoreError::InvalidManifest { .. })
    ));
}

#[tokio::test]
async fn test_open_rejects_malformed_manifests() {
    let cases: [&[u8]; 5] = [
        b"{not json",
        br#"{"numLevels":4}"#,
        br#"{"originalDimensions":{"width":1024,"height":1024}}"#,
        br#"{"originalDimensions":{"width":1024,"height":1024},"numLevels":3}"#,
        br#"{"originalDimensions":{"width":1024,"height":0},"numLevels":1}"#,
    ];

    for data in cases {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), data).unwrap();

        let result = DirectoryTileStore::open(dir.path()).await;
        assert!(
            matches!(result, Err(StoreError::InvalidManifest { .. })),
            "manifest {} was accepted",
            String::from_utf8_lossy(data)
        );
    }
}

#[tokio::test]
async fn test_open_accepts_hand_written_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::new(pyramid_viewer::Dimensions::new(4000, 3000), 6);
    std::fs::write(dir.path().join(MANIFEST_FILE), manifest.to_json().unwrap()).unwrap();

    let store = DirectoryTileStore::open(dir.path()).await.unwrap();
    assert_eq!(store.layout().num_levels(), 6);

    // No tiles were written
    assert!(matches!(
        store.get(TileKey::new(0, 0, 0)).await,
        Err(StoreError::TileNotFound { .. })
    ));
}
