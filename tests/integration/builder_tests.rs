//! Pyramid builder integration tests.
//!
//! Tests verify:
//! - Level counts and per-level grids for assorted source shapes
//! - Every tile, edge tiles included, decodes to TILE_SIZE x TILE_SIZE
//! - Finest-level tiles carry the source pixels unchanged
//! - Background builds report progress and end with one terminal event
//! - Source loading enforces limits and reports decode failures

use image::imageops::FilterType;

use pyramid_viewer::error::BuildError;
use pyramid_viewer::pyramid::{
    decode_tile, load_source, spawn_build, BuildEvent, BuildOptions, Dimensions, PyramidBuilder,
    TileKey, TILE_SIZE,
};

use super::test_utils::{build_pyramid, gradient_image, solid_image};

// =============================================================================
// Level Structure
// =============================================================================

#[test]
fn test_square_1024_has_four_levels() {
    let pyramid = build_pyramid(solid_image(1024, 1024, [10, 20, 30, 255]));
    let layout = pyramid.layout();

    assert_eq!(pyramid.num_levels(), 4);
    let sizes: Vec<_> = layout.levels().iter().map(|l| (l.width, l.height)).collect();
    assert_eq!(sizes, vec![(128, 128), (256, 256), (512, 512), (1024, 1024)]);

    let grids: Vec<_> = layout.levels().iter().map(|l| (l.cols, l.rows)).collect();
    assert_eq!(grids, vec![(1, 1), (2, 2), (4, 4), (8, 8)]);
    assert_eq!(pyramid.tile_count(), 1 + 4 + 16 + 64);
}

#[test]
fn test_level_counts_for_assorted_shapes() {
    let cases = [
        ((1, 1), 1),
        ((128, 128), 1),
        ((129, 10), 2),
        ((256, 256), 2),
        ((257, 3), 3),
        ((10, 1000), 4),
        ((4000, 3000), 6),
    ];

    for ((w, h), expected) in cases {
        let pyramid = PyramidBuilder::new()
            .build(solid_image(w, h, [0, 0, 0, 255]))
            .unwrap();
        assert_eq!(pyramid.num_levels(), expected, "source {}x{}", w, h);
    }
}

#[test]
fn test_levels_halve_with_floor() {
    let pyramid = build_pyramid(gradient_image(999, 333));
    let levels = pyramid.layout().levels();

    for pair in levels.windows(2) {
        let (coarse, fine) = (pair[0], pair[1]);
        assert_eq!(coarse.width, fine.width / 2);
        assert_eq!(coarse.height, fine.height / 2);
    }

    let finest = levels.last().unwrap();
    assert_eq!(finest.dimensions(), Dimensions::new(999, 333));
    assert_eq!(finest.cols, 8); // ceil(999 / 128)
    assert_eq!(finest.rows, 3); // ceil(333 / 128)
}

#[test]
fn test_every_tile_is_full_size() {
    let pyramid = build_pyramid(gradient_image(450, 300));

    for (key, bytes) in pyramid.tiles() {
        let tile = decode_tile(bytes).unwrap();
        assert_eq!(tile.dimensions(), (TILE_SIZE, TILE_SIZE), "tile {:?}", key);
    }
}

#[test]
fn test_edge_tile_is_padded_transparent() {
    let pyramid = build_pyramid(gradient_image(300, 200));
    let finest = pyramid.layout().finest_level();

    // Bottom-right tile covers x 256..300, y 128..200
    let tile = decode_tile(pyramid.tile(TileKey::new(finest, 1, 2)).unwrap()).unwrap();
    assert_eq!(tile.get_pixel(43, 71)[3], 255);
    assert_eq!(tile.get_pixel(44, 0)[3], 0);
    assert_eq!(tile.get_pixel(0, 72)[3], 0);
    assert_eq!(tile.get_pixel(127, 127)[3], 0);
}

#[test]
fn test_finest_tiles_match_source() {
    let source = gradient_image(400, 260);
    let expected = source.to_rgba8();
    let pyramid = build_pyramid(source);
    let finest = pyramid.layout().finest_level();

    for (row, col) in [(0, 0), (1, 2), (2, 3)] {
        let tile = decode_tile(pyramid.tile(TileKey::new(finest, row, col)).unwrap()).unwrap();
        for (tx, ty) in [(0, 0), (5, 3), (15, 3)] {
            let (x, y) = (col * TILE_SIZE + tx, row * TILE_SIZE + ty);
            if x < 400 && y < 260 {
                assert_eq!(tile.get_pixel(tx, ty), expected.get_pixel(x, y));
            }
        }
    }
}

#[test]
fn test_filter_choice_keeps_shape() {
    let source = gradient_image(700, 500);
    let nearest = PyramidBuilder::with_options(BuildOptions {
        filter: FilterType::Nearest,
        ..BuildOptions::default()
    })
    .build(source.clone())
    .unwrap();
    let lanczos = PyramidBuilder::new().build(source).unwrap();

    assert_eq!(nearest.layout(), lanczos.layout());
    assert_eq!(nearest.manifest(), lanczos.manifest());
    assert_eq!(nearest.tile_count(), lanczos.tile_count());
}

#[test]
fn test_empty_source_rejected() {
    let result = PyramidBuilder::new().build(solid_image(0, 10, [0, 0, 0, 0]));
    assert!(matches!(result, Err(BuildError::EmptySource)));
}

#[test]
fn test_oversized_source_rejected() {
    let options = BuildOptions {
        max_dimension: 256,
        ..BuildOptions::default()
    };
    let result = PyramidBuilder::with_options(options).build(solid_image(300, 10, [0, 0, 0, 255]));

    match result {
        Err(BuildError::ResourceExhausted { width, height, .. }) => {
            assert_eq!((width, height), (300, 10));
        }
        other => panic!("expected ResourceExhausted, got {:?}", other.map(|_| ())),
    }
}

// =============================================================================
// Background Builds
// =============================================================================

#[tokio::test]
async fn test_background_build_event_sequence() {
    let mut handle = spawn_build(gradient_image(1024, 700), BuildOptions::default());

    let mut progress = Vec::new();
    let pyramid = loop {
        match handle.next_event().await.expect("terminal event") {
            BuildEvent::Progress {
                level,
                total_levels,
            } => {
                assert_eq!(total_levels, 4);
                progress.push(level);
            }
            BuildEvent::Done(pyramid) => break pyramid,
            BuildEvent::Failed { message } => panic!("build failed: {}", message),
        }
    };

    // Finest level first, one event per level
    assert_eq!(progress, vec![3, 2, 1, 0]);
    assert_eq!(pyramid.num_levels(), 4);
    assert!(handle.next_event().await.is_none());
}

#[tokio::test]
async fn test_background_build_failure_is_terminal() {
    let mut handle = spawn_build(solid_image(0, 0, [0, 0, 0, 0]), BuildOptions::default());

    match handle.next_event().await {
        Some(BuildEvent::Failed { message }) => assert!(!message.is_empty()),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(handle.next_event().await.is_none());
}

#[tokio::test]
async fn test_background_build_finish() {
    let handle = spawn_build(gradient_image(200, 200), BuildOptions::default());
    let pyramid = handle.finish().await.unwrap();
    assert_eq!(pyramid.num_levels(), 2);
}

// =============================================================================
// Source Loading
// =============================================================================

#[test]
fn test_load_source_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("source.png");
    gradient_image(320, 240).save(&path).unwrap();

    let source = load_source(&path, &BuildOptions::default()).unwrap();
    assert_eq!((source.width(), source.height()), (320, 240));

    // 320 > 2 * TILE_SIZE
    let pyramid = PyramidBuilder::new().build(source).unwrap();
    assert_eq!(pyramid.num_levels(), 3);
}

#[test]
fn test_load_source_enforces_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.png");
    solid_image(500, 20, [1, 2, 3, 255]).save(&path).unwrap();

    let options = BuildOptions {
        max_pixels: 5_000,
        ..BuildOptions::default()
    };
    assert!(matches!(
        load_source(&path, &options),
        Err(BuildError::ResourceExhausted { .. })
    ));
}

#[test]
fn test_load_source_rejects_garbage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"this is not an image").unwrap();

    assert!(matches!(
        load_source(&path, &BuildOptions::default()),
        Err(BuildError::Decode { .. })
    ));
}

#[test]
fn test_load_source_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_source(&dir.path().join("missing.png"), &BuildOptions::default());
    assert!(matches!(result, Err(BuildError::Decode { .. })));
}
