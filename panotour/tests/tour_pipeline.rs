//! Integration tests for the full tour pipeline.
//!
//! These tests drive two scenes from metadata through extraction (with a
//! mock rectifier), tiling, fallbacks and document assembly, verifying:
//! - the on-disk tile layout the viewer expects
//! - tiling idempotence with and without force
//! - hotspot geometry between located scenes
//!
//! Run with: `cargo test --test tour_pipeline`

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

use panotour::rectify::face_raster_name;
use panotour::{
    GeoPoint, MetadataSet, PanoramaMetadata, RectificationJob, Rectifier, RectifyError, Scene,
    Tour, TourOptions,
};

/// Rectifier producing flat-colored rasters for every face.
struct FlatRectifier {
    resolution: u32,
}

impl Rectifier for FlatRectifier {
    fn rectify(
        &self,
        _job: &RectificationJob,
        output_dir: &Path,
        scene_id: &str,
    ) -> Result<[Option<PathBuf>; 6], RectifyError> {
        fs::create_dir_all(output_dir)?;
        let mut out: [Option<PathBuf>; 6] = Default::default();
        for (i, slot) in out.iter_mut().enumerate() {
            let raster = RgbImage::from_pixel(
                self.resolution,
                self.resolution,
                image::Rgb([i as u8 * 40, 128, 200]),
            );
            let path = output_dir.join(face_raster_name(scene_id, i));
            raster
                .save(&path)
                .map_err(|e| RectifyError::ScriptIo(std::io::Error::other(e)))?;
            *slot = Some(path);
        }
        Ok(out)
    }
}

/// Width 2600 solves to face 768, tile 384, 2 levels.
fn metadata(lat_lng: Option<(f64, f64)>) -> PanoramaMetadata {
    PanoramaMetadata {
        width: 2600,
        height: 1300,
        location: lat_lng.map(|(lat, lng)| GeoPoint::new(lat, lng)),
        ..Default::default()
    }
}

fn build_tour(dir: &Path) -> Tour {
    let mut set = MetadataSet::new();
    set.insert("paris".to_string(), metadata(Some((48.8566, 2.3522))));
    set.insert("london".to_string(), metadata(Some((51.5074, -0.1278))));

    let mut tour = Tour::new(TourOptions::default().with_author("integration"), set.clone());
    for name in ["paris", "london"] {
        let scene = Scene::new(
            &Path::new("/panos").join(format!("{}.jpg", name)),
            set[name].clone(),
            &dir.join("tiles"),
            &dir.join("work"),
        )
        .unwrap();
        tour.add_scene(scene);
    }
    tour
}

fn count_files(dir: &Path) -> usize {
    let mut count = 0;
    let mut stack = vec![dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                count += 1;
            }
        }
    }
    count
}

#[test]
fn test_two_scene_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut tour = build_tour(dir.path());
    let rectifier = FlatRectifier { resolution: 768 };

    for scene in tour.scenes_mut() {
        scene.extract(&rectifier).unwrap();
        let written = scene.tile(false).unwrap();
        assert_eq!(written, 30, "2x2 + 1 tiles per face, six faces");
        scene.fallback().unwrap();
    }

    // Viewer-facing layout, bit-for-bit naming.
    let tiles = dir.path().join("tiles");
    assert!(tiles.join("paris/2/f0_0.jpg").is_file());
    assert!(tiles.join("paris/2/d1_1.jpg").is_file());
    assert!(tiles.join("paris/1/b0_0.jpg").is_file());
    assert!(tiles.join("paris/fallback/f.jpg").is_file());
    assert!(tiles.join("london/2/u0_1.jpg").is_file());

    let conf = tour.conf().unwrap();
    assert_eq!(conf.default.first_scene, "paris");
    assert_eq!(conf.scenes.len(), 2);

    let paris = &conf.scenes["paris"];
    assert_eq!(paris.multi_res.cube_resolution, 768);
    assert_eq!(paris.multi_res.tile_resolution, 384);
    assert_eq!(paris.multi_res.max_level, 2);
    assert_eq!(paris.multi_res.base_path, "../tiles/paris");

    // London from Paris: initial bearing ~330°, distance in the km bucket.
    assert_eq!(paris.hot_spots.len(), 1);
    let link = &paris.hot_spots[0];
    assert_eq!(link.scene_id, "london");
    assert!((link.yaw - 330.0).abs() < 1.0, "yaw {}", link.yaw);
    assert!(link.text.contains("km"), "text {:?}", link.text);
}

#[test]
fn test_retile_performs_zero_writes_until_forced() {
    let dir = tempfile::tempdir().unwrap();
    let mut tour = build_tour(dir.path());
    let rectifier = FlatRectifier { resolution: 768 };

    let scene = &mut tour.scenes_mut()[0];
    scene.extract(&rectifier).unwrap();
    scene.tile(false).unwrap();

    let scene_dir = dir.path().join("tiles/paris");
    let before = count_files(&scene_dir);

    assert_eq!(scene.tile(false).unwrap(), 0);
    assert_eq!(count_files(&scene_dir), before, "no writes without force");

    assert_eq!(scene.tile(true).unwrap(), 30);
    assert_eq!(count_files(&scene_dir), before, "forced run regenerates in place");
}

#[test]
fn test_document_assembly_does_not_touch_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let tour = build_tour(dir.path());

    // No extract/tile has run; the document must still assemble.
    let json = tour.to_json().unwrap();
    assert!(json.contains("\"firstScene\":\"paris\""));
    assert!(!dir.path().join("tiles").exists(), "conf must not trigger tiling");
}

#[test]
fn test_compact_document_is_deterministic_across_runs() {
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    let json_a = build_tour(dir_a.path()).to_json().unwrap();
    let json_b = build_tour(dir_b.path()).to_json().unwrap();
    assert_eq!(json_a, json_b);
}
