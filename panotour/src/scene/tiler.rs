//! Face tiling: one cube face raster into a directory tree of tiles.
//!
//! Levels are processed from full resolution downwards, each level's
//! raster derived by halving the previous level's. Halving is the only
//! point resampling occurs, so artifacts accumulate level over level in
//! the way the viewer expects. The last row and column of each level are
//! clipped at the raster boundary, never padded.

use std::fs;
use std::path::Path;

use image::{imageops, imageops::FilterType, RgbImage};
use tracing::debug;

use super::SceneError;
use crate::pyramid::PyramidSpec;
use crate::rectify::Face;

/// Pixel rectangle of one tile within a level raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub row: u32,
    pub col: u32,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Partition a square level raster of edge `size` into tile rectangles.
///
/// Full `tile_resolution` squares except the last row/column, which carry
/// the remainder when `size` is not an exact multiple.
pub fn tile_grid(size: u32, tile_resolution: u32) -> Vec<TileRect> {
    let across = size.div_ceil(tile_resolution);
    let mut tiles = Vec::with_capacity((across * across) as usize);
    for row in 0..across {
        let y = row * tile_resolution;
        let height = tile_resolution.min(size - y);
        for col in 0..across {
            let x = col * tile_resolution;
            let width = tile_resolution.min(size - x);
            tiles.push(TileRect {
                row,
                col,
                x,
                y,
                width,
                height,
            });
        }
    }
    tiles
}

/// Write the complete pyramid for one face under `scene_dir`.
///
/// Layout: `<scene_dir>/<level>/<label><row>_<col>.<extension>`. Returns
/// the number of tiles written.
pub fn write_face_pyramid(
    face: Face,
    raster: &RgbImage,
    spec: &PyramidSpec,
    scene_dir: &Path,
    extension: &str,
) -> Result<usize, SceneError> {
    let mut current = raster.clone();
    let mut written = 0;

    for level in (1..=spec.max_level).rev() {
        if level < spec.max_level {
            let half = current.width() / 2;
            current = imageops::resize(&current, half, half, FilterType::Lanczos3);
        }

        let level_dir = scene_dir.join(level.to_string());
        // Concurrent faces share the level directory; create-if-absent.
        fs::create_dir_all(&level_dir).map_err(|e| SceneError::io(&level_dir, e))?;

        let size = current.width();
        for tile in tile_grid(size, spec.tile_resolution) {
            let path = level_dir.join(format!(
                "{}{}_{}.{}",
                face.label(),
                tile.row,
                tile.col,
                extension
            ));
            let cropped =
                imageops::crop_imm(&current, tile.x, tile.y, tile.width, tile.height).to_image();
            cropped.save(&path).map_err(SceneError::Image)?;
            written += 1;
        }
        debug!(face = %face.label(), level, size, "level tiled");
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_exact_multiple() {
        let tiles = tile_grid(1024, 512);
        assert_eq!(tiles.len(), 4);
        assert!(tiles.iter().all(|t| t.width == 512 && t.height == 512));
    }

    #[test]
    fn test_grid_with_remainder() {
        // 1100 / 512 → 3 across, last row/col clipped to 76.
        let tiles = tile_grid(1100, 512);
        assert_eq!(tiles.len(), 9);
        let last = tiles.last().unwrap();
        assert_eq!((last.row, last.col), (2, 2));
        assert_eq!((last.width, last.height), (76, 76));
        // Interior tiles keep full size.
        assert_eq!(tiles[0].width, 512);
        assert_eq!(tiles[1].width, 512);
        assert_eq!(tiles[2].width, 76);
        assert_eq!(tiles[2].height, 512);
    }

    #[test]
    fn test_grid_single_undersized_tile() {
        let tiles = tile_grid(300, 512);
        assert_eq!(tiles.len(), 1);
        assert_eq!((tiles[0].width, tiles[0].height), (300, 300));
    }

    #[test]
    fn test_grid_covers_raster_exactly() {
        for (size, tile) in [(1100u32, 512u32), (3648, 456), (64, 512)] {
            let tiles = tile_grid(size, tile);
            let area: u64 = tiles.iter().map(|t| t.width as u64 * t.height as u64).sum();
            assert_eq!(area, size as u64 * size as u64, "size {} tile {}", size, tile);
        }
    }

    #[test]
    fn test_write_face_pyramid_layout() {
        let dir = tempfile::tempdir().unwrap();
        let spec = PyramidSpec {
            face_resolution: 128,
            tile_resolution: 48,
            max_level: 2,
        };
        let raster = RgbImage::new(128, 128);

        let written =
            write_face_pyramid(Face::Front, &raster, &spec, dir.path(), "jpg").unwrap();

        // Level 2: 128/48 → 3x3; level 1: 64/48 → 2x2.
        assert_eq!(written, 13);
        assert!(dir.path().join("2/f0_0.jpg").is_file());
        assert!(dir.path().join("2/f2_2.jpg").is_file());
        assert!(dir.path().join("1/f1_1.jpg").is_file());
        assert!(!dir.path().join("1/f2_0.jpg").exists());

        // Clipped edge tile has the remainder size.
        let edge = image::open(dir.path().join("2/f2_2.jpg")).unwrap();
        assert_eq!((edge.width(), edge.height()), (32, 32));
        let full = image::open(dir.path().join("2/f0_0.jpg")).unwrap();
        assert_eq!((full.width(), full.height()), (48, 48));
    }

    #[test]
    fn test_single_level_pyramid() {
        let dir = tempfile::tempdir().unwrap();
        let spec = PyramidSpec {
            face_resolution: 64,
            tile_resolution: 512,
            max_level: 1,
        };
        let raster = RgbImage::new(64, 64);
        let written = write_face_pyramid(Face::Up, &raster, &spec, dir.path(), "jpg").unwrap();
        assert_eq!(written, 1);
        assert!(dir.path().join("1/u0_0.jpg").is_file());
    }
}
