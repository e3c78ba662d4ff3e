//! Pyramid geometry solver.
//!
//! Maps a source panorama width onto the integer geometry of a cubic tile
//! pyramid: the cube face edge length, the tile edge length, and the number
//! of pyramid levels. The face resolution is constructed to be exactly
//! divisible by `2^max_level` so that every level halves cleanly down to a
//! single tile.

use thiserror::Error;
use tracing::debug;

/// Largest tile edge length the viewer will accept, in pixels.
pub const MAX_TILE_SIZE: u32 = 640;

/// Upper bound on pyramid depth used when sizing the tile fragment.
pub const MAX_LEVELS: u32 = 6;

/// Errors from pyramid geometry solving.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PyramidError {
    /// The source image is too narrow to yield even a one-pixel tile
    /// fragment at the requested depth.
    #[error("Source width {width} too small for {max_levels} levels")]
    SourceTooSmall { width: u32, max_levels: u32 },

    /// The tile fragment already meets the tile size cap before any
    /// doubling, so no valid tile resolution below the cap exists.
    #[error("Tile fragment {fragment} already exceeds maximum tile size {max_tile_size}")]
    TileResolutionUndefined { fragment: u32, max_tile_size: u32 },
}

/// Integer geometry of one scene's tile pyramid.
///
/// Computed once per scene from the source image width and immutable
/// thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PyramidSpec {
    /// Cube face edge length in pixels, divisible by `2^max_level`.
    pub face_resolution: u32,
    /// Edge length of one tile in pixels.
    pub tile_resolution: u32,
    /// Number of pyramid levels; level 1 is a single tile, level
    /// `max_level` is full resolution.
    pub max_level: u32,
}

impl PyramidSpec {
    /// Face edge length at the given level (1-based).
    pub fn level_resolution(&self, level: u32) -> u32 {
        self.face_resolution >> (self.max_level - level)
    }

    /// Number of tile rows (and columns) at the given level.
    pub fn tiles_across(&self, level: u32) -> u32 {
        self.level_resolution(level).div_ceil(self.tile_resolution)
    }
}

/// Solve pyramid geometry for a panorama of the given width.
///
/// A cube face at matching angular resolution is `width / π` pixels wide.
/// That raw width is truncated down to the nearest multiple of
/// `2^max_levels` (the "tile fragment" times the full doubling chain), so
/// the face image is slightly down-scaled from the source; the ratio is
/// logged for diagnostics. The tile resolution is the largest
/// fragment-multiple power-of-two strictly below `max_tile_size`.
///
/// # Errors
///
/// [`PyramidError::SourceTooSmall`] when the fragment truncates to zero,
/// [`PyramidError::TileResolutionUndefined`] when the fragment alone
/// already reaches `max_tile_size`.
pub fn solve(
    source_width: u32,
    max_tile_size: u32,
    max_levels: u32,
) -> Result<PyramidSpec, PyramidError> {
    let raw_face_width = source_width as f64 / std::f64::consts::PI;

    let fragment = (raw_face_width / f64::from(1u32 << max_levels)).floor() as u32;
    if fragment == 0 {
        return Err(PyramidError::SourceTooSmall {
            width: source_width,
            max_levels,
        });
    }

    let face_resolution = fragment << max_levels;
    debug!(
        face_resolution,
        scaling = face_resolution as f64 / raw_face_width,
        "face down-scaled from raw width"
    );

    // Double the fragment until it meets the cap; the value kept is the
    // last one still below it.
    let mut tile_resolution = None;
    let mut exp = 0u32;
    while (fragment << exp) < max_tile_size {
        tile_resolution = Some(fragment << exp);
        exp += 1;
    }
    let tile_resolution = tile_resolution.ok_or(PyramidError::TileResolutionUndefined {
        fragment,
        max_tile_size,
    })?;

    Ok(PyramidSpec {
        face_resolution,
        tile_resolution,
        max_level: max_level_for(face_resolution, tile_resolution),
    })
}

/// Solve pyramid geometry with a caller-fixed tile resolution.
///
/// Bypasses the fragment search: the face is simply `floor(width / π)`
/// and the level count follows from the face/tile ratio.
pub fn solve_with_tile_resolution(
    source_width: u32,
    tile_resolution: u32,
) -> Result<PyramidSpec, PyramidError> {
    let face_resolution = (source_width as f64 / std::f64::consts::PI).floor() as u32;
    if face_resolution == 0 || tile_resolution == 0 {
        return Err(PyramidError::SourceTooSmall {
            width: source_width,
            max_levels: 0,
        });
    }
    Ok(PyramidSpec {
        face_resolution,
        tile_resolution,
        max_level: max_level_for(face_resolution, tile_resolution),
    })
}

/// Pyramid depth for a face/tile resolution pair.
///
/// Uses the rounding form `round(log2(face / tile)) + 1`; for exact
/// power-of-two ratios (the solver always produces these) the rounding is
/// a no-op.
fn max_level_for(face_resolution: u32, tile_resolution: u32) -> u32 {
    let ratio = face_resolution as f64 / tile_resolution as f64;
    // A face smaller than one tile collapses to a single-level pyramid.
    (ratio.log2().round() + 1.0).max(1.0) as u32
}
