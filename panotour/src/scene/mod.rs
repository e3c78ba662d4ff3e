//! Scene orchestration: one panorama from source image to tiled pyramid.
//!
//! A scene moves through `Created → Extracted → Tiled → Finalized`.
//! Extraction calls the external rectifier for six face rasters (blanks
//! substituted for faces the collaborator could not produce), tiling
//! writes the multi-resolution pyramid, and finalization adds the
//! per-face fallback images and the source thumbnail. Tiling is
//! idempotent: an existing output directory is skipped unless forced.

mod tiler;

pub use tiler::{tile_grid, write_face_pyramid, TileRect};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::{imageops, imageops::FilterType, RgbImage};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::conf::{MultiResConf, SceneConf, FALLBACK_PATH_TEMPLATE, TILE_PATH_TEMPLATE};
use crate::hotspot::HotSpot;
use crate::metadata::{scene_id_from_path, PanoramaMetadata};
use crate::pyramid::{self, PyramidError, PyramidSpec};
use crate::rectify::{Face, RectificationJob, Rectifier, RectifyError};

/// Edge length of the per-face fallback image, in pixels.
pub const FALLBACK_RESOLUTION: u32 = 1024;

/// File extension of all generated tiles, fallbacks and thumbnails.
pub const TILE_EXTENSION: &str = "jpg";

/// Horizontal field of view of the equirectangular source, in degrees.
const SOURCE_HFOV: f64 = 360.0;

/// Errors from scene processing.
#[derive(Debug, Error)]
pub enum SceneError {
    /// The source is too small for a valid pyramid; fatal for this
    /// scene, tiling must not proceed.
    #[error(transparent)]
    Pyramid(#[from] PyramidError),

    /// The rectification collaborator failed at process level.
    #[error(transparent)]
    Rectify(#[from] RectifyError),

    /// An image could not be decoded, resampled or encoded.
    #[error("Image operation failed: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem failure with the offending path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A stage was invoked before its input stage completed.
    #[error("Scene '{0}' has no extracted faces; call extract() first")]
    NotExtracted(String),
}

impl SceneError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Processing stage of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Created,
    Extracted,
    Tiled,
    Finalized,
}

/// One panorama and its derived pyramid outputs.
#[derive(Debug)]
pub struct Scene {
    scene_id: String,
    source: PathBuf,
    metadata: PanoramaMetadata,
    spec: PyramidSpec,
    tile_folder: PathBuf,
    work_dir: PathBuf,
    stage: Stage,
    faces: Option<Vec<RgbImage>>,
}

impl Scene {
    /// Create a scene for one panorama, solving its pyramid geometry.
    ///
    /// # Arguments
    ///
    /// * `source` - Path to the equirectangular source image
    /// * `metadata` - The typed metadata record for this panorama
    /// * `tile_folder` - Root directory all scenes write tiles under
    /// * `work_dir` - Scratch directory for intermediate face rasters
    ///
    /// # Errors
    ///
    /// [`PyramidError`] when the source width cannot produce a valid
    /// pyramid; such a scene must not be processed further.
    pub fn new(
        source: &Path,
        metadata: PanoramaMetadata,
        tile_folder: &Path,
        work_dir: &Path,
    ) -> Result<Self, SceneError> {
        let scene_id = scene_id_from_path(source);
        let spec = pyramid::solve(metadata.width, pyramid::MAX_TILE_SIZE, pyramid::MAX_LEVELS)?;
        info!(
            scene_id = %scene_id,
            face = spec.face_resolution,
            tile = spec.tile_resolution,
            levels = spec.max_level,
            "pyramid solved"
        );
        Ok(Self {
            scene_id,
            source: source.to_path_buf(),
            metadata,
            spec,
            tile_folder: tile_folder.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            stage: Stage::Created,
            faces: None,
        })
    }

    /// Create a scene with a caller-fixed tile resolution (bypassing the
    /// fragment search).
    pub fn with_tile_resolution(
        source: &Path,
        metadata: PanoramaMetadata,
        tile_folder: &Path,
        work_dir: &Path,
        tile_resolution: u32,
    ) -> Result<Self, SceneError> {
        let scene_id = scene_id_from_path(source);
        let spec = pyramid::solve_with_tile_resolution(metadata.width, tile_resolution)?;
        Ok(Self {
            scene_id,
            source: source.to_path_buf(),
            metadata,
            spec,
            tile_folder: tile_folder.to_path_buf(),
            work_dir: work_dir.to_path_buf(),
            stage: Stage::Created,
            faces: None,
        })
    }

    pub fn scene_id(&self) -> &str {
        &self.scene_id
    }

    pub fn metadata(&self) -> &PanoramaMetadata {
        &self.metadata
    }

    pub fn spec(&self) -> &PyramidSpec {
        &self.spec
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Directory all of this scene's outputs live under.
    pub fn scene_dir(&self) -> PathBuf {
        self.tile_folder.join(&self.scene_id)
    }

    /// The rectification job describing this scene's face extraction.
    pub fn rectification_job(&self) -> RectificationJob {
        RectificationJob::new(
            &self.source,
            self.metadata.width,
            self.metadata.height,
            self.spec.face_resolution,
            SOURCE_HFOV,
            self.metadata.vertical_shift(),
        )
    }

    /// Extract the six cube faces via the rectification collaborator.
    ///
    /// The collaborator runs to completion before any raster is read. A
    /// face it did not produce is replaced with a fresh blank raster of
    /// face resolution, so tiling always has six inputs; narrow-FOV
    /// sources legitimately produce blank poles.
    pub fn extract(&mut self, rectifier: &dyn Rectifier) -> Result<(), SceneError> {
        let job = self.rectification_job();
        let produced = rectifier.rectify(&job, &self.work_dir, &self.scene_id)?;

        let res = self.spec.face_resolution;
        let mut faces = Vec::with_capacity(6);
        for (face, path) in Face::ALL.iter().zip(produced.into_iter()) {
            match path {
                Some(path) => {
                    let raster = image::open(&path)?.into_rgb8();
                    faces.push(raster);
                }
                None => {
                    info!(scene_id = %self.scene_id, face = %face.label(), "substituting blank face");
                    faces.push(RgbImage::new(res, res));
                }
            }
        }
        self.faces = Some(faces);
        self.stage = Stage::Extracted;
        Ok(())
    }

    /// Tile all six faces into the pyramid directory tree.
    ///
    /// Skips entirely (no writes) when the scene directory already
    /// exists and `force` is false. Faces run in parallel; levels within
    /// one face are strictly sequential since each is derived from the
    /// previous one. Returns the number of tiles written.
    pub fn tile(&mut self, force: bool) -> Result<usize, SceneError> {
        let scene_dir = self.scene_dir();
        if scene_dir.exists() && !force {
            info!(scene_id = %self.scene_id, "tiles present, skipping");
            self.stage = Stage::Tiled;
            return Ok(0);
        }

        let faces = self
            .faces
            .as_ref()
            .ok_or_else(|| SceneError::NotExtracted(self.scene_id.clone()))?;
        fs::create_dir_all(&scene_dir).map_err(|e| SceneError::io(&scene_dir, e))?;

        let spec = self.spec;
        let written = Face::ALL
            .par_iter()
            .zip(faces.par_iter())
            .map(|(face, raster)| {
                write_face_pyramid(*face, raster, &spec, &scene_dir, TILE_EXTENSION)
            })
            .try_reduce(|| 0, |a, b| Ok(a + b))?;

        info!(scene_id = %self.scene_id, written, "scene tiled");
        self.stage = Stage::Tiled;
        Ok(written)
    }

    /// Write the fixed-size fallback image for every face.
    ///
    /// Fallbacks are independent of the pyramid and are loaded by the
    /// viewer before any tile arrives.
    pub fn fallback(&self) -> Result<(), SceneError> {
        let Some(faces) = self.faces.as_ref() else {
            warn!(scene_id = %self.scene_id, "no faces extracted, skipping fallbacks");
            return Ok(());
        };

        let fallback_dir = self.scene_dir().join("fallback");
        fs::create_dir_all(&fallback_dir).map_err(|e| SceneError::io(&fallback_dir, e))?;

        for (face, raster) in Face::ALL.iter().zip(faces.iter()) {
            let small = imageops::resize(
                raster,
                FALLBACK_RESOLUTION,
                FALLBACK_RESOLUTION,
                FilterType::Lanczos3,
            );
            let path = fallback_dir.join(format!("{}.{}", face.label(), TILE_EXTENSION));
            small.save(&path)?;
            debug!(scene_id = %self.scene_id, face = %face.label(), "fallback written");
        }
        Ok(())
    }

    /// Crop a centered horizontal band out of the source panorama and
    /// save it as a thumbnail of the given width and aspect ratio.
    ///
    /// # Returns
    ///
    /// The path of the written thumbnail.
    pub fn thumbnail(&self, aspect_ratio: f64, width: u32) -> Result<PathBuf, SceneError> {
        let source = image::open(&self.source)?.into_rgb8();
        let (src_w, src_h) = source.dimensions();

        let band_height = ((f64::from(src_w) / aspect_ratio).round() as u32).min(src_h);
        let y0 = (src_h - band_height) / 2;
        let band = imageops::crop_imm(&source, 0, y0, src_w, band_height).to_image();

        let thumb_height = (f64::from(width) / aspect_ratio).round() as u32;
        let thumb = imageops::resize(&band, width, thumb_height, FilterType::Lanczos3);

        let thumbs_dir = self.scene_dir().join("thumbs");
        fs::create_dir_all(&thumbs_dir).map_err(|e| SceneError::io(&thumbs_dir, e))?;
        let path = thumbs_dir.join(format!("{}-{}.{}", self.scene_id, width, TILE_EXTENSION));
        thumb.save(&path)?;
        Ok(path)
    }

    /// Finalize the scene: fallbacks plus a default thumbnail.
    pub fn finalize(&mut self, aspect_ratio: f64, thumb_width: u32) -> Result<(), SceneError> {
        self.fallback()?;
        self.thumbnail(aspect_ratio, thumb_width)?;
        self.stage = Stage::Finalized;
        Ok(())
    }

    /// Assemble this scene's configuration record.
    ///
    /// `hotspots` is this scene's outgoing link set, computed by the
    /// tour. Only pitch bounds strictly tighter than ±90° are emitted.
    pub fn conf(&self, hotspots: &[HotSpot]) -> SceneConf {
        let (min_pitch, max_pitch) = self.metadata.pitch_bounds();
        SceneConf {
            kind: "multires".to_string(),
            north_offset: self.metadata.north_offset_or_default(),
            title: self.metadata.title_or(&self.scene_id),
            compass: true,
            yaw: self.metadata.pan_or_default(),
            pitch: self.metadata.tilt_or_default(),
            hfov: self.metadata.field_of_view_or_default(),
            min_pitch,
            max_pitch,
            location: self.metadata.location,
            multi_res: MultiResConf {
                base_path: format!("../tiles/{}", self.scene_id),
                path: TILE_PATH_TEMPLATE.to_string(),
                fallback_path: FALLBACK_PATH_TEMPLATE.to_string(),
                extension: TILE_EXTENSION.to_string(),
                tile_resolution: self.spec.tile_resolution,
                max_level: self.spec.max_level,
                cube_resolution: self.spec.face_resolution,
            },
            hot_spots: hotspots.iter().map(HotSpot::conf).collect(),
        }
    }
}
