//! Cube face definitions and the rectification job handed to the
//! external projection tool.
//!
//! Rectification itself — reprojecting the equirectangular source into
//! six rectilinear face rasters — is the job of an external collaborator
//! (`nona` from the Hugin toolchain). This module builds its textual job
//! description and defines the [`Rectifier`] seam so scene orchestration
//! can run against a mock in tests.

mod nona;

pub use nona::NonaRectifier;

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from the rectification collaborator.
#[derive(Debug, Error)]
pub enum RectifyError {
    /// The external rectification binary could not be located on PATH.
    /// Fatal at process level: no faces can be produced at all.
    #[error("Rectification tool '{0}' not found on PATH")]
    CollaboratorUnavailable(String),

    /// Failed to write or clean up the job script.
    #[error("Failed to stage job script: {0}")]
    ScriptIo(#[from] std::io::Error),
}

/// The six cube face orientations, in the fixed order the tile directory
/// naming is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    Front,
    Back,
    Left,
    Right,
    Up,
    Down,
}

impl Face {
    /// All faces in canonical order: front, back, left, right, up, down.
    pub const ALL: [Face; 6] = [
        Face::Front,
        Face::Back,
        Face::Left,
        Face::Right,
        Face::Up,
        Face::Down,
    ];

    /// Single-letter label used in tile and fallback filenames.
    pub fn label(self) -> char {
        match self {
            Face::Front => 'f',
            Face::Back => 'b',
            Face::Left => 'l',
            Face::Right => 'r',
            Face::Up => 'u',
            Face::Down => 'd',
        }
    }

    /// Center (yaw, pitch) of this face in the panorama's local frame,
    /// in degrees. Roll is always 0.
    pub fn yaw_pitch(self) -> (i32, i32) {
        match self {
            Face::Front => (0, 0),
            Face::Back => (-180, 0),
            Face::Left => (90, 0),
            Face::Right => (-90, 0),
            Face::Up => (0, -90),
            Face::Down => (0, 90),
        }
    }

    /// Index of this face in [`Face::ALL`], which is also the index in
    /// the rectifier's output raster naming.
    pub fn index(self) -> usize {
        match self {
            Face::Front => 0,
            Face::Back => 1,
            Face::Left => 2,
            Face::Right => 3,
            Face::Up => 4,
            Face::Down => 5,
        }
    }
}

/// A rectification job: the textual description the external projection
/// tool consumes.
///
/// One output directive (cubic projection, square faces, multi-page TIFF
/// output) followed by exactly six input directives, one per face in
/// canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct RectificationJob {
    /// Path to the source equirectangular image.
    pub source: PathBuf,
    /// Source width in pixels.
    pub width: u32,
    /// Source height in pixels.
    pub height: u32,
    /// Face edge length in pixels.
    pub face_resolution: u32,
    /// Horizontal field of view per face, in degrees.
    pub horizontal_fov: f64,
    /// Vertical shift in pixels for asymmetrically cropped sources.
    pub vertical_shift: Option<f64>,
}

impl RectificationJob {
    /// Build a job for one panorama.
    pub fn new(
        source: &Path,
        width: u32,
        height: u32,
        face_resolution: u32,
        horizontal_fov: f64,
        vertical_shift: Option<f64>,
    ) -> Self {
        Self {
            source: source.to_path_buf(),
            width,
            height,
            face_resolution,
            horizontal_fov,
            vertical_shift,
        }
    }

    /// Render the job as the script text the projection tool consumes.
    ///
    /// The `p`-line requests a rectilinear output of face size; the six
    /// `i`-lines carry each face's yaw/pitch/roll. Sign convention and
    /// ordering are load-bearing: the tool writes its outputs by input
    /// index, and downstream naming maps index to face label.
    pub fn to_script(&self) -> String {
        let mut script = String::new();
        let _ = writeln!(
            script,
            "p f0 w{res} h{res} n\"TIFF_m\" u0 v90",
            res = self.face_resolution
        );
        for face in Face::ALL {
            let (yaw, pitch) = face.yaw_pitch();
            let _ = write!(
                script,
                "i f4 w{} h{} y{} p{} r0 v{}",
                self.width, self.height, yaw, pitch, self.horizontal_fov
            );
            if let Some(shift) = self.vertical_shift {
                let _ = write!(script, " e{}", shift);
            }
            let _ = writeln!(script, " n\"{}\"", self.source.display());
        }
        script
    }
}

/// Seam to the external rectification collaborator.
///
/// Implementations consume a job and yield one raster path per face, in
/// canonical face order. `None` at an index means the collaborator did
/// not produce that face; callers recover by substituting a blank raster,
/// so this is not an error.
pub trait Rectifier: Send + Sync {
    /// Run the job, writing face rasters under `output_dir` named
    /// `<scene_id><index:04>.tif`, and report which faces materialized.
    fn rectify(
        &self,
        job: &RectificationJob,
        output_dir: &Path,
        scene_id: &str,
    ) -> Result<[Option<PathBuf>; 6], RectifyError>;
}

/// Expected raster filename for a face index, mirroring the external
/// tool's output naming.
pub fn face_raster_name(scene_id: &str, index: usize) -> String {
    format!("{}{:04}.tif", scene_id, index)
}
