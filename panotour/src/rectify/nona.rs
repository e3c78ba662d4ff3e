//! Rectification via the external `nona` remapping tool.

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};

use super::{face_raster_name, RectificationJob, Rectifier, RectifyError};

/// Rectifier backed by the `nona` binary from the Hugin toolchain.
///
/// The binary is located once at construction; a missing binary is fatal
/// for the whole process since no scene can produce faces without it. A
/// failed or partial run is local to one scene: whichever face rasters
/// are missing afterwards are reported as absent, and the caller
/// substitutes blanks.
#[derive(Debug, Clone)]
pub struct NonaRectifier {
    binary: PathBuf,
}

impl NonaRectifier {
    /// Locate `nona` on PATH.
    ///
    /// # Errors
    ///
    /// [`RectifyError::CollaboratorUnavailable`] when the binary cannot
    /// be found.
    pub fn locate() -> Result<Self, RectifyError> {
        let binary = find_executable("nona")
            .ok_or_else(|| RectifyError::CollaboratorUnavailable("nona".to_string()))?;
        info!(binary = %binary.display(), "nona found");
        Ok(Self { binary })
    }

    /// Use an explicit binary path, bypassing the PATH search.
    pub fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }
}

impl Rectifier for NonaRectifier {
    fn rectify(
        &self,
        job: &RectificationJob,
        output_dir: &Path,
        scene_id: &str,
    ) -> Result<[Option<PathBuf>; 6], RectifyError> {
        fs::create_dir_all(output_dir)?;

        let mut script = tempfile::Builder::new()
            .prefix("nona")
            .suffix(".txt")
            .tempfile()?;
        script.write_all(job.to_script().as_bytes())?;
        script.flush()?;
        debug!(script = %script.path().display(), "job script staged");

        let output_prefix = output_dir.join(scene_id);
        // Blocking run to completion; tiling must never consume a raster
        // the tool is still writing.
        let status = Command::new(&self.binary)
            .arg("-o")
            .arg(&output_prefix)
            .arg(script.path())
            .status()?;
        if !status.success() {
            warn!(scene_id, %status, "nona exited with failure; missing faces become blanks");
        }

        let mut faces: [Option<PathBuf>; 6] = Default::default();
        for (i, slot) in faces.iter_mut().enumerate() {
            let path = output_dir.join(face_raster_name(scene_id, i));
            if path.is_file() {
                *slot = Some(path);
            } else {
                warn!(scene_id, face = i, "face raster not produced");
            }
        }
        Ok(faces)
    }
}

/// Search PATH for an executable by name.
fn find_executable(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
