//! Typed panorama metadata and scene identifiers.
//!
//! The pipeline never parses raw image metadata itself; an external
//! collaborator delivers a typed record per panorama, keyed by scene id.
//! Fields that the collaborator could not determine are `None`, so an
//! unknown heading stays distinguishable from a true heading of 0°.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Stable identifier for one panorama within a tour.
///
/// Derived from the source filename: extension stripped, lower-cased,
/// spaces replaced with hyphens. Unique within a tour by construction of
/// the input set.
pub fn scene_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.to_lowercase().replace(' ', "-")
}

/// Metadata for one panorama, as delivered by the metadata collaborator.
///
/// Angles are in degrees, pixel fields in source pixels. Optional fields
/// model "collaborator did not know", with documented defaults applied at
/// the accessors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanoramaMetadata {
    pub title: Option<String>,
    /// Source image width in pixels.
    pub width: u32,
    /// Source image height in pixels.
    pub height: u32,
    /// Capture timestamp, when known.
    pub taken_at: Option<NaiveDateTime>,
    /// Initial view heading in degrees.
    pub pan: Option<f64>,
    /// Initial view pitch in degrees.
    pub tilt: Option<f64>,
    /// Initial horizontal field of view in degrees.
    pub field_of_view: Option<f64>,
    /// Device heading offset from true north in degrees.
    pub north_offset: Option<f64>,
    /// Number of source photos stitched into the panorama.
    pub source_photo_count: Option<u32>,
    /// Capture location, when geotagged.
    pub location: Option<GeoPoint>,
    /// Top edge of the vertical crop within the full-sphere frame.
    pub cropped_top: Option<u32>,
    /// Height of the vertical crop.
    pub cropped_height: Option<u32>,
    /// Height the full sphere would have had, in pixels.
    pub pano_height: Option<u32>,
}

impl PanoramaMetadata {
    /// Title, defaulting to the scene id when the collaborator had none.
    pub fn title_or(&self, scene_id: &str) -> String {
        match &self.title {
            Some(t) if !t.is_empty() => t.clone(),
            _ => scene_id.to_string(),
        }
    }

    /// Initial heading, defaulting to 0°.
    pub fn pan_or_default(&self) -> f64 {
        self.pan.unwrap_or(0.0)
    }

    /// Initial pitch, defaulting to 0°.
    pub fn tilt_or_default(&self) -> f64 {
        self.tilt.unwrap_or(0.0)
    }

    /// Horizontal field of view, defaulting to 90°.
    pub fn field_of_view_or_default(&self) -> f64 {
        self.field_of_view.unwrap_or(90.0)
    }

    /// North offset, defaulting to 0°.
    pub fn north_offset_or_default(&self) -> f64 {
        self.north_offset.unwrap_or(0.0)
    }

    /// Vertical shift in pixels compensating an asymmetric crop, or
    /// `None` when the crop geometry is unknown or symmetric.
    pub fn vertical_shift(&self) -> Option<f64> {
        let pano = self.pano_height?;
        let cropped = self.cropped_height?;
        let top = self.cropped_top?;
        let shift = 0.5 * f64::from(pano - cropped.min(pano)) - f64::from(top);
        if shift == 0.0 {
            None
        } else {
            Some(shift)
        }
    }

    /// Pitch bounds `(min, max)` implied by the vertical crop.
    ///
    /// A full-sphere source yields `(-90, 90)`. Each side is `None` when
    /// not strictly tighter than the full bound, so callers only emit the
    /// bounds that actually constrain the viewer.
    pub fn pitch_bounds(&self) -> (Option<f64>, Option<f64>) {
        let (Some(pano), Some(cropped), Some(top)) =
            (self.pano_height, self.cropped_height, self.cropped_top)
        else {
            return (None, None);
        };
        if pano == 0 {
            return (None, None);
        }
        let max_pitch = 90.0 - 180.0 * f64::from(top) / f64::from(pano);
        let min_pitch = 90.0 - 180.0 * f64::from(top + cropped) / f64::from(pano);
        (
            (min_pitch > -90.0).then_some(min_pitch),
            (max_pitch < 90.0).then_some(max_pitch),
        )
    }
}

/// The full metadata record set for a tour, keyed by scene id.
pub type MetadataSet = BTreeMap<String, PanoramaMetadata>;
