//! Navigation links between scenes.
//!
//! A hotspot is a clickable marker placed at the great-circle bearing of
//! another scene, corrected for each device's heading offset so the
//! marker points where the target actually is, and the arrival view
//! faces back along the travel direction.

use crate::conf::HotSpotConf;
use crate::geo;
use crate::metadata::PanoramaMetadata;

/// An outgoing navigation link from one scene to another.
#[derive(Debug, Clone, PartialEq)]
pub struct HotSpot {
    /// Scene id of the link target.
    pub target_scene_id: String,
    /// Marker yaw within the source scene, degrees in `[0, 360)`.
    pub yaw: f64,
    /// View yaw on arrival in the target scene, degrees in `[0, 360)`.
    pub target_yaw: f64,
    /// Formatted distance, empty when either side lacks a location.
    pub distance_label: String,
    /// Marker text shown to the viewer.
    pub display_text: String,
}

impl HotSpot {
    /// Build the link from `src` towards `dest`.
    ///
    /// The stored yaw is the geographic bearing minus the source scene's
    /// north offset; the target yaw additionally swaps in the target's
    /// offset so the traveler arrives facing their direction of travel.
    /// Without locations on both sides the link degrades to yaw 0 and an
    /// empty distance label.
    pub fn new(target_scene_id: &str, src: &PanoramaMetadata, dest: &PanoramaMetadata) -> Self {
        let title = dest.title_or(target_scene_id);
        let (yaw, target_yaw, distance_label) = match (src.location, dest.location) {
            (Some(a), Some(b)) => {
                let bearing = geo::bearing_degrees(a, b);
                let src_offset = src.north_offset_or_default();
                let dest_offset = dest.north_offset_or_default();
                let yaw = geo::normalize_degrees(bearing - src_offset);
                let target_yaw = geo::normalize_degrees(yaw + src_offset - dest_offset);
                (yaw, target_yaw, geo::format_distance(geo::distance_km(a, b)))
            }
            _ => (0.0, 0.0, String::new()),
        };
        let display_text = if distance_label.is_empty() {
            title
        } else {
            format!("{} ({})", title, distance_label)
        };
        Self {
            target_scene_id: target_scene_id.to_string(),
            yaw,
            target_yaw,
            distance_label,
            display_text,
        }
    }

    /// Whether both endpoints carried a location.
    pub fn has_geometry(&self) -> bool {
        !self.distance_label.is_empty()
    }

    /// The serialized hotspot record.
    pub fn conf(&self) -> HotSpotConf {
        HotSpotConf {
            kind: "scene".to_string(),
            text: self.display_text.clone(),
            yaw: self.yaw,
            pitch: 0.0,
            target_yaw: self.target_yaw,
            target_pitch: 0.0,
            scene_id: self.target_scene_id.clone(),
        }
    }
}
