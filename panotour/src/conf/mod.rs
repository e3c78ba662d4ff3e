//! The serialized tour configuration document.
//!
//! These records are the externally consumed contract with the viewer:
//! field names, the path templates, and the face labels must reproduce
//! exactly. Serialization has two modes: compact with stable declared
//! key order for production, and indented with sorted keys for eyeballing
//! during debugging.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeoPoint;

/// Path template for tiles below a scene's base path.
pub const TILE_PATH_TEMPLATE: &str = "/%l/%s%y_%x";

/// Path template for fallback faces below a scene's base path.
pub const FALLBACK_PATH_TEMPLATE: &str = "/fallback/%s";

/// Errors serializing the configuration document.
#[derive(Debug, Error)]
pub enum ConfError {
    #[error("Failed to serialize tour configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Top-level document: global defaults plus one record per scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourConf {
    pub default: DefaultConf,
    pub scenes: BTreeMap<String, SceneConf>,
}

/// Global viewer options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultConf {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub first_scene: String,
    pub auto_load: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_rotate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_fade_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hot_spot_debug: Option<bool>,
}

/// One scene's record in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConf {
    /// Always `"multires"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub north_offset: f64,
    pub title: String,
    pub compass: bool,
    pub yaw: f64,
    pub pitch: f64,
    pub hfov: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub multi_res: MultiResConf,
    pub hot_spots: Vec<HotSpotConf>,
}

/// The multi-resolution pyramid block of a scene record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiResConf {
    pub base_path: String,
    pub path: String,
    pub fallback_path: String,
    pub extension: String,
    pub tile_resolution: u32,
    pub max_level: u32,
    pub cube_resolution: u32,
}

/// One outgoing navigation link in a scene record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotSpotConf {
    /// Always `"scene"`.
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub yaw: f64,
    pub pitch: f64,
    pub target_yaw: f64,
    pub target_pitch: f64,
    pub scene_id: String,
}

impl TourConf {
    /// Serialize the document.
    ///
    /// Compact mode keeps declared key order with no whitespace; debug
    /// mode re-sorts every object's keys and indents, which is easier to
    /// diff by hand.
    pub fn to_json(&self, debug: bool) -> Result<String, ConfError> {
        if debug {
            // serde_json's Value map is a BTreeMap, so a round-trip
            // through Value sorts all keys.
            let value = serde_json::to_value(self)?;
            Ok(serde_json::to_string_pretty(&value)?)
        } else {
            Ok(serde_json::to_string(self)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TourConf {
        let scene = SceneConf {
            kind: "multires".to_string(),
            north_offset: 12.5,
            title: "Bridge".to_string(),
            compass: true,
            yaw: 0.0,
            pitch: 0.0,
            hfov: 90.0,
            min_pitch: None,
            max_pitch: Some(45.0),
            location: Some(GeoPoint::new(51.2184, 6.7616)),
            multi_res: MultiResConf {
                base_path: "../tiles/bridge".to_string(),
                path: TILE_PATH_TEMPLATE.to_string(),
                fallback_path: FALLBACK_PATH_TEMPLATE.to_string(),
                extension: "jpg".to_string(),
                tile_resolution: 456,
                max_level: 4,
                cube_resolution: 3648,
            },
            hot_spots: vec![],
        };
        let mut scenes = BTreeMap::new();
        scenes.insert("bridge".to_string(), scene);
        TourConf {
            default: DefaultConf {
                author: Some("4pi".to_string()),
                first_scene: "bridge".to_string(),
                auto_load: true,
                ..Default::default()
            },
            scenes,
        }
    }

    #[test]
    fn test_compact_mode_has_no_whitespace() {
        let json = sample().to_json(false).unwrap();
        assert!(!json.contains('\n'));
        assert!(!json.contains(": "));
    }

    #[test]
    fn test_compact_mode_field_names() {
        let json = sample().to_json(false).unwrap();
        for key in [
            "\"type\":\"multires\"",
            "\"northOffset\":12.5",
            "\"firstScene\":\"bridge\"",
            "\"autoLoad\":true",
            "\"basePath\":\"../tiles/bridge\"",
            "\"path\":\"/%l/%s%y_%x\"",
            "\"fallbackPath\":\"/fallback/%s\"",
            "\"tileResolution\":456",
            "\"maxLevel\":4",
            "\"cubeResolution\":3648",
            "\"maxPitch\":45.0",
        ] {
            assert!(json.contains(key), "missing {} in {}", key, json);
        }
    }

    #[test]
    fn test_absent_options_are_omitted() {
        let json = sample().to_json(false).unwrap();
        assert!(!json.contains("minPitch"));
        assert!(!json.contains("autoRotate"));
        assert!(!json.contains("sceneFadeDuration"));
        assert!(!json.contains("hotSpotDebug"));
    }

    #[test]
    fn test_debug_mode_is_indented_and_sorted() {
        let json = sample().to_json(true).unwrap();
        assert!(json.contains('\n'));
        // Sorted keys: "compass" precedes "northOffset" precedes "title".
        let compass = json.find("\"compass\"").unwrap();
        let north = json.find("\"northOffset\"").unwrap();
        let title = json.find("\"title\"").unwrap();
        assert!(compass < north && north < title);
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let conf = sample();
        assert_eq!(conf.to_json(false).unwrap(), conf.to_json(false).unwrap());
        assert_eq!(conf.to_json(true).unwrap(), conf.to_json(true).unwrap());
    }

    #[test]
    fn test_round_trips_through_serde() {
        let json = sample().to_json(false).unwrap();
        let back: TourConf = serde_json::from_str(&json).unwrap();
        assert_eq!(back.default.first_scene, "bridge");
        assert_eq!(back.scenes["bridge"].multi_res.cube_resolution, 3648);
    }
}
