//! Tour aggregation: many scenes into one navigable document.
//!
//! A tour owns its scenes in insertion order, computes the pairwise
//! hotspot links once, and assembles the configuration document. It
//! never triggers tiling; extraction and tiling are explicit per-scene
//! steps driven by the caller.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::conf::{ConfError, DefaultConf, TourConf};
use crate::hotspot::HotSpot;
use crate::metadata::MetadataSet;
use crate::scene::Scene;

/// Errors assembling a tour document.
#[derive(Debug, Error)]
pub enum TourError {
    /// A tour needs at least one scene to pick a first scene from.
    #[error("Tour has no scenes")]
    Empty,

    /// The explicitly requested first scene is not part of the tour.
    #[error("First scene '{0}' is not in the tour")]
    UnknownFirstScene(String),

    #[error(transparent)]
    Conf(#[from] ConfError),
}

/// Global tour options.
#[derive(Debug, Clone, Default)]
pub struct TourOptions {
    /// Document author.
    pub author: Option<String>,
    /// Auto-rotation speed in degrees per second, when enabled.
    pub auto_rotate: Option<f64>,
    /// Scene fade duration in milliseconds.
    pub scene_fade_duration: Option<u32>,
    /// Emit the document indented with sorted keys, plus viewer debug
    /// flags.
    pub debug: bool,
    /// Override for the first scene; defaults to the first inserted.
    pub first_scene: Option<String>,
}

impl TourOptions {
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_auto_rotate(mut self, degrees_per_second: f64) -> Self {
        self.auto_rotate = Some(degrees_per_second);
        self
    }

    pub fn with_scene_fade_duration(mut self, millis: u32) -> Self {
        self.scene_fade_duration = Some(millis);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_first_scene(mut self, scene_id: impl Into<String>) -> Self {
        self.first_scene = Some(scene_id.into());
        self
    }
}

/// A set of scenes plus the metadata records linking them.
pub struct Tour {
    options: TourOptions,
    metadata: MetadataSet,
    scenes: Vec<Scene>,
}

impl Tour {
    /// Create an empty tour over the given metadata set.
    pub fn new(options: TourOptions, metadata: MetadataSet) -> Self {
        Self {
            options,
            metadata,
            scenes: Vec::new(),
        }
    }

    /// Add a scene. Insertion order determines the default first scene.
    pub fn add_scene(&mut self, scene: Scene) {
        self.scenes.push(scene);
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut [Scene] {
        &mut self.scenes
    }

    pub fn metadata(&self) -> &MetadataSet {
        &self.metadata
    }

    /// Outgoing hotspot links for one scene: one per other scene whose
    /// metadata carries a location, provided this scene has one too.
    /// Pairs are not deduplicated; each scene stores its own set.
    pub fn hotspots_for(&self, scene_id: &str) -> Vec<HotSpot> {
        let Some(src) = self.metadata.get(scene_id) else {
            return Vec::new();
        };
        if src.location.is_none() {
            return Vec::new();
        }
        self.metadata
            .iter()
            .filter(|(dest_id, dest)| dest_id.as_str() != scene_id && dest.location.is_some())
            .map(|(dest_id, dest)| HotSpot::new(dest_id, src, dest))
            .collect()
    }

    /// Assemble the configuration document.
    ///
    /// # Errors
    ///
    /// [`TourError::Empty`] without scenes, [`TourError::UnknownFirstScene`]
    /// when an explicit first-scene override names an absent scene.
    pub fn conf(&self) -> Result<TourConf, TourError> {
        let first_inserted = self
            .scenes
            .first()
            .map(|s| s.scene_id().to_string())
            .ok_or(TourError::Empty)?;

        let first_scene = match &self.options.first_scene {
            Some(id) => {
                if !self.scenes.iter().any(|s| s.scene_id() == id.as_str()) {
                    return Err(TourError::UnknownFirstScene(id.clone()));
                }
                id.clone()
            }
            None => first_inserted,
        };

        let mut scenes = BTreeMap::new();
        for scene in &self.scenes {
            let hotspots = self.hotspots_for(scene.scene_id());
            debug!(scene_id = %scene.scene_id(), links = hotspots.len(), "scene record assembled");
            scenes.insert(scene.scene_id().to_string(), scene.conf(&hotspots));
        }

        Ok(TourConf {
            default: DefaultConf {
                author: self.options.author.clone(),
                first_scene,
                auto_load: true,
                auto_rotate: self.options.auto_rotate,
                scene_fade_duration: self.options.scene_fade_duration,
                debug: self.options.debug.then_some(true),
                hot_spot_debug: self.options.debug.then_some(true),
            },
            scenes,
        })
    }

    /// Serialize the document in the mode selected by the options.
    pub fn to_json(&self) -> Result<String, TourError> {
        Ok(self.conf()?.to_json(self.options.debug)?)
    }
}
