//! Panotour - cubic tile pyramids and tour documents from panoramas
//!
//! This library turns equirectangular panoramas into the multi-resolution
//! cubic tile pyramids and scene-graph configuration consumed by a
//! web panorama viewer. Projection of the source into cube faces is
//! delegated to an external rectification tool; everything else — pyramid
//! geometry, tiling, inter-scene navigation links, document assembly —
//! lives here.

pub mod conf;
pub mod geo;
pub mod hotspot;
pub mod metadata;
pub mod pyramid;
pub mod rectify;
pub mod scene;
pub mod tour;

pub use conf::TourConf;
pub use geo::GeoPoint;
pub use hotspot::HotSpot;
pub use metadata::{scene_id_from_path, MetadataSet, PanoramaMetadata};
pub use pyramid::{PyramidError, PyramidSpec};
pub use rectify::{Face, NonaRectifier, RectificationJob, Rectifier, RectifyError};
pub use scene::{Scene, SceneError, Stage};
pub use tour::{Tour, TourError, TourOptions};
