//! Great-circle geometry between panorama locations.
//!
//! Provides distance and initial-bearing calculations between geographic
//! points, plus the human-readable distance labels used by scene hotspots.
//! All angles are in decimal degrees at the API boundary and converted to
//! radians internally.

/// Mean Earth radius in kilometers, as used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new point from latitude and longitude in degrees.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Great-circle distance between two points via the haversine formula.
///
/// # Arguments
///
/// * `a` - First point in decimal degrees
/// * `b` - Second point in decimal degrees
///
/// # Returns
///
/// Distance in kilometers, always non-negative. Symmetric in its
/// arguments, and zero when both points coincide.
#[inline]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let d = (dlat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng * 0.5).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * d.sqrt().asin()
}

/// Initial bearing from `a` towards `b`.
///
/// # Returns
///
/// Bearing in degrees, normalized into `[0, 360)`, measured clockwise
/// from true north. Coincident points yield `0`.
#[inline]
pub fn bearing_degrees(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let y = dlng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlng.cos();
    normalize_degrees(y.atan2(x).to_degrees())
}

/// Normalize an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    degrees.rem_euclid(360.0)
}

/// Format a distance as a short label for hotspot text.
///
/// The thresholds and precision are a fixed contract with the viewer
/// layout: meters below one kilometer, one decimal below ten kilometers,
/// whole kilometers above.
pub fn format_distance(km: f64) -> String {
    let label = if km < 0.1 {
        format!("{:3.0} m", km * 1000.0)
    } else if km < 1.0 {
        format!("{:3.0} m", km * 1000.0)
    } else if km < 10.0 {
        format!("{:3.1} km", km)
    } else if km < 100.0 {
        format!("{:3.0} km", km)
    } else {
        format!("{:5.0} km", km)
    };
    label.trim().to_string()
}
