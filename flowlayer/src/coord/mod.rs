//! Geographic coordinate primitives.
//!
//! Provides the `[longitude, latitude]` vertex type shared by route geometry
//! and camera state, plus longitude normalization used to avoid seams at the
//! antimeridian.

/// Minimum valid latitude in degrees (Web Mercator clamp).
pub const MIN_LAT: f64 = -85.05112878;

/// Maximum valid latitude in degrees (Web Mercator clamp).
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// A geographic position as `[longitude, latitude]` in degrees.
///
/// Route vertices and camera centers both use this type. The field order
/// matches GeoJSON position order (longitude first).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LonLat {
    /// Longitude in degrees.
    pub lon: f64,
    /// Latitude in degrees.
    pub lat: f64,
}

impl LonLat {
    /// Create a new position.
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// Returns true if both components are finite and within geographic bounds.
    ///
    /// Longitudes slightly outside [-180, 180] are considered valid input
    /// because hosts report unwrapped longitudes while panning across the
    /// antimeridian; callers normalize via [`normalize_longitude`].
    pub fn is_finite(&self) -> bool {
        self.lon.is_finite() && self.lat.is_finite()
    }
}

/// Normalizes a longitude into `[-180, 180)`.
///
/// Uses `((lon + 540) mod 360) - 180` so that unwrapped longitudes reported
/// by a host panning across the antimeridian map back into the canonical
/// range (e.g. `-185` becomes `175`).
#[inline]
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 540.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_longitude_antimeridian_wrap() {
        // ((-185 + 540) % 360) - 180 = 175
        assert_eq!(normalize_longitude(-185.0), 175.0);
    }

    #[test]
    fn test_normalize_longitude_identity_in_range() {
        assert_eq!(normalize_longitude(0.0), 0.0);
        assert_eq!(normalize_longitude(-74.006), -74.006);
        assert_eq!(normalize_longitude(139.69), 139.69);
    }

    #[test]
    fn test_normalize_longitude_eastward_wrap() {
        assert_eq!(normalize_longitude(185.0), -175.0);
        assert_eq!(normalize_longitude(360.0), 0.0);
        assert_eq!(normalize_longitude(540.0), -180.0);
    }

    #[test]
    fn test_normalize_longitude_multiple_wraps() {
        assert!((normalize_longitude(720.0 + 10.0) - 10.0).abs() < 1e-9);
        assert!((normalize_longitude(-720.0 - 10.0) + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_lon_lat_is_finite() {
        assert!(LonLat::new(-74.006, 40.7128).is_finite());
        assert!(!LonLat::new(f64::NAN, 0.0).is_finite());
        assert!(!LonLat::new(0.0, f64::INFINITY).is_finite());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_normalized_longitude_in_range(lon in -1000.0..1000.0_f64) {
                let normalized = normalize_longitude(lon);
                prop_assert!(
                    (-180.0..180.0).contains(&normalized),
                    "Normalized longitude {} out of range for input {}",
                    normalized, lon
                );
            }

            #[test]
            fn test_normalization_preserves_angle(lon in -1000.0..1000.0_f64) {
                let normalized = normalize_longitude(lon);
                let delta = (lon - normalized).rem_euclid(360.0);
                // Difference must be a whole number of turns.
                prop_assert!(
                    delta.abs() < 1e-6 || (delta - 360.0).abs() < 1e-6,
                    "Normalization changed the angle: {} -> {} (delta {})",
                    lon, normalized, delta
                );
            }

            #[test]
            fn test_normalization_is_idempotent(lon in -1000.0..1000.0_f64) {
                let once = normalize_longitude(lon);
                let twice = normalize_longitude(once);
                prop_assert!((once - twice).abs() < 1e-9);
            }
        }
    }
}
