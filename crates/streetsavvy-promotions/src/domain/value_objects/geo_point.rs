//! Geographic point value object (WGS84 latitude/longitude in degrees).

use serde::{Deserialize, Serialize};

use crate::error::PromoError;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Create a validated point. Latitude must lie in [-90, 90] and
    /// longitude in [-180, 180].
    pub fn new(lat: f64, lng: f64) -> Result<Self, PromoError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(PromoError::InvalidParameter(format!(
                "latitude out of range: {lat}"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(PromoError::InvalidParameter(format!(
                "longitude out of range: {lng}"
            )));
        }
        Ok(Self { lat, lng })
    }

    /// Create a point from trusted storage without validation
    pub fn new_unchecked(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_point() {
        let p = GeoPoint::new(40.0, -74.0).unwrap();
        assert_eq!(p.lat(), 40.0);
        assert_eq!(p.lng(), -74.0);
    }

    #[test]
    fn test_poles_and_antimeridian_are_valid() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_out_of_range_latitude() {
        assert!(matches!(GeoPoint::new(90.5, 0.0), Err(PromoError::InvalidParameter(_))));
    }

    #[test]
    fn test_out_of_range_longitude() {
        assert!(matches!(GeoPoint::new(0.0, -180.1), Err(PromoError::InvalidParameter(_))));
    }

    #[test]
    fn test_nan_rejected() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
    }
}
