//! Geofence containment.
//!
//! Points are projected onto spherical Web Mercator (EPSG:3857) and compared
//! by planar Euclidean distance in meters. Degree deltas are not linear in
//! distance, so comparing raw lat/lng would skew with latitude.

use std::f64::consts::FRAC_PI_4;

use crate::domain::value_objects::GeoPoint;

/// Semi-major axis used by EPSG:3857
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Web Mercator is undefined at the poles; latitudes are clamped here.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Absolute slack applied at the boundary. Absorbs float error from the
/// km to m conversion; far below any meaningful geofence resolution.
pub const BOUNDARY_TOLERANCE_M: f64 = 1e-6;

/// Project a point to planar (x, y) meters
pub fn project(point: &GeoPoint) -> (f64, f64) {
    let lat = point.lat().clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = EARTH_RADIUS_M * point.lng().to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln();
    (x, y)
}

/// Planar distance between two points in projected meters
pub fn planar_distance_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let (ax, ay) = project(a);
    let (bx, by) = project(b);
    (ax - bx).hypot(ay - by)
}

/// True when `a` lies within `radius_km` of `b`. The boundary is inside.
///
/// A negative or non-finite radius contains nothing.
pub fn within_radius(a: &GeoPoint, b: &GeoPoint, radius_km: f64) -> bool {
    if !radius_km.is_finite() || radius_km < 0.0 {
        return false;
    }
    planar_distance_m(a, b) <= radius_km * 1000.0 + BOUNDARY_TOLERANCE_M
}
