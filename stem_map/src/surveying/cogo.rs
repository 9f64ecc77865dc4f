//! Coordinate geometry (COGO) for stem mapping.
//!
//! Azimuths are compass bearings: degrees clockwise from grid north, so
//! 0° points along +northing and 90° along +easting. Values outside
//! `[0, 360)` are accepted because sine and cosine are periodic.

use crate::geometry::Point;

/// Converts a compass azimuth in degrees to radians.
pub fn azimuth_to_radians(azimuth_deg: f64) -> f64 {
    azimuth_deg.to_radians()
}

/// Computes a new point from a starting point, a compass azimuth in degrees
/// and a horizontal distance.
pub fn forward(start: Point, azimuth_deg: f64, distance: f64) -> Point {
    let theta = azimuth_to_radians(azimuth_deg);
    Point::new(
        start.x + distance * theta.sin(),
        start.y + distance * theta.cos(),
    )
}

/// Locates a stem from its reference point and polar offset.
///
/// Returns `None` if any operand is missing or not finite; a missing input
/// never yields a fabricated coordinate.
pub fn project_offset(
    reference: Option<Point>,
    distance: Option<f64>,
    azimuth_deg: Option<f64>,
) -> Option<Point> {
    let reference = reference.filter(Point::is_finite)?;
    let distance = distance.filter(|d| d.is_finite())?;
    let azimuth_deg = azimuth_deg.filter(|a| a.is_finite())?;
    Some(forward(reference, azimuth_deg, distance))
}
