//! Spatial query utilities for distance calculations.
//!
//! Uses the Haversine formula for distances on Earth's surface.

use geo::{HaversineDistance, Point};

const METERS_PER_DEGREE: f64 = 111_320.0;

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Convert meters to degrees at the equator
pub fn meters_to_degrees_approx(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Degree radius that covers `meters` in every direction around `latitude`.
///
/// A degree of longitude shrinks with latitude, so the equator figure is widened.
pub fn search_radius_degrees(meters: f64, latitude: f64) -> f64 {
    let shrink = latitude.to_radians().cos().abs().max(0.01);
    meters_to_degrees_approx(meters) / shrink
}
