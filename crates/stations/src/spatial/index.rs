//! R-tree nodes for spatial indexing.
//!
//! ## Two-Stage Filtering
//!
//! Radius queries first ask the R-tree for candidates in degree space, then
//! keep only the ones whose haversine distance is inside the radius.

use std::sync::Arc;

use geo::Point;
use rstar::{PointDistance, RTreeObject, AABB};

use crate::models::station::Station;

#[derive(Clone)]
pub struct StationNode {
    pub station: Arc<Station>,
    point: [f64; 2],
}

impl StationNode {
    pub fn new(location: Point, station: Arc<Station>) -> Self {
        Self {
            station,
            point: [location.x(), location.y()],
        }
    }
}

impl RTreeObject for StationNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for StationNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}
