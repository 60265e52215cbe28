//! Lookup interface over a station catalogue.
//!
//! Implementations can be in-memory, database-backed, or remote.

use std::sync::Arc;

use geo::Point;

use crate::identifiers::StationIdentifier;
use crate::models::station::Station;

pub trait StationProvider: Send + Sync {
    // ---- Lookups ----
    fn get_station(&self, id: &StationIdentifier) -> Option<Arc<Station>>;

    // ---- Collections ----
    fn all_stations(&self) -> Vec<Arc<Station>>;

    /// Case-insensitive match against name or address
    fn search(&self, text: &str) -> Vec<Arc<Station>>;

    // ---- Spatial queries ----

    /// Find stations within radius (meters), closest first
    fn stations_near(&self, point: Point, radius_m: f64) -> Vec<Arc<Station>>;

    /// Find the N nearest stations to a point, closest first
    fn nearest_stations(&self, point: Point, n: usize) -> Vec<Arc<Station>>;
}
