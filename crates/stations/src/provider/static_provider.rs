//! In-memory station provider.
//!
//! Holds the station list fetched for a screen session with an id map and an
//! R-tree for proximity queries.

use std::collections::HashMap;
use std::sync::Arc;

use geo::Point;
use rstar::RTree;

use crate::identifiers::StationIdentifier;
use crate::models::{station::Station, traits::StationProvider};
use crate::spatial::index::StationNode;
use crate::spatial::queries::{haversine_distance, search_radius_degrees};

/// In-memory station provider with spatial indexing
///
/// This type is cheap to clone since all data is stored in `Arc`s.
#[derive(Clone)]
pub struct StaticStationProvider {
    stations: Vec<Arc<Station>>,
    station_map: HashMap<StationIdentifier, Arc<Station>>,
    station_tree: RTree<StationNode>,
}

impl StaticStationProvider {
    pub fn new() -> Self {
        Self {
            stations: Vec::new(),
            station_map: HashMap::new(),
            station_tree: RTree::new(),
        }
    }

    /// Later duplicates of an id replace earlier ones in lookups; list order is kept.
    pub fn from_stations(stations: Vec<Station>) -> Self {
        let stations: Vec<Arc<Station>> = stations.into_iter().map(Arc::new).collect();

        let station_map: HashMap<_, _> = stations
            .iter()
            .map(|s| (s.id.clone(), s.clone()))
            .collect();

        let station_tree = RTree::bulk_load(
            stations
                .iter()
                .map(|s| StationNode::new(s.location(), s.clone()))
                .collect(),
        );

        Self {
            stations,
            station_map,
            station_tree,
        }
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Stations in their original order, borrowed
    pub fn stations(&self) -> &[Arc<Station>] {
        &self.stations
    }
}

impl Default for StaticStationProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl StationProvider for StaticStationProvider {
    fn get_station(&self, id: &StationIdentifier) -> Option<Arc<Station>> {
        self.station_map.get(id).cloned()
    }

    fn all_stations(&self) -> Vec<Arc<Station>> {
        self.stations.clone()
    }

    fn search(&self, text: &str) -> Vec<Arc<Station>> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.all_stations();
        }

        self.stations
            .iter()
            .filter(|s| {
                s.name.to_lowercase().contains(&needle)
                    || s.address.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    fn stations_near(&self, point: Point, radius_m: f64) -> Vec<Arc<Station>> {
        if radius_m <= 0.0 || !radius_m.is_finite() {
            return Vec::new();
        }

        let radius_deg = search_radius_degrees(radius_m, point.y());

        let mut found: Vec<_> = self
            .station_tree
            .locate_within_distance([point.x(), point.y()], radius_deg * radius_deg)
            .map(|node| {
                (
                    haversine_distance(point, node.station.location()),
                    node.station.clone(),
                )
            })
            .filter(|(distance, _)| *distance <= radius_m)
            .collect();

        found.sort_by(|a, b| a.0.total_cmp(&b.0));
        found.into_iter().map(|(_, s)| s).collect()
    }

    fn nearest_stations(&self, point: Point, n: usize) -> Vec<Arc<Station>> {
        // Degree-space ordering is close enough at city scale; re-sort the
        // short candidate list geodesically.
        let mut candidates: Vec<_> = self
            .station_tree
            .nearest_neighbor_iter(&[point.x(), point.y()])
            .take(n.saturating_mul(2))
            .map(|node| {
                (
                    haversine_distance(point, node.station.location()),
                    node.station.clone(),
                )
            })
            .collect();

        candidates.sort_by(|a, b| a.0.total_cmp(&b.0));
        candidates.into_iter().take(n).map(|(_, s)| s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::station::fixtures::station;

    fn provider() -> StaticStationProvider {
        StaticStationProvider::from_stations(vec![
            station("1", 106.7017, 10.7769),
            station("2", 106.6934, 10.7834),
            station("3", 105.8342, 21.0278), // Hanoi
        ])
    }

    #[test]
    fn test_empty_provider() {
        let provider = StaticStationProvider::new();
        assert!(provider.is_empty());
        assert_eq!(provider.all_stations().len(), 0);
        assert!(provider.nearest_stations(Point::new(0.0, 0.0), 3).is_empty());
    }

    #[test]
    fn test_provider_lookups() {
        let provider = provider();

        assert!(provider.get_station(&StationIdentifier::new("2")).is_some());
        assert!(provider.get_station(&StationIdentifier::new("9")).is_none());
        assert_eq!(provider.len(), 3);
    }

    #[test]
    fn test_stations_near() {
        let provider = provider();
        let here = Point::new(106.70, 10.78);

        let mut ids: Vec<_> = provider
            .stations_near(here, 5_000.0)
            .iter()
            .map(|s| s.id.to_string())
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["1", "2"]);

        assert!(provider.stations_near(here, -1.0).is_empty());
        assert!(provider.stations_near(here, f64::NAN).is_empty());
    }

    #[test]
    fn test_stations_near_closest_first() {
        // Enough stations for the R-tree to split into several leaves.
        let mut stations: Vec<_> = (0..40)
            .map(|i| station(&format!("s{i}"), 106.7005 + i as f64 * 0.001, 10.78))
            .collect();
        stations.push(station("near", 106.7201, 10.78));
        let provider = StaticStationProvider::from_stations(stations);
        let here = Point::new(106.7200, 10.78);

        let found = provider.stations_near(here, 5_000.0);
        assert_eq!(found.len(), 41);
        assert_eq!(found[0].id.as_str(), "near");

        let distances: Vec<f64> = found
            .iter()
            .map(|s| haversine_distance(here, s.location()))
            .collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_nearest_stations_are_ordered() {
        let provider = provider();
        let near_two = Point::new(106.6930, 10.7830);

        let nearest = provider.nearest_stations(near_two, 2);
        assert_eq!(nearest.len(), 2);
        assert_eq!(nearest[0].id.as_str(), "2");
        assert_eq!(nearest[1].id.as_str(), "1");
    }

    #[test]
    fn test_search_matches_name_and_address() {
        let provider = provider();

        assert_eq!(provider.search("station 3").len(), 1);
        assert_eq!(provider.search("VO VAN TAN").len(), 3);
        assert_eq!(provider.search("   ").len(), 3);
        assert!(provider.search("hai ba trung").is_empty());
    }
}
