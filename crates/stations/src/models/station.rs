//! The battery-swap station record.

use std::sync::Arc;

use chrono::NaiveDateTime;
use geo::Point;

use crate::identifiers::StationIdentifier;
use crate::models::hours::OpeningHours;
use crate::models::types::{LngLat, StationStatus};

/// A physical battery-swap location
///
/// Immutable for the lifetime of a screen session; shared as `Arc<Station>`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Station {
    pub id: StationIdentifier,
    pub name: Arc<str>,
    pub address: Arc<str>,
    pub latitude: f64,
    pub longitude: f64,
    pub status: StationStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub battery_count: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub open_time: Arc<str>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub image: Arc<str>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub swappable_batteries: u32,
}

impl Station {
    pub fn location(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    pub fn position(&self) -> LngLat {
        LngLat::new(self.longitude, self.latitude)
    }

    pub fn opening_hours(&self) -> Option<OpeningHours> {
        OpeningHours::parse(&self.open_time)
    }

    /// Stations with unparsable hours are reported as open.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        self.opening_hours()
            .map(|hours| hours.is_open_at(at))
            .unwrap_or(true)
    }
}
