//! Core enums, coordinates and errors for station data.

use std::fmt;
use std::str::FromStr;

use geo::Point;

use crate::identifiers::StationIdentifier;

// ============================================================================
// Enums
// ============================================================================

/// Operational status reported by a station
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StationStatus {
    Available,
    Occupied,
    Maintenance,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Maintenance => "maintenance",
        }
    }

    /// Whether a swap can currently be booked at the station
    pub fn accepts_bookings(&self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StationStatus {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(StationError::InvalidData(format!(
                "unknown station status `{other}`"
            ))),
        }
    }
}

// ============================================================================
// Coordinates
// ============================================================================

/// A WGS84 position, serialized as `[longitude, latitude]`
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "[f64; 2]", into = "[f64; 2]"))]
pub struct LngLat {
    pub longitude: f64,
    pub latitude: f64,
}

impl LngLat {
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    pub fn to_point(self) -> Point {
        Point::new(self.longitude, self.latitude)
    }

    /// Finite and within the WGS84 ranges
    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self::new(longitude, latitude)
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(value: LngLat) -> Self {
        [value.longitude, value.latitude]
    }
}

impl From<Point> for LngLat {
    fn from(point: Point) -> Self {
        Self::new(point.x(), point.y())
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.longitude, self.latitude)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StationError {
    #[error("Station not found: {0}")]
    StationNotFound(StationIdentifier),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, StationError>;
