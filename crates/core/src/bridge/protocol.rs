//! Messages exchanged between the host and the map surface.
//!
//! Frames are JSON objects discriminated by `type`. Each frame may carry a
//! protocol version `v`; frames without one are version 1.

use std::sync::Arc;

use amply_stations::{LngLat, Station, StationIdentifier};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::bridge::BridgeError;

pub const PROTOCOL_VERSION: u32 = 1;

/// Tags a route request so late answers for an older request can be dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Host -> map
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum HostMessage {
    InitMap {
        user_location: LngLat,
        stations: Vec<Arc<Station>>,
    },
    ShowRoute {
        start: LngLat,
        end: LngLat,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
    ClearRoute,
}

/// Map -> host
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum MapEvent {
    StationSelected {
        station_id: StationIdentifier,
    },
    RouteInfo {
        /// meters
        distance: f64,
        /// seconds
        duration: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
    },
    RouteFailed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
        #[serde(default)]
        reason: String,
    },
    MapLoaded,
}

/// A message type that may cross the bridge.
pub trait Frame: Serialize + DeserializeOwned {
    /// Checks that hold regardless of what the receiver currently knows.
    fn validate(&self) -> Result<(), BridgeError>;
}

impl Frame for HostMessage {
    fn validate(&self) -> Result<(), BridgeError> {
        match self {
            HostMessage::InitMap {
                user_location,
                stations,
            } => {
                check_position("userLocation", user_location)?;
                for station in stations {
                    if station.id.is_empty() {
                        return Err(BridgeError::Invalid("station with empty id".to_owned()));
                    }
                    check_position("station position", &station.position())?;
                }
                Ok(())
            }
            HostMessage::ShowRoute { start, end, .. } => {
                check_position("start", start)?;
                check_position("end", end)
            }
            HostMessage::ClearRoute => Ok(()),
        }
    }
}

impl Frame for MapEvent {
    fn validate(&self) -> Result<(), BridgeError> {
        match self {
            MapEvent::StationSelected { station_id } if station_id.is_empty() => {
                Err(BridgeError::Invalid("empty stationId".to_owned()))
            }
            MapEvent::RouteInfo {
                distance, duration, ..
            } => {
                check_measure("distance", *distance)?;
                check_measure("duration", *duration)
            }
            _ => Ok(()),
        }
    }
}

fn check_position(what: &str, position: &LngLat) -> Result<(), BridgeError> {
    if position.is_valid() {
        Ok(())
    } else {
        Err(BridgeError::Invalid(format!("{what} {position} out of range")))
    }
}

fn check_measure(what: &str, value: f64) -> Result<(), BridgeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BridgeError::Invalid(format!("{what} must be a non-negative number, got {value}")))
    }
}

pub fn encode<F: Frame>(frame: &F) -> Result<String, BridgeError> {
    let mut value = serde_json::to_value(frame)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("v".to_owned(), PROTOCOL_VERSION.into());
    }
    Ok(serde_json::to_string(&value)?)
}

pub fn decode<F: Frame>(text: &str) -> Result<F, BridgeError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    let version = match value.get("v") {
        None => PROTOCOL_VERSION,
        Some(v) => v
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| BridgeError::Invalid(format!("bad protocol version {v}")))?,
    };
    if version > PROTOCOL_VERSION {
        return Err(BridgeError::UnsupportedVersion {
            found: version,
            supported: PROTOCOL_VERSION,
        });
    }

    let frame: F = serde_json::from_value(value)?;
    frame.validate()?;
    Ok(frame)
}
