use std::time::Duration;

use amply_stations::LngLat;
use serde::Deserialize;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/";
const DEFAULT_DIRECTIONS_BASE_URL: &str = "https://api.mapbox.com/directions/v5/mapbox/driving";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Settings shared by every part of the core.
///
/// Every field has a default, so the host app may pass partial JSON.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub api_base_url: String,
    pub mapbox_access_token: Option<String>,
    pub directions_base_url: String,
    pub request_timeout_ms: u64,
    /// Added on top of the route duration when a booking starts
    pub booking_buffer_minutes: u32,
    /// Total booking window when no route duration is known
    pub fallback_booking_minutes: u32,
    /// Where the map centres when location permission is refused
    pub fallback_location: LngLat,
    /// Delay between the surface reporting loaded and the first INIT_MAP
    pub bridge_settle_ms: u64,
    pub route_timeout_ms: u64,
    /// How long the platform gets to confirm the external map opened
    pub handoff_timeout_ms: u64,
    pub tick_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            mapbox_access_token: None,
            directions_base_url: DEFAULT_DIRECTIONS_BASE_URL.to_owned(),
            request_timeout_ms: 10_000,
            booking_buffer_minutes: 30,
            fallback_booking_minutes: 30,
            fallback_location: LngLat::new(106.7017, 10.7769),
            bridge_settle_ms: 1_000,
            route_timeout_ms: 15_000,
            handoff_timeout_ms: 10_000,
            tick_ms: 1_000,
        }
    }
}

impl CoreConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `AMPLY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("AMPLY_API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Ok(token) = std::env::var("AMPLY_MAPBOX_ACCESS_TOKEN") {
            config.mapbox_access_token = Some(token).filter(|t| !t.is_empty());
        }
        if let Ok(url) = std::env::var("AMPLY_DIRECTIONS_BASE_URL") {
            config.directions_base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fallback_location.is_valid() {
            return Err(ConfigError::Invalid {
                field: "fallback_location",
                reason: format!("{} is not a WGS84 position", self.fallback_location),
            });
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "tick_ms",
                reason: "must be positive".to_owned(),
            });
        }
        if self.fallback_booking_minutes == 0 {
            return Err(ConfigError::Invalid {
                field: "fallback_booking_minutes",
                reason: "must be positive".to_owned(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn bridge_settle(&self) -> Duration {
        Duration::from_millis(self.bridge_settle_ms)
    }

    pub fn route_timeout(&self) -> Duration {
        Duration::from_millis(self.route_timeout_ms)
    }

    pub fn handoff_timeout(&self) -> Duration {
        Duration::from_millis(self.handoff_timeout_ms)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
