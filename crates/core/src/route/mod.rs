//! Driving route between two points.
//!
//! One attempt per request: no retry, no cancellation. Callers decide what a
//! failure means for them.

use std::future::Future;
use std::pin::Pin;

use amply_stations::LngLat;
use geo::LineString;

pub mod mapbox;

pub use mapbox::MapboxDirections;

#[derive(Clone, Debug, PartialEq)]
pub struct RouteSummary {
    pub distance_m: f64,
    pub duration_s: f64,
    pub geometry: LineString<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("directions provider answered {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("no route between {start} and {end}")]
    NoRoute { start: LngLat, end: LngLat },
    #[error("unreadable directions response: {0}")]
    Decode(String),
    #[error("no directions access token configured")]
    MissingToken,
    #[error("invalid directions url: {0}")]
    InvalidUrl(String),
}

pub trait RouteProvider: Send + Sync {
    fn route<'a>(
        &'a self,
        start: LngLat,
        end: LngLat,
    ) -> Pin<Box<dyn Future<Output = Result<RouteSummary, RouteError>> + Send + 'a>>;
}
