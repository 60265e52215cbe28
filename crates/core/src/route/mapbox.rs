use std::future::Future;
use std::pin::Pin;

use amply_stations::LngLat;
use geo::LineString;
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::config::CoreConfig;
use crate::route::{RouteError, RouteProvider, RouteSummary};

/// Mapbox Directions API, driving profile.
pub struct MapboxDirections {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    distance: f64,
    duration: f64,
    geometry: geojson::Geometry,
}

impl MapboxDirections {
    pub fn new(config: &CoreConfig) -> Result<Self, RouteError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self::with_client(
            client,
            config.directions_base_url.clone(),
            config.mapbox_access_token.clone(),
        ))
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: String,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            access_token,
        }
    }

    pub fn request_url(&self, start: LngLat, end: LngLat) -> Result<Url, RouteError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(RouteError::MissingToken)?;

        let path = format!(
            "{}/{},{};{},{}",
            self.base_url.trim_end_matches('/'),
            start.longitude,
            start.latitude,
            end.longitude,
            end.latitude
        );

        Url::parse_with_params(&path, &[("geometries", "geojson"), ("access_token", token)])
            .map_err(|e| RouteError::InvalidUrl(e.to_string()))
    }

    async fn fetch(&self, start: LngLat, end: LngLat) -> Result<RouteSummary, RouteError> {
        let url = self.request_url(start, end)?;
        debug!(%start, %end, "requesting directions");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RouteError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        parse_directions(&body, start, end)
    }
}

impl RouteProvider for MapboxDirections {
    fn route<'a>(
        &'a self,
        start: LngLat,
        end: LngLat,
    ) -> Pin<Box<dyn Future<Output = Result<RouteSummary, RouteError>> + Send + 'a>> {
        Box::pin(self.fetch(start, end))
    }
}

/// Picks the shortest-duration route of a Directions response.
fn parse_directions(body: &str, start: LngLat, end: LngLat) -> Result<RouteSummary, RouteError> {
    let response: DirectionsResponse =
        serde_json::from_str(body).map_err(|e| RouteError::Decode(e.to_string()))?;

    let route = response
        .routes
        .into_iter()
        .min_by(|a, b| a.duration.total_cmp(&b.duration))
        .ok_or(RouteError::NoRoute { start, end })?;

    let geometry = LineString::<f64>::try_from(route.geometry.value)
        .map_err(|e| RouteError::Decode(e.to_string()))?;

    Ok(RouteSummary {
        distance_m: route.distance,
        duration_s: route.duration,
        geometry,
    })
}
