use amply_api_types::station::StationListQuery;
use amply_stations::{Station, StationIdentifier};

use crate::api::{ApiClient, ApiError};

const PUBLIC_STATIONS: &str = "station/public";

pub fn station_path(id: &StationIdentifier) -> String {
    format!("station/{id}")
}

impl ApiClient {
    /// `GET station/public`, filtered and paged by `query`.
    pub async fn list_stations(&self, query: &StationListQuery) -> Result<Vec<Station>, ApiError> {
        self.get(PUBLIC_STATIONS, &query.to_pairs()).await
    }

    pub async fn get_station(&self, id: &StationIdentifier) -> Result<Station, ApiError> {
        self.get(&station_path(id), &[]).await
    }
}
