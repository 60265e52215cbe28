//! Wire types for the Amply backend REST API.

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod station;

pub use amply_stations::Station;

/// Every successful backend response wraps its payload in `data`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of a non-2xx response, when the backend bothers to send one.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "statusCode")]
    pub status_code: Option<u16>,
}
