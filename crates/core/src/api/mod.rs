//! Clients for the Amply backend REST API.

use std::sync::{Mutex, PoisonError};

pub mod auth;
pub mod client;
pub mod stations;

pub use auth::AuthService;
pub use client::ApiClient;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("session expired, please log in again")]
    Unauthorized,
    #[error("backend answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unreadable response: {0}")]
    Decode(String),
    #[error("no access token stored")]
    MissingToken,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("token storage failed: {0}")]
    Storage(String),
}

/// Where the access token lives between app launches.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn save(&self, token: &str) -> Result<(), ApiError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
