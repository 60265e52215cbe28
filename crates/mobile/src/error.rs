use amply_core::api::ApiError;
use amply_core::config::ConfigError;
use amply_core::screen::ScreenError;

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MobileError {
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Screen(String),
    #[error("{0}")]
    Api(String),
    #[error("session expired, please log in again")]
    Unauthorized,
    #[error("{0}")]
    Internal(String),
}

impl From<ConfigError> for MobileError {
    fn from(err: ConfigError) -> Self {
        MobileError::Config(err.to_string())
    }
}

impl From<ScreenError> for MobileError {
    fn from(err: ScreenError) -> Self {
        MobileError::Screen(err.to_string())
    }
}

impl From<ApiError> for MobileError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Unauthorized => MobileError::Unauthorized,
            other => MobileError::Api(other.to_string()),
        }
    }
}
