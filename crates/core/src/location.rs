//! Device location with a fixed fallback.

use std::future::Future;
use std::pin::Pin;

use amply_stations::LngLat;
use tracing::{info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum LocationPermission {
    Granted,
    Denied,
}

#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location unavailable: {0}")]
    Unavailable(String),
}

pub type LocationFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LocationError>> + Send + 'a>>;

pub trait LocationProvider: Send + Sync {
    fn request_permission(&self) -> LocationFuture<'_, LocationPermission>;
    fn current_position(&self) -> LocationFuture<'_, LngLat>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationSource {
    Device,
    /// Permission was refused.
    FallbackDenied,
    /// Permission granted but no fix could be read.
    FallbackUnavailable,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocationFix {
    pub position: LngLat,
    pub source: LocationSource,
}

impl LocationFix {
    pub fn permission_denied(&self) -> bool {
        self.source == LocationSource::FallbackDenied
    }
}

/// Never fails: anything short of a device fix falls back to `fallback`.
pub async fn acquire_location(provider: &dyn LocationProvider, fallback: LngLat) -> LocationFix {
    let denied = LocationFix {
        position: fallback,
        source: LocationSource::FallbackDenied,
    };

    match provider.request_permission().await {
        Ok(LocationPermission::Granted) => {}
        Ok(LocationPermission::Denied) | Err(LocationError::PermissionDenied) => {
            info!("location permission denied, using fallback");
            return denied;
        }
        Err(err) => {
            warn!(%err, "permission request failed, using fallback");
            return denied;
        }
    }

    match provider.current_position().await {
        Ok(position) if position.is_valid() => LocationFix {
            position,
            source: LocationSource::Device,
        },
        Ok(position) => {
            warn!(%position, "device reported an invalid position, using fallback");
            LocationFix {
                position: fallback,
                source: LocationSource::FallbackUnavailable,
            }
        }
        Err(err) => {
            warn!(%err, "could not read device position, using fallback");
            LocationFix {
                position: fallback,
                source: LocationSource::FallbackUnavailable,
            }
        }
    }
}

/// Answers every request the same way.
#[derive(Clone, Debug)]
pub struct FixedLocation {
    pub permission: LocationPermission,
    pub position: Option<LngLat>,
}

impl LocationProvider for FixedLocation {
    fn request_permission(&self) -> LocationFuture<'_, LocationPermission> {
        let permission = self.permission;
        Box::pin(async move { Ok(permission) })
    }

    fn current_position(&self) -> LocationFuture<'_, LngLat> {
        let position = self
            .position
            .ok_or_else(|| LocationError::Unavailable("no position configured".to_owned()));
        Box::pin(async move { position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FALLBACK: LngLat = LngLat::new(106.7017, 10.7769);

    #[tokio::test]
    async fn test_device_fix() {
        let provider = FixedLocation {
            permission: LocationPermission::Granted,
            position: Some(LngLat::new(106.66, 10.76)),
        };

        let fix = acquire_location(&provider, FALLBACK).await;
        assert_eq!(fix.source, LocationSource::Device);
        assert_eq!(fix.position, LngLat::new(106.66, 10.76));
    }

    #[tokio::test]
    async fn test_denied_uses_fallback() {
        let provider = FixedLocation {
            permission: LocationPermission::Denied,
            position: Some(LngLat::new(106.66, 10.76)),
        };

        let fix = acquire_location(&provider, FALLBACK).await;
        assert_eq!(fix.position, FALLBACK);
        assert!(fix.permission_denied());
    }

    #[tokio::test]
    async fn test_unavailable_uses_fallback() {
        let provider = FixedLocation {
            permission: LocationPermission::Granted,
            position: None,
        };

        let fix = acquire_location(&provider, FALLBACK).await;
        assert_eq!(fix.position, FALLBACK);
        assert_eq!(fix.source, LocationSource::FallbackUnavailable);
        assert!(!fix.permission_denied());
    }

    #[tokio::test]
    async fn test_out_of_range_position_is_rejected() {
        let provider = FixedLocation {
            permission: LocationPermission::Granted,
            position: Some(LngLat::new(200.0, 10.0)),
        };

        let fix = acquire_location(&provider, FALLBACK).await;
        assert_eq!(fix.position, FALLBACK);
    }
}
