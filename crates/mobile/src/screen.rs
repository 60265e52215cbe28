use std::sync::Arc;

use amply_core::bridge::channel;
use amply_core::config::CoreConfig;
use amply_core::location::{LocationError, LocationFuture, LocationPermission, LocationProvider};
use amply_core::screen::{self, StationScreenHandle};
use amply_stations::{LngLat, StaticStationProvider};
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, warn};

use crate::MobileError;
use crate::records::{
    BookingRecord, NoticeRecord, Position, ScreenState, StationRecord, stations_from_records,
};
use crate::runtime::{on_runtime, runtime};

/// The web view hosting the map page.
#[uniffi::export(with_foreign)]
pub trait MapWebView: Send + Sync {
    /// Deliver one JSON frame to the page.
    fn post_message(&self, json: String);
}

#[uniffi::export(with_foreign)]
pub trait DeviceLocation: Send + Sync {
    /// Returns whether permission was granted.
    fn request_permission(&self) -> bool;
    fn current_position(&self) -> Option<Position>;
}

#[uniffi::export(with_foreign)]
pub trait ScreenListener: Send + Sync {
    fn on_state(&self, state: ScreenState);
    fn on_notice(&self, notice: NoticeRecord);
}

/// Platform location calls may sit behind a permission dialog, so they run
/// on the blocking pool.
struct ForeignLocation(Arc<dyn DeviceLocation>);

impl LocationProvider for ForeignLocation {
    fn request_permission(&self) -> LocationFuture<'_, LocationPermission> {
        let device = self.0.clone();
        Box::pin(async move {
            let granted = task::spawn_blocking(move || device.request_permission())
                .await
                .map_err(|err| LocationError::Unavailable(err.to_string()))?;
            Ok(if granted {
                LocationPermission::Granted
            } else {
                LocationPermission::Denied
            })
        })
    }

    fn current_position(&self) -> LocationFuture<'_, LngLat> {
        let device = self.0.clone();
        Box::pin(async move {
            task::spawn_blocking(move || device.current_position())
                .await
                .map_err(|err| LocationError::Unavailable(err.to_string()))?
                .map(LngLat::from)
                .ok_or_else(|| LocationError::Unavailable("no fix from device".to_owned()))
        })
    }
}

/// The station map screen. One per mounted screen; dropping it stops the
/// screen task.
#[derive(uniffi::Object)]
pub struct StationScreen {
    handle: StationScreenHandle,
    to_host: mpsc::UnboundedSender<String>,
}

#[uniffi::export]
impl StationScreen {
    #[uniffi::constructor]
    pub fn new(
        config_json: String,
        stations: Vec<StationRecord>,
        web_view: Arc<dyn MapWebView>,
        location: Arc<dyn DeviceLocation>,
        listener: Arc<dyn ScreenListener>,
    ) -> Result<Arc<Self>, MobileError> {
        let config = if config_json.trim().is_empty() {
            CoreConfig::default()
        } else {
            CoreConfig::from_json(&config_json)?
        };
        let stations = StaticStationProvider::from_stations(stations_from_records(stations)?);

        let (host, surface) = channel();
        let (to_host, mut from_host) = surface.into_raw();

        let _guard = runtime().enter();
        let (task, mut notices) = screen::StationScreen::new(
            config,
            Arc::new(stations),
            Arc::new(ForeignLocation(location)),
            host,
        );
        let handle = task.spawn();

        runtime().spawn(async move {
            while let Some(frame) = from_host.recv().await {
                web_view.post_message(frame);
            }
            debug!("map frame pump stopped");
        });

        let mut states = handle.subscribe();
        let state_listener = listener.clone();
        runtime().spawn(async move {
            loop {
                let state = ScreenState::from(&*states.borrow_and_update());
                state_listener.on_state(state);
                if states.changed().await.is_err() {
                    break;
                }
            }
        });

        runtime().spawn(async move {
            while let Some(notice) = notices.recv().await {
                listener.on_notice(notice.into());
            }
        });

        Ok(Arc::new(Self { handle, to_host }))
    }

    /// The web view finished loading the map page.
    pub fn on_map_loaded(&self) -> Result<(), MobileError> {
        Ok(self.handle.surface_loaded()?)
    }

    /// A raw frame posted by the map page.
    pub fn on_map_message(&self, json: String) {
        if self.to_host.send(json).is_err() {
            warn!("map message after the screen stopped");
        }
    }

    pub fn state(&self) -> ScreenState {
        ScreenState::from(&self.handle.snapshot())
    }

    pub async fn refresh_location(&self) -> Result<Position, MobileError> {
        let handle = self.handle.clone();
        let fix = on_runtime(async move { handle.refresh_location().await }).await??;
        Ok(fix.position.into())
    }

    pub async fn get_directions(&self) -> Result<(), MobileError> {
        let handle = self.handle.clone();
        on_runtime(async move { handle.get_directions().await }).await??;
        Ok(())
    }

    /// URL to open in the maps app. Call `external_map_opened` or
    /// `external_map_failed` afterwards.
    pub async fn open_external_map(&self) -> Result<String, MobileError> {
        let handle = self.handle.clone();
        Ok(on_runtime(async move { handle.open_external_map().await }).await??)
    }

    pub fn external_map_opened(&self) -> Result<(), MobileError> {
        Ok(self.handle.external_map_opened()?)
    }

    /// The maps app could not be opened.
    pub fn external_map_failed(&self, reason: String) -> Result<(), MobileError> {
        Ok(self.handle.external_map_failed(reason)?)
    }

    pub async fn book(&self) -> Result<BookingRecord, MobileError> {
        let handle = self.handle.clone();
        let booking = on_runtime(async move { handle.book().await }).await??;
        Ok(BookingRecord::from(&booking))
    }

    pub fn close_sheet(&self) -> Result<(), MobileError> {
        Ok(self.handle.close_sheet()?)
    }

    pub fn close_countdown(&self) -> Result<(), MobileError> {
        Ok(self.handle.close_countdown()?)
    }
}

/// Every station, as the records the screen constructor takes.
#[uniffi::export]
pub fn parse_stations(json: String) -> Result<Vec<StationRecord>, MobileError> {
    let stations: Vec<amply_stations::Station> =
        serde_json::from_str(&json).map_err(|e| MobileError::InvalidInput(e.to_string()))?;
    Ok(stations.iter().map(StationRecord::from).collect())
}
