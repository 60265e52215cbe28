//! The station screen: owns the booking session and coordinates the map
//! bridge, location, sheet and countdown.
//!
//! The screen runs as one task. Everything else talks to it through a
//! [`StationScreenHandle`], reads [`ScreenSnapshot`]s and receives
//! [`Notice`]s.

use std::sync::Arc;

use amply_stations::Station;

use crate::booking::{Hms, PhaseKind, RouteInfo, SessionError, SheetView};
use crate::bridge::BridgeError;
use crate::location::LocationFix;

pub mod handle;
pub mod task;

pub use handle::StationScreenHandle;
pub use task::StationScreen;

#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("user location is not known yet")]
    NoLocation,
    #[error("station screen has stopped")]
    Stopped,
}

/// One-shot, user-visible messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    PermissionDenied,
    RouteUnavailable,
    TimeUp { station_name: String },
}

impl Notice {
    pub fn message(&self) -> String {
        match self {
            Notice::PermissionDenied => {
                "Location permission denied, showing the default area".to_owned()
            }
            Notice::RouteUnavailable => "Could not find a route to this station".to_owned(),
            Notice::TimeUp { station_name } => {
                format!("Time's up! Your booking at {station_name} has expired.")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountdownView {
    pub station_name: Arc<str>,
    pub remaining: Hms,
    pub total: Hms,
}

#[derive(Clone, Debug)]
pub struct ScreenSnapshot {
    /// Overlay shown until the map reports it is ready
    pub map_loading: bool,
    pub user_location: Option<LocationFix>,
    pub phase: PhaseKind,
    pub selected: Option<Arc<Station>>,
    pub route: Option<RouteInfo>,
    pub sheet: Option<SheetView>,
    pub countdown: Option<CountdownView>,
}

impl Default for ScreenSnapshot {
    fn default() -> Self {
        Self {
            map_loading: true,
            user_location: None,
            phase: PhaseKind::Idle,
            selected: None,
            route: None,
            sheet: None,
            countdown: None,
        }
    }
}
