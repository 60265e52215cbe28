//! Plain records handed across the FFI boundary.

use amply_api_types::auth::User;
use amply_api_types::station::{SortOrder, StationListQuery};
use amply_core::booking::{BookingSession, ButtonView, SheetView};
use amply_core::screen::{CountdownView, Notice, ScreenSnapshot};
use amply_core::store::AuthState;
use amply_stations::{LngLat, Station, StationIdentifier, StationStatus};

use crate::MobileError;

#[derive(Clone, Copy, Debug, PartialEq, uniffi::Record)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LngLat> for Position {
    fn from(at: LngLat) -> Self {
        Self {
            latitude: at.latitude,
            longitude: at.longitude,
        }
    }
}

impl From<Position> for LngLat {
    fn from(at: Position) -> Self {
        LngLat::new(at.longitude, at.latitude)
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct StationRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// `available`, `occupied` or `maintenance`
    pub status: String,
    pub battery_count: u32,
    pub open_time: String,
    pub image: String,
    pub swappable_batteries: u32,
}

impl From<&Station> for StationRecord {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.to_string(),
            name: station.name.to_string(),
            address: station.address.to_string(),
            latitude: station.latitude,
            longitude: station.longitude,
            status: station.status.as_str().to_owned(),
            battery_count: station.battery_count,
            open_time: station.open_time.to_string(),
            image: station.image.to_string(),
            swappable_batteries: station.swappable_batteries,
        }
    }
}

impl TryFrom<StationRecord> for Station {
    type Error = MobileError;

    fn try_from(record: StationRecord) -> Result<Self, Self::Error> {
        let id = StationIdentifier::new(record.id);
        if id.is_empty() {
            return Err(MobileError::InvalidInput("station without id".to_owned()));
        }
        let position = LngLat::new(record.longitude, record.latitude);
        if !position.is_valid() {
            return Err(MobileError::InvalidInput(format!(
                "station {id} has an invalid position {position}"
            )));
        }
        let status: StationStatus = record
            .status
            .parse()
            .map_err(|e: amply_stations::StationError| MobileError::InvalidInput(e.to_string()))?;

        Ok(Station {
            id,
            name: record.name.into(),
            address: record.address.into(),
            latitude: record.latitude,
            longitude: record.longitude,
            status,
            battery_count: record.battery_count,
            open_time: record.open_time.into(),
            image: record.image.into(),
            swappable_batteries: record.swappable_batteries,
        })
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct ButtonRecord {
    pub label: String,
    pub loading: bool,
    pub disabled: bool,
}

impl From<&ButtonView> for ButtonRecord {
    fn from(button: &ButtonView) -> Self {
        Self {
            label: button.label.to_owned(),
            loading: button.loading,
            disabled: button.disabled,
        }
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct SheetRecord {
    pub station: StationRecord,
    pub is_open: bool,
    /// One decimal, e.g. `"2.5"`
    pub distance_km: Option<String>,
    pub duration_minutes: Option<u32>,
    pub external_map: ButtonRecord,
    pub secondary: ButtonRecord,
}

impl From<&SheetView> for SheetRecord {
    fn from(sheet: &SheetView) -> Self {
        Self {
            station: StationRecord::from(&*sheet.station),
            is_open: sheet.is_open,
            distance_km: sheet.route.as_ref().map(|r| r.distance_km.clone()),
            duration_minutes: sheet.route.as_ref().map(|r| r.duration_minutes),
            external_map: ButtonRecord::from(&sheet.external_map),
            secondary: ButtonRecord::from(&sheet.secondary),
        }
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct CountdownRecord {
    pub station_name: String,
    /// `HH:MM:SS`
    pub remaining: String,
    pub remaining_seconds: u64,
    pub total_seconds: u64,
}

impl From<&CountdownView> for CountdownRecord {
    fn from(view: &CountdownView) -> Self {
        Self {
            station_name: view.station_name.to_string(),
            remaining: view.remaining.to_string(),
            remaining_seconds: view.remaining.total_seconds(),
            total_seconds: view.total.total_seconds(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct ScreenState {
    pub map_loading: bool,
    pub user_location: Option<Position>,
    /// `Idle`, `Selected`, `Directed` or `Booked`
    pub phase: String,
    pub selected_station_id: Option<String>,
    pub sheet: Option<SheetRecord>,
    pub countdown: Option<CountdownRecord>,
}

impl From<&ScreenSnapshot> for ScreenState {
    fn from(snapshot: &ScreenSnapshot) -> Self {
        Self {
            map_loading: snapshot.map_loading,
            user_location: snapshot.user_location.map(|fix| fix.position.into()),
            phase: snapshot.phase.to_string(),
            selected_station_id: snapshot.selected.as_ref().map(|s| s.id.to_string()),
            sheet: snapshot.sheet.as_ref().map(SheetRecord::from),
            countdown: snapshot.countdown.as_ref().map(CountdownRecord::from),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum NoticeRecord {
    PermissionDenied { message: String },
    RouteUnavailable { message: String },
    TimeUp { station_name: String, message: String },
}

impl From<Notice> for NoticeRecord {
    fn from(notice: Notice) -> Self {
        let message = notice.message();
        match notice {
            Notice::PermissionDenied => NoticeRecord::PermissionDenied { message },
            Notice::RouteUnavailable => NoticeRecord::RouteUnavailable { message },
            Notice::TimeUp { station_name } => NoticeRecord::TimeUp {
                station_name,
                message,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct BookingRecord {
    pub station_id: String,
    pub total_minutes: u32,
}

impl From<&BookingSession> for BookingRecord {
    fn from(booking: &BookingSession) -> Self {
        Self {
            station_id: booking.station.id.to_string(),
            total_minutes: booking.total_minutes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub phone: Option<String>,
    pub role: String,
}

impl From<User> for UserRecord {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar,
            phone: user.phone,
            role: user.role,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct AuthStateRecord {
    pub user: Option<UserRecord>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub is_authenticated: bool,
}

impl From<AuthState> for AuthStateRecord {
    fn from(state: AuthState) -> Self {
        Self {
            user: state.user.map(UserRecord::from),
            is_loading: state.is_loading,
            error: state.error,
            is_authenticated: state.is_authenticated,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum StationOrder {
    Asc,
    Desc,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, uniffi::Record)]
pub struct StationQueryRecord {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub order: Option<StationOrder>,
}

impl From<StationQueryRecord> for StationListQuery {
    fn from(record: StationQueryRecord) -> Self {
        StationListQuery {
            page: record.page,
            limit: record.limit,
            search: record.search.filter(|s| !s.trim().is_empty()),
            order: record.order.map(|order| match order {
                StationOrder::Asc => SortOrder::Asc,
                StationOrder::Desc => SortOrder::Desc,
            }),
        }
    }
}

pub(crate) fn stations_from_records(
    records: Vec<StationRecord>,
) -> Result<Vec<Station>, MobileError> {
    records.into_iter().map(Station::try_from).collect()
}
