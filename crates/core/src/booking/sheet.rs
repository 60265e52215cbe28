//! Action state of the booking bottom sheet.
//!
//! Loading flags follow the real operation: an action stays in flight until the
//! orchestrator reports it settled.

use std::sync::Arc;

use amply_stations::Station;
use chrono::NaiveDateTime;

use crate::booking::RouteInfo;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SheetAction {
    ExternalMap,
    Directions,
    Booking,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SheetError {
    #[error("{requested} is blocked while {in_flight} is in flight")]
    Busy {
        requested: SheetAction,
        in_flight: SheetAction,
    },
    #[error("directions must be requested before booking")]
    DirectionsFirst,
}

pub const EXTERNAL_MAP_LABEL: &str = "Google Maps";
pub const GET_DIRECTIONS_LABEL: &str = "Get Directions";
pub const BOOK_NOW_LABEL: &str = "Book Now";
pub const ALREADY_BOOKED_LABEL: &str = "Already Booked";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonView {
    pub label: &'static str,
    pub loading: bool,
    pub disabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteCard {
    pub distance_km: String,
    pub duration_minutes: u32,
}

#[derive(Clone, Debug)]
pub struct SheetView {
    pub station: Arc<Station>,
    pub is_open: bool,
    pub route: Option<RouteCard>,
    pub external_map: ButtonView,
    pub secondary: ButtonView,
}

/// Per-selection sheet state; a new selection gets a fresh sheet.
#[derive(Clone, Debug, Default)]
pub struct BookingSheet {
    in_flight: Option<SheetAction>,
    directions_settled: bool,
}

impl BookingSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> Option<SheetAction> {
        self.in_flight
    }

    pub fn show_booking_button(&self) -> bool {
        self.directions_settled
    }

    pub fn begin(&mut self, action: SheetAction) -> Result<(), SheetError> {
        if let Some(in_flight) = self.in_flight {
            return Err(SheetError::Busy {
                requested: action,
                in_flight,
            });
        }
        if action == SheetAction::Booking && !self.directions_settled {
            return Err(SheetError::DirectionsFirst);
        }

        self.in_flight = Some(action);
        Ok(())
    }

    /// Returns false when `action` was not the one in flight.
    pub fn finish(&mut self, action: SheetAction) -> bool {
        if self.in_flight != Some(action) {
            return false;
        }

        self.in_flight = None;
        if action == SheetAction::Directions {
            self.directions_settled = true;
        }
        true
    }

    pub fn view(
        &self,
        station: Arc<Station>,
        route: Option<&RouteInfo>,
        countdown_active: bool,
        now: NaiveDateTime,
    ) -> SheetView {
        let busy_with = |action: SheetAction| self.in_flight == Some(action);
        let busy_elsewhere = |action: SheetAction| self.in_flight.is_some_and(|a| a != action);

        let external_map = ButtonView {
            label: EXTERNAL_MAP_LABEL,
            loading: busy_with(SheetAction::ExternalMap),
            disabled: busy_elsewhere(SheetAction::ExternalMap),
        };

        let secondary = if !self.directions_settled {
            ButtonView {
                label: GET_DIRECTIONS_LABEL,
                loading: busy_with(SheetAction::Directions),
                disabled: busy_elsewhere(SheetAction::Directions),
            }
        } else if countdown_active {
            ButtonView {
                label: ALREADY_BOOKED_LABEL,
                loading: false,
                disabled: true,
            }
        } else {
            ButtonView {
                label: BOOK_NOW_LABEL,
                loading: busy_with(SheetAction::Booking),
                disabled: busy_elsewhere(SheetAction::Booking),
            }
        };

        SheetView {
            is_open: station.is_open_at(now),
            route: route.map(|info| RouteCard {
                distance_km: info.distance_km_label(),
                duration_minutes: info.duration_minutes(),
            }),
            station,
            external_map,
            secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amply_stations::{StationIdentifier, StationStatus};
    use chrono::NaiveDate;

    fn station() -> Arc<Station> {
        Arc::new(Station {
            id: StationIdentifier::new("1"),
            name: "District 1".into(),
            address: "1 Le Loi".into(),
            latitude: 10.7769,
            longitude: 106.7017,
            status: StationStatus::Available,
            battery_count: 8,
            open_time: "Daily, 08:00 - 22:00".into(),
            image: "".into(),
            swappable_batteries: 2,
        })
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_initial_sheet_offers_directions() {
        let view = BookingSheet::new().view(station(), None, false, noon());

        assert_eq!(view.secondary.label, GET_DIRECTIONS_LABEL);
        assert!(!view.secondary.disabled);
        assert!(!view.secondary.loading);
        assert!(!view.external_map.disabled);
        assert!(view.route.is_none());
        assert!(view.is_open);
    }

    #[test]
    fn test_directions_flip_to_book_now() {
        let mut sheet = BookingSheet::new();
        sheet.begin(SheetAction::Directions).unwrap();

        let pending = sheet.view(station(), None, false, noon());
        assert!(pending.secondary.loading);
        assert!(pending.external_map.disabled);

        assert!(sheet.finish(SheetAction::Directions));
        let route = RouteInfo {
            distance_m: 2_000.0,
            duration_s: 600.0,
        };
        let view = sheet.view(station(), Some(&route), false, noon());

        assert!(sheet.show_booking_button());
        assert_eq!(view.secondary.label, BOOK_NOW_LABEL);
        assert!(!view.secondary.loading);
        assert_eq!(
            view.route,
            Some(RouteCard {
                distance_km: "2.0".into(),
                duration_minutes: 10
            })
        );
    }

    #[test]
    fn test_one_action_at_a_time() {
        let mut sheet = BookingSheet::new();
        sheet.begin(SheetAction::ExternalMap).unwrap();

        assert_eq!(
            sheet.begin(SheetAction::Directions),
            Err(SheetError::Busy {
                requested: SheetAction::Directions,
                in_flight: SheetAction::ExternalMap
            })
        );
        let view = sheet.view(station(), None, false, noon());
        assert!(view.external_map.loading);
        assert!(view.secondary.disabled);

        assert!(!sheet.finish(SheetAction::Directions));
        assert!(sheet.finish(SheetAction::ExternalMap));
        assert!(sheet.begin(SheetAction::Directions).is_ok());
    }

    #[test]
    fn test_booking_needs_directions() {
        let mut sheet = BookingSheet::new();
        assert_eq!(
            sheet.begin(SheetAction::Booking),
            Err(SheetError::DirectionsFirst)
        );
    }

    #[test]
    fn test_already_booked_is_disabled() {
        let mut sheet = BookingSheet::new();
        sheet.begin(SheetAction::Directions).unwrap();
        sheet.finish(SheetAction::Directions);

        let view = sheet.view(station(), None, true, noon());
        assert_eq!(view.secondary.label, ALREADY_BOOKED_LABEL);
        assert!(view.secondary.disabled);
    }
}
