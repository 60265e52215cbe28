//! The booking interaction: session state machine, bottom sheet and countdown.

pub mod countdown;
pub mod session;
pub mod sheet;

pub use countdown::{Countdown, Hms, Tick, booking_minutes};
pub use session::{BookingSession, PhaseKind, RouteState, Session, SessionError, SessionSnapshot};
pub use sheet::{BookingSheet, ButtonView, RouteCard, SheetAction, SheetError, SheetView};

/// Distance and duration of the route to the selected station.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RouteInfo {
    pub distance_m: f64,
    pub duration_s: f64,
}

impl RouteInfo {
    /// Kilometres with one decimal, e.g. `"2.5"`
    pub fn distance_km_label(&self) -> String {
        format!("{:.1}", self.distance_m / 1000.0)
    }

    pub fn duration_minutes(&self) -> u32 {
        (self.duration_s / 60.0).round() as u32
    }
}
