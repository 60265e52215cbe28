//! The booking session state machine.
//!
//! `Idle -> Selected -> Directed -> Booked -> Idle`. Only the station screen
//! owns a [`Session`]; everything else sees [`SessionSnapshot`]s.

use std::sync::Arc;

use amply_stations::{LngLat, Station, StationIdentifier};

use crate::booking::{
    RouteInfo,
    countdown::booking_minutes,
    sheet::{BookingSheet, SheetAction, SheetError},
};
use crate::bridge::{HostMessage, RequestId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum PhaseKind {
    Idle,
    Selected,
    Directed,
    Booked,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RouteState {
    None,
    Pending(RequestId),
    Ready(RouteInfo),
    Failed,
}

#[derive(Clone, Debug)]
pub struct BookingSession {
    pub station: Arc<Station>,
    pub total_minutes: u32,
    pub route: Option<RouteInfo>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("selection is pinned to booked station {booked}")]
    SelectionPinned { booked: StationIdentifier },
    #[error("no station selected")]
    NoSelection,
    #[error("station {0} is already booked")]
    AlreadyBooked(StationIdentifier),
    #[error(transparent)]
    Sheet(#[from] SheetError),
}

#[derive(Clone, Debug)]
struct Selection {
    station: Arc<Station>,
    route: RouteState,
    sheet: BookingSheet,
}

impl Selection {
    fn new(station: Arc<Station>) -> Self {
        Self {
            station,
            route: RouteState::None,
            sheet: BookingSheet::new(),
        }
    }

    fn route_info(&self) -> Option<RouteInfo> {
        match self.route {
            RouteState::Ready(info) => Some(info),
            _ => None,
        }
    }

    /// Id-less answers come from surfaces that predate request ids; they can
    /// only refer to the request that is pending right now.
    fn is_answer_to(&self, request: Option<RequestId>) -> bool {
        match self.route {
            RouteState::Pending(pending) => request.is_none_or(|r| r == pending),
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Default)]
enum Phase {
    #[default]
    Idle,
    Selected(Selection),
    Booked(Selection, BookingSession),
}

#[derive(Clone, Debug)]
pub struct SessionSnapshot {
    pub phase: PhaseKind,
    pub selected: Option<Arc<Station>>,
    pub route: Option<RouteInfo>,
    pub route_pending: bool,
    pub booking: Option<BookingSession>,
    pub sheet: Option<BookingSheet>,
}

#[derive(Debug)]
pub struct Session {
    phase: Phase,
    last_request: RequestId,
    booking_buffer_minutes: u32,
    fallback_booking_minutes: u32,
}

impl Session {
    pub fn new(booking_buffer_minutes: u32, fallback_booking_minutes: u32) -> Self {
        Self {
            phase: Phase::Idle,
            last_request: RequestId(0),
            booking_buffer_minutes,
            fallback_booking_minutes,
        }
    }

    pub fn phase(&self) -> PhaseKind {
        match &self.phase {
            Phase::Idle => PhaseKind::Idle,
            Phase::Selected(selection) if selection.route_info().is_some() => PhaseKind::Directed,
            Phase::Selected(_) => PhaseKind::Selected,
            Phase::Booked(..) => PhaseKind::Booked,
        }
    }

    pub fn selected_station(&self) -> Option<&Arc<Station>> {
        self.selection().map(|s| &s.station)
    }

    pub fn booking(&self) -> Option<&BookingSession> {
        match &self.phase {
            Phase::Booked(_, booking) => Some(booking),
            _ => None,
        }
    }

    pub fn pending_route(&self) -> Option<RequestId> {
        match self.selection()?.route {
            RouteState::Pending(request) => Some(request),
            _ => None,
        }
    }

    fn selection(&self) -> Option<&Selection> {
        match &self.phase {
            Phase::Idle => None,
            Phase::Selected(selection) | Phase::Booked(selection, _) => Some(selection),
        }
    }

    fn selection_mut(&mut self) -> Option<&mut Selection> {
        match &mut self.phase {
            Phase::Idle => None,
            Phase::Selected(selection) | Phase::Booked(selection, _) => Some(selection),
        }
    }

    /// Returns whether the selection changed.
    pub fn select(&mut self, station: Arc<Station>) -> Result<bool, SessionError> {
        match &self.phase {
            Phase::Booked(selection, _) if selection.station.id != station.id => {
                return Err(SessionError::SelectionPinned {
                    booked: selection.station.id.clone(),
                });
            }
            Phase::Booked(..) => return Ok(false),
            Phase::Selected(selection) if selection.station.id == station.id => return Ok(false),
            _ => {}
        }

        self.phase = Phase::Selected(Selection::new(station));
        Ok(true)
    }

    /// Marks the directions action in flight and builds the map command for it.
    pub fn request_route(
        &mut self,
        from: LngLat,
    ) -> Result<(RequestId, HostMessage), SessionError> {
        let request = self.last_request.next();

        let selection = match &mut self.phase {
            Phase::Idle => return Err(SessionError::NoSelection),
            Phase::Booked(selection, _) => {
                return Err(SessionError::AlreadyBooked(selection.station.id.clone()));
            }
            Phase::Selected(selection) => selection,
        };

        selection.sheet.begin(SheetAction::Directions)?;
        selection.route = RouteState::Pending(request);
        self.last_request = request;

        let message = HostMessage::ShowRoute {
            start: from,
            end: selection.station.position(),
            request_id: Some(request),
        };
        Ok((request, message))
    }

    /// Returns false for answers that no longer apply.
    pub fn route_arrived(&mut self, request: Option<RequestId>, info: RouteInfo) -> bool {
        self.settle_route(request, RouteState::Ready(info))
    }

    pub fn route_failed(&mut self, request: Option<RequestId>) -> bool {
        self.settle_route(request, RouteState::Failed)
    }

    fn settle_route(&mut self, request: Option<RequestId>, outcome: RouteState) -> bool {
        let Some(selection) = self.selection_mut() else {
            return false;
        };
        if !selection.is_answer_to(request) {
            return false;
        }

        selection.route = outcome;
        selection.sheet.finish(SheetAction::Directions);
        true
    }

    /// Starts the external-map handoff and returns the station to route to.
    pub fn begin_external_map(&mut self) -> Result<Arc<Station>, SessionError> {
        let selection = self.selection_mut().ok_or(SessionError::NoSelection)?;
        selection.sheet.begin(SheetAction::ExternalMap)?;
        Ok(selection.station.clone())
    }

    pub fn finish_external_map(&mut self) -> bool {
        self.selection_mut()
            .is_some_and(|s| s.sheet.finish(SheetAction::ExternalMap))
    }

    pub fn book(&mut self) -> Result<BookingSession, SessionError> {
        let selection = match &mut self.phase {
            Phase::Idle => return Err(SessionError::NoSelection),
            Phase::Booked(selection, _) => {
                return Err(SessionError::AlreadyBooked(selection.station.id.clone()));
            }
            Phase::Selected(selection) => selection,
        };

        selection.sheet.begin(SheetAction::Booking)?;
        let route = selection.route_info();
        let total_minutes = booking_minutes(
            route.map(|r| r.duration_minutes()),
            self.booking_buffer_minutes,
            self.fallback_booking_minutes,
        );
        selection.sheet.finish(SheetAction::Booking);

        let booking = BookingSession {
            station: selection.station.clone(),
            total_minutes,
            route,
        };
        self.phase = Phase::Booked(selection.clone(), booking.clone());
        Ok(booking)
    }

    /// Manual close from any phase. Returns the cancelled booking, if any.
    pub fn close(&mut self) -> Option<BookingSession> {
        match std::mem::take(&mut self.phase) {
            Phase::Booked(_, booking) => Some(booking),
            _ => None,
        }
    }

    /// Countdown ran out. No-op unless a booking is active.
    pub fn expire(&mut self) -> Option<BookingSession> {
        match &self.phase {
            Phase::Booked(..) => self.close(),
            _ => None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let selection = self.selection();
        SessionSnapshot {
            phase: self.phase(),
            selected: selection.map(|s| s.station.clone()),
            route: selection.and_then(Selection::route_info),
            route_pending: self.pending_route().is_some(),
            booking: self.booking().cloned(),
            sheet: selection.map(|s| s.sheet.clone()),
        }
    }
}
