use std::future::pending;
use std::sync::Arc;

use amply_stations::{StationIdentifier, StationProvider};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, Interval, interval_at, sleep_until};
use tracing::{debug, info, warn};

use crate::booking::{BookingSession, Countdown, RouteInfo, Session, SessionError, Tick};
use crate::bridge::{HostEndpoint, HostMessage, MapEvent, RequestId};
use crate::config::CoreConfig;
use crate::handoff::external_map_url;
use crate::location::{LocationFix, LocationProvider, LocationSource, acquire_location};
use crate::screen::handle::{Command, StationScreenHandle};
use crate::screen::{CountdownView, Notice, ScreenError, ScreenSnapshot};

/// The orchestrator task. Build one per mounted screen and [`spawn`] it.
///
/// [`spawn`]: StationScreen::spawn
pub struct StationScreen {
    config: CoreConfig,
    stations: Arc<dyn StationProvider>,
    location: Arc<dyn LocationProvider>,
    bridge: HostEndpoint,
    bridge_open: bool,

    session: Session,
    countdown: Option<Countdown>,
    ticker: Option<Interval>,
    fix: Option<LocationFix>,
    locating: Option<JoinHandle<LocationFix>>,
    fix_waiters: Vec<oneshot::Sender<LocationFix>>,

    surface_loaded: bool,
    map_loading: bool,
    init_sent: bool,
    init_at: Option<Instant>,
    route_deadline: Option<Instant>,
    handoff_deadline: Option<Instant>,

    snapshots: watch::Sender<ScreenSnapshot>,
    notices: mpsc::UnboundedSender<Notice>,
}

impl StationScreen {
    pub fn new(
        config: CoreConfig,
        stations: Arc<dyn StationProvider>,
        location: Arc<dyn LocationProvider>,
        bridge: HostEndpoint,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (notices, notice_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(ScreenSnapshot::default());

        let screen = Self {
            session: Session::new(
                config.booking_buffer_minutes,
                config.fallback_booking_minutes,
            ),
            config,
            stations,
            location,
            bridge,
            bridge_open: true,
            countdown: None,
            ticker: None,
            fix: None,
            locating: None,
            fix_waiters: Vec::new(),
            surface_loaded: false,
            map_loading: true,
            init_sent: false,
            init_at: None,
            route_deadline: None,
            handoff_deadline: None,
            snapshots,
            notices,
        };
        (screen, notice_rx)
    }

    /// Starts the task on the current runtime.
    pub fn spawn(self) -> StationScreenHandle {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let handle = StationScreenHandle::new(commands, self.snapshots.subscribe());
        tokio::spawn(self.run(command_rx));
        handle
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        self.start_locating();

        loop {
            let init_at = self.init_at;
            let route_deadline = self.route_deadline;
            let handoff_deadline = self.handoff_deadline;

            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
                fix = next_fix(&mut self.locating) => {
                    self.locating = None;
                    self.on_location(fix);
                },
                frame = self.bridge.recv(), if self.bridge_open => match frame {
                    Some(Ok(event)) => self.on_event(event),
                    Some(Err(err)) => warn!(%err, "dropping map frame"),
                    None => {
                        warn!("map surface went away");
                        self.bridge_open = false;
                    }
                },
                _ = sleep_until(init_at.unwrap_or_else(Instant::now)), if init_at.is_some() => {
                    self.init_at = None;
                    self.send_init();
                },
                _ = sleep_until(route_deadline.unwrap_or_else(Instant::now)), if route_deadline.is_some() => {
                    self.route_deadline = None;
                    self.on_route_timeout();
                },
                _ = sleep_until(handoff_deadline.unwrap_or_else(Instant::now)), if handoff_deadline.is_some() => {
                    self.handoff_deadline = None;
                    if self.session.finish_external_map() {
                        warn!("external map never confirmed, releasing the sheet");
                    }
                },
                _ = next_tick(&mut self.ticker) => self.on_tick(),
            }

            self.publish();
        }

        if let Some(locating) = self.locating.take() {
            locating.abort();
        }
        debug!("station screen stopped");
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::SurfaceLoaded => {
                self.surface_loaded = true;
                self.schedule_init();
            }
            Command::RefreshLocation(reply) => {
                self.fix_waiters.push(reply);
                self.start_locating();
            }
            Command::GetDirections(reply) => {
                let _ = reply.send(self.get_directions());
            }
            Command::OpenExternalMap(reply) => {
                let _ = reply.send(self.open_external_map());
            }
            Command::ExternalMapOpened => {
                self.handoff_deadline = None;
                self.session.finish_external_map();
            }
            Command::ExternalMapFailed(reason) => {
                self.handoff_deadline = None;
                if self.session.finish_external_map() {
                    warn!(%reason, "external map could not be opened");
                }
            }
            Command::Book(reply) => {
                let _ = reply.send(self.book());
            }
            Command::CloseSheet | Command::CloseCountdown => self.close(),
        }
    }

    /// Acquisition can wait on a permission dialog, so it runs beside the
    /// loop. Refreshes asked for meanwhile share the attempt in flight.
    fn start_locating(&mut self) {
        if self.locating.is_some() {
            return;
        }
        let provider = self.location.clone();
        let fallback = self.config.fallback_location;
        self.locating = Some(tokio::spawn(async move {
            acquire_location(&*provider, fallback).await
        }));
    }

    fn on_location(&mut self, fix: Result<LocationFix, JoinError>) {
        let fix = fix.unwrap_or_else(|err| {
            warn!(%err, "location task failed, using fallback");
            LocationFix {
                position: self.config.fallback_location,
                source: LocationSource::FallbackUnavailable,
            }
        });
        info!(position = %fix.position, source = ?fix.source, "user location");
        if fix.permission_denied() {
            self.notify(Notice::PermissionDenied);
        }

        self.fix = Some(fix);
        if self.init_sent {
            self.send_init();
        } else {
            self.schedule_init();
        }
        for waiter in self.fix_waiters.drain(..) {
            let _ = waiter.send(fix);
        }
    }

    /// The surface may drop frames that arrive right after it loads, so the
    /// first INIT_MAP waits for the settle delay.
    fn schedule_init(&mut self) {
        if self.surface_loaded && self.fix.is_some() && !self.init_sent && self.init_at.is_none() {
            self.init_at = Some(Instant::now() + self.config.bridge_settle());
        }
    }

    fn send_init(&mut self) {
        let Some(fix) = self.fix else {
            return;
        };

        let (stations, unplaceable): (Vec<_>, Vec<_>) = self
            .stations
            .all_stations()
            .into_iter()
            .partition(|s| !s.id.is_empty() && s.position().is_valid());
        for station in &unplaceable {
            warn!(station = %station.id, position = %station.position(), "leaving station off the map");
        }

        let message = HostMessage::InitMap {
            user_location: fix.position,
            stations,
        };
        match self.bridge.send(&message) {
            Ok(()) => self.init_sent = true,
            Err(err) => warn!(%err, "could not initialize map"),
        }
    }

    fn on_event(&mut self, event: MapEvent) {
        match event {
            MapEvent::MapLoaded => self.map_loading = false,
            MapEvent::StationSelected { station_id } => self.on_station_selected(station_id),
            MapEvent::RouteInfo {
                distance,
                duration,
                request_id,
            } => {
                let info = RouteInfo {
                    distance_m: distance,
                    duration_s: duration,
                };
                if self.session.route_arrived(request_id, info) {
                    self.route_deadline = None;
                } else {
                    debug!(?request_id, "discarding stale route");
                }
            }
            MapEvent::RouteFailed { request_id, reason } => {
                if self.session.route_failed(request_id) {
                    warn!(?request_id, %reason, "route unavailable");
                    self.route_deadline = None;
                    self.notify(Notice::RouteUnavailable);
                } else {
                    debug!(?request_id, "discarding stale route failure");
                }
            }
        }
    }

    fn on_station_selected(&mut self, station_id: StationIdentifier) {
        let Some(station) = self.stations.get_station(&station_id) else {
            warn!(%station_id, "map selected an unknown station");
            return;
        };

        let had_route = self.has_route();
        match self.session.select(station) {
            Ok(true) => {
                self.route_deadline = None;
                if had_route {
                    self.clear_route();
                }
            }
            Ok(false) => {}
            Err(SessionError::SelectionPinned { booked }) => {
                debug!(%station_id, %booked, "selection pinned to booked station");
            }
            Err(err) => warn!(%err, "selection rejected"),
        }
    }

    fn get_directions(&mut self) -> Result<RequestId, ScreenError> {
        let from = self.fix.ok_or(ScreenError::NoLocation)?.position;
        let (request_id, message) = self.session.request_route(from)?;

        if let Err(err) = self.bridge.send(&message) {
            self.session.route_failed(Some(request_id));
            self.notify(Notice::RouteUnavailable);
            return Err(err.into());
        }

        self.route_deadline = Some(Instant::now() + self.config.route_timeout());
        Ok(request_id)
    }

    fn on_route_timeout(&mut self) {
        if let Some(pending) = self.session.pending_route() {
            warn!(request_id = ?pending, "route request timed out");
            self.session.route_failed(Some(pending));
            self.notify(Notice::RouteUnavailable);
        }
    }

    fn open_external_map(&mut self) -> Result<String, ScreenError> {
        let from = self.fix.ok_or(ScreenError::NoLocation)?.position;
        let station = self.session.begin_external_map()?;
        self.handoff_deadline = Some(Instant::now() + self.config.handoff_timeout());
        Ok(external_map_url(from, station.position()))
    }

    fn book(&mut self) -> Result<BookingSession, ScreenError> {
        let booking = self.session.book()?;
        info!(
            station = %booking.station.id,
            minutes = booking.total_minutes,
            "booking started"
        );

        let mut countdown = Countdown::new(booking.total_minutes);
        countdown.set_visible(true);
        self.countdown = Some(countdown);

        let period = self.config.tick();
        self.ticker = Some(interval_at(Instant::now() + period, period));
        Ok(booking)
    }

    fn on_tick(&mut self) {
        let Some(countdown) = self.countdown.as_mut() else {
            self.ticker = None;
            return;
        };

        if countdown.tick() == Tick::Expired {
            let expired = self.session.expire();
            self.stop_countdown();
            self.clear_route();

            if let Some(booking) = expired {
                info!(station = %booking.station.id, "booking expired");
                self.notify(Notice::TimeUp {
                    station_name: booking.station.name.to_string(),
                });
            }
        }
    }

    fn close(&mut self) {
        let had_selection = self.session.selected_station().is_some();
        if let Some(booking) = self.session.close() {
            info!(station = %booking.station.id, "booking cancelled");
        }
        self.stop_countdown();
        self.route_deadline = None;
        self.handoff_deadline = None;
        if had_selection {
            self.clear_route();
        }
    }

    fn stop_countdown(&mut self) {
        if let Some(countdown) = self.countdown.as_mut() {
            countdown.set_visible(false);
        }
        self.countdown = None;
        self.ticker = None;
    }

    fn has_route(&self) -> bool {
        let snapshot = self.session.snapshot();
        snapshot.route.is_some() || snapshot.route_pending
    }

    fn clear_route(&mut self) {
        if let Err(err) = self.bridge.send(&HostMessage::ClearRoute) {
            debug!(%err, "could not clear route");
        }
    }

    fn notify(&self, notice: Notice) {
        if self.notices.send(notice).is_err() {
            debug!("no one is listening for notices");
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }

    fn snapshot(&self) -> ScreenSnapshot {
        let session = self.session.snapshot();
        let now = chrono::Local::now().naive_local();
        let countdown_active = session.booking.is_some();

        let sheet = session
            .selected
            .clone()
            .zip(session.sheet.as_ref())
            .map(|(station, sheet)| {
                sheet.view(station, session.route.as_ref(), countdown_active, now)
            });

        let countdown = session
            .booking
            .as_ref()
            .zip(self.countdown.as_ref())
            .map(|(booking, countdown)| CountdownView {
                station_name: booking.station.name.clone(),
                remaining: countdown.remaining(),
                total: countdown.total(),
            });

        ScreenSnapshot {
            map_loading: self.map_loading,
            user_location: self.fix,
            phase: session.phase,
            selected: session.selected,
            route: session.route,
            sheet,
            countdown,
        }
    }
}

async fn next_fix(locating: &mut Option<JoinHandle<LocationFix>>) -> Result<LocationFix, JoinError> {
    match locating {
        Some(locating) => locating.await,
        None => pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}
