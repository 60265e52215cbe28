//! Map side of the bridge for native map views.
//!
//! [`MapSurface`] answers host frames the way the web map does: it draws
//! through a [`MapCanvas`], reports taps on station markers and runs route
//! queries itself.

use std::collections::HashMap;
use std::sync::Arc;

use amply_stations::{LngLat, Station, StationIdentifier, StationStatus};
use geo::{BoundingRect, LineString, Rect};
use itertools::Itertools;
use palette::Srgb;
use tokio::{sync::mpsc, task::JoinSet};
use tracing::{debug, error, info, warn};

use crate::bridge::{BridgeError, HostMessage, MapEvent, RequestId, SurfaceEndpoint};
use crate::route::{RouteError, RouteProvider, RouteSummary};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MarkerColor {
    Green,
    Red,
    Gray,
}

impl MarkerColor {
    pub fn for_status(status: StationStatus) -> Self {
        match status {
            StationStatus::Available => MarkerColor::Green,
            StationStatus::Occupied => MarkerColor::Red,
            StationStatus::Maintenance => MarkerColor::Gray,
        }
    }

    pub fn rgb(self) -> Srgb<u8> {
        match self {
            MarkerColor::Green => Srgb::new(0x22, 0xc5, 0x5e),
            MarkerColor::Red => Srgb::new(0xef, 0x44, 0x44),
            MarkerColor::Gray => Srgb::new(0x6b, 0x72, 0x80),
        }
    }

    /// `#rrggbb`
    pub fn hex(self) -> String {
        let Srgb {
            red, green, blue, ..
        } = self.rgb();
        format!("#{red:02x}{green:02x}{blue:02x}")
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StationMarker {
    pub id: StationIdentifier,
    pub position: LngLat,
    pub color: MarkerColor,
}

impl From<&Station> for StationMarker {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.clone(),
            position: station.position(),
            color: MarkerColor::for_status(station.status),
        }
    }
}

/// Drawing operations of a native map view.
pub trait MapCanvas: Send {
    fn show_user(&mut self, at: LngLat);
    /// Replaces every station marker.
    fn show_stations(&mut self, markers: &[StationMarker]);
    fn draw_route(&mut self, line: &LineString<f64>);
    fn clear_route(&mut self);
    fn fit_bounds(&mut self, bounds: Rect<f64>);
}

/// Route generation the query was started under, its request id and result.
type RouteOutcome = (u64, Option<RequestId>, Result<RouteSummary, RouteError>);

pub struct MapSurface<C> {
    endpoint: SurfaceEndpoint,
    canvas: C,
    routes: Arc<dyn RouteProvider>,
    taps: mpsc::UnboundedReceiver<StationIdentifier>,
    stations: HashMap<StationIdentifier, Arc<Station>>,
    loaded: bool,
    /// Bumped by every SHOW_ROUTE and CLEAR_ROUTE; only the latest query draws.
    route_generation: u64,
}

impl<C: MapCanvas> MapSurface<C> {
    /// Returns the surface and the sender the view reports marker taps on.
    pub fn new(
        endpoint: SurfaceEndpoint,
        canvas: C,
        routes: Arc<dyn RouteProvider>,
    ) -> (Self, mpsc::UnboundedSender<StationIdentifier>) {
        let (tap_tx, taps) = mpsc::unbounded_channel();
        let surface = Self {
            endpoint,
            canvas,
            routes,
            taps,
            stations: HashMap::new(),
            loaded: false,
            route_generation: 0,
        };
        (surface, tap_tx)
    }

    /// Runs until the host side of the bridge goes away.
    pub async fn run(mut self) {
        let mut queries: JoinSet<RouteOutcome> = JoinSet::new();

        loop {
            let sent = tokio::select! {
                frame = self.endpoint.recv() => match frame {
                    None => break,
                    Some(Ok(message)) => self.on_message(message, &mut queries),
                    Some(Err(err)) => {
                        warn!(%err, "dropping host frame");
                        Ok(())
                    }
                },
                Some(station_id) = self.taps.recv() => self.on_tap(station_id),
                Some(joined) = queries.join_next() => match joined {
                    Ok((generation, request_id, outcome)) => {
                        self.on_route(generation, request_id, outcome)
                    }
                    Err(err) => {
                        error!(%err, "route query task failed");
                        Ok(())
                    }
                },
            };

            if let Err(BridgeError::Closed) = sent {
                break;
            }
            if let Err(err) = sent {
                error!(%err, "could not send map event");
            }
        }

        debug!("map surface stopped");
    }

    fn on_message(
        &mut self,
        message: HostMessage,
        queries: &mut JoinSet<RouteOutcome>,
    ) -> Result<(), BridgeError> {
        match message {
            HostMessage::InitMap {
                user_location,
                stations,
            } => {
                let markers = stations.iter().map(|s| StationMarker::from(&**s)).collect_vec();
                self.stations = stations.into_iter().map(|s| (s.id.clone(), s)).collect();

                self.canvas.show_user(user_location);
                self.canvas.show_stations(&markers);

                if !self.loaded {
                    self.loaded = true;
                    info!(stations = markers.len(), "map initialized");
                    self.endpoint.send(&MapEvent::MapLoaded)?;
                }
                Ok(())
            }
            HostMessage::ShowRoute {
                start,
                end,
                request_id,
            } => {
                if !self.loaded {
                    warn!("route requested before the map was initialized");
                    return Ok(());
                }

                self.route_generation += 1;
                let generation = self.route_generation;
                let routes = self.routes.clone();
                queries.spawn(async move {
                    (generation, request_id, routes.route(start, end).await)
                });
                Ok(())
            }
            HostMessage::ClearRoute => {
                self.route_generation += 1;
                self.canvas.clear_route();
                Ok(())
            }
        }
    }

    fn on_tap(&mut self, station_id: StationIdentifier) -> Result<(), BridgeError> {
        if !self.stations.contains_key(&station_id) {
            debug!(%station_id, "tap on unknown station");
            return Ok(());
        }
        self.endpoint.send(&MapEvent::StationSelected { station_id })
    }

    /// Superseded answers are still reported so the host can discard them,
    /// but never drawn.
    fn on_route(
        &mut self,
        generation: u64,
        request_id: Option<RequestId>,
        outcome: Result<RouteSummary, RouteError>,
    ) -> Result<(), BridgeError> {
        let current = generation == self.route_generation;
        match outcome {
            Ok(summary) => {
                if current {
                    self.canvas.draw_route(&summary.geometry);
                    if let Some(bounds) = summary.geometry.bounding_rect() {
                        self.canvas.fit_bounds(bounds);
                    }
                } else {
                    debug!(?request_id, "not drawing superseded route");
                }
                self.endpoint.send(&MapEvent::RouteInfo {
                    distance: summary.distance_m,
                    duration: summary.duration_s,
                    request_id,
                })
            }
            Err(err) => {
                error!(%err, ?request_id, "route query failed");
                self.endpoint.send(&MapEvent::RouteFailed {
                    request_id,
                    reason: err.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::bridge::{HostEndpoint, channel};

    #[derive(Debug, PartialEq)]
    enum Call {
        User(LngLat),
        Stations(Vec<StationMarker>),
        Route(usize),
        Clear,
        Fit,
    }

    #[derive(Clone, Default)]
    struct RecordingCanvas(Arc<Mutex<Vec<Call>>>);

    impl RecordingCanvas {
        fn calls(&self) -> std::sync::MutexGuard<'_, Vec<Call>> {
            self.0.lock().unwrap()
        }
    }

    impl MapCanvas for RecordingCanvas {
        fn show_user(&mut self, at: LngLat) {
            self.calls().push(Call::User(at));
        }
        fn show_stations(&mut self, markers: &[StationMarker]) {
            self.calls().push(Call::Stations(markers.to_vec()));
        }
        fn draw_route(&mut self, line: &LineString<f64>) {
            self.calls().push(Call::Route(line.0.len()));
        }
        fn clear_route(&mut self) {
            self.calls().push(Call::Clear);
        }
        fn fit_bounds(&mut self, _bounds: Rect<f64>) {
            self.calls().push(Call::Fit);
        }
    }

    struct FixedRoute {
        summary: Option<RouteSummary>,
        calls: AtomicUsize,
    }

    impl RouteProvider for FixedRoute {
        fn route<'a>(
            &'a self,
            start: LngLat,
            end: LngLat,
        ) -> Pin<Box<dyn Future<Output = Result<RouteSummary, RouteError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let outcome = self.summary.clone().ok_or(RouteError::NoRoute { start, end });
            Box::pin(async move { outcome })
        }
    }

    fn station(id: &str, status: StationStatus) -> Arc<Station> {
        Arc::new(Station {
            id: StationIdentifier::new(id),
            name: id.into(),
            address: "".into(),
            latitude: 10.78,
            longitude: 106.70,
            status,
            battery_count: 1,
            open_time: "".into(),
            image: "".into(),
            swappable_batteries: 1,
        })
    }

    fn init() -> HostMessage {
        HostMessage::InitMap {
            user_location: LngLat::new(106.69, 10.77),
            stations: vec![
                station("a", StationStatus::Available),
                station("b", StationStatus::Maintenance),
            ],
        }
    }

    fn show_route(id: u64) -> HostMessage {
        HostMessage::ShowRoute {
            start: LngLat::new(106.69, 10.77),
            end: LngLat::new(106.70, 10.78),
            request_id: Some(RequestId(id)),
        }
    }

    struct Harness {
        host: HostEndpoint,
        taps: mpsc::UnboundedSender<StationIdentifier>,
        canvas: RecordingCanvas,
        routes: Arc<FixedRoute>,
    }

    fn start(summary: Option<RouteSummary>) -> Harness {
        let (host, surface_end) = channel();
        let canvas = RecordingCanvas::default();
        let routes = Arc::new(FixedRoute {
            summary,
            calls: AtomicUsize::new(0),
        });

        let (surface, taps) = MapSurface::new(surface_end, canvas.clone(), routes.clone());
        tokio::spawn(surface.run());

        Harness {
            host,
            taps,
            canvas,
            routes,
        }
    }

    fn summary() -> RouteSummary {
        RouteSummary {
            distance_m: 1_800.0,
            duration_s: 420.0,
            geometry: LineString::from(vec![(106.69, 10.77), (106.695, 10.775), (106.70, 10.78)]),
        }
    }

    #[test]
    fn test_marker_colors() {
        assert_eq!(MarkerColor::for_status(StationStatus::Available).hex(), "#22c55e");
        assert_eq!(MarkerColor::for_status(StationStatus::Occupied).hex(), "#ef4444");
        assert_eq!(MarkerColor::for_status(StationStatus::Maintenance), MarkerColor::Gray);
    }

    #[tokio::test]
    async fn test_map_loaded_once() {
        let mut h = start(None);

        h.host.send(&init()).unwrap();
        h.host.send(&init()).unwrap();
        h.host.send(&HostMessage::ClearRoute).unwrap();
        h.host.send(&show_route(1)).unwrap();

        assert!(matches!(h.host.recv().await, Some(Ok(MapEvent::MapLoaded))));
        assert!(matches!(
            h.host.recv().await,
            Some(Ok(MapEvent::RouteFailed { .. }))
        ));

        let calls = h.canvas.calls();
        assert_eq!(calls[0], Call::User(LngLat::new(106.69, 10.77)));
        let Call::Stations(markers) = &calls[1] else {
            panic!("expected markers, got {:?}", calls[1]);
        };
        assert_eq!(markers[0].color, MarkerColor::Green);
        assert_eq!(markers[1].color, MarkerColor::Gray);
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::Stations(_))).count(),
            2
        );
        assert!(calls.contains(&Call::Clear));
    }

    #[tokio::test]
    async fn test_unknown_tap_is_ignored() {
        let mut h = start(None);
        h.host.send(&init()).unwrap();
        assert!(matches!(h.host.recv().await, Some(Ok(MapEvent::MapLoaded))));

        h.taps.send(StationIdentifier::new("zzz")).unwrap();
        h.taps.send(StationIdentifier::new("b")).unwrap();

        assert!(matches!(
            h.host.recv().await,
            Some(Ok(MapEvent::StationSelected { station_id })) if station_id.as_str() == "b"
        ));
    }

    #[tokio::test]
    async fn test_route_before_init_is_ignored() {
        let mut h = start(Some(summary()));

        h.host.send(&show_route(1)).unwrap();
        h.host.send(&init()).unwrap();
        assert!(matches!(h.host.recv().await, Some(Ok(MapEvent::MapLoaded))));
        assert_eq!(h.routes.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_route_info_carries_request_id() {
        let mut h = start(Some(summary()));
        h.host.send(&init()).unwrap();
        h.host.recv().await;

        h.host.send(&show_route(4)).unwrap();
        assert_eq!(
            h.host.recv().await.unwrap().unwrap(),
            MapEvent::RouteInfo {
                distance: 1_800.0,
                duration: 420.0,
                request_id: Some(RequestId(4)),
            }
        );

        let calls = h.canvas.calls();
        assert!(calls.contains(&Call::Route(3)));
        assert!(calls.contains(&Call::Fit));
    }

    #[tokio::test]
    async fn test_route_failure_is_reported() {
        let mut h = start(None);
        h.host.send(&init()).unwrap();
        h.host.recv().await;

        h.host.send(&show_route(2)).unwrap();
        assert!(matches!(
            h.host.recv().await,
            Some(Ok(MapEvent::RouteFailed {
                request_id: Some(RequestId(2)),
                ..
            }))
        ));
        assert!(!h.canvas.calls().iter().any(|c| matches!(c, Call::Route(_))));
    }

    struct SlowRoute(Duration);

    impl RouteProvider for SlowRoute {
        fn route<'a>(
            &'a self,
            _start: LngLat,
            _end: LngLat,
        ) -> Pin<Box<dyn Future<Output = Result<RouteSummary, RouteError>> + Send + 'a>> {
            let delay = self.0;
            Box::pin(async move {
                tokio::time::sleep(delay).await;
                Ok(summary())
            })
        }
    }

    async fn start_slow(delay: Duration) -> (HostEndpoint, RecordingCanvas) {
        let (mut host, surface_end) = channel();
        let canvas = RecordingCanvas::default();
        let (surface, _taps) =
            MapSurface::new(surface_end, canvas.clone(), Arc::new(SlowRoute(delay)));
        tokio::spawn(surface.run());

        host.send(&init()).unwrap();
        assert!(matches!(host.recv().await, Some(Ok(MapEvent::MapLoaded))));
        (host, canvas)
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleared_route_is_not_drawn() {
        let (mut host, canvas) = start_slow(Duration::from_secs(5)).await;

        host.send(&show_route(1)).unwrap();
        host.send(&HostMessage::ClearRoute).unwrap();

        assert!(matches!(
            host.recv().await,
            Some(Ok(MapEvent::RouteInfo {
                request_id: Some(RequestId(1)),
                ..
            }))
        ));
        let calls = canvas.calls();
        assert!(!calls.iter().any(|c| matches!(c, Call::Route(_) | Call::Fit)));
        assert_eq!(calls.last(), Some(&Call::Clear));
    }

    #[tokio::test(start_paused = true)]
    async fn test_only_latest_route_is_drawn() {
        let (mut host, canvas) = start_slow(Duration::from_secs(5)).await;

        host.send(&show_route(1)).unwrap();
        host.send(&show_route(2)).unwrap();
        host.recv().await.unwrap().unwrap();
        host.recv().await.unwrap().unwrap();

        let calls = canvas.calls();
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Route(_))).count(), 1);
        assert_eq!(calls.iter().filter(|c| matches!(c, Call::Fit)).count(), 1);
    }

    #[tokio::test]
    async fn test_stops_when_host_goes_away() {
        let (host, surface_end) = channel();
        let routes: Arc<dyn RouteProvider> = Arc::new(FixedRoute {
            summary: None,
            calls: AtomicUsize::new(0),
        });
        let (surface, _taps) = MapSurface::new(surface_end, RecordingCanvas::default(), routes);
        let task = tokio::spawn(surface.run());

        drop(host);
        task.await.unwrap();
    }
}
