use tokio::sync::{mpsc, oneshot, watch};

use crate::booking::BookingSession;
use crate::bridge::RequestId;
use crate::location::LocationFix;
use crate::screen::{ScreenError, ScreenSnapshot};

type Reply<T> = oneshot::Sender<Result<T, ScreenError>>;

pub(crate) enum Command {
    SurfaceLoaded,
    RefreshLocation(oneshot::Sender<LocationFix>),
    GetDirections(Reply<RequestId>),
    OpenExternalMap(Reply<String>),
    ExternalMapOpened,
    ExternalMapFailed(String),
    Book(Reply<BookingSession>),
    CloseSheet,
    CloseCountdown,
}

/// Cheap to clone. The screen task stops once every handle is dropped.
#[derive(Clone)]
pub struct StationScreenHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<ScreenSnapshot>,
}

impl StationScreenHandle {
    pub(crate) fn new(
        commands: mpsc::UnboundedSender<Command>,
        snapshots: watch::Receiver<ScreenSnapshot>,
    ) -> Self {
        Self {
            commands,
            snapshots,
        }
    }

    fn send(&self, command: Command) -> Result<(), ScreenError> {
        self.commands.send(command).map_err(|_| ScreenError::Stopped)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ScreenError> {
        let (tx, rx) = oneshot::channel();
        self.send(command(tx))?;
        rx.await.map_err(|_| ScreenError::Stopped)
    }

    pub fn snapshot(&self) -> ScreenSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScreenSnapshot> {
        self.snapshots.clone()
    }

    /// The map surface finished loading its page or view.
    pub fn surface_loaded(&self) -> Result<(), ScreenError> {
        self.send(Command::SurfaceLoaded)
    }

    pub async fn refresh_location(&self) -> Result<LocationFix, ScreenError> {
        self.request(Command::RefreshLocation).await
    }

    /// Resolves once the route request is on its way, not when it is answered.
    pub async fn get_directions(&self) -> Result<RequestId, ScreenError> {
        self.request(Command::GetDirections).await?
    }

    /// URL for the platform to open. Report back with
    /// [`StationScreenHandle::external_map_opened`] or
    /// [`StationScreenHandle::external_map_failed`]; without either the
    /// handoff is released after the configured timeout.
    pub async fn open_external_map(&self) -> Result<String, ScreenError> {
        self.request(Command::OpenExternalMap).await?
    }

    pub fn external_map_opened(&self) -> Result<(), ScreenError> {
        self.send(Command::ExternalMapOpened)
    }

    /// The platform could not open the URL. Frees the sheet's other buttons.
    pub fn external_map_failed(&self, reason: impl Into<String>) -> Result<(), ScreenError> {
        self.send(Command::ExternalMapFailed(reason.into()))
    }

    pub async fn book(&self) -> Result<BookingSession, ScreenError> {
        self.request(Command::Book).await?
    }

    pub fn close_sheet(&self) -> Result<(), ScreenError> {
        self.send(Command::CloseSheet)
    }

    pub fn close_countdown(&self) -> Result<(), ScreenError> {
        self.send(Command::CloseCountdown)
    }
}
