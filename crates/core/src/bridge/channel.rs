use std::marker::PhantomData;

use tokio::sync::mpsc;

use crate::bridge::{
    BridgeError,
    protocol::{Frame, HostMessage, MapEvent, decode, encode},
};

/// One side of the bridge: sends `Out` frames, receives `In` frames.
///
/// Each direction is FIFO; nothing orders one direction against the other.
pub struct BridgeEndpoint<Out, In> {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
    _frames: PhantomData<fn(Out) -> In>,
}

pub type HostEndpoint = BridgeEndpoint<HostMessage, MapEvent>;
pub type SurfaceEndpoint = BridgeEndpoint<MapEvent, HostMessage>;

pub fn channel() -> (HostEndpoint, SurfaceEndpoint) {
    let (to_surface, from_host) = mpsc::unbounded_channel();
    let (to_host, from_surface) = mpsc::unbounded_channel();

    (
        BridgeEndpoint::from_raw(to_surface, from_surface),
        BridgeEndpoint::from_raw(to_host, from_host),
    )
}

impl<Out: Frame, In: Frame> BridgeEndpoint<Out, In> {
    pub fn from_raw(
        outbound: mpsc::UnboundedSender<String>,
        inbound: mpsc::UnboundedReceiver<String>,
    ) -> Self {
        Self {
            outbound,
            inbound,
            _frames: PhantomData,
        }
    }

    /// Raw text halves, for when the other side lives outside Rust.
    pub fn into_raw(
        self,
    ) -> (
        mpsc::UnboundedSender<String>,
        mpsc::UnboundedReceiver<String>,
    ) {
        (self.outbound, self.inbound)
    }

    pub fn send(&self, frame: &Out) -> Result<(), BridgeError> {
        frame.validate()?;
        let text = encode(frame)?;
        self.outbound.send(text).map_err(|_| BridgeError::Closed)
    }

    /// `None` once the other side has gone away.
    ///
    /// A frame that fails to decode is reported and the endpoint stays usable.
    pub async fn recv(&mut self) -> Option<Result<In, BridgeError>> {
        let text = self.inbound.recv().await?;
        Some(decode(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amply_stations::{LngLat, StationIdentifier};

    #[tokio::test]
    async fn test_frames_arrive_in_order() {
        let (host, mut surface) = channel();

        host.send(&HostMessage::ClearRoute).unwrap();
        host.send(&HostMessage::ShowRoute {
            start: LngLat::new(1.0, 1.0),
            end: LngLat::new(2.0, 2.0),
            request_id: None,
        })
        .unwrap();

        assert!(matches!(
            surface.recv().await,
            Some(Ok(HostMessage::ClearRoute))
        ));
        assert!(matches!(
            surface.recv().await,
            Some(Ok(HostMessage::ShowRoute { .. }))
        ));
    }

    #[tokio::test]
    async fn test_bad_frame_does_not_poison_endpoint() {
        let (mut host, surface) = channel();
        let (raw_to_host, _raw_from_host) = surface.into_raw();

        raw_to_host.send("garbage".to_owned()).unwrap();
        raw_to_host
            .send(r#"{"type":"STATION_SELECTED","stationId":"9"}"#.to_owned())
            .unwrap();

        assert!(matches!(host.recv().await, Some(Err(BridgeError::Malformed(_)))));
        assert!(matches!(
            host.recv().await,
            Some(Ok(MapEvent::StationSelected { station_id })) if station_id == StationIdentifier::new("9")
        ));
    }

    #[tokio::test]
    async fn test_invalid_outbound_frame_is_not_sent() {
        let (host, mut surface) = channel();

        let result = host.send(&HostMessage::ShowRoute {
            start: LngLat::new(f64::NAN, 0.0),
            end: LngLat::new(0.0, 0.0),
            request_id: None,
        });
        assert!(matches!(result, Err(BridgeError::Invalid(_))));

        drop(host);
        assert!(surface.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_send_after_close() {
        let (host, surface) = channel();
        drop(surface);

        assert!(matches!(
            host.send(&HostMessage::ClearRoute),
            Err(BridgeError::Closed)
        ));
    }
}
