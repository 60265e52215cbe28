//! The message boundary between the host logic and the map surface.
//!
//! The surface may be a web view running a map library or the in-process
//! [`surface::MapSurface`] driving a native map view. Both sides only ever see
//! JSON text frames, decoded and validated on arrival.

pub mod channel;
pub mod protocol;
pub mod surface;

pub use channel::{BridgeEndpoint, HostEndpoint, SurfaceEndpoint, channel};
pub use protocol::{Frame, HostMessage, MapEvent, PROTOCOL_VERSION, RequestId};

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid frame: {0}")]
    Invalid(String),
    #[error("protocol version {found} is newer than supported {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("bridge closed")]
    Closed,
}
