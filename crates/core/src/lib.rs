//! Headless core of the Amply swap-station client.
//!
//! The platform UI renders; this crate decides. The [`screen`] task owns the
//! booking session and talks to the map over the [`bridge`].

pub mod api;
pub mod booking;
pub mod bridge;
pub mod config;
pub mod handoff;
pub mod location;
pub mod route;
pub mod screen;
pub mod store;

pub use amply_api_types as api_types;
pub use amply_stations as stations;
pub use config::CoreConfig;
