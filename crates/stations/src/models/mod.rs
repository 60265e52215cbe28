//! Station data models, types, and traits.

pub mod hours;
pub mod station;
pub mod traits;
pub mod types;

pub use hours::{OpeningHours, WeekdayFlags};
pub use station::Station;
pub use traits::StationProvider;
pub use types::{LngLat, Result, StationError, StationStatus};
