//! # amply-stations
//!
//! Battery-swap station data for the Amply client core.
//!
//! ## Features
//!
//! - **Typed identifiers**: `Arc<str>` backed ids that are cheap to clone
//! - **Spatial queries**: R-tree backed nearest / within-radius lookups
//! - **Opening hours**: parsing of the human readable `openTime` field
//! - **Serde** (optional): camelCase wire format shared with the backend
//!
//! ## Example
//!
//! ```
//! use amply_stations::prelude::*;
//! use geo::Point;
//!
//! let station = Station {
//!     id: StationIdentifier::new("1"),
//!     name: "District 1 Station".into(),
//!     address: "1 Le Loi, District 1".into(),
//!     latitude: 10.7769,
//!     longitude: 106.7017,
//!     status: StationStatus::Available,
//!     battery_count: 8,
//!     open_time: "Monday, 10:00 - 21:00".into(),
//!     image: "".into(),
//!     swappable_batteries: 2,
//! };
//!
//! let provider = StaticStationProvider::from_stations(vec![station]);
//!
//! let here = Point::new(106.70, 10.78);
//! let nearby = provider.stations_near(here, 5_000.0); // 5km radius
//! assert_eq!(nearby.len(), 1);
//! ```

pub mod identifiers;
pub mod models;
pub mod provider;
pub mod spatial;

pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{hours::*, station::*, traits::*, types::*};
    pub use crate::provider::static_provider::StaticStationProvider;
}

pub use prelude::*;
