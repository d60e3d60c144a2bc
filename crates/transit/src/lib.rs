//! # inspector-transit
//!
//! Read-only model of a realtime transit feed snapshot, as consumed by the
//! map view.
//!
//! ## Features
//!
//! - **Snapshots**: the vehicle-position subset of a GTFS-RT feed message
//! - **Type-safe ids**: cheap-to-clone vehicle, trip and route identifiers
//! - **Service days**: trip start parsing, including times past midnight
//! - **JSON decoding**: enable the `serde` feature
//!
//! ## Example
//!
//! ```
//! use inspector_transit::prelude::*;
//!
//! let snapshot = FeedSnapshot::new(vec![FeedEntity::vehicle(VehicleEntity {
//!     vehicle: Some(VehicleDescriptor {
//!         id: Some(VehicleIdentifier::new("V1")),
//!         ..Default::default()
//!     }),
//!     position: Some(Position::new(40.7128, -74.0060)),
//!     delay: Some(45),
//!     ..Default::default()
//! })]);
//!
//! let (vehicle, point) = snapshot.positioned_vehicles().next().unwrap();
//! assert_eq!(vehicle.vehicle_id().unwrap().as_str(), "V1");
//! assert_eq!(point.x(), -74.0060);
//! ```

pub mod identifiers;
pub mod models;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::{calendar::*, feed::*, types::*};
}

pub use prelude::*;
