//! Feed data models and types.

pub mod calendar;
pub mod feed;
pub mod types;

// Re-exports for convenience
pub use calendar::TripStart;
pub use feed::{FeedEntity, FeedSnapshot, TripDescriptor, VehicleDescriptor, VehicleEntity};
pub use types::{Position, Result, TransitError};
