//! Realtime feed snapshot model.
//!
//! Mirrors the vehicle-position subset of a decoded GTFS-RT `FeedMessage`.
//! A snapshot always replaces the previous one wholesale; nothing here tracks
//! identity across refreshes.

use crate::identifiers::*;
use crate::models::calendar::TripStart;
use crate::models::types::{Position, Result};

/// One poll cycle worth of feed entities.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct FeedSnapshot {
    #[cfg_attr(feature = "serde", serde(default, rename = "entity"))]
    pub entities: Vec<FeedEntity>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct FeedEntity {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: Option<String>,
    /// Absent for trip updates and alerts.
    #[cfg_attr(feature = "serde", serde(default))]
    pub vehicle: Option<VehicleEntity>,
}

/// A vehicle position report.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VehicleEntity {
    pub vehicle: Option<VehicleDescriptor>,
    pub position: Option<Position>,
    pub trip: Option<TripDescriptor>,
    /// Seconds behind schedule; negative when running early.
    pub delay: Option<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VehicleDescriptor {
    pub id: Option<VehicleIdentifier>,
    pub label: Option<String>,
    pub license_plate: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TripDescriptor {
    pub trip_id: Option<TripIdentifier>,
    pub route_id: Option<RouteIdentifier>,
    /// Service day as `YYYYMMDD`.
    pub start_date: Option<String>,
    /// Start relative to the service day as `HH:MM:SS`.
    pub start_time: Option<String>,
}

impl FeedSnapshot {
    pub fn new(entities: Vec<FeedEntity>) -> Self {
        Self { entities }
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Vehicles that carry a usable position, in feed order.
    pub fn positioned_vehicles(&self) -> impl Iterator<Item = (&VehicleEntity, geo::Point)> + '_ {
        self.entities
            .iter()
            .filter_map(|entity| entity.vehicle.as_ref())
            .filter_map(|vehicle| vehicle.location().map(|point| (vehicle, point)))
    }
}

impl FeedEntity {
    pub fn vehicle(vehicle: VehicleEntity) -> Self {
        Self {
            id: None,
            vehicle: Some(vehicle),
        }
    }
}

impl VehicleEntity {
    pub fn location(&self) -> Option<geo::Point> {
        self.position.as_ref().and_then(Position::point)
    }

    pub fn vehicle_id(&self) -> Option<&VehicleIdentifier> {
        self.vehicle.as_ref().and_then(|v| v.id.as_ref())
    }

    pub fn trip_id(&self) -> Option<&TripIdentifier> {
        self.trip.as_ref().and_then(|t| t.trip_id.as_ref())
    }
}

impl TripDescriptor {
    /// Parsed trip start, if both the date and the time are present.
    pub fn start(&self) -> Option<Result<TripStart>> {
        match (&self.start_date, &self.start_time) {
            (Some(date), Some(time)) => Some(TripStart::parse(date, time)),
            _ => None,
        }
    }
}
