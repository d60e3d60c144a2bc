//! Feed snapshot to vehicle-positions source.
//!
//! Every refresh fully replaces the source data. A snapshot without a single
//! positioned vehicle leaves the previous features on screen, so a transient
//! gap in the feed does not blank the map.

use geo::Point;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value as GeometryValue};
use inspector_transit::{FeedSnapshot, VehicleEntity};
use serde_json::Value;

use crate::layers::viewport::{ViewportFitter, ViewportRequest};
use crate::state::view::map::source::{MapSource, empty_collection};
use crate::surface::RenderSurface;

/// Flattened feature properties; the keys are what the paint expressions and
/// the popup read back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehicleProperties {
    pub vehicle_id: Option<String>,
    pub vehicle_label: Option<String>,
    pub vehicle_license_plate: Option<String>,
    pub trip_id: Option<String>,
    pub route_id: Option<String>,
    pub start_date: Option<String>,
    pub start_time: Option<String>,
    pub delay: Option<i32>,
}

impl VehicleProperties {
    pub fn from_entity(entity: &VehicleEntity) -> Self {
        let vehicle = entity.vehicle.as_ref();
        let trip = entity.trip.as_ref();
        Self {
            vehicle_id: entity.vehicle_id().map(|id| id.as_str().to_owned()),
            vehicle_label: vehicle.and_then(|v| v.label.clone()),
            vehicle_license_plate: vehicle.and_then(|v| v.license_plate.clone()),
            trip_id: entity.trip_id().map(|id| id.as_str().to_owned()),
            route_id: trip.and_then(|t| t.route_id.as_ref()).map(|id| id.as_str().to_owned()),
            start_date: trip.and_then(|t| t.start_date.clone()),
            start_time: trip.and_then(|t| t.start_time.clone()),
            delay: entity.delay,
        }
    }

    /// Absent fields are left out, so the paint expressions see them as null.
    pub fn to_json(&self) -> JsonObject {
        let mut properties = JsonObject::new();
        let strings = [
            ("vehicleId", &self.vehicle_id),
            ("vehicleLabel", &self.vehicle_label),
            ("vehicleLicensePlate", &self.vehicle_license_plate),
            ("trip_id", &self.trip_id),
            ("route_id", &self.route_id),
            ("start_date", &self.start_date),
            ("start_time", &self.start_time),
        ];
        for (key, value) in strings {
            if let Some(value) = value {
                properties.insert(key.to_owned(), Value::from(value.as_str()));
            }
        }
        if let Some(delay) = self.delay {
            properties.insert("delay".to_owned(), Value::from(delay));
        }
        properties
    }
}

/// One vehicle as drawn on the map. Only built for entities with a position.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedVehicleFeature {
    pub properties: VehicleProperties,
    pub geometry: Point,
}

impl RenderedVehicleFeature {
    pub fn from_entity(entity: &VehicleEntity) -> Option<Self> {
        Some(Self {
            geometry: entity.location()?,
            properties: VehicleProperties::from_entity(entity),
        })
    }

    pub fn to_feature(&self) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(GeometryValue::Point(vec![
                self.geometry.x(),
                self.geometry.y(),
            ]))),
            id: None,
            properties: Some(self.properties.to_json()),
            foreign_members: None,
        }
    }
}

/// Result of diffing one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleDiff {
    pub features: Vec<RenderedVehicleFeature>,
    pub viewport: ViewportRequest,
}

impl VehicleDiff {
    pub fn to_geojson(&self) -> GeoJson {
        GeoJson::FeatureCollection(FeatureCollection {
            bbox: None,
            features: self.features.iter().map(RenderedVehicleFeature::to_feature).collect(),
            foreign_members: None,
        })
    }
}

/// What a call to [`FeedSnapshotDiffer::apply`] did to the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOutcome {
    /// The vehicle source is not registered yet.
    NotReady,
    /// No positioned vehicles; previous features kept.
    Preserved,
    /// No positioned vehicles; source emptied.
    Cleared,
    Replaced { count: usize },
    /// The surface rejected the write; the camera was left alone.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedSnapshotDiffer {
    fitter: ViewportFitter,
    clear_on_empty: bool,
}

impl Default for FeedSnapshotDiffer {
    fn default() -> Self {
        Self::new(ViewportFitter::default(), false)
    }
}

impl FeedSnapshotDiffer {
    pub fn new(fitter: ViewportFitter, clear_on_empty: bool) -> Self {
        Self {
            fitter,
            clear_on_empty,
        }
    }

    /// Features and framing for `snapshot`, or `None` if nothing has a position.
    pub fn diff(&self, snapshot: &FeedSnapshot) -> Option<VehicleDiff> {
        let features: Vec<RenderedVehicleFeature> = snapshot
            .positioned_vehicles()
            .map(|(entity, geometry)| RenderedVehicleFeature {
                properties: VehicleProperties::from_entity(entity),
                geometry,
            })
            .collect();
        let points: Vec<Point> = features.iter().map(|f| f.geometry).collect();
        let viewport = self.fitter.fit(&points)?;

        Some(VehicleDiff { features, viewport })
    }

    pub fn apply<S: RenderSurface>(&self, surface: &mut S, snapshot: &FeedSnapshot) -> DiffOutcome {
        let source = MapSource::VehiclePositions.id();
        if !surface.has_source(source) {
            tracing::trace!(source, "vehicle source not registered, skipping snapshot");
            return DiffOutcome::NotReady;
        }

        let Some(diff) = self.diff(snapshot) else {
            if !self.clear_on_empty {
                tracing::debug!(entities = snapshot.entities.len(), "no positioned vehicles, keeping previous features");
                return DiffOutcome::Preserved;
            }
            if let Err(e) = surface.set_source_data(source, empty_collection()) {
                tracing::warn!(source, error = %e, "failed to clear vehicle positions");
                return DiffOutcome::Failed;
            }
            return DiffOutcome::Cleared;
        };

        let count = diff.features.len();
        if let Err(e) = surface.set_source_data(source, diff.to_geojson()) {
            tracing::warn!(source, error = %e, "failed to replace vehicle positions");
            return DiffOutcome::Failed;
        }
        surface.fit_bounds(&diff.viewport);
        tracing::debug!(count, "replaced vehicle positions");

        DiffOutcome::Replaced { count }
    }
}
