//! Overlay sources for the focused trip and vehicle.
//!
//! Both syncs are total replacements: the supplied geometry, or an empty
//! collection when nothing is focused. Calling either before the surface is
//! ready does nothing.

use geo::{LineString, Point};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value as GeometryValue};

use crate::state::view::map::source::{MapSource, empty_collection};
use crate::surface::RenderSurface;

/// Path of the focused trip. `properties` travel with the line so the arrow
/// decoration can read them.
#[derive(Debug, Clone, PartialEq)]
pub struct FocusedTripShape {
    pub path: LineString,
    pub properties: JsonObject,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FocusedVehiclePosition {
    pub point: Point,
    /// Carries `delay` for the shared lateness coloring.
    pub properties: JsonObject,
}

impl FocusedTripShape {
    pub fn new(path: LineString) -> Self {
        Self {
            path,
            properties: JsonObject::new(),
        }
    }

    pub fn to_geojson(&self) -> GeoJson {
        let line = self.path.coords().map(|c| vec![c.x, c.y]).collect();
        single_feature(GeometryValue::LineString(line), &self.properties)
    }
}

impl FocusedVehiclePosition {
    pub fn new(point: Point) -> Self {
        Self {
            point,
            properties: JsonObject::new(),
        }
    }

    pub fn to_geojson(&self) -> GeoJson {
        single_feature(
            GeometryValue::Point(vec![self.point.x(), self.point.y()]),
            &self.properties,
        )
    }
}

fn single_feature(value: GeometryValue, properties: &JsonObject) -> GeoJson {
    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features: vec![Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: Some(properties.clone()),
            foreign_members: None,
        }],
        foreign_members: None,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    NotReady,
    Cleared,
    Drawn,
    /// The surface rejected the write.
    Failed,
}

pub fn sync_trip_shape<S: RenderSurface>(
    surface: &mut S,
    shape: Option<&FocusedTripShape>,
) -> SyncOutcome {
    replace(surface, MapSource::FocusedTripShape, shape.map(FocusedTripShape::to_geojson))
}

pub fn sync_vehicle_position<S: RenderSurface>(
    surface: &mut S,
    position: Option<&FocusedVehiclePosition>,
) -> SyncOutcome {
    replace(
        surface,
        MapSource::FocusedVehiclePosition,
        position.map(FocusedVehiclePosition::to_geojson),
    )
}

fn replace<S: RenderSurface>(surface: &mut S, source: MapSource, data: Option<GeoJson>) -> SyncOutcome {
    let id = source.id();
    if !surface.has_source(id) {
        tracing::trace!(source = id, "overlay source not registered");
        return SyncOutcome::NotReady;
    }

    let (data, outcome) = match data {
        Some(data) => (data, SyncOutcome::Drawn),
        None => (empty_collection(), SyncOutcome::Cleared),
    };
    match surface.set_source_data(id, data) {
        Ok(()) => outcome,
        Err(e) => {
            tracing::warn!(source = id, error = %e, "failed to sync overlay");
            SyncOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessSurface, SurfaceOptions};
    use geo::{Coord, line_string};

    fn ready_surface() -> HeadlessSurface {
        let mut surface = HeadlessSurface::new(SurfaceOptions {
            style: "test".into(),
            center: Coord { x: 0.0, y: 0.0 },
            zoom: 1.0,
        });
        for source in MapSource::ALL {
            surface.add_source(source.id(), empty_collection()).unwrap();
        }
        surface
    }

    #[test]
    fn test_absent_twice_stays_empty() {
        let mut surface = ready_surface();
        for _ in 0..2 {
            assert_eq!(sync_trip_shape(&mut surface, None), SyncOutcome::Cleared);
            assert_eq!(surface.source("focused-trip-shape"), Some(&empty_collection()));
        }
    }

    #[test]
    fn test_absent_clears_previous_shape() {
        let mut surface = ready_surface();
        let shape = FocusedTripShape::new(line_string![(x: -74.0, y: 40.7), (x: -73.9, y: 40.8)]);

        assert_eq!(sync_trip_shape(&mut surface, Some(&shape)), SyncOutcome::Drawn);
        let features = surface.source_features("focused-trip-shape");
        assert_eq!(features.len(), 1);
        assert_eq!(
            features[0].geometry.as_ref().unwrap().value,
            GeometryValue::LineString(vec![vec![-74.0, 40.7], vec![-73.9, 40.8]])
        );

        sync_trip_shape(&mut surface, None);
        assert!(surface.source_features("focused-trip-shape").is_empty());
    }

    #[test]
    fn test_vehicle_position_replaced_then_cleared() {
        let mut surface = ready_surface();
        let mut position = FocusedVehiclePosition::new(Point::new(13.4, 52.5));
        position.properties.insert("delay".into(), serde_json::json!(95));

        assert_eq!(sync_vehicle_position(&mut surface, Some(&position)), SyncOutcome::Drawn);
        let features = surface.source_features("focused-vehicle-position");
        assert_eq!(features[0].property("delay"), Some(&serde_json::json!(95)));

        assert_eq!(sync_vehicle_position(&mut surface, None), SyncOutcome::Cleared);
        assert!(surface.source_features("focused-vehicle-position").is_empty());
    }

    #[test]
    fn test_rejected_write_is_failed() {
        let mut surface = ready_surface();
        surface.freeze_source("focused-vehicle-position");

        assert_eq!(sync_vehicle_position(&mut surface, None), SyncOutcome::Failed);
        assert_eq!(sync_trip_shape(&mut surface, None), SyncOutcome::Cleared);
    }

    #[test]
    fn test_not_ready_is_a_no_op() {
        let mut surface = HeadlessSurface::new(SurfaceOptions {
            style: "test".into(),
            center: Coord { x: 0.0, y: 0.0 },
            zoom: 1.0,
        });
        assert_eq!(sync_trip_shape(&mut surface, None), SyncOutcome::NotReady);
        assert_eq!(
            sync_vehicle_position(&mut surface, Some(&FocusedVehiclePosition::new(Point::new(0.0, 0.0)))),
            SyncOutcome::NotReady
        );
        assert!(surface.source("focused-trip-shape").is_none());
    }
}
