use geojson::{FeatureCollection, GeoJson};

/// GeoJSON sources owned by the map view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapSource {
    VehiclePositions,
    FocusedTripShape,
    FocusedVehiclePosition,
}

impl MapSource {
    pub const ALL: [MapSource; 3] = [
        MapSource::VehiclePositions,
        MapSource::FocusedTripShape,
        MapSource::FocusedVehiclePosition,
    ];

    pub fn id(self) -> &'static str {
        match self {
            MapSource::VehiclePositions => "vehicle-positions",
            MapSource::FocusedTripShape => "focused-trip-shape",
            MapSource::FocusedVehiclePosition => "focused-vehicle-position",
        }
    }
}

/// An empty collection, used both as initial source data and to clear a source.
pub fn empty_collection() -> GeoJson {
    GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features: Vec::new(),
        foreign_members: None,
    })
}
