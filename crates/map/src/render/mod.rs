//! Layer definitions registered on the render surface.

use serde_json::{Value, json};

use crate::render::style::{ColorRamp, Color, TRIP_SHAPE, ZoomStops, hex};
use crate::state::view::map::source::MapSource;

pub mod style;

pub const VEHICLE_POSITIONS_LAYER: &str = "vehicle-positions";
pub const FOCUSED_TRIP_SHAPE_LAYER: &str = "focused-trip-shape";
pub const FOCUSED_TRIP_SHAPE_ARROWS_LAYER: &str = "focused-trip-shape-arrows";
pub const FOCUSED_VEHICLE_POSITION_LAYER: &str = "focused-vehicle-position";

/// Image name the arrow icon is registered under.
pub const TRIP_SHAPE_ARROW_IMAGE: &str = "focused-trip-shape-arrow";

#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    Circle {
        radius: ZoomStops,
        color: ColorRamp,
    },
    Line {
        width: ZoomStops,
        color: Color,
        opacity: ZoomStops,
    },
    Symbol {
        icon_opacity: ZoomStops,
    },
}

/// Icons repeated along the source's line geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolLayout {
    pub icon_image: String,
    pub icon_size: f64,
    pub icon_ignore_placement: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LayerSpec {
    pub id: &'static str,
    pub source: MapSource,
    pub paint: Paint,
    pub layout: Option<SymbolLayout>,
}

impl LayerSpec {
    pub fn kind(&self) -> &'static str {
        match self.paint {
            Paint::Circle { .. } => "circle",
            Paint::Line { .. } => "line",
            Paint::Symbol { .. } => "symbol",
        }
    }

    /// The surface's JSON layer definition.
    pub fn to_json(&self) -> Value {
        let paint = match &self.paint {
            Paint::Circle { radius, color } => json!({
                "circle-radius": radius.to_expression(),
                "circle-color": color.to_expression(),
            }),
            Paint::Line {
                width,
                color,
                opacity,
            } => json!({
                "line-width": width.to_expression(),
                "line-color": hex(*color),
                "line-opacity": opacity.to_expression(),
            }),
            Paint::Symbol { icon_opacity } => json!({
                "icon-opacity": icon_opacity.to_expression(),
            }),
        };

        let mut layer = json!({
            "id": self.id,
            "type": self.kind(),
            "source": self.source.id(),
            "paint": paint,
        });
        if let Some(layout) = &self.layout {
            layer["layout"] = json!({
                "symbol-placement": "line",
                "icon-image": layout.icon_image,
                "icon-size": layout.icon_size,
                "icon-ignore-placement": layout.icon_ignore_placement,
            });
        }
        layer
    }
}

fn trip_shape_opacity() -> ZoomStops {
    ZoomStops::linear([(9.0, 0.3), (15.0, 0.8)])
}

pub fn vehicle_positions_layer() -> LayerSpec {
    LayerSpec {
        id: VEHICLE_POSITIONS_LAYER,
        source: MapSource::VehiclePositions,
        paint: Paint::Circle {
            radius: ZoomStops::linear([(1.0, 1.5), (20.0, 35.0)]),
            color: ColorRamp::delay(),
        },
        layout: None,
    }
}

pub fn focused_trip_shape_layer() -> LayerSpec {
    LayerSpec {
        id: FOCUSED_TRIP_SHAPE_LAYER,
        source: MapSource::FocusedTripShape,
        paint: Paint::Line {
            width: ZoomStops::linear([(1.0, 0.6), (20.0, 4.0)]),
            color: TRIP_SHAPE,
            opacity: trip_shape_opacity(),
        },
        layout: None,
    }
}

pub fn focused_trip_shape_arrows_layer(icon_size: f64) -> LayerSpec {
    LayerSpec {
        id: FOCUSED_TRIP_SHAPE_ARROWS_LAYER,
        source: MapSource::FocusedTripShape,
        paint: Paint::Symbol {
            icon_opacity: trip_shape_opacity(),
        },
        layout: Some(SymbolLayout {
            icon_image: TRIP_SHAPE_ARROW_IMAGE.to_owned(),
            icon_size,
            icon_ignore_placement: true,
        }),
    }
}

pub fn focused_vehicle_position_layer() -> LayerSpec {
    LayerSpec {
        id: FOCUSED_VEHICLE_POSITION_LAYER,
        source: MapSource::FocusedVehiclePosition,
        paint: Paint::Circle {
            radius: ZoomStops::linear([(1.0, 5.0), (20.0, 100.0)]),
            color: ColorRamp::delay(),
        },
        layout: None,
    }
}
