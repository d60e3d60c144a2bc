//! Typed paint properties.
//!
//! The render surface evaluates these itself from their expression form; the
//! `evaluate` methods reproduce the same curves so the styling can be checked
//! without a surface.

use palette::{Mix, Srgb};
use serde_json::{Value, json};

pub type Color = Srgb<u8>;

pub const ON_TIME: Color = Srgb::new(0x2e, 0xcc, 0x71);
pub const LATE: Color = Srgb::new(0xee, 0xbb, 0x00);
pub const VERY_LATE: Color = Srgb::new(0xee, 0x22, 0x00);
pub const DELAY_UNKNOWN: Color = Srgb::new(0xe0, 0xe0, 0xe0);
pub const TRIP_SHAPE: Color = Srgb::new(0x44, 0xa8, 0xeb);

pub fn hex(color: Color) -> String {
    format!("#{color:x}")
}

/// A zoom-dependent number: `(zoom, value)` stops with an interpolation base.
///
/// A base of 1 interpolates linearly. Larger bases bias the curve towards the
/// upper stop, matching the surface's exponential zoom functions. Input
/// outside the stop range clamps to the nearest stop.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoomStops {
    pub base: f64,
    pub stops: Vec<(f64, f64)>,
}

impl ZoomStops {
    pub fn linear(stops: impl Into<Vec<(f64, f64)>>) -> Self {
        Self::exponential(1.0, stops)
    }

    pub fn exponential(base: f64, stops: impl Into<Vec<(f64, f64)>>) -> Self {
        Self {
            base,
            stops: stops.into(),
        }
    }

    pub fn evaluate(&self, zoom: f64) -> f64 {
        let (Some(&(first_zoom, first)), Some(&(last_zoom, last))) =
            (self.stops.first(), self.stops.last())
        else {
            return 0.0;
        };
        if zoom <= first_zoom {
            return first;
        }
        if zoom >= last_zoom {
            return last;
        }

        self.stops
            .windows(2)
            .find(|pair| zoom < pair[1].0)
            .map(|pair| {
                let (lower, from) = pair[0];
                let (upper, to) = pair[1];
                let t = interpolation_factor(self.base, zoom, lower, upper);
                from + (to - from) * t
            })
            .unwrap_or(last)
    }

    pub fn to_expression(&self) -> Value {
        let stops: Vec<Value> = self.stops.iter().map(|(z, v)| json!([z, v])).collect();
        json!({ "base": self.base, "stops": stops })
    }
}

fn interpolation_factor(base: f64, input: f64, lower: f64, upper: f64) -> f64 {
    let difference = upper - lower;
    let progress = input - lower;
    if difference == 0.0 {
        0.0
    } else if base == 1.0 {
        progress / difference
    } else {
        (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
    }
}

/// A data-driven color: linear interpolation over `(threshold, color)` stops
/// of one numeric feature property, with a fixed color when the property is
/// absent.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorRamp {
    pub property: String,
    pub stops: Vec<(f64, Color)>,
    pub fallback: Color,
}

impl ColorRamp {
    /// Lateness coloring keyed on the `delay` property (seconds).
    pub fn delay() -> Self {
        Self {
            property: "delay".to_owned(),
            stops: vec![(0.0, ON_TIME), (90.0, LATE), (210.0, VERY_LATE)],
            fallback: DELAY_UNKNOWN,
        }
    }

    pub fn evaluate(&self, value: Option<f64>) -> Color {
        let Some(value) = value.filter(|v| !v.is_nan()) else {
            return self.fallback;
        };
        let (Some(&(first_at, first)), Some(&(last_at, last))) =
            (self.stops.first(), self.stops.last())
        else {
            return self.fallback;
        };
        if value <= first_at {
            return first;
        }
        if value >= last_at {
            return last;
        }

        self.stops
            .windows(2)
            .find(|pair| value < pair[1].0)
            .map(|pair| {
                let (lower, from) = pair[0];
                let (upper, to) = pair[1];
                let t = interpolation_factor(1.0, value, lower, upper) as f32;
                from.into_format::<f32>()
                    .mix(to.into_format::<f32>(), t)
                    .into_format::<u8>()
            })
            .unwrap_or(last)
    }

    pub fn to_expression(&self) -> Value {
        let mut interpolate = vec![json!("interpolate"), json!(["linear"]), json!(["get", self.property])];
        for (threshold, color) in &self.stops {
            interpolate.push(json!(threshold));
            interpolate.push(json!(["to-color", hex(*color)]));
        }

        json!([
            "case",
            ["!=", ["get", self.property], null],
            interpolate,
            hex(self.fallback),
        ])
    }
}
