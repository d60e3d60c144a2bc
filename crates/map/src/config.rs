use chrono::Locale;
use geo::Coord;
use serde::Deserialize;

use crate::interaction::popup::StartFormat;
use crate::layers::viewport::DEFAULT_FIT_PADDING;
use crate::surface::SurfaceOptions;

pub const DEFAULT_STYLE: &str = "mapbox://styles/mapbox/dark-v10";
pub const DEFAULT_ARROW_ICON_URL: &str = "assets/arrow.png";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Base style the surface is created with.
    pub style: String,
    /// Initial camera center as `[lon, lat]`.
    pub center: [f64; 2],
    pub zoom: f64,
    /// Pixels kept free around the vehicles when framing them.
    pub fit_padding: f64,
    pub arrow_icon_url: String,
    pub arrow_icon_size: f64,
    /// POSIX locale name used for popup timestamps, e.g. `de_DE`.
    pub locale: String,
    /// Empty the vehicle layer when a snapshot has no positioned vehicles
    /// instead of keeping the last ones on screen.
    pub clear_on_empty_snapshot: bool,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            style: DEFAULT_STYLE.to_owned(),
            center: [-74.5, 40.0],
            zoom: 9.0,
            fit_padding: DEFAULT_FIT_PADDING,
            arrow_icon_url: DEFAULT_ARROW_ICON_URL.to_owned(),
            arrow_icon_size: 0.15,
            locale: "en_US".to_owned(),
            clear_on_empty_snapshot: false,
        }
    }
}

impl MapConfig {
    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            style: self.style.clone(),
            center: Coord {
                x: self.center[0],
                y: self.center[1],
            },
            zoom: self.zoom,
        }
    }

    pub fn locale(&self) -> Locale {
        Locale::try_from(self.locale.as_str()).unwrap_or_else(|_| {
            tracing::warn!(locale = %self.locale, "unknown locale, using en_US");
            Locale::en_US
        })
    }

    pub fn start_format(&self) -> StartFormat {
        StartFormat {
            locale: self.locale(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: MapConfig = serde_json::from_str(r#"{ "zoom": 12, "locale": "de_DE" }"#).unwrap();
        assert_eq!(config.zoom, 12.0);
        assert_eq!(config.style, DEFAULT_STYLE);
        assert_eq!(config.fit_padding, 50.0);
        assert!(!config.clear_on_empty_snapshot);
    }

    #[test]
    fn test_surface_options() {
        let options = MapConfig::default().surface_options();
        assert_eq!(options.center, Coord { x: -74.5, y: 40.0 });
        assert_eq!(options.zoom, 9.0);
        assert_eq!(options.style, "mapbox://styles/mapbox/dark-v10");
    }

    #[test]
    fn test_unknown_locale_falls_back() {
        let config = MapConfig {
            locale: "xx_NOPE".into(),
            ..Default::default()
        };
        assert!(matches!(config.locale(), Locale::en_US));
    }
}
