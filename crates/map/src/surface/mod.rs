//! The render surface seam.
//!
//! A render surface is the external map engine: it owns sources, layers,
//! images, the camera, popups and pointer hit-testing. The map view only ever
//! talks to it through [`RenderSurface`], from the host's event loop.

use geo::Coord;
use geojson::{Feature, GeoJson};

use crate::interaction::popup::PopupContent;
use crate::layers::viewport::ViewportRequest;
use crate::render::LayerSpec;

pub mod headless;

pub use headless::{HeadlessFactory, HeadlessSurface};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SurfaceError {
    #[error("source not found: {0}")]
    UnknownSource(String),

    #[error("source already exists: {0}")]
    DuplicateSource(String),

    #[error("layer already exists: {0}")]
    DuplicateLayer(String),

    #[error("layer {layer} references missing source {source_id}")]
    MissingLayerSource { layer: String, source_id: String },

    #[error("failed to load image {url}: {reason}")]
    ImageLoad { url: String, reason: String },

    #[error("render surface has been removed")]
    Removed,

    #[error("{0}")]
    Backend(String),
}

/// Construction parameters for a new surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceOptions {
    pub style: String,
    /// Initial camera center, (lon, lat).
    pub center: Coord,
    pub zoom: f64,
}

/// Decoded RGBA icon pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    #[default]
    Default,
    Pointer,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "",
            Cursor::Pointer => "pointer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopupId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEvent {
    Enter,
    Leave,
    Click,
}

/// A pointer event class the surface should deliver, either for one layer
/// or, with `layer: None`, anywhere on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub event: PointerEvent,
    pub layer: Option<&'static str>,
}

/// Everything the surface reports back to the map view.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The style finished loading; sources and layers may now be added.
    Load,
    /// Completion of an earlier [`RenderSurface::load_image`] call.
    ImageLoaded {
        name: String,
        result: Result<IconImage, SurfaceError>,
    },
    PointerEnter {
        layer: String,
    },
    PointerLeave {
        layer: String,
    },
    /// A click anywhere on the map, at (lon, lat).
    Click {
        lng_lat: Coord,
    },
}

pub trait RenderSurface {
    fn add_source(&mut self, id: &str, data: GeoJson) -> Result<(), SurfaceError>;
    fn has_source(&self, id: &str) -> bool;
    fn set_source_data(&mut self, id: &str, data: GeoJson) -> Result<(), SurfaceError>;

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), SurfaceError>;
    fn has_layer(&self, id: &str) -> bool;

    /// Start an asynchronous image load. The outcome arrives later as
    /// [`SurfaceEvent::ImageLoaded`] carrying the same `name`.
    fn load_image(&mut self, name: &str, url: &str);
    fn add_image(&mut self, name: &str, image: IconImage) -> Result<(), SurfaceError>;

    /// Animate the camera to frame the requested bounds.
    fn fit_bounds(&mut self, request: &ViewportRequest);

    /// Rendered features of `layers` under `at`, top-most first.
    fn query_rendered_features(&self, at: Coord, layers: &[&str]) -> Vec<Feature>;

    fn subscribe(&mut self, subscription: Subscription);
    fn set_cursor(&mut self, cursor: Cursor);

    fn add_popup(&mut self, at: Coord, content: &PopupContent) -> Result<PopupId, SurfaceError>;
    fn remove_popup(&mut self, popup: PopupId);

    /// Release the surface and everything registered on it, subscriptions
    /// included. Further calls fail or do nothing.
    fn remove(&mut self);
}

/// Creates surfaces bound to a host container.
pub trait SurfaceFactory {
    type Container: ?Sized;
    type Surface: RenderSurface;

    fn create(
        &mut self,
        container: &Self::Container,
        options: &SurfaceOptions,
    ) -> Result<Self::Surface, SurfaceError>;
}
