//! Render surface ownership and the one-time registration of sources,
//! layers and images.

pub mod source;

use crate::config::MapConfig;
use crate::render::{
    LayerSpec, TRIP_SHAPE_ARROW_IMAGE, focused_trip_shape_arrows_layer, focused_trip_shape_layer,
    focused_vehicle_position_layer, vehicle_positions_layer,
};
use crate::state::view::map::source::{MapSource, empty_collection};
use crate::surface::{IconImage, RenderSurface, SurfaceError};

/// Progress of the optional trip-shape arrow decoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrowDecoration {
    #[default]
    NotRequested,
    Loading,
    Registered,
    Failed,
}

/// A live render surface plus what has been registered on it.
#[derive(Debug)]
pub struct MapState<S: RenderSurface> {
    surface: S,
    ready: bool,
    arrows: ArrowDecoration,
}

impl<S: RenderSurface> MapState<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            ready: false,
            arrows: ArrowDecoration::NotRequested,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn arrows(&self) -> ArrowDecoration {
        self.arrows
    }

    /// Register everything the view draws with. Runs once, when the surface
    /// reports its style loaded; later calls do nothing.
    ///
    /// A failing registration is logged and skipped so the remaining layers
    /// still come up.
    pub fn register(&mut self, config: &MapConfig) {
        if self.ready {
            return;
        }

        self.add_source_with_layer(MapSource::VehiclePositions, &vehicle_positions_layer());
        self.add_source_with_layer(MapSource::FocusedTripShape, &focused_trip_shape_layer());

        // The arrow layer follows once the icon arrives; see `image_loaded`.
        self.surface.load_image(TRIP_SHAPE_ARROW_IMAGE, &config.arrow_icon_url);
        self.arrows = ArrowDecoration::Loading;

        self.add_source_with_layer(
            MapSource::FocusedVehiclePosition,
            &focused_vehicle_position_layer(),
        );

        self.ready = true;
        tracing::debug!("map sources and layers registered");
    }

    /// Completion of the arrow icon load. Failures only cost the decoration.
    pub fn image_loaded(
        &mut self,
        name: &str,
        result: Result<IconImage, SurfaceError>,
        config: &MapConfig,
    ) {
        if name != TRIP_SHAPE_ARROW_IMAGE || self.arrows != ArrowDecoration::Loading {
            tracing::debug!(name, "ignoring unexpected image load");
            return;
        }

        let registered = result
            .and_then(|image| self.surface.add_image(TRIP_SHAPE_ARROW_IMAGE, image))
            .and_then(|()| {
                self.surface
                    .add_layer(&focused_trip_shape_arrows_layer(config.arrow_icon_size))
            });

        self.arrows = match registered {
            Ok(()) => ArrowDecoration::Registered,
            Err(e) => {
                tracing::error!(error = %e, "failed to load trip shape arrow");
                ArrowDecoration::Failed
            }
        };
    }

    /// Release the surface. Safe to call more than once.
    pub fn release(&mut self) {
        if self.ready || self.arrows != ArrowDecoration::NotRequested {
            tracing::debug!("releasing render surface");
        }
        self.surface.remove();
        self.ready = false;
        self.arrows = ArrowDecoration::NotRequested;
    }

    fn add_source_with_layer(&mut self, source: MapSource, layer: &LayerSpec) {
        let registered = self
            .surface
            .add_source(source.id(), empty_collection())
            .and_then(|()| self.surface.add_layer(layer));
        if let Err(e) = registered {
            tracing::warn!(source = source.id(), layer = layer.id, error = %e, "failed to register layer");
        }
    }
}
