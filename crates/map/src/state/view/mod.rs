use std::fmt;
use std::sync::Arc;

use inspector_transit::FeedSnapshot;

use crate::config::MapConfig;
use crate::interaction::{FocusListener, InteractionController};
use crate::layers::focus::{self, FocusedTripShape, FocusedVehiclePosition};
use crate::layers::vehicles::FeedSnapshotDiffer;
use crate::layers::viewport::ViewportFitter;
use crate::render::VEHICLE_POSITIONS_LAYER;
use crate::state::view::map::MapState;
use crate::surface::{RenderSurface, SurfaceError, SurfaceEvent, SurfaceFactory};

pub mod map;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("failed to create render surface: {0}")]
    Surface(#[from] SurfaceError),

    #[error("map view is already initialized")]
    AlreadyInitialized,
}

/// The host's view of the world at one revision. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub feed: Option<Arc<FeedSnapshot>>,
    pub focused_trip_shape: Option<Arc<FocusedTripShape>>,
    pub focused_vehicle_position: Option<Arc<FocusedVehiclePosition>>,
}

/// One-shot callback run once the surface is ready and the first
/// reconciliation pass has been applied.
struct ReadyHook(Box<dyn FnOnce()>);

impl fmt::Debug for ReadyHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ReadyHook")
    }
}

/// Keeps a render surface in step with the host's [`AppState`].
///
/// The host calls [`MapView::update`] for every state revision and forwards
/// surface callbacks to [`MapView::handle_event`]; both must run on the same
/// event loop. Until the surface reports [`SurfaceEvent::Load`] updates are
/// only remembered, and the latest one is applied as soon as it does.
#[derive(Debug)]
pub struct MapView<S: RenderSurface> {
    config: MapConfig,
    differ: FeedSnapshotDiffer,
    interaction: InteractionController,
    map: Option<MapState<S>>,
    latest: Option<AppState>,
    ready_hook: Option<ReadyHook>,
}

impl<S: RenderSurface> MapView<S> {
    pub fn new(config: MapConfig) -> Self {
        Self {
            differ: FeedSnapshotDiffer::new(
                ViewportFitter::new(config.fit_padding),
                config.clear_on_empty_snapshot,
            ),
            interaction: InteractionController::new(config.start_format()),
            config,
            map: None,
            latest: None,
            ready_hook: None,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    /// Create the surface inside `container` with the configured camera and
    /// style. Sources and layers follow on [`SurfaceEvent::Load`].
    pub fn initialize<F>(&mut self, factory: &mut F, container: &F::Container) -> Result<(), MapError>
    where
        F: SurfaceFactory<Surface = S>,
    {
        if self.map.is_some() {
            return Err(MapError::AlreadyInitialized);
        }
        let surface = factory.create(container, &self.config.surface_options())?;
        self.map = Some(MapState::new(surface));
        tracing::debug!(style = %self.config.style, "render surface created");
        Ok(())
    }

    /// Run `hook` once the surface is ready and the latest pending update has
    /// been drawn. Runs immediately if that already happened. Replaces any
    /// hook not yet run.
    pub fn on_ready(&mut self, hook: impl FnOnce() + 'static) {
        if self.is_ready() {
            hook();
        } else {
            self.ready_hook = Some(ReadyHook(Box::new(hook)));
        }
    }

    pub fn is_ready(&self) -> bool {
        self.map.as_ref().is_some_and(MapState::is_ready)
    }

    pub fn map(&self) -> Option<&MapState<S>> {
        self.map.as_ref()
    }

    pub fn surface(&self) -> Option<&S> {
        self.map.as_ref().map(MapState::surface)
    }

    /// Backends pump their own callbacks through this.
    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.map.as_mut().map(MapState::surface_mut)
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    /// Reconcile the surface with `state`: vehicles, then the focused trip
    /// shape, then the focused vehicle.
    pub fn update(&mut self, state: &AppState) {
        self.latest = Some(state.clone());
        self.reconcile();
    }

    pub fn handle_event<L: FocusListener + ?Sized>(&mut self, event: SurfaceEvent, listener: &mut L) {
        let Some(map) = self.map.as_mut() else {
            tracing::trace!(?event, "surface event without a surface");
            return;
        };

        match event {
            SurfaceEvent::Load => {
                if map.is_ready() {
                    return;
                }
                map.register(&self.config);
                for subscription in InteractionController::subscriptions() {
                    map.surface_mut().subscribe(subscription);
                }
                self.reconcile();
                if let Some(ReadyHook(hook)) = self.ready_hook.take() {
                    hook();
                }
            }
            SurfaceEvent::ImageLoaded { name, result } => map.image_loaded(&name, result, &self.config),
            _ if !map.is_ready() => {}
            SurfaceEvent::PointerEnter { layer } if layer == VEHICLE_POSITIONS_LAYER => {
                self.interaction.pointer_enter(map.surface_mut());
            }
            SurfaceEvent::PointerLeave { layer } if layer == VEHICLE_POSITIONS_LAYER => {
                self.interaction.pointer_leave(map.surface_mut());
            }
            SurfaceEvent::Click { lng_lat } => {
                self.interaction.click(map.surface_mut(), lng_lat, listener);
            }
            SurfaceEvent::PointerEnter { .. } | SurfaceEvent::PointerLeave { .. } => {}
        }
    }

    /// Close the popup and release the surface. Safe to call repeatedly, and
    /// before [`MapView::initialize`].
    pub fn teardown(&mut self) {
        self.ready_hook = None;
        if let Some(mut map) = self.map.take() {
            self.interaction.dismiss(map.surface_mut());
            map.release();
        }
    }

    fn reconcile(&mut self) {
        let (Some(map), Some(state)) = (self.map.as_mut(), self.latest.as_ref()) else {
            return;
        };
        if !map.is_ready() {
            tracing::trace!("surface not ready, deferring update");
            return;
        }

        let surface = map.surface_mut();
        if let Some(feed) = &state.feed {
            self.differ.apply(surface, feed);
        }
        focus::sync_trip_shape(surface, state.focused_trip_shape.as_deref());
        focus::sync_vehicle_position(surface, state.focused_vehicle_position.as_deref());
    }
}

impl<S: RenderSurface> Drop for MapView<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::{FocusEvent, PopupState};
    use crate::render::{FOCUSED_TRIP_SHAPE_ARROWS_LAYER, TRIP_SHAPE_ARROW_IMAGE};
    use crate::state::view::map::ArrowDecoration;
    use crate::surface::{Cursor, HeadlessFactory, HeadlessSurface, IconImage, PointerEvent};
    use geo::{Coord, LineString, Point};
    use geojson::Value as GeometryValue;
    use inspector_transit::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn vehicle(id: &str, trip: &str, lon: f64, lat: f64, delay: Option<i32>) -> FeedEntity {
        FeedEntity::vehicle(VehicleEntity {
            vehicle: Some(VehicleDescriptor {
                id: Some(VehicleIdentifier::new(id)),
                ..Default::default()
            }),
            position: Some(Position::new(lat, lon)),
            trip: Some(TripDescriptor {
                trip_id: Some(TripIdentifier::new(trip)),
                ..Default::default()
            }),
            delay,
        })
    }

    fn state(entities: Vec<FeedEntity>) -> AppState {
        AppState {
            feed: Some(Arc::new(FeedSnapshot::new(entities))),
            ..Default::default()
        }
    }

    fn view() -> MapView<HeadlessSurface> {
        let mut view = MapView::new(MapConfig::default());
        view.initialize(&mut HeadlessFactory::default(), "map").unwrap();
        view
    }

    fn ready_view() -> MapView<HeadlessSurface> {
        let mut view = view();
        view.handle_event(SurfaceEvent::Load, &mut Vec::new());
        view
    }

    fn icon() -> IconImage {
        IconImage {
            width: 1,
            height: 1,
            rgba: vec![255; 4],
        }
    }

    fn vehicle_coords(view: &MapView<HeadlessSurface>) -> Vec<Vec<f64>> {
        view.surface()
            .unwrap()
            .source_features("vehicle-positions")
            .iter()
            .filter_map(|f| match &f.geometry.as_ref()?.value {
                GeometryValue::Point(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_surface_created_with_configured_camera() {
        let config = MapConfig {
            style: "mapbox://styles/mapbox/light-v10".into(),
            center: [13.4, 52.5],
            zoom: 11.0,
            ..Default::default()
        };
        let mut view = MapView::new(config.clone());
        view.initialize(&mut HeadlessFactory::default(), "map").unwrap();

        assert_eq!(view.surface().unwrap().options(), &config.surface_options());
        assert_eq!(view.config(), &config);
    }

    #[test]
    fn test_on_ready_runs_once_after_first_pass() {
        let calls = Rc::new(Cell::new(0));
        let mut view = view();
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, None)]));

        let seen = Rc::clone(&calls);
        view.on_ready(move || seen.set(seen.get() + 1));
        assert_eq!(calls.get(), 0);

        view.handle_event(SurfaceEvent::Load, &mut Vec::new());
        assert_eq!(calls.get(), 1);
        assert_eq!(vehicle_coords(&view), [vec![-74.0, 40.7]]);

        view.handle_event(SurfaceEvent::Load, &mut Vec::new());
        assert_eq!(calls.get(), 1);

        let seen = Rc::clone(&calls);
        view.on_ready(move || seen.set(seen.get() + 10));
        assert_eq!(calls.get(), 11);
    }

    #[test]
    fn test_on_ready_dropped_on_teardown() {
        let calls = Rc::new(Cell::new(0));
        let mut view = view();
        let seen = Rc::clone(&calls);
        view.on_ready(move || seen.set(seen.get() + 1));

        view.teardown();
        view.handle_event(SurfaceEvent::Load, &mut Vec::new());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_initialize_twice_fails() {
        let mut view = view();
        let result = view.initialize(&mut HeadlessFactory::default(), "map");
        assert!(matches!(result, Err(MapError::AlreadyInitialized)));
    }

    #[test]
    fn test_initialize_empty_container_fails() {
        let mut view: MapView<HeadlessSurface> = MapView::new(MapConfig::default());
        let result = view.initialize(&mut HeadlessFactory::default(), "");
        assert!(matches!(result, Err(MapError::Surface(_))));
        assert!(view.surface().is_none());
    }

    #[test]
    fn test_load_registers_layers_and_subscriptions() {
        let view = ready_view();
        let surface = view.surface().unwrap();

        let ids: Vec<&str> = surface.layers().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(
            ids,
            ["vehicle-positions", "focused-trip-shape", "focused-vehicle-position"]
        );
        assert_eq!(surface.subscriptions(), InteractionController::subscriptions());
        assert!(surface.delivers(PointerEvent::Click, None));
        assert!(surface.delivers(PointerEvent::Enter, Some("vehicle-positions")));
        assert!(!surface.delivers(PointerEvent::Enter, Some("focused-trip-shape")));
        assert!(!surface.delivers(PointerEvent::Enter, None));
        assert_eq!(surface.pending_image_loads().len(), 1);
        assert!(view.is_ready());
    }

    #[test]
    fn test_update_before_load_is_replayed() {
        let mut view = view();
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, Some(30))]));
        assert!(view.surface().unwrap().source("vehicle-positions").is_none());

        view.handle_event(SurfaceEvent::Load, &mut Vec::new());

        assert_eq!(vehicle_coords(&view), [vec![-74.0, 40.7]]);
        assert_eq!(view.surface().unwrap().camera_requests().len(), 1);
    }

    #[test]
    fn test_only_latest_pending_update_is_applied() {
        let mut view = view();
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, None)]));
        view.update(&state(vec![vehicle("V2", "T2", -73.9, 40.8, None)]));
        view.handle_event(SurfaceEvent::Load, &mut Vec::new());

        assert_eq!(vehicle_coords(&view), [vec![-73.9, 40.8]]);
        assert_eq!(view.surface().unwrap().camera_requests().len(), 1);
    }

    #[test]
    fn test_coordinates_follow_feed() {
        let mut view = ready_view();
        view.update(&state(vec![
            vehicle("V1", "T1", -74.0, 40.7, Some(30)),
            vehicle("V2", "T2", -73.5, 41.0, None),
        ]));

        assert_eq!(vehicle_coords(&view), [vec![-74.0, 40.7], vec![-73.5, 41.0]]);
        let request = &view.surface().unwrap().camera_requests()[0];
        assert_eq!(request.to_bbox(), [-74.0, 40.7, -73.5, 41.0]);
    }

    #[test]
    fn test_empty_snapshot_keeps_previous_vehicles() {
        let mut view = ready_view();
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, None)]));
        view.update(&state(vec![]));

        assert_eq!(vehicle_coords(&view), [vec![-74.0, 40.7]]);
        assert_eq!(view.surface().unwrap().camera_requests().len(), 1);
    }

    #[test]
    fn test_empty_snapshot_clears_when_configured() {
        let mut view = MapView::new(MapConfig {
            clear_on_empty_snapshot: true,
            ..Default::default()
        });
        view.initialize(&mut HeadlessFactory::default(), "map").unwrap();
        view.handle_event(SurfaceEvent::Load, &mut Vec::new());
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, None)]));
        view.update(&state(vec![]));

        assert!(vehicle_coords(&view).is_empty());
    }

    #[test]
    fn test_focus_overlays_follow_state() {
        let mut view = ready_view();
        let mut focused = AppState {
            focused_trip_shape: Some(Arc::new(FocusedTripShape::new(LineString::from(vec![
                (-74.0, 40.7),
                (-73.9, 40.8),
            ])))),
            focused_vehicle_position: Some(Arc::new(FocusedVehiclePosition::new(Point::new(
                -74.0, 40.7,
            )))),
            ..Default::default()
        };
        view.update(&focused);

        let surface = view.surface().unwrap();
        assert_eq!(surface.source_features("focused-trip-shape").len(), 1);
        assert_eq!(surface.source_features("focused-vehicle-position").len(), 1);

        focused.focused_trip_shape = None;
        view.update(&focused);

        let surface = view.surface().unwrap();
        assert!(surface.source_features("focused-trip-shape").is_empty());
        assert_eq!(surface.source_features("focused-vehicle-position").len(), 1);
    }

    #[test]
    fn test_late_icon_still_adds_arrow_layer() {
        let mut view = ready_view();
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, None)]));

        let event = view.surface_mut().unwrap().complete_image_load(Ok(icon())).unwrap();
        view.handle_event(event, &mut Vec::new());

        let surface = view.surface().unwrap();
        assert!(surface.has_image(TRIP_SHAPE_ARROW_IMAGE));
        assert!(surface.layer(FOCUSED_TRIP_SHAPE_ARROWS_LAYER).is_some());
        assert_eq!(view.map().unwrap().arrows(), ArrowDecoration::Registered);
    }

    #[test]
    fn test_failed_icon_leaves_other_layers() {
        let mut view = ready_view();
        let event = view
            .surface_mut()
            .unwrap()
            .complete_image_load(Err("404".into()))
            .unwrap();
        view.handle_event(event, &mut Vec::new());

        let surface = view.surface().unwrap();
        assert!(surface.layer(FOCUSED_TRIP_SHAPE_ARROWS_LAYER).is_none());
        assert_eq!(surface.layers().len(), 3);
        assert_eq!(view.map().unwrap().arrows(), ArrowDecoration::Failed);
    }

    #[test]
    fn test_click_on_vehicle_focuses_and_opens_popup() {
        let mut view = ready_view();
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, Some(30))]));

        let mut events = Vec::new();
        view.handle_event(
            SurfaceEvent::Click {
                lng_lat: Coord { x: -74.0, y: 40.7 },
            },
            &mut events,
        );

        assert_eq!(
            events,
            [
                FocusEvent::Vehicle(Some(VehicleIdentifier::new("V1"))),
                FocusEvent::Trip(Some(TripIdentifier::new("T1"))),
            ]
        );
        assert_eq!(view.surface().unwrap().popup_count(), 1);
        assert!(matches!(
            view.interaction().popup_state(),
            PopupState::AwaitingDismiss { .. }
        ));
    }

    #[test]
    fn test_second_click_replaces_popup() {
        let mut view = ready_view();
        view.update(&state(vec![
            vehicle("V1", "T1", -74.0, 40.7, None),
            vehicle("V2", "T2", -73.5, 41.0, None),
        ]));

        let mut events = Vec::new();
        for (x, y) in [(-74.0, 40.7), (-73.5, 41.0)] {
            view.handle_event(
                SurfaceEvent::Click {
                    lng_lat: Coord { x, y },
                },
                &mut events,
            );
        }

        let surface = view.surface().unwrap();
        assert_eq!(surface.popup_count(), 1);
        let (_, popup) = surface.popups().next().unwrap();
        assert_eq!(popup.at, Coord { x: -73.5, y: 41.0 });
        assert_eq!(events.len(), 4);
        assert_eq!(events[2].id(), Some("V2"));
    }

    #[test]
    fn test_click_on_empty_space_clears_focus() {
        let mut view = ready_view();
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, None)]));

        let mut events = Vec::new();
        view.handle_event(
            SurfaceEvent::Click {
                lng_lat: Coord { x: -74.0, y: 40.7 },
            },
            &mut events,
        );
        view.handle_event(
            SurfaceEvent::Click {
                lng_lat: Coord { x: 10.0, y: 10.0 },
            },
            &mut events,
        );

        assert_eq!(events[2..], [FocusEvent::Vehicle(None), FocusEvent::Trip(None)]);
        assert_eq!(view.surface().unwrap().popup_count(), 0);
        assert_eq!(view.interaction().popup_state(), PopupState::Absent);
    }

    #[test]
    fn test_click_before_load_is_ignored() {
        let mut view = view();
        let mut events = Vec::new();
        view.handle_event(
            SurfaceEvent::Click {
                lng_lat: Coord { x: 0.0, y: 0.0 },
            },
            &mut events,
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_pointer_over_vehicles_sets_cursor() {
        let mut view = ready_view();
        let mut events = Vec::new();

        view.handle_event(
            SurfaceEvent::PointerEnter {
                layer: "vehicle-positions".into(),
            },
            &mut events,
        );
        assert_eq!(view.surface().unwrap().cursor(), Cursor::Pointer);

        view.handle_event(
            SurfaceEvent::PointerEnter {
                layer: "focused-trip-shape".into(),
            },
            &mut events,
        );
        view.handle_event(
            SurfaceEvent::PointerLeave {
                layer: "vehicle-positions".into(),
            },
            &mut events,
        );
        assert_eq!(view.surface().unwrap().cursor(), Cursor::Default);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut never_initialized: MapView<HeadlessSurface> = MapView::new(MapConfig::default());
        never_initialized.teardown();

        let mut view = ready_view();
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, None)]));
        view.handle_event(
            SurfaceEvent::Click {
                lng_lat: Coord { x: -74.0, y: 40.7 },
            },
            &mut Vec::new(),
        );

        view.teardown();
        view.teardown();
        assert!(view.surface().is_none());
        assert!(!view.is_ready());
        assert_eq!(view.interaction().popup_state(), PopupState::Absent);
    }

    #[test]
    fn test_icon_load_after_teardown_is_ignored() {
        let mut view = ready_view();
        let event = view.surface_mut().unwrap().complete_image_load(Ok(icon())).unwrap();
        view.teardown();

        view.handle_event(event, &mut Vec::new());
        view.update(&state(vec![vehicle("V1", "T1", -74.0, 40.7, None)]));
        assert!(view.map().is_none());
    }
}
