//! In-memory render surface.
//!
//! Keeps the last data written to every source and records camera, cursor,
//! popup and subscription calls. Image loads are parked until the host
//! completes them, which makes the asynchronous icon path drivable offline.

use std::collections::{BTreeMap, BTreeSet};

use geo::Coord;
use geojson::{Feature, GeoJson, Value as GeometryValue};
use serde_json::Value;

use crate::interaction::popup::PopupContent;
use crate::layers::viewport::ViewportRequest;
use crate::render::LayerSpec;
use crate::surface::{
    Cursor, IconImage, PointerEvent, PopupId, RenderSurface, SurfaceError, SurfaceFactory, SurfaceOptions,
    SurfaceEvent, Subscription,
};

/// Default hit-test radius, in degrees.
pub const DEFAULT_HIT_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessLayer {
    pub id: String,
    pub source: String,
    pub definition: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessPopup {
    pub at: Coord,
    pub html: String,
    pub content: PopupContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLoadRequest {
    pub name: String,
    pub url: String,
}

#[derive(Debug)]
pub struct HeadlessSurface {
    options: SurfaceOptions,
    hit_tolerance: f64,
    sources: BTreeMap<String, GeoJson>,
    frozen_sources: BTreeSet<String>,
    layers: Vec<HeadlessLayer>,
    images: BTreeMap<String, IconImage>,
    pending_images: Vec<ImageLoadRequest>,
    camera_requests: Vec<ViewportRequest>,
    cursor: Cursor,
    popups: BTreeMap<PopupId, HeadlessPopup>,
    next_popup: u64,
    subscriptions: Vec<Subscription>,
    removed: bool,
}

impl HeadlessSurface {
    pub fn new(options: SurfaceOptions) -> Self {
        Self {
            options,
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
            sources: BTreeMap::new(),
            frozen_sources: BTreeSet::new(),
            layers: Vec::new(),
            images: BTreeMap::new(),
            pending_images: Vec::new(),
            camera_requests: Vec::new(),
            cursor: Cursor::Default,
            popups: BTreeMap::new(),
            next_popup: 0,
            subscriptions: Vec::new(),
            removed: false,
        }
    }

    pub fn with_hit_tolerance(mut self, degrees: f64) -> Self {
        self.hit_tolerance = degrees;
        self
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    pub fn source(&self, id: &str) -> Option<&GeoJson> {
        self.sources.get(id)
    }

    /// Features currently held by a collection source; empty if the source is
    /// missing or holds something else.
    pub fn source_features(&self, id: &str) -> &[Feature] {
        match self.sources.get(id) {
            Some(GeoJson::FeatureCollection(collection)) => &collection.features,
            _ => &[],
        }
    }

    /// Make later writes to source `id` fail with a backend error, the way a
    /// surface that lost its style mid-update would.
    pub fn freeze_source(&mut self, id: &str) {
        self.frozen_sources.insert(id.to_owned());
    }

    pub fn layers(&self) -> &[HeadlessLayer] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&HeadlessLayer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    pub fn has_image(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    pub fn pending_image_loads(&self) -> &[ImageLoadRequest] {
        &self.pending_images
    }

    /// Resolve the oldest parked image load, producing the event the host
    /// would deliver.
    pub fn complete_image_load(
        &mut self,
        result: Result<IconImage, String>,
    ) -> Option<SurfaceEvent> {
        if self.pending_images.is_empty() {
            return None;
        }
        let request = self.pending_images.remove(0);
        Some(SurfaceEvent::ImageLoaded {
            result: result.map_err(|reason| SurfaceError::ImageLoad {
                url: request.url,
                reason,
            }),
            name: request.name,
        })
    }

    pub fn camera_requests(&self) -> &[ViewportRequest] {
        &self.camera_requests
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn popups(&self) -> impl Iterator<Item = (PopupId, &HeadlessPopup)> + '_ {
        self.popups.iter().map(|(id, popup)| (*id, popup))
    }

    pub fn popup_count(&self) -> usize {
        self.popups.len()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Whether a pointer event over `layer` (or over no layer) would reach a
    /// subscriber.
    pub fn delivers(&self, event: PointerEvent, layer: Option<&str>) -> bool {
        self.subscriptions
            .iter()
            .any(|s| s.event == event && (s.layer.is_none() || s.layer == layer))
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    fn ensure_live(&self) -> Result<(), SurfaceError> {
        if self.removed {
            Err(SurfaceError::Removed)
        } else {
            Ok(())
        }
    }

    fn hit(&self, feature: &Feature, at: Coord) -> bool {
        let Some(geometry) = &feature.geometry else {
            return false;
        };
        match &geometry.value {
            GeometryValue::Point(position) if position.len() >= 2 => {
                (position[0] - at.x).abs() <= self.hit_tolerance
                    && (position[1] - at.y).abs() <= self.hit_tolerance
            }
            _ => false,
        }
    }
}

impl RenderSurface for HeadlessSurface {
    fn add_source(&mut self, id: &str, data: GeoJson) -> Result<(), SurfaceError> {
        self.ensure_live()?;
        if self.sources.contains_key(id) {
            return Err(SurfaceError::DuplicateSource(id.to_owned()));
        }
        self.sources.insert(id.to_owned(), data);
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        !self.removed && self.sources.contains_key(id)
    }

    fn set_source_data(&mut self, id: &str, data: GeoJson) -> Result<(), SurfaceError> {
        self.ensure_live()?;
        if self.frozen_sources.contains(id) {
            return Err(SurfaceError::Backend(format!("source {id} rejected the update")));
        }
        let source = self
            .sources
            .get_mut(id)
            .ok_or_else(|| SurfaceError::UnknownSource(id.to_owned()))?;
        *source = data;
        Ok(())
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), SurfaceError> {
        self.ensure_live()?;
        if self.has_layer(layer.id) {
            return Err(SurfaceError::DuplicateLayer(layer.id.to_owned()));
        }
        let source_id = layer.source.id();
        if !self.sources.contains_key(source_id) {
            return Err(SurfaceError::MissingLayerSource {
                layer: layer.id.to_owned(),
                source_id: source_id.to_owned(),
            });
        }
        self.layers.push(HeadlessLayer {
            id: layer.id.to_owned(),
            source: source_id.to_owned(),
            definition: layer.to_json(),
        });
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        !self.removed && self.layers.iter().any(|layer| layer.id == id)
    }

    fn load_image(&mut self, name: &str, url: &str) {
        if self.removed {
            return;
        }
        self.pending_images.push(ImageLoadRequest {
            name: name.to_owned(),
            url: url.to_owned(),
        });
    }

    fn add_image(&mut self, name: &str, image: IconImage) -> Result<(), SurfaceError> {
        self.ensure_live()?;
        self.images.insert(name.to_owned(), image);
        Ok(())
    }

    fn fit_bounds(&mut self, request: &ViewportRequest) {
        if !self.removed {
            self.camera_requests.push(request.clone());
        }
    }

    fn query_rendered_features(&self, at: Coord, layers: &[&str]) -> Vec<Feature> {
        if self.removed {
            return Vec::new();
        }

        // Later layers draw above earlier ones, and later features above
        // earlier features of the same layer.
        self.layers
            .iter()
            .rev()
            .filter(|layer| layers.contains(&layer.id.as_str()))
            .flat_map(|layer| self.source_features(&layer.source).iter().rev())
            .filter(|feature| self.hit(feature, at))
            .cloned()
            .collect()
    }

    fn subscribe(&mut self, subscription: Subscription) {
        if !self.removed {
            self.subscriptions.push(subscription);
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    fn add_popup(&mut self, at: Coord, content: &PopupContent) -> Result<PopupId, SurfaceError> {
        self.ensure_live()?;
        let id = PopupId(self.next_popup);
        self.next_popup += 1;
        self.popups.insert(
            id,
            HeadlessPopup {
                at,
                html: content.to_html(),
                content: content.clone(),
            },
        );
        Ok(id)
    }

    fn remove_popup(&mut self, popup: PopupId) {
        self.popups.remove(&popup);
    }

    fn remove(&mut self) {
        self.sources.clear();
        self.frozen_sources.clear();
        self.layers.clear();
        self.images.clear();
        self.pending_images.clear();
        self.popups.clear();
        self.subscriptions.clear();
        self.cursor = Cursor::Default;
        self.removed = true;
    }
}

/// Factory for [`HeadlessSurface`]s; the container is a plain element id.
#[derive(Debug, Clone)]
pub struct HeadlessFactory {
    pub hit_tolerance: f64,
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self {
            hit_tolerance: DEFAULT_HIT_TOLERANCE,
        }
    }
}

impl SurfaceFactory for HeadlessFactory {
    type Container = str;
    type Surface = HeadlessSurface;

    fn create(
        &mut self,
        container: &str,
        options: &SurfaceOptions,
    ) -> Result<HeadlessSurface, SurfaceError> {
        if container.is_empty() {
            return Err(SurfaceError::Backend("empty container id".to_owned()));
        }
        Ok(HeadlessSurface::new(options.clone()).with_hit_tolerance(self.hit_tolerance))
    }
}
