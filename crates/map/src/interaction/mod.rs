//! Pointer handling on the vehicle layer.
//!
//! Clicks select a vehicle: the focus change goes out to the host, and a popup
//! describing the vehicle opens at the click. The popup closes on the next
//! click anywhere, which is tracked by [`PopupState`] rather than by
//! registering a fresh one-shot handler per click.

use geo::Coord;
use inspector_transit::{TripIdentifier, VehicleIdentifier};

use crate::interaction::popup::{PopupContent, StartFormat, display_value};
use crate::render::VEHICLE_POSITIONS_LAYER;
use crate::surface::{Cursor, PointerEvent, PopupId, RenderSurface, Subscription};

pub mod popup;

pub const FOCUS_VEHICLE_ID: &str = "focus-vehicle-id";
pub const FOCUS_TRIP_ID: &str = "focus-trip-id";

/// Outbound focus change. `None` clears the focus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEvent {
    Vehicle(Option<VehicleIdentifier>),
    Trip(Option<TripIdentifier>),
}

impl FocusEvent {
    pub fn name(&self) -> &'static str {
        match self {
            FocusEvent::Vehicle(_) => FOCUS_VEHICLE_ID,
            FocusEvent::Trip(_) => FOCUS_TRIP_ID,
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            FocusEvent::Vehicle(id) => id.as_ref().map(VehicleIdentifier::as_str),
            FocusEvent::Trip(id) => id.as_ref().map(TripIdentifier::as_str),
        }
    }
}

/// Receives focus changes on behalf of the host's state owner.
pub trait FocusListener {
    fn emit(&mut self, event: FocusEvent);
}

impl FocusListener for Vec<FocusEvent> {
    fn emit(&mut self, event: FocusEvent) {
        self.push(event);
    }
}

impl<F: FnMut(FocusEvent)> FocusListener for F {
    fn emit(&mut self, event: FocusEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PopupState {
    #[default]
    Absent,
    /// A popup is open; the next map click closes it.
    AwaitingDismiss { popup: PopupId, anchor: Coord },
}

#[derive(Debug, Default)]
pub struct InteractionController {
    popup: PopupState,
    start_format: StartFormat,
}

impl InteractionController {
    pub fn new(start_format: StartFormat) -> Self {
        Self {
            popup: PopupState::Absent,
            start_format,
        }
    }

    /// Pointer events the surface must deliver for this controller. Hover is
    /// scoped to the vehicle layer; clicks are map-wide so that a click on
    /// empty space still dismisses the popup and clears the focus.
    pub fn subscriptions() -> [Subscription; 3] {
        [
            Subscription {
                event: PointerEvent::Enter,
                layer: Some(VEHICLE_POSITIONS_LAYER),
            },
            Subscription {
                event: PointerEvent::Leave,
                layer: Some(VEHICLE_POSITIONS_LAYER),
            },
            Subscription {
                event: PointerEvent::Click,
                layer: None,
            },
        ]
    }

    pub fn popup_state(&self) -> PopupState {
        self.popup
    }

    pub fn pointer_enter<S: RenderSurface>(&self, surface: &mut S) {
        surface.set_cursor(Cursor::Pointer);
    }

    pub fn pointer_leave<S: RenderSurface>(&self, surface: &mut S) {
        surface.set_cursor(Cursor::Default);
    }

    /// One click cycle: close any open popup, select whatever vehicle lies
    /// under the pointer (or nothing), and open a popup for it.
    pub fn click<S: RenderSurface, L: FocusListener + ?Sized>(
        &mut self,
        surface: &mut S,
        at: Coord,
        listener: &mut L,
    ) -> PopupState {
        self.dismiss(surface);

        let hit = surface
            .query_rendered_features(at, &[VEHICLE_POSITIONS_LAYER])
            .into_iter()
            .next();
        let properties = hit.and_then(|feature| feature.properties).unwrap_or_default();

        let vehicle_id = display_value(properties.get("vehicleId")).map(VehicleIdentifier::from);
        let trip_id = display_value(properties.get("trip_id")).map(TripIdentifier::from);
        listener.emit(FocusEvent::Vehicle(vehicle_id));
        listener.emit(FocusEvent::Trip(trip_id));

        let content = PopupContent::for_vehicle(&properties, &self.start_format);
        if content.is_empty() {
            return self.popup;
        }

        match surface.add_popup(at, &content) {
            Ok(popup) => self.popup = PopupState::AwaitingDismiss { popup, anchor: at },
            Err(e) => tracing::warn!(error = %e, "failed to open vehicle popup"),
        }
        self.popup
    }

    /// Close the open popup, if any.
    pub fn dismiss<S: RenderSurface>(&mut self, surface: &mut S) {
        if let PopupState::AwaitingDismiss { popup, .. } = std::mem::take(&mut self.popup) {
            surface.remove_popup(popup);
            tracing::debug!(popup = popup.0, "closed popup on map click");
        }
    }
}
