//! # inspector-map
//!
//! Keeps a map render surface in step with a realtime fleet snapshot.
//!
//! The host owns a [`MapView`], pushes every new [`AppState`] into
//! [`MapView::update`] and forwards surface callbacks to
//! [`MapView::handle_event`]. The view colors vehicles by delay, frames them
//! in the viewport, draws the focused trip and vehicle, and turns clicks into
//! popups plus [`FocusEvent`]s.
//!
//! Rendering backends implement [`RenderSurface`]. [`HeadlessSurface`]
//! records everything it is asked to do and backs the tests and the
//! `feed-preview` tool.

pub mod config;
pub mod interaction;
pub mod layers;
pub mod render;
pub mod state;
pub mod surface;

pub use config::MapConfig;
pub use interaction::{FocusEvent, FocusListener, InteractionController, PopupState};
pub use state::view::{AppState, MapError, MapView};
pub use surface::{HeadlessFactory, HeadlessSurface, RenderSurface, SurfaceEvent, SurfaceFactory};
