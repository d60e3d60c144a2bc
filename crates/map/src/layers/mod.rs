//! Source data producers: the bulk vehicle layer, the focus overlays and the
//! camera framing derived from them.

pub mod focus;
pub mod vehicles;
pub mod viewport;
