//! Camera framing for a set of positions.

use geo::{BoundingRect, MultiPoint, Point, Rect};

/// Screen-space padding around fitted bounds, in pixels.
pub const DEFAULT_FIT_PADDING: f64 = 50.0;

/// A request for the surface to animate its camera onto `bounds`, keeping
/// `padding` pixels free on every side.
///
/// `bounds` is the exact geographic extent; the padding is applied by the
/// surface in screen space, so even a single point (a zero-area `bounds`)
/// frames to a padded region rather than a degenerate one.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportRequest {
    pub bounds: Rect,
    pub padding: f64,
}

impl ViewportRequest {
    /// West, south, east, north.
    pub fn to_bbox(&self) -> [f64; 4] {
        let min = self.bounds.min();
        let max = self.bounds.max();
        [min.x, min.y, max.x, max.y]
    }
}

/// Stateless fitter; the padding is fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFitter {
    padding: f64,
}

impl Default for ViewportFitter {
    fn default() -> Self {
        Self::new(DEFAULT_FIT_PADDING)
    }
}

impl ViewportFitter {
    pub fn new(padding: f64) -> Self {
        Self { padding }
    }

    /// Smallest region covering all `points`. `None` only for an empty slice.
    pub fn fit(&self, points: &[Point]) -> Option<ViewportRequest> {
        let bounds = MultiPoint::from(points.to_vec()).bounding_rect()?;
        Some(ViewportRequest {
            bounds,
            padding: self.padding,
        })
    }
}
