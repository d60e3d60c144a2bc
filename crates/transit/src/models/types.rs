//! Shared value types and the crate error.

// ============================================================================
// Data Structures
// ============================================================================

/// WGS84 position reported by a vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Point in (lon, lat) order, or `None` when either axis is not a finite number.
    pub fn point(&self) -> Option<geo::Point> {
        if self.latitude.is_finite() && self.longitude.is_finite() {
            Some(geo::Point::new(self.longitude, self.latitude))
        } else {
            None
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Invalid start date: {0}")]
    InvalidStartDate(String),

    #[error("Invalid start time: {0}")]
    InvalidStartTime(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_position_point_is_lon_lat() {
        let point = Position::new(52.52, 13.405).point().unwrap();
        assert_relative_eq!(point.x(), 13.405);
        assert_relative_eq!(point.y(), 52.52);
    }

    #[test]
    fn test_position_rejects_non_finite() {
        assert!(Position::new(f64::NAN, 13.4).point().is_none());
        assert!(Position::new(52.5, f64::INFINITY).point().is_none());
    }
}
