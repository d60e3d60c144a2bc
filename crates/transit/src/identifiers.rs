//! Identifiers carried by feed entities.
//!
//! Each wraps an `Arc<str>`: a snapshot refresh clones every id it renders,
//! and those clones only bump a refcount.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

macro_rules! feed_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(Arc::from(s.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(Arc::from(s))
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                <String as serde::Deserialize>::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

feed_identifier!(
    /// `VehicleDescriptor.id`: the system-internal vehicle id.
    VehicleIdentifier
);
feed_identifier!(TripIdentifier);
feed_identifier!(RouteIdentifier);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_clones_share_storage() {
        let id = VehicleIdentifier::new("bus_4711");
        let copy = id.clone();

        assert_eq!(id, copy);
        assert!(Arc::ptr_eq(&id.0, &copy.0));
        assert_eq!(id, VehicleIdentifier::from(String::from("bus_4711")));
    }

    #[test]
    fn test_lookup_by_str() {
        let trips: HashSet<TripIdentifier> = ["trip_9", "trip_10"].into_iter().map(Into::into).collect();

        assert!(trips.contains("trip_9"));
        assert!(!trips.contains("trip_11"));
    }

    #[test]
    fn test_display_is_raw_id() {
        assert_eq!(RouteIdentifier::new("M10").to_string(), "M10");
    }
}
