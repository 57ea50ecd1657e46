//! Domain types shared by the handlers, the geo index and the metadata store.

use serde::{Deserialize, Serialize};

use crate::keys::{ItemId, PartitionKey};

/// A point on the earth's surface in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both components are finite and inside the valid degree ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// User-supplied attributes of an item, echoed into the geo index so search
/// results can be returned without a second lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAttributes {
    pub name: String,
    pub address: String,
}

impl ItemAttributes {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Shadow record kept outside the geo index.
///
/// The geo index cannot update a point in place and needs the point's
/// coordinates to delete it, so every write to the index is mirrored here
/// under a key derivable from the item id alone.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataRecord {
    pub hash_key: PartitionKey,
    pub range_key: ItemId,
    pub geo_point: GeoPoint,
    pub name: Option<String>,
    pub address: Option<String>,
}

impl MetadataRecord {
    /// Build the record for an item at `point`.
    pub fn new(id: &ItemId, point: GeoPoint, attributes: &ItemAttributes) -> Self {
        Self {
            hash_key: PartitionKey::derive(id.as_str()),
            range_key: id.clone(),
            geo_point: point,
            name: Some(attributes.name.clone()),
            address: Some(attributes.address.clone()),
        }
    }
}

/// Entry returned by a radius query, before it is shaped for the caller.
///
/// Every field is optional: the index table can hold rows written by other
/// tools, and those are skipped rather than failing the whole query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGeoEntry {
    pub range_key: Option<String>,
    pub geo_json: Option<String>,
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Latitude/longitude pair in the short form used by responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl From<GeoPoint> for Coordinates {
    fn from(point: GeoPoint) -> Self {
        Self {
            lat: point.latitude,
            lng: point.longitude,
        }
    }
}

impl From<Coordinates> for GeoPoint {
    fn from(coords: Coordinates) -> Self {
        Self::new(coords.lat, coords.lng)
    }
}

/// An item found by a radius search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemLocation {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coords: Coordinates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_point_validity() {
        assert!(GeoPoint::new(39.78, -89.65).is_valid());
        assert!(GeoPoint::new(90.0, 180.0).is_valid());
        assert!(!GeoPoint::new(90.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn metadata_record_uses_derived_partition_key() {
        let id = ItemId::from("a1b2c3");
        let record = MetadataRecord::new(
            &id,
            GeoPoint::new(1.0, 2.0),
            &ItemAttributes::new("Cafe", "1 Main St"),
        );
        assert_eq!(record.hash_key.as_str(), "123");
        assert_eq!(record.range_key, id);
        assert_eq!(record.name.as_deref(), Some("Cafe"));
    }

    #[test]
    fn item_location_serializes_coords() {
        let location = ItemLocation {
            id: "x1".to_string(),
            name: "Cafe".to_string(),
            address: "1 Main St".to_string(),
            coords: Coordinates {
                lat: 39.78,
                lng: -89.65,
            },
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["coords"]["lat"], 39.78);
        assert_eq!(json["coords"]["lng"], -89.65);
    }
}
