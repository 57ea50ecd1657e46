//! Geospatial secondary index.
//!
//! Points live in a table partitioned by geohash cell (see [`crate::geohash`]).
//! The index can insert, delete and radius-query points, but cannot move a
//! point or change its attributes: callers delete and re-insert instead, and
//! must know the point's current coordinates to delete it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geohash::DEFAULT_HASH_KEY_LENGTH;
use crate::keys::ItemId;
use crate::model::{GeoPoint, ItemAttributes, RawGeoEntry};

/// Table configuration shared by geo index implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoTableConfig {
    pub table_name: String,
    pub hash_key_length: u8,
}

impl GeoTableConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            hash_key_length: DEFAULT_HASH_KEY_LENGTH,
        }
    }

    pub fn with_hash_key_length(mut self, hash_key_length: u8) -> Self {
        self.hash_key_length = hash_key_length;
        self
    }
}

/// Spatial index over item points.
#[async_trait]
pub trait GeoIndex: Send + Sync {
    /// Insert (or overwrite) the point for `id` together with its attributes.
    async fn put_point(
        &self,
        id: &ItemId,
        point: GeoPoint,
        attributes: &ItemAttributes,
    ) -> Result<()>;

    /// Remove the point for `id` stored at `point`.
    async fn delete_point(&self, id: &ItemId, point: GeoPoint) -> Result<()>;

    /// Return every entry within `radius_meters` of `center`.
    async fn query_radius(&self, center: GeoPoint, radius_meters: f64) -> Result<Vec<RawGeoEntry>>;
}

/// GeoJSON point geometry as stored in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoJsonPoint {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]`, per GeoJSON.
    pub coordinates: Vec<f64>,
}

impl GeoJsonPoint {
    pub fn from_point(point: GeoPoint) -> Self {
        Self {
            kind: "Point".to_string(),
            coordinates: vec![point.longitude, point.latitude],
        }
    }

    /// Convert back to a point, flipping GeoJSON's `[lng, lat]` order.
    pub fn to_point(&self) -> Result<GeoPoint> {
        match self.coordinates.as_slice() {
            [lng, lat, ..] => Ok(GeoPoint::new(*lat, *lng)),
            _ => Err(Error::malformed(format!(
                "geometry has {} coordinates, expected at least 2",
                self.coordinates.len()
            ))),
        }
    }
}

/// Serialize a point into the stored geometry string.
pub fn geo_json_string(point: GeoPoint) -> Result<String> {
    Ok(serde_json::to_string(&GeoJsonPoint::from_point(point))?)
}

/// Parse a stored geometry string back into a point.
pub fn parse_geo_json(geo_json: &str) -> Result<GeoPoint> {
    let geometry: GeoJsonPoint = serde_json::from_str(geo_json)?;
    geometry.to_point()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_json_stores_longitude_first() {
        let json = geo_json_string(GeoPoint::new(39.78, -89.65)).unwrap();
        assert_eq!(json, r#"{"type":"Point","coordinates":[-89.65,39.78]}"#);
    }

    #[test]
    fn parse_geo_json_flips_order() {
        let point = parse_geo_json(r#"{"type":"Point","coordinates":[-89.65,39.78]}"#).unwrap();
        assert_eq!(point, GeoPoint::new(39.78, -89.65));
    }

    #[test]
    fn parse_geo_json_rejects_short_coordinates() {
        let err = parse_geo_json(r#"{"type":"Point","coordinates":[1.0]}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
        assert!(parse_geo_json("{").is_err());
    }

    #[test]
    fn config_defaults_hash_key_length() {
        let config = GeoTableConfig::new("items");
        assert_eq!(config.hash_key_length, 5);
        assert_eq!(config.with_hash_key_length(6).hash_key_length, 6);
    }
}
