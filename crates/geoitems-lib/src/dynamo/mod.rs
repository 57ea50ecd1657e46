//! DynamoDB-backed implementations of [`GeoIndex`](crate::index::GeoIndex)
//! and [`MetadataStore`](crate::metadata::MetadataStore).
//!
//! Both tables use a numeric `hashKey` and a string `rangeKey`. By default the
//! metadata records share the geo index table: their `hashKey` comes from the
//! item id's digits instead of a geohash cell, and they carry no `geoJson`
//! attribute, so a radius query that reads such a row skips it.

mod conversions;
mod error;
mod geo_table;
mod metadata_table;

pub use conversions::{
    ADDRESS_ATTR, GEOHASH_ATTR, GEO_JSON_ATTR, GEO_POINT_ATTR, HASH_KEY_ATTR, NAME_ATTR,
    RANGE_KEY_ATTR,
};
pub use geo_table::DynamoGeoIndex;
pub use metadata_table::DynamoMetadataStore;
