//! Geo items library entry points.
//!
//! This crate stores named, addressed items in a geospatial index and a
//! companion metadata table, geocodes addresses, and answers radius queries.
//! Higher-level consumers (the Lambda handlers) should only depend on the
//! [`ItemService`] operations exported here instead of talking to the stores
//! directly.

#![deny(warnings)]

pub mod dynamo;
pub mod error;
pub mod geocode;
pub mod geohash;
pub mod index;
pub mod keys;
pub mod memory;
pub mod metadata;
pub mod model;
pub mod service;

pub use dynamo::{DynamoGeoIndex, DynamoMetadataStore};
pub use error::{Error, Result};
pub use geocode::{geocode_address, GeocodeCandidate, Geocoder, GeocodioClient};
pub use index::{GeoIndex, GeoTableConfig};
pub use keys::{ItemId, PartitionKey};
pub use memory::{InMemoryGeoIndex, InMemoryMetadataStore, StaticGeocoder};
pub use metadata::MetadataStore;
pub use model::{Coordinates, GeoPoint, ItemAttributes, ItemLocation, MetadataRecord, RawGeoEntry};
pub use service::{
    transform_entries, CleanupPolicy, ItemService, SearchCenter, DEFAULT_SEARCH_RADIUS_METERS,
    MAX_SEARCH_RADIUS_METERS,
};
