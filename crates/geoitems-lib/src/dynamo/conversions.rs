//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and domain types.
//! These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;

use crate::error::{Error, Result};
use crate::index::geo_json_string;
use crate::keys::{ItemId, PartitionKey};
use crate::model::{GeoPoint, ItemAttributes, MetadataRecord, RawGeoEntry};

pub const HASH_KEY_ATTR: &str = "hashKey";
pub const RANGE_KEY_ATTR: &str = "rangeKey";
pub const GEOHASH_ATTR: &str = "geohash";
pub const GEO_JSON_ATTR: &str = "geoJson";
pub const GEO_POINT_ATTR: &str = "GeoPoint";
pub const NAME_ATTR: &str = "name";
pub const ADDRESS_ATTR: &str = "address";

const LATITUDE_ATTR: &str = "latitude";
const LONGITUDE_ATTR: &str = "longitude";

pub type Item = HashMap<String, AttributeValue>;

/// Primary key of a metadata record.
pub fn metadata_key(hash_key: &PartitionKey, range_key: &ItemId) -> Item {
    HashMap::from([
        (
            HASH_KEY_ATTR.to_string(),
            AttributeValue::N(hash_key.to_string()),
        ),
        (
            RANGE_KEY_ATTR.to_string(),
            AttributeValue::S(range_key.to_string()),
        ),
    ])
}

/// Convert a metadata record to a DynamoDB item.
pub fn metadata_to_item(record: &MetadataRecord) -> Item {
    let mut item = metadata_key(&record.hash_key, &record.range_key);
    item.insert(
        GEO_POINT_ATTR.to_string(),
        AttributeValue::M(HashMap::from([
            (
                LATITUDE_ATTR.to_string(),
                AttributeValue::N(record.geo_point.latitude.to_string()),
            ),
            (
                LONGITUDE_ATTR.to_string(),
                AttributeValue::N(record.geo_point.longitude.to_string()),
            ),
        ])),
    );
    if let Some(name) = &record.name {
        item.insert(NAME_ATTR.to_string(), AttributeValue::S(name.clone()));
    }
    if let Some(address) = &record.address {
        item.insert(ADDRESS_ATTR.to_string(), AttributeValue::S(address.clone()));
    }
    item
}

/// Convert a DynamoDB item to a metadata record.
pub fn item_to_metadata(item: &Item) -> Result<MetadataRecord> {
    let hash_key = get_number(item, HASH_KEY_ATTR)?;
    let range_key = get_string(item, RANGE_KEY_ATTR)?;
    let geo_point = item
        .get(GEO_POINT_ATTR)
        .and_then(|v| v.as_m().ok())
        .ok_or_else(|| Error::malformed(format!("missing or invalid field: {GEO_POINT_ATTR}")))?;

    Ok(MetadataRecord {
        hash_key: PartitionKey::from_stored(&hash_key),
        range_key: ItemId::from(range_key),
        geo_point: GeoPoint::new(
            parse_f64(geo_point, LATITUDE_ATTR)?,
            parse_f64(geo_point, LONGITUDE_ATTR)?,
        ),
        name: get_optional_string(item, NAME_ATTR),
        address: get_optional_string(item, ADDRESS_ATTR),
    })
}

/// Primary key of a geo index entry.
pub fn geo_key(hash_key: u64, id: &ItemId) -> Item {
    HashMap::from([
        (
            HASH_KEY_ATTR.to_string(),
            AttributeValue::N(hash_key.to_string()),
        ),
        (RANGE_KEY_ATTR.to_string(), AttributeValue::S(id.to_string())),
    ])
}

/// Build the geo index item for a point.
pub fn geo_entry_to_item(
    hash_key: u64,
    geohash: u64,
    id: &ItemId,
    point: GeoPoint,
    attributes: &ItemAttributes,
) -> Result<Item> {
    let mut item = geo_key(hash_key, id);
    item.insert(
        GEOHASH_ATTR.to_string(),
        AttributeValue::N(geohash.to_string()),
    );
    item.insert(
        GEO_JSON_ATTR.to_string(),
        AttributeValue::S(geo_json_string(point)?),
    );
    item.insert(
        NAME_ATTR.to_string(),
        AttributeValue::S(attributes.name.clone()),
    );
    item.insert(
        ADDRESS_ATTR.to_string(),
        AttributeValue::S(attributes.address.clone()),
    );
    Ok(item)
}

/// Read a geo index item loosely; absent or mistyped attributes become `None`.
pub fn item_to_raw_entry(item: &Item) -> RawGeoEntry {
    RawGeoEntry {
        range_key: get_optional_string(item, RANGE_KEY_ATTR),
        geo_json: get_optional_string(item, GEO_JSON_ATTR),
        name: get_optional_string(item, NAME_ATTR),
        address: get_optional_string(item, ADDRESS_ATTR),
    }
}

fn get_string(item: &Item, key: &str) -> Result<String> {
    get_optional_string(item, key)
        .ok_or_else(|| Error::malformed(format!("missing or invalid field: {key}")))
}

fn get_optional_string(item: &Item, key: &str) -> Option<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

fn get_number(item: &Item, key: &str) -> Result<String> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::malformed(format!("missing or invalid field: {key}")))
}

fn parse_f64(item: &Item, key: &str) -> Result<f64> {
    get_number(item, key)?
        .parse()
        .map_err(|e| Error::malformed(format!("invalid number in {key}: {e}")))
}
