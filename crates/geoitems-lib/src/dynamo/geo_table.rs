use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::debug;

use crate::error::Result;
use crate::geohash::{covering_hash_keys, encode, hash_key, haversine_meters};
use crate::index::{parse_geo_json, GeoIndex, GeoTableConfig};
use crate::keys::ItemId;
use crate::model::{GeoPoint, ItemAttributes, RawGeoEntry};

use super::conversions::{geo_entry_to_item, geo_key, item_to_raw_entry, HASH_KEY_ATTR};
use super::error::{map_delete_item_error, map_put_item_error, map_query_error};

/// Geo index stored in a DynamoDB table partitioned by geohash cell.
pub struct DynamoGeoIndex {
    client: Client,
    config: GeoTableConfig,
}

impl DynamoGeoIndex {
    pub fn new(client: Client, config: GeoTableConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GeoTableConfig {
        &self.config
    }

    /// Read every item of one hash key partition, following pagination.
    async fn query_cell(&self, cell: u64) -> Result<Vec<RawGeoEntry>> {
        let mut entries = Vec::new();
        let mut start_key = None;

        loop {
            let page = self
                .client
                .query()
                .table_name(&self.config.table_name)
                .key_condition_expression("#hk = :hk")
                .expression_attribute_names("#hk", HASH_KEY_ATTR)
                .expression_attribute_values(":hk", AttributeValue::N(cell.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(map_query_error)?;

            entries.extend(page.items.unwrap_or_default().iter().map(item_to_raw_entry));

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(entries)
    }
}

impl std::fmt::Debug for DynamoGeoIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoGeoIndex")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GeoIndex for DynamoGeoIndex {
    async fn put_point(
        &self,
        id: &ItemId,
        point: GeoPoint,
        attributes: &ItemAttributes,
    ) -> Result<()> {
        let geohash = encode(point);
        let key = hash_key(geohash, self.config.hash_key_length)?;
        let item = geo_entry_to_item(key, geohash, id, point, attributes)?;

        self.client
            .put_item()
            .table_name(&self.config.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(map_put_item_error)?;

        debug!(item_id = %id, hash_key = key, "geo point stored");
        Ok(())
    }

    async fn delete_point(&self, id: &ItemId, point: GeoPoint) -> Result<()> {
        let key = hash_key(encode(point), self.config.hash_key_length)?;

        self.client
            .delete_item()
            .table_name(&self.config.table_name)
            .set_key(Some(geo_key(key, id)))
            .send()
            .await
            .map_err(map_delete_item_error)?;

        debug!(item_id = %id, hash_key = key, "geo point deleted");
        Ok(())
    }

    async fn query_radius(&self, center: GeoPoint, radius_meters: f64) -> Result<Vec<RawGeoEntry>> {
        let cells = covering_hash_keys(center, radius_meters, self.config.hash_key_length)?;
        debug!(
            cells = cells.len(),
            radius_meters = radius_meters,
            "querying geo index cells"
        );

        let mut found = Vec::new();
        for cell in cells {
            for entry in self.query_cell(cell).await? {
                let within = match entry.geo_json.as_deref().map(parse_geo_json) {
                    Some(Ok(point)) => haversine_meters(center, point) <= radius_meters,
                    // Rows without readable geometry are left for the caller to skip.
                    _ => true,
                };
                if within {
                    found.push(entry);
                }
            }
        }

        Ok(found)
    }
}
