use async_trait::async_trait;
use aws_sdk_dynamodb::Client;

use crate::error::Result;
use crate::keys::{ItemId, PartitionKey};
use crate::metadata::MetadataStore;
use crate::model::MetadataRecord;

use super::conversions::{item_to_metadata, metadata_key, metadata_to_item};
use super::error::{map_delete_item_error, map_get_item_error, map_put_item_error};

/// Metadata records stored in a DynamoDB table.
pub struct DynamoMetadataStore {
    client: Client,
    table_name: String,
}

impl DynamoMetadataStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl std::fmt::Debug for DynamoMetadataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoMetadataStore")
            .field("table_name", &self.table_name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MetadataStore for DynamoMetadataStore {
    async fn get(
        &self,
        hash_key: &PartitionKey,
        range_key: &ItemId,
    ) -> Result<Option<MetadataRecord>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(metadata_key(hash_key, range_key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        match result.item {
            Some(item) => Ok(Some(item_to_metadata(&item)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, record: &MetadataRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(metadata_to_item(record)))
            .send()
            .await
            .map_err(map_put_item_error)?;

        Ok(())
    }

    async fn delete(&self, hash_key: &PartitionKey, range_key: &ItemId) -> Result<()> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(metadata_key(hash_key, range_key)))
            .send()
            .await
            .map_err(map_delete_item_error)?;

        Ok(())
    }
}
