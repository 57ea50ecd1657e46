//! Key/value store for [`MetadataRecord`]s.

use async_trait::async_trait;

use crate::error::Result;
use crate::keys::{ItemId, PartitionKey};
use crate::model::MetadataRecord;

/// Store holding one metadata record per indexed item.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Load the record at (`hash_key`, `range_key`), if any.
    async fn get(
        &self,
        hash_key: &PartitionKey,
        range_key: &ItemId,
    ) -> Result<Option<MetadataRecord>>;

    /// Insert or overwrite a record.
    async fn put(&self, record: &MetadataRecord) -> Result<()>;

    /// Delete the record at (`hash_key`, `range_key`). Deleting a missing record succeeds.
    async fn delete(&self, hash_key: &PartitionKey, range_key: &ItemId) -> Result<()>;
}
