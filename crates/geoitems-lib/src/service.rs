//! Item lifecycle orchestration.
//!
//! [`ItemService`] owns the three collaborators and implements the four
//! operations the Lambda handlers expose. Handlers only translate between
//! proxy events and these calls.
//!
//! # Consistency
//!
//! The geo index and the metadata store are written separately, without a
//! transaction. Each operation orders its writes so that a failure leaves the
//! pair recoverable where possible, and logs every step that could not be
//! undone. Concurrent mutations of the same id are not serialized.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::geocode::{geocode_address, Geocoder};
use crate::index::{parse_geo_json, GeoIndex};
use crate::keys::{ItemId, PartitionKey};
use crate::metadata::MetadataStore;
use crate::model::{
    Coordinates, GeoPoint, ItemAttributes, ItemLocation, MetadataRecord, RawGeoEntry,
};

/// Radius used when a search does not specify one.
pub const DEFAULT_SEARCH_RADIUS_METERS: f64 = 5000.0;

/// Largest radius a search may request.
pub const MAX_SEARCH_RADIUS_METERS: f64 = 50_000.0;

/// What the delete operation does when one of its two removals fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanupPolicy {
    /// Log the failure, keep going, and report success.
    #[default]
    BestEffort,
    /// Stop at the first failure and report it. A failed index delete leaves
    /// the metadata record in place so the delete can be retried.
    Strict,
}

impl FromStr for CleanupPolicy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(Self::BestEffort),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown cleanup policy '{other}'; expected 'best-effort' or 'strict'"
            )),
        }
    }
}

/// Where a radius search is centered.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchCenter {
    /// Geocode this address to find the center.
    Address(String),
    /// Use these coordinates directly.
    Point(GeoPoint),
}

/// Orchestrates the geocoder, geo index and metadata store.
#[derive(Clone)]
pub struct ItemService {
    geocoder: Arc<dyn Geocoder>,
    index: Arc<dyn GeoIndex>,
    metadata: Arc<dyn MetadataStore>,
    cleanup_policy: CleanupPolicy,
}

impl ItemService {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        index: Arc<dyn GeoIndex>,
        metadata: Arc<dyn MetadataStore>,
    ) -> Self {
        Self {
            geocoder,
            index,
            metadata,
            cleanup_policy: CleanupPolicy::default(),
        }
    }

    pub fn with_cleanup_policy(mut self, policy: CleanupPolicy) -> Self {
        self.cleanup_policy = policy;
        self
    }

    pub fn cleanup_policy(&self) -> CleanupPolicy {
        self.cleanup_policy
    }

    /// Load the metadata record for `id`.
    pub async fn load_metadata(&self, id: &ItemId) -> Result<Option<MetadataRecord>> {
        self.metadata
            .get(&PartitionKey::derive(id.as_str()), id)
            .await
    }

    /// Geocode and store a new item, returning its generated id.
    ///
    /// The point is written first, then the metadata record. If the metadata
    /// write fails the point is removed again so no point is left without a
    /// record to find it by.
    pub async fn create_item(&self, attributes: &ItemAttributes) -> Result<ItemId> {
        let point = self.geocode(&attributes.address).await?;
        let id = ItemId::generate();

        if let Err(e) = self.index.put_point(&id, point, attributes).await {
            error!(item_id = %id, error = %e, "an error occurred adding coordinates to the geo index");
            return Err(e);
        }

        let record = MetadataRecord::new(&id, point, attributes);
        if let Err(e) = self.metadata.put(&record).await {
            error!(item_id = %id, error = %e, "an error occurred saving the geolocation metadata");
            if let Err(rollback) = self.index.delete_point(&id, point).await {
                error!(
                    item_id = %id,
                    error = %rollback,
                    "failed to remove geo point after metadata write failure"
                );
            }
            return Err(e);
        }

        info!(
            item_id = %id,
            latitude = point.latitude,
            longitude = point.longitude,
            "item created"
        );
        Ok(id)
    }

    /// Remove an item's point and metadata record.
    ///
    /// Returns [`Error::ItemNotFound`] without touching either store when no
    /// record exists. Failures after that are handled per [`CleanupPolicy`].
    pub async fn delete_item(&self, id: &ItemId) -> Result<()> {
        let record = match self.load_metadata(id).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(Error::ItemNotFound { id: id.to_string() }),
            Err(e) => {
                error!(item_id = %id, error = %e, "an error occurred loading the geolocation metadata");
                return match self.cleanup_policy {
                    CleanupPolicy::Strict => Err(e),
                    CleanupPolicy::BestEffort => Err(Error::ItemNotFound { id: id.to_string() }),
                };
            }
        };

        if let Err(e) = self.index.delete_point(id, record.geo_point).await {
            error!(item_id = %id, error = %e, "an error occurred deleting the geo point");
            if self.cleanup_policy == CleanupPolicy::Strict {
                return Err(e);
            }
        }

        if let Err(e) = self
            .metadata
            .delete(&PartitionKey::derive(id.as_str()), id)
            .await
        {
            error!(item_id = %id, error = %e, "an error occurred deleting item metadata");
            if self.cleanup_policy == CleanupPolicy::Strict {
                return Err(e);
            }
        }

        info!(item_id = %id, "item deleted");
        Ok(())
    }

    /// Find every item within `radius_meters` of the search center.
    ///
    /// The radius must be positive and at most [`MAX_SEARCH_RADIUS_METERS`].
    /// An address that cannot be geocoded is an error. A store failure while
    /// querying the index is logged and yields no results.
    pub async fn search_items(
        &self,
        center: &SearchCenter,
        radius_meters: f64,
    ) -> Result<Vec<ItemLocation>> {
        if radius_meters.is_nan()
            || radius_meters <= 0.0
            || radius_meters > MAX_SEARCH_RADIUS_METERS
        {
            return Err(Error::InvalidRadius { radius_meters });
        }

        let point = match center {
            SearchCenter::Point(point) => *point,
            SearchCenter::Address(address) => self.geocode(address).await?,
        };

        let entries = match self.index.query_radius(point, radius_meters).await {
            Ok(entries) => entries,
            Err(e @ Error::Store { .. }) => {
                error!(error = %e, "an error occurred while searching the geo index");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let items = transform_entries(entries);
        debug!(
            latitude = point.latitude,
            longitude = point.longitude,
            radius_meters = radius_meters,
            found = items.len(),
            "radius search complete"
        );
        Ok(items)
    }

    /// Move an item to a new address and replace its attributes.
    ///
    /// The geo index cannot update a point, so this runs in two phases after
    /// the new address has been geocoded:
    ///
    /// 1. delete the old point (found through the metadata record);
    /// 2. write the new point, then overwrite the metadata record.
    ///
    /// Between the phases the item is absent from search results. If the new
    /// point cannot be written the old one is restored. If the metadata write
    /// fails, the index holds the new point while the record still names the
    /// old one; the error is returned and logged with both points.
    pub async fn update_item(&self, id: &ItemId, attributes: &ItemAttributes) -> Result<()> {
        let existing = self
            .load_metadata(id)
            .await?
            .ok_or_else(|| Error::ItemNotFound { id: id.to_string() })?;
        let new_point = self.geocode(&attributes.address).await?;

        if let Err(e) = self.index.delete_point(id, existing.geo_point).await {
            error!(item_id = %id, error = %e, "an error occurred deleting the item");
            return Err(e);
        }

        if let Err(e) = self.index.put_point(id, new_point, attributes).await {
            error!(item_id = %id, error = %e, "unable to save geolocation for item");
            self.restore_point(&existing, attributes).await;
            return Err(e);
        }

        let record = MetadataRecord::new(id, new_point, attributes);
        if let Err(e) = self.metadata.put(&record).await {
            error!(
                item_id = %id,
                error = %e,
                old_latitude = existing.geo_point.latitude,
                old_longitude = existing.geo_point.longitude,
                new_latitude = new_point.latitude,
                new_longitude = new_point.longitude,
                "geo point moved but metadata record could not be updated"
            );
            return Err(e);
        }

        info!(
            item_id = %id,
            latitude = new_point.latitude,
            longitude = new_point.longitude,
            "item updated"
        );
        Ok(())
    }

    async fn geocode(&self, address: &str) -> Result<GeoPoint> {
        geocode_address(self.geocoder.as_ref(), address)
            .await
            .ok_or_else(|| Error::GeocodeFailed {
                address: address.to_string(),
            })
    }

    async fn restore_point(&self, existing: &MetadataRecord, fallback: &ItemAttributes) {
        let attributes = match (&existing.name, &existing.address) {
            (Some(name), Some(address)) => ItemAttributes::new(name.clone(), address.clone()),
            _ => fallback.clone(),
        };
        match self
            .index
            .put_point(&existing.range_key, existing.geo_point, &attributes)
            .await
        {
            Ok(()) => warn!(item_id = %existing.range_key, "restored previous geo point"),
            Err(e) => error!(
                item_id = %existing.range_key,
                error = %e,
                "failed to restore previous geo point"
            ),
        }
    }
}

impl std::fmt::Debug for ItemService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemService")
            .field("cleanup_policy", &self.cleanup_policy)
            .finish_non_exhaustive()
    }
}

/// Shape raw index entries for the caller, skipping malformed ones.
pub fn transform_entries(entries: Vec<RawGeoEntry>) -> Vec<ItemLocation> {
    entries.into_iter().filter_map(to_location).collect()
}

fn to_location(entry: RawGeoEntry) -> Option<ItemLocation> {
    let point = match entry.geo_json.as_deref().map(parse_geo_json) {
        Some(Ok(point)) => point,
        Some(Err(e)) => {
            debug!(range_key = ?entry.range_key, error = %e, "skipping entry with unreadable geometry");
            return None;
        }
        None => {
            debug!(range_key = ?entry.range_key, "skipping entry without geometry");
            return None;
        }
    };

    match (entry.range_key, entry.name, entry.address) {
        (Some(id), Some(name), Some(address)) => Some(ItemLocation {
            id,
            name,
            address,
            coords: Coordinates::from(point),
        }),
        (range_key, _, _) => {
            debug!(range_key = ?range_key, "skipping entry with missing attributes");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_policy_parses() {
        assert_eq!("strict".parse(), Ok(CleanupPolicy::Strict));
        assert_eq!(" Best-Effort ".parse(), Ok(CleanupPolicy::BestEffort));
        assert!("sometimes".parse::<CleanupPolicy>().is_err());
        assert_eq!(CleanupPolicy::default(), CleanupPolicy::BestEffort);
    }

    #[test]
    fn transform_flips_geometry_order() {
        let geo_json = r#"{"type":"Point","coordinates":[-89.65,39.78]}"#;
        let entries = vec![RawGeoEntry {
            range_key: Some("id1".to_string()),
            geo_json: Some(geo_json.to_string()),
            name: Some("Cafe".to_string()),
            address: Some("123 Main St".to_string()),
        }];

        let items = transform_entries(entries);
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].coords,
            Coordinates {
                lat: 39.78,
                lng: -89.65
            }
        );
    }

    #[test]
    fn transform_skips_malformed_entries() {
        let good = RawGeoEntry {
            range_key: Some("good".to_string()),
            geo_json: Some(r#"{"type":"Point","coordinates":[1.0,2.0]}"#.to_string()),
            name: Some("n".to_string()),
            address: Some("a".to_string()),
        };
        let entries = vec![
            RawGeoEntry {
                geo_json: Some("not json".to_string()),
                ..good.clone()
            },
            RawGeoEntry {
                geo_json: None,
                ..good.clone()
            },
            RawGeoEntry {
                name: None,
                ..good.clone()
            },
            RawGeoEntry {
                geo_json: Some(r#"{"type":"Point","coordinates":[]}"#.to_string()),
                ..good.clone()
            },
            good,
        ];

        let items = transform_entries(entries);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "good");
    }
}
