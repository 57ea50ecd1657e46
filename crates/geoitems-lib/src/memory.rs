//! In-process implementations of the collaborator traits.
//!
//! Used as test doubles and for running the handlers without AWS. The geo
//! index partitions points by the same geohash cells as the DynamoDB adapter,
//! so a point can only be deleted when its stored coordinates are known.
//! Each double can be switched into a failing mode to exercise error paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::geocode::{GeocodeCandidate, Geocoder};
use crate::geohash::{covering_hash_keys, encode, hash_key, haversine_meters};
use crate::index::{geo_json_string, parse_geo_json, GeoIndex, GeoTableConfig};
use crate::keys::{ItemId, PartitionKey};
use crate::metadata::MetadataStore;
use crate::model::{Coordinates, GeoPoint, ItemAttributes, MetadataRecord, RawGeoEntry};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn injected(operation: &'static str) -> Error {
    Error::store(operation, "injected failure")
}

/// Geo index held in memory, partitioned by hash key cell.
#[derive(Debug)]
pub struct InMemoryGeoIndex {
    hash_key_length: u8,
    cells: Mutex<BTreeMap<u64, BTreeMap<String, RawGeoEntry>>>,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_queries: AtomicBool,
    mutations: AtomicUsize,
}

impl InMemoryGeoIndex {
    pub fn new(config: &GeoTableConfig) -> Self {
        Self {
            hash_key_length: config.hash_key_length,
            cells: Mutex::new(BTreeMap::new()),
            fail_puts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_queries: AtomicBool::new(false),
            mutations: AtomicUsize::new(0),
        }
    }

    /// Store an arbitrary entry in the cell containing `cell_point`.
    pub fn insert_raw(&self, cell_point: GeoPoint, entry: RawGeoEntry) -> Result<()> {
        let key = hash_key(encode(cell_point), self.hash_key_length)?;
        let range_key = entry.range_key.clone().unwrap_or_default();
        lock(&self.cells)
            .entry(key)
            .or_default()
            .insert(range_key, entry);
        Ok(())
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Number of successful puts and deletes so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Total entries across all cells.
    pub fn len(&self) -> usize {
        lock(&self.cells).values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GeoIndex for InMemoryGeoIndex {
    async fn put_point(
        &self,
        id: &ItemId,
        point: GeoPoint,
        attributes: &ItemAttributes,
    ) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(injected("PutPoint"));
        }
        let key = hash_key(encode(point), self.hash_key_length)?;
        let entry = RawGeoEntry {
            range_key: Some(id.to_string()),
            geo_json: Some(geo_json_string(point)?),
            name: Some(attributes.name.clone()),
            address: Some(attributes.address.clone()),
        };
        lock(&self.cells)
            .entry(key)
            .or_default()
            .insert(id.to_string(), entry);
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete_point(&self, id: &ItemId, point: GeoPoint) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected("DeletePoint"));
        }
        let key = hash_key(encode(point), self.hash_key_length)?;
        let mut cells = lock(&self.cells);
        if let Some(cell) = cells.get_mut(&key) {
            cell.remove(id.as_str());
            if cell.is_empty() {
                cells.remove(&key);
            }
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query_radius(&self, center: GeoPoint, radius_meters: f64) -> Result<Vec<RawGeoEntry>> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(injected("QueryRadius"));
        }
        let keys = covering_hash_keys(center, radius_meters, self.hash_key_length)?;
        let cells = lock(&self.cells);
        let mut found = Vec::new();
        for key in keys {
            let Some(cell) = cells.get(&key) else {
                continue;
            };
            for entry in cell.values() {
                let within = match entry.geo_json.as_deref().map(parse_geo_json) {
                    Some(Ok(point)) => haversine_meters(center, point) <= radius_meters,
                    // Unreadable geometry is handed to the caller to decide on.
                    _ => true,
                };
                if within {
                    found.push(entry.clone());
                }
            }
        }
        Ok(found)
    }
}

/// Metadata store held in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    records: Mutex<HashMap<(String, String), MetadataRecord>>,
    fail_gets: AtomicBool,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    mutations: AtomicUsize,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_gets(&self, fail: bool) {
        self.fail_gets.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful puts and deletes so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn record_key(hash_key: &PartitionKey, range_key: &ItemId) -> (String, String) {
    (hash_key.to_string(), range_key.to_string())
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get(
        &self,
        hash_key: &PartitionKey,
        range_key: &ItemId,
    ) -> Result<Option<MetadataRecord>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(injected("GetItem"));
        }
        Ok(lock(&self.records)
            .get(&record_key(hash_key, range_key))
            .cloned())
    }

    async fn put(&self, record: &MetadataRecord) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(injected("PutItem"));
        }
        lock(&self.records).insert(
            record_key(&record.hash_key, &record.range_key),
            record.clone(),
        );
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, hash_key: &PartitionKey, range_key: &ItemId) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected("DeleteItem"));
        }
        lock(&self.records).remove(&record_key(hash_key, range_key));
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Geocoder answering from a fixed address table.
#[derive(Debug, Default)]
pub struct StaticGeocoder {
    addresses: HashMap<String, Vec<GeocodeCandidate>>,
    failing: bool,
    calls: AtomicUsize,
}

impl StaticGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `address` to a single candidate at `point`.
    pub fn with_address(mut self, address: impl Into<String>, point: GeoPoint) -> Self {
        self.addresses.insert(
            address.into(),
            vec![GeocodeCandidate {
                location: Coordinates::from(point),
                accuracy: Some(1.0),
                formatted_address: None,
            }],
        );
        self
    }

    /// Make every lookup fail as if the provider were unreachable.
    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn geocode(&self, address: &str) -> Result<Vec<GeocodeCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(Error::GeocoderResponse {
                status: 503,
                message: "geocoder unavailable".to_string(),
            });
        }
        Ok(self.addresses.get(address).cloned().unwrap_or_default())
    }
}
