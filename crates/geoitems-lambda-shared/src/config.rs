//! Environment configuration read once at cold start.

use std::time::Duration;

use geoitems_lib::geocode::DEFAULT_GEOCODIO_BASE_URL;
use geoitems_lib::geohash::{DEFAULT_HASH_KEY_LENGTH, MAX_HASH_KEY_LENGTH};
use geoitems_lib::CleanupPolicy;

use crate::runtime::InitError;

pub const ENV_TABLE_NAME: &str = "DYNAMODB_TABLE_NAME";
pub const ENV_METADATA_TABLE_NAME: &str = "METADATA_TABLE_NAME";
pub const ENV_GEOCODIO_API_KEY: &str = "GEOCODIO_API_KEY";
pub const ENV_GEOCODIO_BASE_URL: &str = "GEOCODIO_BASE_URL";
pub const ENV_GEOCODER_TIMEOUT_SECS: &str = "GEOCODER_TIMEOUT_SECS";
pub const ENV_HASH_KEY_LENGTH: &str = "GEO_HASH_KEY_LENGTH";
pub const ENV_CLEANUP_POLICY: &str = "DELETE_CLEANUP_POLICY";
pub const ENV_DYNAMODB_ENDPOINT_URL: &str = "DYNAMODB_ENDPOINT_URL";

const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;

/// Settings shared by all four handlers.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub table_name: String,
    pub metadata_table_name: String,
    pub geocodio_api_key: String,
    pub geocodio_base_url: String,
    pub geocoder_timeout: Duration,
    pub hash_key_length: u8,
    pub cleanup_policy: CleanupPolicy,
    pub dynamodb_endpoint_url: Option<String>,
}

impl Config {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, InitError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InitError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |key: &str| {
            get(key).ok_or_else(|| InitError {
                message: format!("missing required environment variable {key}"),
            })
        };

        let table_name = required(ENV_TABLE_NAME)?;
        let geocodio_api_key = required(ENV_GEOCODIO_API_KEY)?;

        let hash_key_length = match get(ENV_HASH_KEY_LENGTH) {
            None => DEFAULT_HASH_KEY_LENGTH,
            Some(raw) => raw
                .parse::<u8>()
                .ok()
                .filter(|len| (1..=MAX_HASH_KEY_LENGTH).contains(len))
                .ok_or_else(|| InitError {
                    message: format!(
                        "{ENV_HASH_KEY_LENGTH} must be 1 to {MAX_HASH_KEY_LENGTH}, got '{raw}'"
                    ),
                })?,
        };

        let timeout_secs = match get(ENV_GEOCODER_TIMEOUT_SECS) {
            None => DEFAULT_GEOCODER_TIMEOUT_SECS,
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| InitError {
                    message: format!(
                        "{ENV_GEOCODER_TIMEOUT_SECS} must be a positive number of seconds, got '{raw}'"
                    ),
                })?,
        };

        let cleanup_policy = match get(ENV_CLEANUP_POLICY) {
            None => CleanupPolicy::default(),
            Some(raw) => raw.parse().map_err(|message| InitError { message })?,
        };

        Ok(Self {
            metadata_table_name: get(ENV_METADATA_TABLE_NAME).unwrap_or_else(|| table_name.clone()),
            table_name,
            geocodio_api_key,
            geocodio_base_url: get(ENV_GEOCODIO_BASE_URL)
                .unwrap_or_else(|| DEFAULT_GEOCODIO_BASE_URL.to_string()),
            geocoder_timeout: Duration::from_secs(timeout_secs),
            hash_key_length,
            cleanup_policy,
            dynamodb_endpoint_url: get(ENV_DYNAMODB_ENDPOINT_URL),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("table_name", &self.table_name)
            .field("metadata_table_name", &self.metadata_table_name)
            .field("geocodio_api_key", &"<redacted>")
            .field("geocodio_base_url", &self.geocodio_base_url)
            .field("geocoder_timeout", &self.geocoder_timeout)
            .field("hash_key_length", &self.hash_key_length)
            .field("cleanup_policy", &self.cleanup_policy)
            .field("dynamodb_endpoint_url", &self.dynamodb_endpoint_url)
            .finish()
    }
}
